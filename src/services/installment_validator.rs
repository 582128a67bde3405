use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::dto::CreateInstallmentRequest;

pub const TITLE_MAX_LENGTH: usize = 100; // min: 1 caractère après trim
pub const MONTH_COUNT_MIN: i32 = 1;

/// Erreurs de validation d'un plan de paiement.
/// La validation s'arrête à la première erreur rencontrée (pas d'accumulation),
/// dans l'ordre: titre, montant, nombre de mois, date de début, liste des
/// paiements, chaque paiement, puis réconciliation des totaux.
#[derive(Debug, Clone, PartialEq)]
pub enum InstallmentValidationError {
    TitleEmpty,
    TitleTooLong,
    AmountNotFinite,
    AmountNotPositive,
    MonthCountTooSmall,
    StartDateInvalid,
    PaymentCountMismatch { expected: i32, actual: usize },
    PaymentDateInvalid { index: usize },
    PaymentAmountNotFinite { index: usize },
    PaymentAmountNotPositive { index: usize },
    TotalMismatch { computed: Decimal, expected: Decimal },
}

impl InstallmentValidationError {
    pub fn message(&self) -> String {
        match self {
            Self::TitleEmpty => "Title is required".to_string(),
            Self::TitleTooLong => {
                format!("Title must be at most {} characters", TITLE_MAX_LENGTH)
            }
            Self::AmountNotFinite => "Amount must be a finite number".to_string(),
            Self::AmountNotPositive => "Amount must be greater than 0".to_string(),
            Self::MonthCountTooSmall => {
                format!("Month count must be at least {}", MONTH_COUNT_MIN)
            }
            Self::StartDateInvalid => {
                "Start date must be a valid date in YYYY-MM-DD format".to_string()
            }
            Self::PaymentCountMismatch { expected, actual } => {
                format!("Expected {} monthly payments, got {}", expected, actual)
            }
            Self::PaymentDateInvalid { .. } => {
                "Monthly payment date must be a valid date in YYYY-MM-DD format".to_string()
            }
            Self::PaymentAmountNotFinite { .. } => {
                "Monthly payment amount must be a finite number".to_string()
            }
            Self::PaymentAmountNotPositive { .. } => {
                "Monthly payment amount must be greater than 0".to_string()
            }
            Self::TotalMismatch { computed, expected } => {
                format!(
                    "Monthly payments total {:.2} does not match amount {:.2}",
                    computed, expected
                )
            }
        }
    }

    /// Corps JSON de la réponse 400: toujours un "message", plus "index" pour
    /// les erreurs sur un paiement précis, plus les deux totaux calculés pour
    /// une erreur de réconciliation.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::PaymentDateInvalid { index }
            | Self::PaymentAmountNotFinite { index }
            | Self::PaymentAmountNotPositive { index } => serde_json::json!({
                "message": self.message(),
                "index": index,
            }),
            Self::TotalMismatch { computed, expected } => serde_json::json!({
                "message": self.message(),
                "computed": format!("{:.2}", computed),
                "expected": format!("{:.2}", expected),
            }),
            _ => serde_json::json!({
                "message": self.message(),
            }),
        }
    }
}

/// Valide un plan de paiement complet. Fonction pure, aucun accès BD.
///
/// La présence et le type des champs sont déjà garantis par la
/// désérialisation typée de la requête; on vérifie ici les valeurs.
/// La longueur de la liste est validée avant la réconciliation pour
/// qu'une liste trop courte ne puisse pas "tomber juste" par accident.
pub fn validate_installment(
    request: &CreateInstallmentRequest,
) -> Result<(), InstallmentValidationError> {
    // 1. Titre: non vide après trim, longueur bornée
    let title = request.title.trim();
    if title.is_empty() {
        return Err(InstallmentValidationError::TitleEmpty);
    }
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(InstallmentValidationError::TitleTooLong);
    }

    // 2. Montant total: représentable en Decimal (fini) et strictement positif
    let amount = match Decimal::from_f64_retain(request.amount) {
        Some(d) => d,
        None => return Err(InstallmentValidationError::AmountNotFinite),
    };
    if amount <= Decimal::ZERO {
        return Err(InstallmentValidationError::AmountNotPositive);
    }

    // 3. Nombre de mois
    if request.month_count < MONTH_COUNT_MIN {
        return Err(InstallmentValidationError::MonthCountTooSmall);
    }

    // 4. Date de début
    if !is_iso_date(&request.start_date) {
        return Err(InstallmentValidationError::StartDateInvalid);
    }

    // 5. La liste doit contenir exactement month_count paiements
    if request.monthly_payments.len() != request.month_count as usize {
        return Err(InstallmentValidationError::PaymentCountMismatch {
            expected: request.month_count,
            actual: request.monthly_payments.len(),
        });
    }

    // 6. Chaque paiement: date valide et montant strictement positif.
    // La première entrée invalide gagne et rapporte son index.
    let mut computed = Decimal::ZERO;
    for (index, payment) in request.monthly_payments.iter().enumerate() {
        if !is_iso_date(&payment.date) {
            return Err(InstallmentValidationError::PaymentDateInvalid { index });
        }
        let payment_amount = match Decimal::from_f64_retain(payment.amount) {
            Some(d) => d,
            None => return Err(InstallmentValidationError::PaymentAmountNotFinite { index }),
        };
        if payment_amount <= Decimal::ZERO {
            return Err(InstallmentValidationError::PaymentAmountNotPositive { index });
        }

        computed += round2(payment_amount);
    }

    // 7. Réconciliation: la somme des paiements arrondis à 2 décimales doit
    // égaler le montant total arrondi à 2 décimales
    let expected = round2(amount);
    if computed != expected {
        return Err(InstallmentValidationError::TotalMismatch { computed, expected });
    }

    Ok(())
}

/// Arrondi monétaire à 2 décimales, demi-unités éloignées de zéro
/// (0.005 -> 0.01, comme toFixed, pas l'arrondi bancaire)
fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Vérifie le format YYYY-MM-DD (chiffres et tirets aux bonnes positions)
/// puis que la date existe réellement dans le calendrier
fn is_iso_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }

    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return false;
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dto::MonthlyPaymentInput;

    fn payment(date: &str, amount: f64) -> MonthlyPaymentInput {
        MonthlyPaymentInput {
            date: date.to_string(),
            amount,
        }
    }

    fn laptop_request() -> CreateInstallmentRequest {
        CreateInstallmentRequest {
            title: "Laptop".to_string(),
            amount: 1200.00,
            month_count: 3,
            start_date: "2024-01-01".to_string(),
            monthly_payments: vec![
                payment("2024-01-01", 400.0),
                payment("2024-02-01", 400.0),
                payment("2024-03-01", 400.0),
            ],
        }
    }

    #[test]
    fn test_valid_plan_passes() {
        assert_eq!(validate_installment(&laptop_request()), Ok(()));
    }

    #[test]
    fn test_title_empty_after_trim_rejected() {
        let mut request = laptop_request();
        request.title = "   ".to_string();

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::TitleEmpty)
        );
    }

    #[test]
    fn test_title_too_long_rejected() {
        let mut request = laptop_request();
        request.title = "x".repeat(TITLE_MAX_LENGTH + 1);

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::TitleTooLong)
        );
    }

    #[test]
    fn test_amount_zero_rejected() {
        let mut request = laptop_request();
        request.amount = 0.0;

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::AmountNotPositive)
        );
    }

    #[test]
    fn test_amount_negative_rejected() {
        let mut request = laptop_request();
        request.amount = -1200.0;

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::AmountNotPositive)
        );
    }

    #[test]
    fn test_amount_nan_rejected() {
        let mut request = laptop_request();
        request.amount = f64::NAN;

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::AmountNotFinite)
        );
    }

    #[test]
    fn test_amount_infinite_rejected() {
        let mut request = laptop_request();
        request.amount = f64::INFINITY;

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::AmountNotFinite)
        );
    }

    #[test]
    fn test_month_count_zero_rejected() {
        let mut request = laptop_request();
        request.month_count = 0;

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::MonthCountTooSmall)
        );
    }

    #[test]
    fn test_start_date_wrong_format_rejected() {
        for bad_date in ["01-01-2024", "2024/01/01", "2024-1-1", "not-a-date", ""] {
            let mut request = laptop_request();
            request.start_date = bad_date.to_string();

            assert_eq!(
                validate_installment(&request),
                Err(InstallmentValidationError::StartDateInvalid),
                "date: {:?}",
                bad_date
            );
        }
    }

    #[test]
    fn test_start_date_impossible_day_rejected() {
        let mut request = laptop_request();
        request.start_date = "2024-02-30".to_string();

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::StartDateInvalid)
        );
    }

    #[test]
    fn test_payment_count_mismatch_rejected_even_if_sum_matches() {
        // 2 paiements pour month_count=3, mais la somme tombe juste quand même
        let mut request = laptop_request();
        request.monthly_payments = vec![
            payment("2024-01-01", 600.0),
            payment("2024-02-01", 600.0),
        ];

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::PaymentCountMismatch {
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn test_payment_invalid_date_reports_index() {
        let mut request = laptop_request();
        request.monthly_payments[1].date = "2024-13-01".to_string();

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::PaymentDateInvalid { index: 1 })
        );
    }

    #[test]
    fn test_payment_zero_amount_reports_index() {
        let mut request = laptop_request();
        request.monthly_payments[2].amount = 0.0;

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::PaymentAmountNotPositive { index: 2 })
        );
    }

    #[test]
    fn test_first_invalid_payment_wins() {
        let mut request = laptop_request();
        request.monthly_payments[0].amount = -5.0;
        request.monthly_payments[1].date = "bad".to_string();

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::PaymentAmountNotPositive { index: 0 })
        );
    }

    #[test]
    fn test_total_mismatch_reports_both_totals() {
        let mut request = laptop_request();
        request.monthly_payments[2].amount = 399.99;

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::TotalMismatch {
                computed: "1199.99".parse().unwrap(),
                expected: "1200".parse().unwrap(),
            })
        );
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        // 2.125 est exact en binaire; arrondi à 2 décimales il donne 2.13
        // (l'arrondi bancaire donnerait 2.12 et rejetterait ce plan)
        let request = CreateInstallmentRequest {
            title: "Abonnement".to_string(),
            amount: 2.13,
            month_count: 1,
            start_date: "2024-01-01".to_string(),
            monthly_payments: vec![payment("2024-01-01", 2.125)],
        };

        assert_eq!(validate_installment(&request), Ok(()));
    }

    #[test]
    fn test_validation_short_circuits_in_order() {
        // Titre vide ET montant invalide: l'erreur de titre gagne
        let mut request = laptop_request();
        request.title = "".to_string();
        request.amount = -1.0;

        assert_eq!(
            validate_installment(&request),
            Err(InstallmentValidationError::TitleEmpty)
        );
    }

    #[test]
    fn test_mismatch_error_json_includes_totals() {
        let error = InstallmentValidationError::TotalMismatch {
            computed: "1199.99".parse().unwrap(),
            expected: "1200".parse().unwrap(),
        };
        let body = error.to_json();

        assert_eq!(body["computed"], "1199.99");
        assert_eq!(body["expected"], "1200.00");
    }

    #[test]
    fn test_payment_error_json_includes_index() {
        let error = InstallmentValidationError::PaymentDateInvalid { index: 4 };
        let body = error.to_json();

        assert_eq!(body["index"], 4);
        assert!(body["message"].as_str().unwrap().contains("YYYY-MM-DD"));
    }
}
