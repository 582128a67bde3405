use sea_orm::*;
use chrono::Utc;
use uuid::Uuid;

use crate::models::dto::{f64_to_decimal, CreateInstallmentRequest, MonthlyPaymentInput};
use crate::models::installment::{self, MonthlyPayment, MonthlyPayments};

// Nombre de tentatives pour les écritures protégées par le verrouillage optimiste
const MAX_WRITE_ATTEMPTS: u32 = 3;

pub struct InstallmentService;

impl InstallmentService {
    /// Crée un nouveau plan pour l'utilisateur.
    /// La requête doit déjà avoir été validée par installment_validator.
    /// Chaque paiement reçoit un id frais, paid=false et paid_date=NULL.
    pub async fn create(
        db: &DatabaseConnection,
        user_id: i32,
        request: CreateInstallmentRequest,
    ) -> Result<installment::Model, DbErr> {
        let now = Utc::now();

        let new_installment = installment::ActiveModel {
            user_id: Set(user_id),
            title: Set(request.title.trim().to_string()),
            amount: Set(f64_to_decimal(request.amount)),
            month_count: Set(request.month_count),
            start_date: Set(request.start_date.clone()),
            monthly_payments: Set(build_monthly_payments(&request.monthly_payments)),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        new_installment.insert(db).await
    }

    /// Tous les plans de l'utilisateur, du plus récent au plus ancien
    pub async fn list(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<Vec<installment::Model>, DbErr> {
        installment::Entity::find()
            .filter(installment::Column::UserId.eq(user_id))
            .order_by_desc(installment::Column::CreatedAt)
            .order_by_desc(installment::Column::Id)
            .all(db)
            .await
    }

    /// Un plan inexistant et un plan appartenant à un autre utilisateur sont
    /// indistinguables: les deux donnent None (donc 404 côté API).
    pub async fn get_by_id(
        db: &DatabaseConnection,
        user_id: i32,
        installment_id: i32,
    ) -> Result<Option<installment::Model>, DbErr> {
        installment::Entity::find()
            .filter(installment::Column::Id.eq(installment_id))
            .filter(installment::Column::UserId.eq(user_id))
            .one(db)
            .await
    }

    /// Remplace intégralement les champs du plan (sémantique full-replace:
    /// les ids des paiements sont réémis). L'écriture est conditionnée sur la
    /// colonne version pour ne pas écraser une modification concurrente.
    pub async fn update(
        db: &DatabaseConnection,
        user_id: i32,
        installment_id: i32,
        request: &CreateInstallmentRequest,
    ) -> Result<Option<installment::Model>, DbErr> {
        for _attempt in 0..MAX_WRITE_ATTEMPTS {
            // 1. Relire le plan (et sa version courante)
            let existing = match Self::get_by_id(db, user_id, installment_id).await? {
                Some(model) => model,
                None => return Ok(None),
            };

            // 2. Construire le remplacement complet
            let replacement = installment::ActiveModel {
                title: Set(request.title.trim().to_string()),
                amount: Set(f64_to_decimal(request.amount)),
                month_count: Set(request.month_count),
                start_date: Set(request.start_date.clone()),
                monthly_payments: Set(build_monthly_payments(&request.monthly_payments)),
                version: Set(existing.version + 1),
                updated_at: Set(Utc::now()),
                ..Default::default()
            };

            // 3. Écrire seulement si la version n'a pas bougé entre temps
            let result = installment::Entity::update_many()
                .set(replacement)
                .filter(installment::Column::Id.eq(installment_id))
                .filter(installment::Column::UserId.eq(user_id))
                .filter(installment::Column::Version.eq(existing.version))
                .exec(db)
                .await?;

            if result.rows_affected == 1 {
                return Self::get_by_id(db, user_id, installment_id).await;
            }
        }

        Err(DbErr::Custom(
            "Concurrent modification, update aborted after retries".to_string(),
        ))
    }

    /// Inverse le statut payé d'un paiement: paid_date passe à maintenant
    /// quand il devient payé, et revient à NULL sinon. Retourne le paiement
    /// mis à jour, ou None si le plan ou le paiement ne se résout pas pour
    /// cet utilisateur.
    pub async fn toggle_payment(
        db: &DatabaseConnection,
        user_id: i32,
        installment_id: i32,
        payment_id: Uuid,
    ) -> Result<Option<MonthlyPayment>, DbErr> {
        for _attempt in 0..MAX_WRITE_ATTEMPTS {
            // 1. Relire le plan
            let existing = match Self::get_by_id(db, user_id, installment_id).await? {
                Some(model) => model,
                None => return Ok(None),
            };

            // 2. Basculer le paiement ciblé dans la liste
            let mut payments = existing.monthly_payments.clone();
            let updated = match payments.toggle(payment_id, Utc::now()) {
                Some(payment) => payment,
                None => return Ok(None),
            };

            // 3. Réécrire la liste complète, conditionnée sur la version
            let replacement = installment::ActiveModel {
                monthly_payments: Set(payments),
                version: Set(existing.version + 1),
                updated_at: Set(Utc::now()),
                ..Default::default()
            };

            let result = installment::Entity::update_many()
                .set(replacement)
                .filter(installment::Column::Id.eq(installment_id))
                .filter(installment::Column::UserId.eq(user_id))
                .filter(installment::Column::Version.eq(existing.version))
                .exec(db)
                .await?;

            if result.rows_affected == 1 {
                return Ok(Some(updated));
            }
        }

        Err(DbErr::Custom(
            "Concurrent modification, toggle aborted after retries".to_string(),
        ))
    }

    /// Supprime le plan (et donc ses paiements embarqués).
    /// Retourne false si le plan ne se résout pas pour cet utilisateur.
    pub async fn delete(
        db: &DatabaseConnection,
        user_id: i32,
        installment_id: i32,
    ) -> Result<bool, DbErr> {
        let result = installment::Entity::delete_many()
            .filter(installment::Column::Id.eq(installment_id))
            .filter(installment::Column::UserId.eq(user_id))
            .exec(db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Supprime tous les plans d'un utilisateur.
    /// Appelé avant la suppression du compte pour ne pas laisser d'orphelins.
    pub async fn delete_all_for_user(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<u64, DbErr> {
        let result = installment::Entity::delete_many()
            .filter(installment::Column::UserId.eq(user_id))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }
}

/// Construit la liste embarquée des paiements: ids frais, paid=false,
/// paid_date=NULL, montants convertis en Decimal
fn build_monthly_payments(inputs: &[MonthlyPaymentInput]) -> MonthlyPayments {
    MonthlyPayments(
        inputs
            .iter()
            .map(|input| MonthlyPayment {
                id: Uuid::new_v4(),
                date: input.date.clone(),
                amount: f64_to_decimal(input.amount),
                paid: false,
                paid_date: None,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn inputs() -> Vec<MonthlyPaymentInput> {
        vec![
            MonthlyPaymentInput {
                date: "2024-01-01".to_string(),
                amount: 400.0,
            },
            MonthlyPaymentInput {
                date: "2024-02-01".to_string(),
                amount: 400.0,
            },
            MonthlyPaymentInput {
                date: "2024-03-01".to_string(),
                amount: 400.0,
            },
        ]
    }

    #[test]
    fn test_built_payments_start_unpaid() {
        let payments = build_monthly_payments(&inputs());

        assert_eq!(payments.0.len(), 3);
        for payment in &payments.0 {
            assert!(!payment.paid);
            assert_eq!(payment.paid_date, None);
        }
    }

    #[test]
    fn test_built_payments_have_unique_ids() {
        let payments = build_monthly_payments(&inputs());
        let ids: HashSet<_> = payments.0.iter().map(|p| p.id).collect();

        assert_eq!(ids.len(), payments.0.len());
    }

    #[test]
    fn test_built_payments_keep_dates_and_amounts() {
        let payments = build_monthly_payments(&inputs());

        assert_eq!(payments.0[1].date, "2024-02-01");
        assert_eq!(payments.0[1].amount, "400".parse().unwrap());
    }
}
