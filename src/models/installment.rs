use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;

/// Un paiement mensuel, stocké dans la colonne JSONB de son plan.
/// Un paiement n'existe jamais en dehors de son plan parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPayment {
    pub id: Uuid,
    pub date: String, // Format: "2025-01-15"
    pub amount: Decimal,
    pub paid: bool,
    pub paid_date: Option<DateTimeUtc>, // NULL tant que le paiement n'est pas payé
}

/// La liste complète des paiements d'un plan (colonne JSONB)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct MonthlyPayments(pub Vec<MonthlyPayment>);

impl MonthlyPayments {
    /// Inverse le statut payé d'un paiement: paid_date passe à `now` quand le
    /// paiement devient payé, et revient à NULL quand il redevient impayé.
    /// Retourne le paiement mis à jour, ou None si l'id n'existe pas dans le plan.
    pub fn toggle(&mut self, payment_id: Uuid, now: DateTimeUtc) -> Option<MonthlyPayment> {
        let payment = self.0.iter_mut().find(|p| p.id == payment_id)?;

        payment.paid = !payment.paid;
        payment.paid_date = if payment.paid { Some(now) } else { None };

        Some(payment.clone())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "installments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32, // Propriétaire, immuable après création
    pub title: String,
    pub amount: Decimal,
    pub month_count: i32,
    pub start_date: String, // Format: "2025-01-15"
    #[sea_orm(column_type = "JsonBinary")]
    pub monthly_payments: MonthlyPayments,
    pub version: i32, // Compteur pour le verrouillage optimiste
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_payments() -> MonthlyPayments {
        MonthlyPayments(vec![
            MonthlyPayment {
                id: Uuid::new_v4(),
                date: "2024-01-01".to_string(),
                amount: Decimal::new(40000, 2),
                paid: false,
                paid_date: None,
            },
            MonthlyPayment {
                id: Uuid::new_v4(),
                date: "2024-02-01".to_string(),
                amount: Decimal::new(40000, 2),
                paid: false,
                paid_date: None,
            },
        ])
    }

    #[test]
    fn test_toggle_marks_payment_paid() {
        let mut payments = sample_payments();
        let target = payments.0[0].id;
        let now = Utc::now();

        let updated = payments.toggle(target, now).unwrap();

        assert!(updated.paid);
        assert_eq!(updated.paid_date, Some(now));
        assert!(payments.0[0].paid);
        assert!(!payments.0[1].paid);
    }

    #[test]
    fn test_toggle_twice_restores_original_state() {
        let mut payments = sample_payments();
        let target = payments.0[1].id;

        payments.toggle(target, Utc::now()).unwrap();
        let restored = payments.toggle(target, Utc::now()).unwrap();

        assert!(!restored.paid);
        assert_eq!(restored.paid_date, None);
        assert_eq!(payments.0[1].paid, false);
        assert_eq!(payments.0[1].paid_date, None);
    }

    #[test]
    fn test_toggle_unknown_payment_returns_none() {
        let mut payments = sample_payments();
        let before = payments.clone();

        let result = payments.toggle(Uuid::new_v4(), Utc::now());

        assert!(result.is_none());
        assert_eq!(payments, before);
    }
}
