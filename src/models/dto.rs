//pour les requêtes et réponses structurées de l'API installments
use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;
use uuid::Uuid;
use chrono::{DateTime, Utc};

use super::installment::{self, MonthlyPayment};

// DTO pour créer ou remplacer un plan de paiement
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstallmentRequest {
    pub title: String,
    pub amount: f64,
    pub month_count: i32,
    pub start_date: String, // Format: "2024-01-01"
    pub monthly_payments: Vec<MonthlyPaymentInput>,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyPaymentInput {
    pub date: String, // Format: "2024-01-01"
    pub amount: f64,
}

// DTO pour un plan dans la réponse
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentResponse {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub amount: f64,
    pub month_count: i32,
    pub start_date: String,
    pub monthly_payments: Vec<MonthlyPaymentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// DTO pour un paiement mensuel dans la réponse
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPaymentResponse {
    pub id: Uuid,
    pub date: String,
    pub amount: f64,
    pub paid: bool,
    pub paid_date: Option<DateTime<Utc>>,
}

impl InstallmentResponse {
    pub fn from_model(model: installment::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            amount: decimal_to_f64(model.amount),
            month_count: model.month_count,
            start_date: model.start_date,
            monthly_payments: model
                .monthly_payments
                .0
                .into_iter()
                .map(MonthlyPaymentResponse::from_payment)
                .collect(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl MonthlyPaymentResponse {
    pub fn from_payment(payment: MonthlyPayment) -> Self {
        Self {
            id: payment.id,
            date: payment.date,
            amount: decimal_to_f64(payment.amount),
            paid: payment.paid,
            paid_date: payment.paid_date,
        }
    }
}

// Fonction helper pour convertir Decimal en f64
pub fn decimal_to_f64(decimal: Decimal) -> f64 {
    decimal.to_string().parse::<f64>().unwrap_or(0.0)
}

// Fonction helper pour convertir un montant f64 du JSON en Decimal
// (les montants sont validés finis avant conversion)
pub fn f64_to_decimal(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or(Decimal::ZERO)
}
