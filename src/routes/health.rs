use actix_web::{get, HttpResponse};
use chrono::Utc;
use crate::models::health::HealthResponse;

/// GET /api/health - Vérifier que l'API tourne
#[get("/health")]
pub async fn health_check() -> HttpResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "PayFlow API is running!".to_string(),
        time: Utc::now(),
    };

    HttpResponse::Ok().json(response)
}
