use actix_web::{post, get, put, delete, web, HttpResponse};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::models::dto::{CreateInstallmentRequest, InstallmentResponse, MonthlyPaymentResponse};
use crate::services::installment_service::InstallmentService;
use crate::services::installment_validator::validate_installment;

/// POST /api/installments - Créer un plan de paiement (PROTÉGÉE)
#[post("")]
pub async fn create_installment(
    auth_user: AuthUser,
    body: web::Json<CreateInstallmentRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    // 1. Valider le plan (titre, montant, mois, dates, réconciliation)
    if let Err(error) = validate_installment(&body) {
        return HttpResponse::BadRequest().json(error.to_json());
    }

    // 2. Persister pour l'utilisateur authentifié
    match InstallmentService::create(db.get_ref(), auth_user.user_id, body.into_inner()).await {
        Ok(installment) => HttpResponse::Created().json(InstallmentResponse::from_model(installment)),
        Err(e) => {
            eprintln!("⚠️  Create installment error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }))
        }
    }
}

/// GET /api/installments - Lister ses plans, du plus récent au plus ancien (PROTÉGÉE)
#[get("")]
pub async fn get_installments(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    match InstallmentService::list(db.get_ref(), auth_user.user_id).await {
        Ok(installments) => {
            let response: Vec<InstallmentResponse> = installments
                .into_iter()
                .map(InstallmentResponse::from_model)
                .collect();

            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            eprintln!("⚠️  List installments error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }))
        }
    }
}

/// GET /api/installments/{id} - Récupérer un plan (PROTÉGÉE)
#[get("/{id}")]
pub async fn get_installment(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let installment_id = path.into_inner();

    // Un plan d'un autre utilisateur donne le même 404 qu'un plan inexistant
    match InstallmentService::get_by_id(db.get_ref(), auth_user.user_id, installment_id).await {
        Ok(Some(installment)) => HttpResponse::Ok().json(InstallmentResponse::from_model(installment)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "message": "Installment not found"
        })),
        Err(e) => {
            eprintln!("⚠️  Get installment error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }))
        }
    }
}

/// PUT /api/installments/{id} - Remplacer un plan (PROTÉGÉE)
/// Le corps complet est revalidé comme à la création
#[put("/{id}")]
pub async fn update_installment(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<CreateInstallmentRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let installment_id = path.into_inner();

    // 1. Valider le remplacement complet
    if let Err(error) = validate_installment(&body) {
        return HttpResponse::BadRequest().json(error.to_json());
    }

    // 2. Persister
    match InstallmentService::update(db.get_ref(), auth_user.user_id, installment_id, &body).await {
        Ok(Some(installment)) => HttpResponse::Ok().json(InstallmentResponse::from_model(installment)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "message": "Installment not found"
        })),
        Err(e) => {
            eprintln!("⚠️  Update installment error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }))
        }
    }
}

/// PUT /api/installments/{id}/pay/{payment_id} - Basculer payé/impayé (PROTÉGÉE)
#[put("/{id}/pay/{payment_id}")]
pub async fn toggle_payment(
    auth_user: AuthUser,
    path: web::Path<(i32, String)>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let (installment_id, payment_id) = path.into_inner();

    // Un id de paiement mal formé ne peut résoudre aucun paiement
    let payment_id = match payment_id.parse::<Uuid>() {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "Payment not found"
            }));
        }
    };

    match InstallmentService::toggle_payment(db.get_ref(), auth_user.user_id, installment_id, payment_id).await {
        Ok(Some(payment)) => HttpResponse::Ok().json(MonthlyPaymentResponse::from_payment(payment)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "message": "Payment not found"
        })),
        Err(e) => {
            eprintln!("⚠️  Toggle payment error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }))
        }
    }
}

/// DELETE /api/installments/{id} - Supprimer un plan (PROTÉGÉE)
#[delete("/{id}")]
pub async fn delete_installment(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let installment_id = path.into_inner();

    match InstallmentService::delete(db.get_ref(), auth_user.user_id, installment_id).await {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Installment deleted successfully"
        })),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "message": "Installment not found"
        })),
        Err(e) => {
            eprintln!("⚠️  Delete installment error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }))
        }
    }
}

pub fn installment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/installments")
            .service(create_installment)
            .service(get_installments)
            .service(toggle_payment)
            .service(get_installment)
            .service(update_installment)
            .service(delete_installment)
    );
}
