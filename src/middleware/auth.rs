use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest, HttpResponse};
use futures::future::LocalBoxFuture;
use jsonwebtoken::errors::ErrorKind;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};

use crate::models::users::Entity as Users;
use crate::utils::jwt::{self, JwtConfig};

/// Structure qui contient les infos de l'utilisateur authentifié
/// Utilisée comme extracteur dans les routes protégées
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
}

fn unauthorized(message: &str) -> Error {
    let response = HttpResponse::Unauthorized().json(serde_json::json!({
        "message": message
    }));
    actix_web::error::InternalError::from_response("", response).into()
}

fn internal_error() -> Error {
    let response = HttpResponse::InternalServerError().json(serde_json::json!({
        "message": "Something went wrong"
    }));
    actix_web::error::InternalError::from_response("", response).into()
}

/// Implémentation de FromRequest pour AuthUser
/// L'extraction est asynchrone: après vérification du token, l'utilisateur
/// est re-résolu en BD pour qu'un compte supprimé invalide tous ses tokens
impl FromRequest for AuthUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            // 1. Extraire le token du header Authorization (format: "Bearer <token>")
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|header| header.to_str().ok())
                .ok_or_else(|| unauthorized("Missing Authorization header"))?;

            let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
                unauthorized("Invalid Authorization format (expected: Bearer <token>)")
            })?;

            // 2. Vérifier la signature et l'expiration
            let jwt_config = req
                .app_data::<web::Data<JwtConfig>>()
                .ok_or_else(internal_error)?;

            let claims = jwt::verify_token(jwt_config, token).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => unauthorized("Token expired"),
                _ => unauthorized("Invalid token"),
            })?;

            // 3. Re-résoudre l'utilisateur en BD
            let db = req
                .app_data::<web::Data<DatabaseConnection>>()
                .ok_or_else(internal_error)?;

            let user = Users::find_by_id(claims.sub)
                .one(db.get_ref())
                .await
                .map_err(|e| {
                    eprintln!("⚠️  Auth middleware database error: {}", e);
                    internal_error()
                })?
                .ok_or_else(|| unauthorized("User not found"))?;

            // 4. Créer et retourner AuthUser
            Ok(AuthUser {
                user_id: user.id,
                username: user.username,
            })
        })
    }
}
