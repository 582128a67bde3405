use actix_web::{post, get, delete, web, HttpResponse};
use sea_orm::{DatabaseConnection, EntityTrait, QueryFilter, ColumnTrait, Set, ActiveModelTrait};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use chrono::Utc;

use crate::models::users::{Entity as Users, Column as UserColumn, ActiveModel as UserActiveModel};
use crate::services::installment_service::InstallmentService;
use crate::utils::{password, jwt};
use crate::utils::jwt::JwtConfig;
use crate::middleware::AuthUser;

// DTO pour l'inscription
#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 20, message = "Username must be between 3 and 20 characters"),
        custom(function = validate_username_chars)
    )]
    pub username: String,
    #[validate(
        length(min = 8, max = 64, message = "Password must be between 8 and 64 characters"),
        custom(function = validate_password_complexity)
    )]
    pub password: String,
}

// DTO pour la connexion
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// DTO pour la suppression de compte (le mot de passe re-confirme l'identité)
#[derive(Deserialize)]
pub struct DeleteAccountRequest {
    pub password: Option<String>,
}

// Réponse après login/signup
#[derive(Serialize)]
pub struct AuthResponse {
    pub id: i32,
    pub username: String,
    pub token: String,
}

// Réponse pour GET /auth/me
#[derive(Serialize)]
pub struct MeResponse {
    pub id: i32,
    pub username: String,
}

/// Le nom d'utilisateur ne peut contenir que lettres, chiffres et underscore
fn validate_username_chars(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        let mut error = ValidationError::new("username_chars");
        error.message = Some("Username can only contain letters, numbers and underscores".into());
        Err(error)
    }
}

/// Le mot de passe doit contenir au moins une lettre et un chiffre
fn validate_password_complexity(password: &str) -> Result<(), ValidationError> {
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_letter && has_digit {
        Ok(())
    } else {
        let mut error = ValidationError::new("password_complexity");
        error.message = Some("Password must contain at least one letter and one digit".into());
        Err(error)
    }
}

/// POST /auth/signup - Créer un compte (PUBLIC)
#[post("/signup")]
pub async fn signup(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    jwt_config: web::Data<JwtConfig>,
) -> HttpResponse {
    // 1. Valider le format du username et du mot de passe
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    // 2. Vérifier si le username est déjà pris (sensible à la casse)
    let existing_user = Users::find()
        .filter(UserColumn::Username.eq(&body.username))
        .one(db.get_ref())
        .await;

    match existing_user {
        Ok(Some(_)) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Username already exists"
            }));
        }
        Err(e) => {
            eprintln!("⚠️  Signup database error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }));
        }
        _ => {}
    }

    // 3. Hash le mot de passe
    let password_hash = match password::hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            eprintln!("⚠️  Password hashing error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }));
        }
    };

    // 4. Créer l'utilisateur
    let new_user = UserActiveModel {
        username: Set(body.username.clone()),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let user = match new_user.insert(db.get_ref()).await {
        Ok(user) => user,
        Err(e) => {
            eprintln!("⚠️  Failed to create user: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }));
        }
    };

    // 5. Générer le JWT
    let token = match jwt::generate_token(&jwt_config, user.id) {
        Ok(token) => token,
        Err(e) => {
            eprintln!("⚠️  Failed to generate token: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }));
        }
    };

    // 6. Retourner la réponse
    HttpResponse::Created().json(AuthResponse {
        id: user.id,
        username: user.username,
        token,
    })
}

/// POST /auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    jwt_config: web::Data<JwtConfig>,
) -> HttpResponse {
    // 1. Trouver l'utilisateur
    let user = Users::find()
        .filter(UserColumn::Username.eq(&body.username))
        .one(db.get_ref())
        .await;

    let user = match user {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "User not found"
            }));
        }
        Err(e) => {
            eprintln!("⚠️  Login database error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }));
        }
    };

    // 2. Vérifier le mot de passe
    let is_valid = match password::verify_password(&body.password, &user.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            eprintln!("⚠️  Password verification error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }));
        }
    };

    if !is_valid {
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "message": "Password is incorrect"
        }));
    }

    // 3. Générer le JWT
    let token = match jwt::generate_token(&jwt_config, user.id) {
        Ok(token) => token,
        Err(e) => {
            eprintln!("⚠️  Failed to generate token: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }));
        }
    };

    // 4. Retourner la réponse
    HttpResponse::Ok().json(AuthResponse {
        id: user.id,
        username: user.username,
        token,
    })
}

/// GET /auth/me - Vérifier le token (PROTÉGÉE)
#[get("/me")]
pub async fn me(auth_user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(MeResponse {
        id: auth_user.user_id,
        username: auth_user.username,
    })
}

/// DELETE /auth/me - Supprimer son compte et tous ses plans (PROTÉGÉE)
#[delete("/me")]
pub async fn delete_me(
    auth_user: AuthUser,
    body: Option<web::Json<DeleteAccountRequest>>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    // 1. Le mot de passe est requis pour confirmer la suppression
    // (un corps absent équivaut à un mot de passe absent)
    let password = match body.as_ref().and_then(|b| b.password.as_deref()) {
        Some(p) if !p.is_empty() => p,
        _ => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Password is required"
            }));
        }
    };

    // 2. Récupérer l'utilisateur et vérifier le mot de passe
    let user = match Users::find_by_id(auth_user.user_id).one(db.get_ref()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "message": "User not found"
            }));
        }
        Err(e) => {
            eprintln!("⚠️  Delete account database error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }));
        }
    };

    let is_valid = match password::verify_password(password, &user.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            eprintln!("⚠️  Password verification error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Something went wrong"
            }));
        }
    };

    if !is_valid {
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "message": "Password is incorrect"
        }));
    }

    // 3. Supprimer d'abord les plans, puis le compte (pas d'orphelins)
    if let Err(e) = InstallmentService::delete_all_for_user(db.get_ref(), auth_user.user_id).await {
        eprintln!("⚠️  Failed to delete user installments: {}", e);
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "message": "Something went wrong"
        }));
    }

    if let Err(e) = Users::delete_by_id(auth_user.user_id).exec(db.get_ref()).await {
        eprintln!("⚠️  Failed to delete user: {}", e);
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "message": "Something went wrong"
        }));
    }

    HttpResponse::Ok().json(serde_json::json!({
        "message": "User deleted successfully"
    }))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(signup)
            .service(login)
            .service(me)
            .service(delete_me)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_valid_credentials_accepted() {
        assert!(register("jean_01", "Secret123").validate().is_ok());
    }

    #[test]
    fn test_username_too_short_rejected() {
        assert!(register("ab", "Secret123").validate().is_err());
    }

    #[test]
    fn test_username_too_long_rejected() {
        assert!(register(&"a".repeat(21), "Secret123").validate().is_err());
    }

    #[test]
    fn test_username_with_invalid_chars_rejected() {
        assert!(register("jean dupont", "Secret123").validate().is_err());
        assert!(register("jean@mail", "Secret123").validate().is_err());
    }

    #[test]
    fn test_password_too_short_rejected() {
        assert!(register("jean_01", "Ab1").validate().is_err());
    }

    #[test]
    fn test_password_without_digit_rejected() {
        assert!(register("jean_01", "OnlyLetters").validate().is_err());
    }

    #[test]
    fn test_password_without_letter_rejected() {
        assert!(register("jean_01", "12345678").validate().is_err());
    }
}
