use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Deserialize, Serialize};
use chrono::{Utc, Duration};
use std::env;

// Durée de validité des tokens
const TOKEN_VALIDITY_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,        // user_id
    pub exp: i64,        // expiration timestamp
}

/// Clé de signature des tokens, chargée une seule fois au démarrage et
/// injectée dans les handlers via web::Data. Le serveur refuse de démarrer
/// si JWT_SECRET est absent.
#[derive(Clone)]
pub struct JwtConfig {
    secret: String,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        let secret = env::var("JWT_SECRET")?;
        Ok(Self { secret })
    }

    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

/// Génère un JWT token pour un utilisateur (validité 30 jours)
pub fn generate_token(config: &JwtConfig, user_id: i32) -> Result<String, String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(TOKEN_VALIDITY_DAYS))
        .ok_or("Failed to calculate expiration")?
        .timestamp();

    let claims = Claims {
        sub: user_id,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_ref()),
    )
        .map_err(|e| format!("Failed to generate token: {}", e))
}

/// Vérifie la signature et l'expiration d'un token, et rend les claims.
/// L'appelant doit encore re-résoudre claims.sub contre la table users.
pub fn verify_token(
    config: &JwtConfig,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
        .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    #[test]
    fn test_generate_and_verify_token() {
        let config = JwtConfig::new("test-secret");
        let user_id = 123;

        let token = generate_token(&config, user_id).unwrap();
        let claims = verify_token(&config, &token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_invalid_token() {
        let config = JwtConfig::new("test-secret");

        let result = verify_token(&config, "invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let config = JwtConfig::new("test-secret");
        let other = JwtConfig::new("other-secret");

        let token = generate_token(&other, 123).unwrap();
        let result = verify_token(&config, &token);

        assert!(matches!(
            result.unwrap_err().kind(),
            ErrorKind::InvalidSignature
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = JwtConfig::new("test-secret");

        // Token expiré depuis hier, signé avec la bonne clé
        let claims = Claims {
            sub: 123,
            exp: (Utc::now() - Duration::days(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret".as_ref()),
        )
        .unwrap();

        let result = verify_token(&config, &token);

        assert!(matches!(
            result.unwrap_err().kind(),
            ErrorKind::ExpiredSignature
        ));
    }
}
