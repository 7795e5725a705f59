use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The caller identity attached to every protected request. `sub` is the
/// identity provider's stable user identifier.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iss: String,
    pub iat: usize,
    pub jti: String,
}

/******************************************/
// Creating JWT token
/******************************************/
pub fn create_jwt(user_id: &str, secret: &str) -> Result<String, String> {
    let expiration_time = (Utc::now() + Duration::hours(1)).timestamp() as usize;
    let issued_at = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration_time,
        iss: "auth".to_string(),
        iat: issued_at,
        jti: Uuid::new_v4().to_string(),
    };

    let encoding_key = EncodingKey::from_secret(secret.as_ref());
    encode(&Header::default(), &claims, &encoding_key).map_err(|err| err.to_string())
}

/******************************************/
// Verifying JWT token
/******************************************/
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    let decoding_key = DecodingKey::from_secret(secret.as_ref());
    let validation = Validation::default();
    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|err| err.to_string())?;

    if token_data.claims.iss != "auth" {
        return Err("Invalid issuer".to_string());
    }
    let iat = token_data.claims.iat;
    if iat > Utc::now().timestamp() as usize {
        return Err("Token issued in the future".to_string());
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::{create_jwt, verify_jwt};
    use claim::assert_err;

    const SECRET: &str = "test-secret";

    #[test]
    fn a_freshly_issued_token_verifies() {
        let token = create_jwt("gamer-42", SECRET).unwrap();
        let claims = verify_jwt(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "gamer-42");
    }

    #[test]
    fn a_token_signed_with_another_secret_is_rejected() {
        let token = create_jwt("gamer-42", "other-secret").unwrap();
        assert_err!(verify_jwt(&token, SECRET));
    }

    #[test]
    fn a_garbage_token_is_rejected() {
        assert_err!(verify_jwt("not.a.token", SECRET));
    }

    #[test]
    fn two_tokens_for_the_same_user_get_distinct_ids() {
        let first = create_jwt("gamer-42", SECRET).unwrap();
        let second = create_jwt("gamer-42", SECRET).unwrap();
        let first = verify_jwt(&first, SECRET).unwrap();
        let second = verify_jwt(&second, SECRET).unwrap();
        assert_ne!(first.jti, second.jti);
    }
}
