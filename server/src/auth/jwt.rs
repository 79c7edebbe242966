use anyhow::{bail, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use novedades_misc::api::user::{TokenResponse, User};
use serde::{Deserialize, Serialize};

/// JWT issuer identifier
const ISSUER: &str = "novedades/jwt-tokenizer";

const AUD_BOOTSTRAP: &str = "bootstrap";
const AUD_NORMAL: &str = "normal";

/// Claims represents public claim values (as specified in RFC 7519)
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    pub aud: String, // Optional. The intended recipient of the token
    pub exp: usize,  // Required. Token expiration time (timestamp)
    pub iat: usize,  // Optional. Time at which token was issued (timestamp)
    pub iss: String, // Optional. Token issuer
    pub nbf: usize,  // Optional. Time before which token must not be accepted (timestamp)
    pub sub: String, // Optional. Subject of the token (user identifier)
}

/// The identity carried by a validated token. The bootstrap admin has no
/// database row, so it is flagged rather than looked up.
#[derive(Debug, PartialEq)]
pub struct TokenSubject {
    pub name: String,
    pub bootstrap_admin: bool,
}

/// Signs RS256 tokens with the server's RSA private key.
pub struct JwtTokenGenerator {
    key: EncodingKey,
    expiry: usize,
}

impl JwtTokenGenerator {
    pub fn new(private_key: &[u8], expiry: u64) -> Result<Self> {
        let key = match EncodingKey::from_rsa_pem(private_key) {
            Ok(key) => key,
            Err(e) => bail!("parse RSA private key for jwt token generation failed: {e}"),
        };
        Ok(Self {
            key,
            expiry: expiry as usize,
        })
    }

    pub fn generate_token(&self, user: &User, now: u64) -> Result<TokenResponse> {
        let now = now as usize;

        let aud = if user.id == super::BOOTSTRAP_ADMIN_ID {
            AUD_BOOTSTRAP
        } else {
            AUD_NORMAL
        };

        let claims = Claims {
            aud: String::from(aud),
            exp: now + self.expiry,
            iat: now,
            iss: String::from(ISSUER),
            nbf: now,
            sub: user.name.clone(),
        };

        match encode(&Header::new(Algorithm::RS256), &claims, &self.key) {
            Ok(token) => Ok(TokenResponse {
                token,
                expire_after: claims.exp as u64,
            }),
            Err(e) => bail!("generate jwt token failed: {e}"),
        }
    }
}

/// Verifies token signature, expiration and claims with the RSA public key.
pub struct JwtTokenValidator {
    key: DecodingKey,
}

impl JwtTokenValidator {
    pub fn new(public_key: &[u8]) -> Result<Self> {
        let key = match DecodingKey::from_rsa_pem(public_key) {
            Ok(key) => key,
            Err(e) => bail!("parse RSA public key for jwt token validation failed: {e}"),
        };
        Ok(Self { key })
    }

    pub fn validate_token(&self, token: &str, now: u64) -> Result<TokenSubject> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["aud", "exp", "iat", "iss", "nbf", "sub"]);
        validation.set_audience(&[AUD_BOOTSTRAP, AUD_NORMAL]);

        let claims = match decode::<Claims>(token, &self.key, &validation) {
            Ok(data) => data.claims,
            Err(e) => bail!("validate jwt token failed: {e}"),
        };

        if claims.sub.is_empty() {
            bail!("validate jwt token failed: empty subject");
        }

        let now = now as usize;
        if now >= claims.exp {
            bail!("validate jwt token failed: token expired");
        }

        if now < claims.nbf {
            bail!("validate jwt token failed: token not yet valid");
        }

        Ok(TokenSubject {
            name: claims.sub,
            bootstrap_admin: claims.aud == AUD_BOOTSTRAP,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::auth::{bootstrap_admin_user, rsa};
    use crate::authz::hierarchy::tests::user;

    use super::*;

    #[test]
    fn test_jwt() {
        let (public_key, private_key) = rsa::generate_rsa_keys().unwrap();
        let jwt_generator = JwtTokenGenerator::new(&private_key, 60).unwrap();
        let jwt_validator = JwtTokenValidator::new(&public_key).unwrap();

        let now = Utc::now().timestamp() as u64;

        let normal = user(3, "Funcionario", Some(1), None);
        let token = jwt_generator.generate_token(&normal, now).unwrap();
        let subject = jwt_validator.validate_token(&token.token, now).unwrap();
        assert_eq!(
            subject,
            TokenSubject {
                name: normal.name.clone(),
                bootstrap_admin: false,
            }
        );

        let admin = bootstrap_admin_user();
        let token = jwt_generator.generate_token(&admin, now).unwrap();
        let subject = jwt_validator.validate_token(&token.token, now).unwrap();
        assert!(subject.bootstrap_admin);

        // Expired token is rejected.
        let token = jwt_generator.generate_token(&normal, now).unwrap();
        let result = jwt_validator.validate_token(&token.token, now + 80);
        assert!(result.is_err());

        // Garbage is rejected.
        assert!(jwt_validator.validate_token("not a token", now).is_err());
    }
}
