use crate::auth::jwt::{JwtTokenGenerator, JwtTokenValidator};
use crate::config::ServerConfig;
use crate::db::Database;

pub struct ServerContext {
    pub db: Database,

    pub jwt_generator: JwtTokenGenerator,
    pub jwt_validator: JwtTokenValidator,

    pub cfg: ServerConfig,
}

#[cfg(test)]
impl ServerContext {
    pub fn new_test() -> Self {
        let (public_key, private_key) = crate::auth::rsa::generate_rsa_keys().unwrap();
        Self {
            db: Database::new_test(),
            jwt_generator: JwtTokenGenerator::new(&private_key, 60).unwrap(),
            jwt_validator: JwtTokenValidator::new(&public_key).unwrap(),
            cfg: ServerConfig::default(),
        }
    }

    /// Inserts a user with a hashed password and returns its id.
    pub fn seed_user(
        &self,
        name: &str,
        role: &str,
        password: &str,
        jefe_id: Option<u64>,
        segundo_jefe_id: Option<u64>,
    ) -> u64 {
        use novedades_misc::api::user::PutUserRequest;
        use novedades_misc::code;

        use crate::db::types::CreateUserParams;

        let salt = "test_salt";
        self.db
            .with_transaction(|tx| {
                tx.create_user(CreateUserParams {
                    user: PutUserRequest {
                        name: name.to_string(),
                        full_name: format!("Usuario {name}"),
                        email: format!("{name}@example.org"),
                        password: code::sha256(format!("{password}{salt}")),
                        role: role.to_string(),
                        jefe_id,
                        segundo_jefe_id,
                    },
                    salt: salt.to_string(),
                    create_time: 1,
                    update_time: 1,
                })
            })
            .unwrap()
    }

    /// Inserts a factor with one subfactor and returns the subfactor id.
    pub fn seed_subfactor(&self, factor: &str, subfactor: &str) -> u64 {
        self.db
            .with_transaction(|tx| {
                let factor_id = tx.create_factor(factor)?;
                tx.create_subfactor(subfactor, factor_id)
            })
            .unwrap()
    }
}
