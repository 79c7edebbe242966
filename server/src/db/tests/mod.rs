mod audit;
mod comment;

use anyhow::{bail, Result};
use novedades_misc::api::user::PutUserRequest;

use super::types::CreateUserParams;
use super::Database;

fn run_all_tests(db: &Database) {
    user::run_user_tests(db);
    factor::run_factor_tests(db);
    comment::run_comment_tests(db);
    audit::run_audit_tests(db);

    test_rollback(db);
}

#[test]
fn test_memory() {
    let db = Database::new_test();
    run_all_tests(&db);
}

#[test]
fn test_file() {
    let path = std::env::temp_dir().join("test_novedades.db");
    let _ = std::fs::remove_file(&path);

    let sqlite = super::sqlite::SqliteConnection::open(&path).unwrap();
    let db = Database::new(super::UnionConnection::Sqlite(sqlite));

    run_all_tests(&db);

    std::fs::remove_file(&path).unwrap();
}

pub fn seed_user(db: &Database, name: &str, role: &str, jefe_id: Option<u64>) -> u64 {
    seed_user_full(db, name, role, jefe_id, None)
}

pub fn seed_user_full(
    db: &Database,
    name: &str,
    role: &str,
    jefe_id: Option<u64>,
    segundo_jefe_id: Option<u64>,
) -> u64 {
    db.with_transaction(|tx| {
        tx.create_user(CreateUserParams {
            user: PutUserRequest {
                name: name.to_string(),
                full_name: format!("Usuario {name}"),
                email: format!("{name}@example.org"),
                password: "hash".to_string(),
                role: role.to_string(),
                jefe_id,
                segundo_jefe_id,
            },
            salt: "salt".to_string(),
            create_time: 50,
            update_time: 50,
        })
    })
    .unwrap()
}

fn test_rollback(db: &Database) {
    let result: Result<()> = db.with_transaction(|tx| {
        tx.create_user(CreateUserParams {
            user: PutUserRequest {
                name: String::from("fantasma"),
                password: String::from("hash"),
                ..Default::default()
            },
            salt: String::from("salt"),
            create_time: 50,
            update_time: 50,
        })
        .unwrap();

        bail!("rollback");
    });
    assert!(result.is_err());

    db.with_transaction(|tx| {
        assert!(!tx.has_user_name("fantasma")?);
        Ok(())
    })
    .unwrap();
}
