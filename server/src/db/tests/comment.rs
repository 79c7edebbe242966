use novedades_misc::api::comment::{CommentKind, CommentState, GetCommentRequest};
use novedades_misc::api::QueryRequest;

use crate::db::types::CreateCommentParams;
use crate::db::Database;

use super::seed_user;

pub fn run_comment_tests(db: &Database) {
    let jefe = seed_user(db, "jvidal", "Encargado de Unidad", None);
    let func = seed_user(db, "rflores", "Funcionario", Some(jefe));

    let (conducta_factor, puntualidad, calidad) = db
        .with_transaction(|tx| {
            let conducta = tx.create_factor("Conducta comentada")?;
            let rendimiento = tx.create_factor("Rendimiento comentado")?;
            Ok((
                conducta,
                tx.create_subfactor("Puntualidad", conducta)?,
                tx.create_subfactor("Calidad del trabajo", rendimiento)?,
            ))
        })
        .unwrap();

    let folios = db
        .with_transaction(|tx| {
            let mut folios = Vec::new();
            for (kind, subfactor_id, create_time) in [
                ("Favorable", puntualidad, 1000),
                ("Desfavorable", puntualidad, 2000),
                ("Desfavorable", calidad, 3000),
            ] {
                folios.push(tx.create_comment(CreateCommentParams {
                    kind: kind.to_string(),
                    motivo: format!("motivo {kind}"),
                    funcionario_id: func,
                    jefe_id: jefe,
                    subfactor_id,
                    create_time,
                })?);
            }
            Ok(folios)
        })
        .unwrap();

    test_get(db, func, jefe, folios[0]);
    test_filters(db, func, conducta_factor, calidad, folios.len() as u64);
    test_accept(db, folios[1]);
}

fn test_get(db: &Database, func: u64, jefe: u64, folio: u64) {
    db.with_transaction(|tx| {
        let comment = tx.get_comment(folio)?.unwrap();
        assert_eq!(comment.folio, folio);
        assert_eq!(comment.kind, CommentKind::Favorable);
        assert_eq!(comment.motivo, "motivo Favorable");
        assert_eq!(comment.observacion, None);
        assert_eq!(comment.estado, CommentState::Pendiente);
        assert_eq!(comment.funcionario_id, func);
        assert_eq!(comment.jefe_id, jefe);
        assert_eq!(comment.create_time, 1000);
        assert_eq!(comment.accept_time, None);

        assert!(tx.get_comment(9999)?.is_none());

        Ok(())
    })
    .unwrap();
}

fn test_filters(db: &Database, func: u64, conducta_factor: u64, calidad: u64, total: u64) {
    db.with_transaction(|tx| {
        let base = GetCommentRequest {
            funcionario_id: Some(func),
            ..Default::default()
        };

        assert_eq!(tx.count_comments(base.clone())?, total);

        // Newest first.
        let all = tx.get_comments(base.clone())?;
        assert_eq!(all.len(), total as usize);
        assert_eq!(all[0].create_time, 3000);
        assert_eq!(all[2].create_time, 1000);

        let desfavorables = tx.get_comments(GetCommentRequest {
            kind: Some("Desfavorable".to_string()),
            ..base.clone()
        })?;
        assert_eq!(desfavorables.len(), 2);

        let pendientes = tx.get_comments(GetCommentRequest {
            estado: Some("Pendiente".to_string()),
            ..base.clone()
        })?;
        assert_eq!(pendientes.len(), 3);

        // Factor filter goes through the subfactor catalog.
        let conducta = tx.get_comments(GetCommentRequest {
            factor_id: Some(conducta_factor),
            ..base.clone()
        })?;
        assert_eq!(conducta.len(), 2);

        let subfactor = tx.get_comments(GetCommentRequest {
            subfactor_id: Some(calidad),
            ..base.clone()
        })?;
        assert_eq!(subfactor.len(), 1);

        // Inclusive date range.
        let ranged = tx.get_comments(GetCommentRequest {
            created_after: Some(2000),
            created_before: Some(3000),
            ..base.clone()
        })?;
        assert_eq!(ranged.len(), 2);

        let paged = tx.get_comments(GetCommentRequest {
            query: QueryRequest {
                limit: Some(1),
                offset: Some(1),
                ..Default::default()
            },
            ..base.clone()
        })?;
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].create_time, 2000);

        let count = tx.count_comments(GetCommentRequest {
            kind: Some("Desfavorable".to_string()),
            ..base
        })?;
        assert_eq!(count, 2);

        Ok(())
    })
    .unwrap();
}

fn test_accept(db: &Database, folio: u64) {
    db.with_transaction(|tx| {
        // First acceptance applies.
        assert!(tx.accept_comment(folio, "tomo conocimiento", 5000)?);

        let comment = tx.get_comment(folio)?.unwrap();
        assert_eq!(comment.estado, CommentState::Aceptada);
        assert_eq!(comment.observacion.as_deref(), Some("tomo conocimiento"));
        assert_eq!(comment.accept_time, Some(5000));

        // Second one loses the compare-and-set and changes nothing.
        assert!(!tx.accept_comment(folio, "otra vez", 6000)?);

        let comment = tx.get_comment(folio)?.unwrap();
        assert_eq!(comment.observacion.as_deref(), Some("tomo conocimiento"));
        assert_eq!(comment.accept_time, Some(5000));

        // Nonexistent folio simply matches nothing.
        assert!(!tx.accept_comment(9999, "x", 7000)?);

        Ok(())
    })
    .unwrap();
}
