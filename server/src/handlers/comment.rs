use chrono::Utc;
use log::{debug, error};
use novedades_misc::api::audit::AuditAction;
use novedades_misc::api::comment::{
    AcceptCommentRequest, Comment, GetCommentRequest, PutCommentRequest,
};
use novedades_misc::api::user::User;
use novedades_misc::api::{ListResponse, Response};

use crate::authz::{can_accept_comment, can_annotate, can_manage_users, can_view};
use crate::context::ServerContext;
use crate::db::types::CreateCommentParams;
use crate::register_handlers;

use super::record_audit;

register_handlers!(put_comment, get_comment, accept_comment);

/// Default acknowledgment text when the subject accepts without writing one.
const NO_OBSERVATION: &str = "Sin observaciones.";

enum PutOutcome {
    Forbidden,
    NotFound,
    BadRequest(&'static str),
    Created(Comment),
}

async fn put_comment(req: PutCommentRequest, op: User, sc: &ServerContext) -> Response<Comment> {
    debug!("Create comment for funcionario {}", req.funcionario_id);

    let result = sc.db.with_transaction(|tx| {
        let funcionario = match tx.get_user(req.funcionario_id)? {
            Some(funcionario) => funcionario,
            None => return Ok(PutOutcome::NotFound),
        };

        if !can_annotate(&op, &funcionario) {
            return Ok(PutOutcome::Forbidden);
        }

        if !tx.has_subfactor(req.subfactor_id)? {
            return Ok(PutOutcome::BadRequest("subfactor does not exist"));
        }

        let now = Utc::now().timestamp() as u64;
        let folio = tx.create_comment(CreateCommentParams {
            kind: req.kind.clone(),
            motivo: req.motivo.clone(),
            funcionario_id: funcionario.id,
            jefe_id: op.id,
            subfactor_id: req.subfactor_id,
            create_time: now,
        })?;

        record_audit(
            tx,
            Some(&op),
            AuditAction::CreateComment,
            format!(
                "Jefe {} (ID: {}) creó comentario {} (Folio: {}) para {} (ID: {}).",
                op.full_name, op.id, req.kind, folio, funcionario.full_name, funcionario.id
            ),
        )?;

        match tx.get_comment(folio)? {
            Some(comment) => Ok(PutOutcome::Created(comment)),
            None => Ok(PutOutcome::NotFound),
        }
    });

    match result {
        Ok(PutOutcome::Created(comment)) => Response::with_data(comment),
        Ok(PutOutcome::Forbidden) => Response::forbidden(),
        Ok(PutOutcome::NotFound) => Response::resource_not_found(),
        Ok(PutOutcome::BadRequest(message)) => Response::bad_request(message),
        Err(e) => {
            error!("Failed to create comment: {e:#}");
            Response::database_error()
        }
    }
}

enum GetOutcome {
    Forbidden,
    NotFound,
    List(ListResponse<Comment>),
}

async fn get_comment(
    req: GetCommentRequest,
    op: User,
    sc: &ServerContext,
) -> Response<ListResponse<Comment>> {
    debug!("Get comments: {req:?}");
    let admin = can_manage_users(&op);

    let result = sc.db.with_transaction(|tx| {
        if let Some(folio) = req.folio {
            let comment = match tx.get_comment(folio)? {
                Some(comment) => comment,
                None => return Ok(GetOutcome::NotFound),
            };
            let subject = match tx.get_user(comment.funcionario_id)? {
                Some(subject) => subject,
                None => return Ok(GetOutcome::NotFound),
            };
            if !can_view(&op, &subject, tx)? {
                return Ok(GetOutcome::Forbidden);
            }
            return Ok(GetOutcome::List(ListResponse {
                total: 1,
                items: vec![comment],
            }));
        }

        // List queries must name a funcionario unless the caller is an
        // administrator; the book of another user is view-gated.
        match req.funcionario_id {
            Some(funcionario_id) => {
                let subject = match tx.get_user(funcionario_id)? {
                    Some(subject) => subject,
                    None => return Ok(GetOutcome::NotFound),
                };
                if !can_view(&op, &subject, tx)? {
                    return Ok(GetOutcome::Forbidden);
                }
            }
            None => {
                if !admin {
                    return Ok(GetOutcome::Forbidden);
                }
            }
        }

        let total = tx.count_comments(req.clone())?;
        let comments = tx.get_comments(req)?;
        Ok(GetOutcome::List(ListResponse {
            total,
            items: comments,
        }))
    });

    match result {
        Ok(GetOutcome::List(comments)) => Response::with_data(comments),
        Ok(GetOutcome::Forbidden) => Response::forbidden(),
        Ok(GetOutcome::NotFound) => Response::resource_not_found(),
        Err(e) => {
            error!("Failed to get comments: {e:#}");
            Response::database_error()
        }
    }
}

enum AcceptOutcome {
    Forbidden,
    NotFound,
    AlreadyAccepted,
    Done,
}

async fn accept_comment(req: AcceptCommentRequest, op: User, sc: &ServerContext) -> Response<()> {
    debug!("Accept comment folio {}", req.folio);

    let result = sc.db.with_transaction(|tx| {
        let comment = match tx.get_comment(req.folio)? {
            Some(comment) => comment,
            None => return Ok(AcceptOutcome::NotFound),
        };

        // Only the subject may acknowledge; anyone else is rejected before
        // the state is even considered.
        if op.id != comment.funcionario_id {
            return Ok(AcceptOutcome::Forbidden);
        }
        if !can_accept_comment(&op, &comment) {
            return Ok(AcceptOutcome::AlreadyAccepted);
        }

        let observacion = match req.observacion {
            Some(ref observacion) if !observacion.is_empty() => observacion.as_str(),
            _ => NO_OBSERVATION,
        };

        let now = Utc::now().timestamp() as u64;
        if !tx.accept_comment(req.folio, observacion, now)? {
            // Lost the race against a concurrent acceptance.
            return Ok(AcceptOutcome::AlreadyAccepted);
        }

        record_audit(
            tx,
            Some(&op),
            AuditAction::AcceptComment,
            format!(
                "Funcionario {} (ID: {}) aceptó el comentario Folio: {}.",
                op.full_name, op.id, req.folio
            ),
        )?;

        Ok(AcceptOutcome::Done)
    });

    match result {
        Ok(AcceptOutcome::Done) => Response::ok(),
        Ok(AcceptOutcome::AlreadyAccepted) => Response::bad_request("comment already accepted"),
        Ok(AcceptOutcome::Forbidden) => Response::forbidden(),
        Ok(AcceptOutcome::NotFound) => Response::resource_not_found(),
        Err(e) => {
            error!("Failed to accept comment: {e:#}");
            Response::database_error()
        }
    }
}
