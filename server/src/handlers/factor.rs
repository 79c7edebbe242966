use log::{debug, error};
use novedades_misc::api::factor::{
    Factor, GetFactorRequest, GetSubFactorRequest, PutFactorRequest, PutSubFactorRequest,
    SubFactor,
};
use novedades_misc::api::user::User;
use novedades_misc::api::{ListResponse, Response};

use crate::authz::can_manage_users;
use crate::context::ServerContext;
use crate::register_handlers;

register_handlers!(put_factor, get_factor, put_subfactor, get_subfactor);

async fn put_factor(req: PutFactorRequest, op: User, sc: &ServerContext) -> Response<()> {
    if !can_manage_users(&op) {
        return Response::forbidden();
    }
    debug!("Create factor: {}", req.name);

    let result = sc.db.with_transaction(|tx| tx.create_factor(&req.name));
    match result {
        Ok(_) => Response::ok(),
        Err(e) => {
            error!("Failed to create factor: {e:#}");
            Response::database_error()
        }
    }
}

async fn get_factor(
    req: GetFactorRequest,
    _op: User,
    sc: &ServerContext,
) -> Response<ListResponse<Factor>> {
    debug!("Get factors: {req:?}");

    let result = sc.db.with_transaction(|tx| {
        let factors = tx.get_factors(req)?;
        Ok(ListResponse {
            total: factors.len() as u64,
            items: factors,
        })
    });

    match result {
        Ok(factors) => Response::with_data(factors),
        Err(e) => {
            error!("Failed to get factors: {e:#}");
            Response::database_error()
        }
    }
}

async fn put_subfactor(req: PutSubFactorRequest, op: User, sc: &ServerContext) -> Response<()> {
    if !can_manage_users(&op) {
        return Response::forbidden();
    }
    debug!("Create subfactor: {} under {}", req.name, req.factor_id);

    let result = sc.db.with_transaction(|tx| {
        if !tx.has_factor(req.factor_id)? {
            return Ok(false);
        }
        tx.create_subfactor(&req.name, req.factor_id)?;
        Ok(true)
    });
    match result {
        Ok(true) => Response::ok(),
        Ok(false) => Response::bad_request("factor does not exist"),
        Err(e) => {
            error!("Failed to create subfactor: {e:#}");
            Response::database_error()
        }
    }
}

async fn get_subfactor(
    req: GetSubFactorRequest,
    _op: User,
    sc: &ServerContext,
) -> Response<ListResponse<SubFactor>> {
    debug!("Get subfactors: {req:?}");

    let result = sc.db.with_transaction(|tx| {
        let subfactors = tx.get_subfactors(req)?;
        Ok(ListResponse {
            total: subfactors.len() as u64,
            items: subfactors,
        })
    });

    match result {
        Ok(subfactors) => Response::with_data(subfactors),
        Err(e) => {
            error!("Failed to get subfactors: {e:#}");
            Response::database_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::bootstrap_admin_user;

    use super::*;

    #[tokio::test]
    async fn test_factor_catalog() {
        let sc = ServerContext::new_test();
        let admin = bootstrap_admin_user();

        let resp = put_factor(
            PutFactorRequest {
                name: "Conducta".to_string(),
            },
            admin.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 200);

        let resp = get_factor(GetFactorRequest::default(), admin.clone(), &sc).await;
        let factors = resp.data.unwrap();
        assert_eq!(factors.total, 1);
        let factor_id = factors.items[0].id;

        let resp = put_subfactor(
            PutSubFactorRequest {
                name: "Puntualidad".to_string(),
                factor_id,
            },
            admin.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 200);

        // Subfactors must hang off an existing factor.
        let resp = put_subfactor(
            PutSubFactorRequest {
                name: "Huérfano".to_string(),
                factor_id: 999,
            },
            admin.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 400);

        let resp = get_subfactor(
            GetSubFactorRequest {
                factor_id: Some(factor_id),
                ..Default::default()
            },
            admin,
            &sc,
        )
        .await;
        assert_eq!(resp.data.unwrap().total, 1);

        // Catalog writes are admin-only; reads are for everyone.
        let func_id = sc.seed_user("mreyes", "Funcionario", "x", None, None);
        let func = sc
            .db
            .with_transaction(|tx| tx.get_user(func_id))
            .unwrap()
            .unwrap();
        let resp = put_factor(
            PutFactorRequest {
                name: "Otro".to_string(),
            },
            func.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 403);

        let resp = get_factor(GetFactorRequest::default(), func, &sc).await;
        assert_eq!(resp.code, 200);
    }
}
