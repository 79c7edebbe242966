use std::collections::HashMap;

use actix_web::HttpRequest;
use anyhow::{Context, Result};
use log::debug;
use novedades_misc::api::Request;
use url::form_urlencoded;

#[macro_export]
macro_rules! parse_request {
    ($req:expr) => {
        match $crate::request::parse_request_raw(&$req) {
            Ok(parsed) => parsed,
            Err(e) => {
                return novedades_misc::api::Response::bad_request(format!("bad request: {e:#}"))
            }
        }
    };
}

pub fn parse_request_raw<T>(req: &HttpRequest) -> Result<T>
where
    T: Request,
{
    let query_string = req.query_string();

    let fields: HashMap<String, String> = form_urlencoded::parse(query_string.as_bytes())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    debug!(
        "- {} {}, fields: {:?}, peer: {:?}",
        req.method(),
        req.path(),
        fields,
        req.peer_addr(),
    );

    let mut parsed = T::default();
    parsed.complete(fields).context("parse query")?;

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use actix_web::test::TestRequest;
    use novedades_misc::api::comment::GetCommentRequest;
    use novedades_misc::api::user::{GetUserRequest, PutUserRequest};
    use novedades_misc::api::{QueryRequest, Response};

    use super::*;

    fn test_handler<T>(req: HttpRequest, expect_request: Option<T>) -> Response<()>
    where
        T: Request + PartialEq + Debug,
    {
        let parsed: T = parse_request!(req);
        assert_eq!(parsed, expect_request.unwrap());
        Response::ok()
    }

    fn test_request<T>(query: Vec<(&str, &str)>, expect_request: Option<T>)
    where
        T: Request + PartialEq + Debug,
    {
        let mut url = String::from("http://127.0.0.1/api");
        if !query.is_empty() {
            url.push('?');
            for (i, (key, value)) in query.iter().enumerate() {
                if i > 0 {
                    url.push('&');
                }
                url.push_str(key);
                url.push('=');
                url.push_str(value);
            }
        }

        let req = TestRequest::with_uri(&url);

        let expect_err = expect_request.is_none();
        let resp = test_handler(req.to_http_request(), expect_request);

        if expect_err {
            assert_eq!(resp.code, 400);
            return;
        }

        assert_eq!(resp.code, 200);
    }

    #[test]
    fn test_parse_request() {
        test_request(
            vec![("supervised_by", "3"), ("role", "Funcionario"), ("limit", "20")],
            Some(GetUserRequest {
                supervised_by: Some(3),
                role: Some("Funcionario".to_string()),
                query: QueryRequest {
                    limit: Some(20),
                    ..Default::default()
                },
                ..Default::default()
            }),
        );

        test_request(
            vec![("id", "123")],
            Some(GetUserRequest {
                id: Some(123),
                ..Default::default()
            }),
        );

        test_request(
            vec![("funcionario_id", "5"), ("estado", "Pendiente")],
            Some(GetCommentRequest {
                funcionario_id: Some(5),
                estado: Some("Pendiente".to_string()),
                query: QueryRequest {
                    limit: Some(10),
                    ..Default::default()
                },
                ..Default::default()
            }),
        );

        // Missing mandatory fields fail the parse.
        test_request(vec![("name", "someone")], None::<PutUserRequest>);
        test_request(vec![("supervised_by", "x")], None::<GetUserRequest>);
    }
}
