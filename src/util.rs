use std::collections::HashMap;
use std::str::FromStr;

use lambda_http::http::{header, HeaderValue, StatusCode};
use lambda_http::{Body, Request, Response};
use serde::Serialize;

pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";

/// Empty-bodied response carrying the CORS header every endpoint returns.
pub fn resp_empty(status: StatusCode) -> Response<Body> {
    let mut resp = Response::new(Body::Empty);
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(ALLOW_ORIGIN, HeaderValue::from_static("*"));
    resp
}

/// Response with an already-encoded JSON body.
pub fn resp_body(status: StatusCode, json: String) -> Response<Body> {
    let mut resp = resp_empty(status);
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    *resp.body_mut() = Body::Text(json);
    resp
}

pub fn resp_json<T: Serialize>(
    status: StatusCode,
    v: &T,
) -> Result<Response<Body>, serde_json::Error> {
    Ok(resp_body(status, serde_json::to_string(v)?))
}

pub fn query_params(req: &Request) -> HashMap<String, String> {
    let qp = req.uri().query().unwrap_or("");
    url::form_urlencoded::parse(qp.as_bytes())
        .into_owned()
        .collect()
}

/// Parse an optional parameter; `Err` carries the raw text that failed to parse.
pub fn parse_param<T: FromStr>(
    params: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>, String> {
    match params.get(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| raw.clone()),
    }
}
