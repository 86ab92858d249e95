//! The pieces every handler is wrapped in: the invocation span, JSON body
//! parsing, error-to-response mapping, and publishing the metrics and trace
//! segment collected along the way.

use lambda_http::{Body, Request, RequestExt, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{error, warn, Span};

use crate::error::ApiError;
use crate::handler::Ctx;
use crate::metrics::Metrics;
use crate::trace::Segment;
use crate::util::resp_body;

/// Telemetry collected while one request is handled.
#[derive(Debug)]
pub struct Invocation {
    pub metrics: Metrics,
    pub trace: Segment,
}

impl Invocation {
    pub fn new(ctx: &Ctx) -> Self {
        Self {
            metrics: Metrics::new(&ctx.config.metrics_namespace, &ctx.config.service_name),
            trace: Segment::default(),
        }
    }

    fn flush(&mut self) {
        self.trace.flush();
        self.metrics.flush();
    }
}

pub fn invocation_span(req: &Request, operation: &'static str) -> Span {
    let request_id = req
        .lambda_context_ref()
        .map(|c| c.request_id.clone())
        .unwrap_or_default();
    tracing::info_span!("invocation", request_id = %request_id, operation)
}

#[derive(Deserialize)]
struct ItemEnvelope {
    #[serde(rename = "Item")]
    item: Map<String, Value>,
}

/// Decode a `{"Item": {...}}` request body.
pub fn parse_item(req: &Request) -> Result<Map<String, Value>, ApiError> {
    let bytes: &[u8] = match req.body() {
        Body::Text(s) => s.as_bytes(),
        Body::Binary(b) => b.as_slice(),
        _ => &[],
    };
    if bytes.is_empty() {
        return Err(ApiError::InvalidBody("empty body".into()));
    }
    serde_json::from_slice::<ItemEnvelope>(bytes)
        .map(|e| e.item)
        .map_err(|e| ApiError::InvalidBody(e.to_string()))
}

/// Render a handler failure. Server-side details stay in the log.
pub fn error_response(err: &ApiError) -> Response<Body> {
    let status = err.status();
    let message = if status.is_server_error() {
        error!(error = %err, "request failed");
        "Internal server error".to_string()
    } else {
        warn!(error = %err, status = status.as_u16(), "request rejected");
        err.to_string()
    };
    let payload = json!({
        "error": err.code(),
        "message": message,
    });
    resp_body(status, payload.to_string())
}

/// Close out an invocation: publish telemetry, map errors to responses.
pub fn finish(mut inv: Invocation, result: Result<Response<Body>, ApiError>) -> Response<Body> {
    let resp = match result {
        Ok(resp) => resp,
        Err(e) => error_response(&e),
    };
    inv.flush();
    resp
}
