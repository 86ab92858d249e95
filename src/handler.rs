use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb as ddb;
use lambda_http::{Body, Error, Request, RequestExt, Response};
use tracing::{warn, Instrument};

use crate::{
    api,
    config::{Config, StoreKind},
    error::ApiError,
    middleware::{finish, invocation_span, Invocation},
    store::{DynamoStore, MemoryStore, NoteStore},
};

/// Process-wide state: built once at cold start, shared by every invocation.
#[derive(Clone)]
pub struct Ctx {
    pub store: Arc<dyn NoteStore>,
    pub config: Arc<Config>,
}

impl Ctx {
    pub async fn new(config: Config) -> Self {
        let store: Arc<dyn NoteStore> = match config.store {
            StoreKind::Dynamodb => {
                let sdk = aws_config::load_defaults(BehaviorVersion::latest()).await;
                Arc::new(DynamoStore::new(
                    ddb::Client::new(&sdk),
                    &config.table,
                    &config.note_id_index,
                ))
            }
            StoreKind::Memory => {
                warn!("NOTES_STORE=memory: notes live only as long as this process");
                Arc::new(MemoryStore::new())
            }
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Arc<dyn NoteStore>) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    AddNote,
    UpdateNote,
    ListNotes,
    GetNote(String),
    DeleteNote(String),
    Unknown,
}

impl Route {
    /// Match on method and path. Path parameters come from API Gateway when it
    /// supplies them, otherwise from the last path segment.
    pub fn resolve(req: &Request) -> Route {
        let path = req.uri().path().trim_end_matches('/');
        let params = req.path_parameters_ref();
        let param = |name: &str, prefix: &str| {
            params
                .and_then(|p| p.first(name))
                .or_else(|| path.strip_prefix(prefix))
                .filter(|v| !v.is_empty() && !v.contains('/'))
                .map(str::to_string)
        };

        match (req.method().as_str(), path) {
            ("POST", "/note") => Route::AddNote,
            ("PATCH", "/note") => Route::UpdateNote,
            ("GET", "/notes") => Route::ListNotes,
            ("GET", p) if p.starts_with("/note/n/") => param("note_id", "/note/n/")
                .map(Route::GetNote)
                .unwrap_or(Route::Unknown),
            ("DELETE", p) if p.starts_with("/note/t/") => param("ts", "/note/t/")
                .map(Route::DeleteNote)
                .unwrap_or(Route::Unknown),
            _ => Route::Unknown,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Route::AddNote => "addNote",
            Route::UpdateNote => "updateNote",
            Route::ListNotes => "listNotes",
            Route::GetNote(_) => "getNoteById",
            Route::DeleteNote(_) => "deleteNote",
            Route::Unknown => "unknown",
        }
    }
}

pub async fn router(req: Request, ctx: &Ctx) -> Result<Response<Body>, Error> {
    let route = Route::resolve(&req);
    let span = invocation_span(&req, route.operation());

    async {
        let mut inv = Invocation::new(ctx);
        let result = match &route {
            Route::AddNote => api::add_note(&req, ctx, &mut inv).await,
            Route::UpdateNote => api::update_note(&req, ctx, &mut inv).await,
            Route::ListNotes => api::list_notes(&req, ctx, &mut inv).await,
            Route::GetNote(note_id) => api::get_note(note_id, ctx, &mut inv).await,
            Route::DeleteNote(ts) => api::delete_note(&req, ts, ctx, &mut inv).await,
            Route::Unknown => Err(ApiError::NoRoute {
                method: req.method().to_string(),
                path: req.uri().path().to_string(),
            }),
        };
        Ok(finish(inv, result))
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(method: &str, uri: &str) -> Route {
        let req = lambda_http::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::Empty)
            .unwrap();
        Route::resolve(&req)
    }

    #[test]
    fn resolves_note_routes() {
        assert_eq!(route("POST", "/note"), Route::AddNote);
        assert_eq!(route("PATCH", "/note/"), Route::UpdateNote);
        assert_eq!(route("GET", "/notes?limit=2"), Route::ListNotes);
        assert_eq!(
            route("GET", "/note/n/u1%3Aabc"),
            Route::GetNote("u1%3Aabc".into())
        );
        assert_eq!(
            route("DELETE", "/note/t/1700000000"),
            Route::DeleteNote("1700000000".into())
        );
    }

    #[test]
    fn everything_else_is_unknown() {
        assert_eq!(route("GET", "/note"), Route::Unknown);
        assert_eq!(route("PUT", "/note"), Route::Unknown);
        assert_eq!(route("GET", "/note/n/"), Route::Unknown);
        assert_eq!(route("DELETE", "/note/t/1/2"), Route::Unknown);
        assert_eq!(route("GET", "/"), Route::Unknown);
    }
}
