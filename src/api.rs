use chrono::Utc;
use lambda_http::http::StatusCode;
use lambda_http::{Body, Request, Response};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    auth::require_auth,
    error::ApiError,
    handler::Ctx,
    middleware::{parse_item, Invocation},
    model::Note,
    store::StoreError,
    util::{parse_param, query_params, resp_empty, resp_json},
};

pub const DEFAULT_LIST_LIMIT: i32 = 5;

fn ok_json<T: Serialize>(v: &T) -> Result<Response<Body>, ApiError> {
    resp_json(StatusCode::OK, v).map_err(ApiError::Encode)
}

pub(crate) async fn add_note(
    req: &Request,
    ctx: &Ctx,
    inv: &mut Invocation,
) -> Result<Response<Body>, ApiError> {
    let caller = require_auth(req)?;
    let note = Note::create(&caller, parse_item(req)?, Utc::now());

    info!(
        user_id = %note.user_id,
        title = note.title().unwrap_or_default(),
        ts = note.ts,
        "Creating note"
    );

    ctx.store.put_note(&note).await?;

    inv.metrics.add_dimension("user_id", note.user_id.as_str());
    inv.metrics.add_count("NoteCreated", 1);

    inv.trace.put_annotation("user_id", note.user_id.as_str());
    inv.trace.put_annotation("note_id", note.note_id.as_str());
    inv.trace.put_annotation("operation", "addNote");
    inv.trace.put_metadata(
        "noteDetails",
        &json!({"title": note.title(), "ts": note.ts, "expires": note.expires}),
    );

    ok_json(&note)
}

pub(crate) async fn get_note(
    raw_note_id: &str,
    ctx: &Ctx,
    inv: &mut Invocation,
) -> Result<Response<Body>, ApiError> {
    let note_id = urlencoding::decode(raw_note_id).map_err(|_| ApiError::InvalidParam {
        name: "note_id",
        value: raw_note_id.to_string(),
    })?;

    info!(note_id = %note_id, "Retrieving note by ID");

    inv.trace.put_annotation("operation", "getNoteById");
    inv.trace.put_annotation("note_id", &*note_id);
    inv.trace
        .put_metadata("requestParams", &json!({"note_id": raw_note_id}));

    let Some(note) = ctx.store.note_by_id(&note_id).await? else {
        warn!(note_id = %note_id, "Note not found");
        return Ok(resp_empty(StatusCode::NOT_FOUND));
    };

    inv.metrics.add_dimension("user_id", note.user_id.as_str());
    inv.metrics.add_count("NoteFetched", 1);

    inv.trace.put_annotation("user_id", note.user_id.as_str());
    inv.trace.put_metadata("fetchedNote", &note);

    ok_json(&note)
}

pub(crate) async fn list_notes(
    req: &Request,
    ctx: &Ctx,
    inv: &mut Invocation,
) -> Result<Response<Body>, ApiError> {
    let caller = require_auth(req)?;

    let params = query_params(req);
    let limit = parse_param::<i32>(&params, "limit")
        .map_err(|value| ApiError::InvalidParam {
            name: "limit",
            value,
        })?
        .unwrap_or(DEFAULT_LIST_LIMIT);
    if limit < 1 {
        return Err(ApiError::InvalidParam {
            name: "limit",
            value: limit.to_string(),
        });
    }
    // `start=0` has always meant "from the newest note".
    let start = parse_param::<i64>(&params, "start")
        .map_err(|value| ApiError::InvalidParam {
            name: "start",
            value,
        })?
        .filter(|ts| *ts > 0);

    info!(user_id = %caller.user_id, limit, start, "Fetching notes list");

    inv.trace.put_annotation("operation", "listNotes");
    inv.trace.put_annotation("user_id", caller.user_id.as_str());
    inv.trace.put_metadata("queryParams", &params);

    let page = ctx.store.list_notes(&caller.user_id, limit, start).await?;

    inv.trace.put_metadata("notesList", &page.items);

    inv.metrics.add_dimension("user_id", caller.user_id.as_str());
    inv.metrics.add_count("NotesListed", page.items.len() as u64);

    ok_json(&page)
}

pub(crate) async fn update_note(
    req: &Request,
    ctx: &Ctx,
    inv: &mut Invocation,
) -> Result<Response<Body>, ApiError> {
    let caller = require_auth(req)?;
    let fields = parse_item(req)?;

    let note_id = fields
        .get("note_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingField("note_id"))?
        .to_string();
    let ts = fields
        .get("ts")
        .and_then(Value::as_i64)
        .ok_or(ApiError::MissingField("ts"))?;

    let note = Note::revise(&caller, note_id, ts, fields, Utc::now());

    info!(
        user_id = %note.user_id,
        note_id = %note.note_id,
        title = note.title().unwrap_or_default(),
        ts = note.ts,
        "Updating note"
    );

    inv.trace.put_annotation("operation", "updateNote");
    inv.trace.put_annotation("user_id", note.user_id.as_str());

    match ctx.store.put_note_if_current(&note).await {
        Ok(()) => {}
        Err(StoreError::ConditionFailed) => {
            return Err(ApiError::Conflict {
                note_id: note.note_id,
                ts: note.ts,
            })
        }
        Err(e) => return Err(e.into()),
    }

    inv.metrics.add_dimension("user_id", note.user_id.as_str());
    inv.metrics.add_count("NoteUpdated", 1);

    inv.trace.put_metadata("noteAfterUpdate", &note);

    ok_json(&note)
}

pub(crate) async fn delete_note(
    req: &Request,
    raw_ts: &str,
    ctx: &Ctx,
    inv: &mut Invocation,
) -> Result<Response<Body>, ApiError> {
    let caller = require_auth(req)?;
    let ts: i64 = raw_ts.trim().parse().map_err(|_| ApiError::InvalidParam {
        name: "ts",
        value: raw_ts.to_string(),
    })?;

    info!(user_id = %caller.user_id, ts, "Deleting note");

    ctx.store.delete_note(&caller.user_id, ts).await?;

    inv.metrics.add_dimension("user_id", caller.user_id.as_str());
    inv.metrics.add_count("NoteDeleted", 1);

    inv.trace.put_annotation("operation", "deleteNote");
    inv.trace.put_annotation("user_id", caller.user_id.as_str());
    inv.trace.put_metadata("deletedNote", &json!({ "ts": ts }));

    Ok(resp_empty(StatusCode::OK))
}
