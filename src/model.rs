use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::Caller;
use crate::id::new_note_id;

/// Notes are dropped by the table's TTL this long after their last write.
pub const NOTE_TTL_DAYS: i64 = 90;

/// Attributes the handlers own; caller-supplied values for them are discarded.
const RESERVED: [&str; 5] = ["user_id", "user_name", "note_id", "ts", "expires"];

/// A stored note. `(user_id, ts)` is the table key; everything the caller
/// sent beyond the reserved attributes rides along in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub user_id: String,
    pub ts: i64,
    pub note_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub expires: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Note {
    /// A brand new note owned by `caller`, versioned at `now`.
    pub fn create(caller: &Caller, fields: Map<String, Value>, now: DateTime<Utc>) -> Note {
        Note {
            user_id: caller.user_id.clone(),
            ts: now.timestamp(),
            note_id: new_note_id(&caller.user_id),
            user_name: caller.user_name.clone(),
            expires: expiry(now),
            fields: strip_reserved(fields),
        }
    }

    /// The full replacement for an existing note. `ts` is the version the
    /// client last read and is written back unchanged.
    pub fn revise(
        caller: &Caller,
        note_id: String,
        ts: i64,
        fields: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Note {
        Note {
            user_id: caller.user_id.clone(),
            ts,
            note_id,
            user_name: caller.user_name.clone(),
            expires: expiry(now),
            fields: strip_reserved(fields),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }
}

fn expiry(now: DateTime<Utc>) -> i64 {
    (now + Duration::days(NOTE_TTL_DAYS)).timestamp()
}

fn strip_reserved(mut fields: Map<String, Value>) -> Map<String, Value> {
    for key in RESERVED {
        fields.remove(key);
    }
    fields
}

/// Table key of a note, as handed back for pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageKey {
    pub user_id: String,
    pub ts: i64,
}

/// One page of a user's notes, newest first.
///
/// This mirrors DynamoDB's query output on purpose and is part of the API:
/// clients page forward by sending `LastEvaluatedKey.ts` back as `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotePage {
    pub items: Vec<Note>,
    pub count: i32,
    pub scanned_count: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<PageKey>,
}
