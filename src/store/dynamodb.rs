use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb as ddb;
use aws_sdk_dynamodb::error::ProvideErrorMetadata; // for .code()
use ddb::types::AttributeValue as Av;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, from_items, to_item};
use tracing::debug;

use super::{NoteStore, StoreError};
use crate::model::{Note, NotePage, PageKey};

fn map_ddb_err<E>(op: &'static str) -> impl FnOnce(E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |e| StoreError::Dynamo {
        op,
        source: Box::new(e),
    }
}

/// Notes table keyed by `user_id` (hash) and `ts` (range), with a global
/// secondary index on `note_id`.
#[derive(Clone)]
pub struct DynamoStore {
    ddb: ddb::Client,
    table: String,
    note_id_index: String,
}

impl DynamoStore {
    pub fn new(ddb: ddb::Client, table: impl Into<String>, note_id_index: impl Into<String>) -> Self {
        Self {
            ddb,
            table: table.into(),
            note_id_index: note_id_index.into(),
        }
    }
}

fn note_item(note: &Note) -> Result<HashMap<String, Av>, StoreError> {
    Ok(to_item(note)?)
}

#[async_trait]
impl NoteStore for DynamoStore {
    async fn put_note(&self, note: &Note) -> Result<(), StoreError> {
        self.ddb
            .put_item()
            .table_name(&self.table)
            .set_item(Some(note_item(note)?))
            .send()
            .await
            .map_err(map_ddb_err("put_item"))?;
        Ok(())
    }

    async fn put_note_if_current(&self, note: &Note) -> Result<(), StoreError> {
        let r = self
            .ddb
            .put_item()
            .table_name(&self.table)
            .set_item(Some(note_item(note)?))
            .condition_expression("#t = :t AND #n = :n")
            .expression_attribute_names("#t", "ts")
            .expression_attribute_names("#n", "note_id")
            .expression_attribute_values(":t", Av::N(note.ts.to_string()))
            .expression_attribute_values(":n", Av::S(note.note_id.clone()))
            .send()
            .await;

        match r {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.code() == Some("ConditionalCheckFailedException") {
                    debug!(note_id = %note.note_id, ts = note.ts, "stale note version");
                    return Err(StoreError::ConditionFailed);
                }
                Err(map_ddb_err("put_item")(e))
            }
        }
    }

    async fn note_by_id(&self, note_id: &str) -> Result<Option<Note>, StoreError> {
        let r = self
            .ddb
            .query()
            .table_name(&self.table)
            .index_name(&self.note_id_index)
            .key_condition_expression("note_id = :note_id")
            .expression_attribute_values(":note_id", Av::S(note_id.to_string()))
            .limit(1)
            .send()
            .await
            .map_err(map_ddb_err("query"))?;

        match r.items.unwrap_or_default().into_iter().next() {
            Some(item) => Ok(Some(from_item(item)?)),
            None => Ok(None),
        }
    }

    async fn list_notes(
        &self,
        user_id: &str,
        limit: i32,
        start: Option<i64>,
    ) -> Result<NotePage, StoreError> {
        let mut query = self
            .ddb
            .query()
            .table_name(&self.table)
            .key_condition_expression("user_id = :uid")
            .expression_attribute_values(":uid", Av::S(user_id.to_string()))
            .limit(limit)
            .scan_index_forward(false); // newest first

        if let Some(ts) = start {
            query = query
                .exclusive_start_key("user_id", Av::S(user_id.to_string()))
                .exclusive_start_key("ts", Av::N(ts.to_string()));
        }

        let r = query.send().await.map_err(map_ddb_err("query"))?;

        let items: Vec<Note> = from_items(r.items.unwrap_or_default())?;
        let last_evaluated_key: Option<PageKey> = match r.last_evaluated_key {
            Some(key) => Some(from_item(key)?),
            None => None,
        };
        Ok(NotePage {
            items,
            count: r.count,
            scanned_count: r.scanned_count,
            last_evaluated_key,
        })
    }

    async fn delete_note(&self, user_id: &str, ts: i64) -> Result<(), StoreError> {
        self.ddb
            .delete_item()
            .table_name(&self.table)
            .key("user_id", Av::S(user_id.to_string()))
            .key("ts", Av::N(ts.to_string()))
            .send()
            .await
            .map_err(map_ddb_err("delete_item"))?;
        Ok(())
    }
}
