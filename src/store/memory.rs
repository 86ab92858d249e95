use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{NoteStore, StoreError};
use crate::model::{Note, NotePage, PageKey};

/// In-process notes table, ordered by `(user_id, ts)` like the real one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    notes: RwLock<BTreeMap<(String, i64), Note>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }
}

fn key(user_id: &str, ts: i64) -> (String, i64) {
    (user_id.to_string(), ts)
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn put_note(&self, note: &Note) -> Result<(), StoreError> {
        self.notes
            .write()
            .await
            .insert(key(&note.user_id, note.ts), note.clone());
        Ok(())
    }

    async fn put_note_if_current(&self, note: &Note) -> Result<(), StoreError> {
        let mut notes = self.notes.write().await;
        match notes.get_mut(&key(&note.user_id, note.ts)) {
            Some(stored) if stored.ts == note.ts && stored.note_id == note.note_id => {
                *stored = note.clone();
                Ok(())
            }
            _ => Err(StoreError::ConditionFailed),
        }
    }

    async fn note_by_id(&self, note_id: &str) -> Result<Option<Note>, StoreError> {
        Ok(self
            .notes
            .read()
            .await
            .values()
            .find(|n| n.note_id == note_id)
            .cloned())
    }

    async fn list_notes(
        &self,
        user_id: &str,
        limit: i32,
        start: Option<i64>,
    ) -> Result<NotePage, StoreError> {
        let notes = self.notes.read().await;
        let mut matching = notes
            .range(key(user_id, i64::MIN)..=key(user_id, i64::MAX))
            .rev()
            .map(|(_, n)| n)
            .filter(|n| start.map_or(true, |s| n.ts < s));

        let limit = usize::try_from(limit).unwrap_or(0);
        let items: Vec<Note> = matching.by_ref().take(limit).cloned().collect();
        // Only hand out a cursor when there is something behind it.
        let last_evaluated_key = match matching.next() {
            Some(_) => items.last().map(|n| PageKey {
                user_id: n.user_id.clone(),
                ts: n.ts,
            }),
            None => None,
        };
        let count = i32::try_from(items.len()).unwrap_or(i32::MAX);
        Ok(NotePage {
            items,
            count,
            scanned_count: count,
            last_evaluated_key,
        })
    }

    async fn delete_note(&self, user_id: &str, ts: i64) -> Result<(), StoreError> {
        self.notes.write().await.remove(&key(user_id, ts));
        Ok(())
    }
}
