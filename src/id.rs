use uuid::Uuid;

/// `<user_id>:<uuid-v4>`; the user prefix keeps ids readable in the index.
pub fn new_note_id(user_id: &str) -> String {
    format!("{}:{}", user_id, Uuid::new_v4())
}
