//! Direct message entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A direct message between two users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
    /// Read-state lifecycle flag, flipped by `MessageStore::mark_read`.
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for message creation. Messages start out unread.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
}
