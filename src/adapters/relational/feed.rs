//! Poll-based message feed for the relational provider.
//!
//! The hosted store has no push channel on its REST surface, so the feed is
//! a server-filtered poll loop keyed by recipient. Filtering happens in the
//! store's query, not client-side; only the subscribed user's rows travel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::warn;

use crate::ports::ChangeFeed;

use super::client::RestClient;
use super::rows::MessageRow;

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const FEED_BUFFER: usize = 32;

/// Spawns the poll loop and hands back its feed. The loop runs until the
/// feed is unsubscribed or its receiver is dropped and collected.
pub(super) fn subscribe(client: Arc<RestClient>, user_id: String) -> ChangeFeed {
    let (tx, rx) = mpsc::channel(FEED_BUFFER);
    let listener = tokio::spawn(async move {
        // Only messages created after subscription time are delivered.
        let mut cursor: DateTime<Utc> = Utc::now();
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            let query = [
                ("select", "*".to_string()),
                ("recipient_id", format!("eq.{user_id}")),
                ("created_at", format!("gt.{}", cursor.to_rfc3339())),
                ("order", "created_at.asc".to_string()),
            ];
            match client.select::<MessageRow>("messages", &query).await {
                Ok(rows) => {
                    for row in rows {
                        cursor = cursor.max(row.created_at);
                        if tx.send(row.into_message()).await.is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    // Transient poll failures are logged and retried on the
                    // next tick; the feed itself stays up.
                    warn!(user_id = %user_id, error = %err, "message feed poll failed");
                }
            }
        }
    });
    ChangeFeed::new(rx, Some(listener))
}
