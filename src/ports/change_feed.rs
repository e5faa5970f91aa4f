//! Live message feed handle.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::model::Message;

/// A subscription to one user's inbound messages.
///
/// Dropping the handle detaches the backing listener without stopping it;
/// call [`ChangeFeed::unsubscribe`] to release it. Providers with no push
/// capability hand out a feed that never yields.
pub struct ChangeFeed {
    receiver: mpsc::Receiver<Message>,
    listener: Option<JoinHandle<()>>,
}

impl ChangeFeed {
    /// Wraps a receiver and, when the provider runs one, its listener task.
    pub fn new(receiver: mpsc::Receiver<Message>, listener: Option<JoinHandle<()>>) -> Self {
        Self { receiver, listener }
    }

    /// Waits for the next message. `None` once the listener is gone.
    pub async fn next(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Stops the backing listener and closes the channel.
    pub fn unsubscribe(mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        self.receiver.close();
    }
}
