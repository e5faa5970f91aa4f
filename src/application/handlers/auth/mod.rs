mod refresh_session;

pub use refresh_session::{RefreshError, RefreshSessionHandler};
