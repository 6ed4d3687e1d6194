//! Contains the error type returned by `Server` lifecycle calls.

use super::state::ServerStatus;
use thiserror::Error;

/// Error returned by [`Server::start`](super::Server::start) and
/// [`Server::stop`](super::Server::stop).
#[derive(Debug, Error)]
pub enum ServerError {
    /// The requested lifecycle transition is not legal from the current
    /// status (e.g. `start` while already `Running`).
    #[error("cannot {action} while the server is {status:?}")]
    InvalidTransition {
        /// The operation that was attempted.
        action: &'static str,
        /// The status the server was in at the time.
        status: ServerStatus,
    },
}
