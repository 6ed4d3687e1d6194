//! The server core: supervisor, worker pool, per-session engine and the
//! control/data channel plumbing.

pub(crate) mod buffer;
pub(crate) mod controlchan;
pub(crate) mod datachan;
pub(crate) mod error;
pub(crate) mod options;
pub(crate) mod session;
pub(crate) mod state;
pub(crate) mod supervisor;

pub use error::ServerError;
pub use state::{ServerFault, ServerStats, ServerStatus};
pub use supervisor::Server;
