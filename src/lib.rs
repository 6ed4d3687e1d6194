#![deny(missing_docs)]
//! An FTP server library for embedded-profile deployments.
//!
//! `microftp` speaks the RFC 959 subset (with the MDTM/MLSD/SIZE
//! extensions of RFC 3659) against a pluggable block-addressable
//! storage back-end, serving a fixed pool of concurrent clients with a
//! clean start/stop lifecycle. It was built for small boxes: one
//! configured credential, a bounded sector-aligned transfer buffer per
//! session, deterministic passive ports and no per-command allocation
//! churn.
//!
//! # Quick Start
//!
//! ```no_run
//! use microftp::Server;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let server = Server::with_fs(std::env::temp_dir())
//!         .control_port(2121)
//!         .clients(2);
//!     server.set_credentials("user", "secret").await;
//!     server.start().await.unwrap();
//!     // the pool now serves clients; stop() drains it again.
//!     # let _ = server;
//! }
//! ```

pub mod hooks;
pub(crate) mod path;
pub(crate) mod server;
pub mod storage;

pub use crate::server::{Server, ServerError, ServerFault, ServerStats, ServerStatus};
