//! Everything that flows over the control channel: request parsing,
//! reply encoding, the command dispatch table and the per-verb handlers.

pub(crate) mod codec;
pub(crate) mod command;
pub(crate) mod commands;
pub(crate) mod dispatcher;
pub(crate) mod fat_time;
pub(crate) mod handler;
pub(crate) mod host_port;
pub(crate) mod line_parser;
pub(crate) mod reply;

pub(crate) use codec::FtpCodec;
pub(crate) use command::Command;
pub(crate) use dispatcher::Dispatcher;
pub(crate) use reply::{Reply, ReplyCode};

use thiserror::Error;

/// Errors produced while framing the control channel. Any of these ends
/// the session without a reply.
#[derive(Debug, Error)]
pub(crate) enum ControlChanError {
    /// IO failure on the control socket.
    #[error("failed to perform IO on the control channel")]
    Io(#[from] std::io::Error),
    /// The argument would overflow the parameter buffer.
    #[error("argument does not fit the parameter buffer")]
    ArgumentTooLong,
    /// A line arrived without a terminator within the line budget.
    #[error("control line exceeds the line buffer")]
    LineTooLong,
}
