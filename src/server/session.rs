//! Per-connection session state and the control-channel engine.
//!
//! A session owns its control socket (framed with [`FtpCodec`]), the
//! optional passive listener and data socket, the working-directory
//! buffers and the sector-aligned transfer buffer. The engine loop is
//! strictly serial: the next command is not read until the previous
//! one's replies have been written.

use super::buffer::AlignedBuf;
use super::controlchan::{Command, Dispatcher, FtpCodec, Reply, ReplyCode};
use super::options::{Credentials, ServerOptions, TCP_MSS};
use super::state::{ServerFault, ServerState};
use super::supervisor::Slot;
use crate::hooks::ServerHooks;
use crate::path;
use crate::storage::Storage;

use futures_util::{SinkExt, StreamExt};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;

/// Why a session ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEnd {
    /// The client went quiet past the inactivity budget; end silently.
    Timeout,
    /// Transport fault, parse overflow, stop request or link loss.
    Fault,
}

/// Result of one control-channel step. `Err` terminates the session.
pub(crate) type StepResult = Result<(), SessionEnd>;

/// Login progression of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UserState {
    Anonymous,
    AwaitingPassword,
    LoggedIn,
}

/// How the data channel will be established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DataMode {
    Unset,
    Passive,
    Active,
}

pub(crate) struct Session<S>
where
    S: Storage + 'static,
{
    pub(crate) control: Framed<TcpStream, FtpCodec>,
    pub(crate) server_ip: Ipv4Addr,
    pub(crate) client_ip: Ipv4Addr,
    pub(crate) slot_index: u8,
    pub(crate) data_port: u16,
    pub(crate) data_port_offset: u8,
    pub(crate) data_mode: DataMode,
    pub(crate) data_listener: Option<tokio::net::TcpListener>,
    pub(crate) data_socket: Option<TcpStream>,
    pub(crate) user_state: UserState,
    pub(crate) cwd: String,
    pub(crate) rename_from: String,
    pub(crate) scratch: String,
    pub(crate) cmd: Command,
    pub(crate) xfer_buf: AlignedBuf,
    pub(crate) recv_buf: Vec<u8>,
    pub(crate) storage: Arc<S>,
    pub(crate) state: Arc<ServerState>,
    pub(crate) opts: Arc<ServerOptions>,
    pub(crate) hooks: Arc<dyn ServerHooks>,
    pub(crate) credentials: Arc<tokio::sync::RwLock<Credentials>>,
    pub(crate) slot: Arc<Slot>,
    pub(crate) logger: slog::Logger,
}

pub(crate) struct SessionEnv<S>
where
    S: Storage + 'static,
{
    pub(crate) storage: Arc<S>,
    pub(crate) state: Arc<ServerState>,
    pub(crate) opts: Arc<ServerOptions>,
    pub(crate) hooks: Arc<dyn ServerHooks>,
    pub(crate) credentials: Arc<tokio::sync::RwLock<Credentials>>,
}

impl<S> Session<S>
where
    S: Storage + 'static,
{
    pub(crate) fn new(
        stream: TcpStream,
        server_ip: Ipv4Addr,
        client_ip: Ipv4Addr,
        slot: Arc<Slot>,
        data_port_offset: u8,
        env: &SessionEnv<S>,
        logger: slog::Logger,
    ) -> Session<S> {
        let buf_size = env.opts.xfer_buf_size();
        Session {
            control: Framed::new(stream, FtpCodec::new()),
            server_ip,
            client_ip,
            slot_index: slot.index,
            data_port: 0,
            data_port_offset,
            data_mode: DataMode::Unset,
            data_listener: None,
            data_socket: None,
            user_state: UserState::Anonymous,
            cwd: String::from("/"),
            rename_from: String::new(),
            scratch: String::new(),
            cmd: Command::default(),
            xfer_buf: AlignedBuf::new(buf_size, super::options::XFER_BUF_ALIGN),
            recv_buf: vec![0u8; TCP_MSS],
            storage: env.storage.clone(),
            state: env.state.clone(),
            opts: env.opts.clone(),
            hooks: env.hooks.clone(),
            credentials: env.credentials.clone(),
            slot,
            logger,
        }
    }

    /// Runs the session to completion: greet, then loop
    /// read → parse → dispatch → reply until the client quits, goes
    /// quiet or the transport fails.
    pub(crate) async fn service(&mut self, dispatcher: &Dispatcher<S>) {
        slog::info!(self.logger, "client connected");

        let greeting = Reply::new_with_string(ReplyCode::ServiceReady, self.opts.greeting.clone());
        if self.reply(greeting).await.is_ok() {
            loop {
                match self.read_command().await {
                    Ok(cmd) => self.cmd = cmd,
                    Err(end) => {
                        slog::info!(self.logger, "session ending"; "cause" => ?end);
                        break;
                    }
                }
                slog::debug!(self.logger, "incoming"; "verb" => %self.cmd.verb, "args" => %self.cmd.args);

                if self.cmd.verb == "QUIT" {
                    let _ = self
                        .reply(Reply::new(ReplyCode::ClosingControlConnection, "Goodbye"))
                        .await;
                    break;
                }
                if dispatcher.dispatch(self).await.is_err() {
                    break;
                }
            }
        }

        self.pasv_close();
        self.data_close();
        slog::info!(self.logger, "client disconnected");
    }

    /// Polls the control socket once per read-timeout tick, up to the
    /// inactivity budget. Each tick also honors the supervisor's stop
    /// flag, a faulted server status and the link-layer probe.
    async fn read_command(&mut self) -> Result<Command, SessionEnd> {
        for _ in 0..self.opts.inactive_count {
            if self.interrupted() {
                return Err(SessionEnd::Fault);
            }
            match timeout(self.opts.read_timeout, self.control.next()).await {
                Err(_) => continue,
                Ok(None) => return Err(SessionEnd::Fault),
                Ok(Some(Err(err))) => {
                    slog::info!(self.logger, "control channel read failed"; "error" => %err);
                    return Err(SessionEnd::Fault);
                }
                Ok(Some(Ok(cmd))) => return Ok(cmd),
            }
        }
        slog::info!(self.logger, "closing inactive connection");
        Err(SessionEnd::Timeout)
    }

    fn interrupted(&self) -> bool {
        if self.slot.stop_requested() {
            slog::info!(self.logger, "stop requested by supervisor");
            return true;
        }
        if self.state.status().is_error() {
            slog::info!(self.logger, "server is faulted, aborting session");
            return true;
        }
        if !self.hooks.link_up() {
            slog::info!(self.logger, "link down, aborting session");
            return true;
        }
        false
    }

    /// Writes one reply within the bounded write window.
    pub(crate) async fn reply(&mut self, reply: Reply) -> StepResult {
        slog::trace!(self.logger, "sending reply"; "reply" => ?reply);
        match timeout(self.opts.write_timeout, self.control.send(reply)).await {
            Err(_) => {
                slog::warn!(self.logger, "control channel write timed out");
                Err(SessionEnd::Timeout)
            }
            Ok(Err(err)) => {
                slog::warn!(self.logger, "control channel write failed"; "error" => %err);
                self.state.fault(ServerFault::ClientSocketWrite);
                Err(SessionEnd::Fault)
            }
            Ok(Ok(())) => Ok(()),
        }
    }

    /// Builds the working path from a command argument, in place.
    /// Returns false (leaving the path untouched) when the result would
    /// not fit.
    pub(crate) fn build_path(&mut self, arg: &str) -> bool {
        path::build(&mut self.cwd, arg, &mut self.scratch)
    }

    /// Builds the rename source path from the current directory and a
    /// command argument.
    pub(crate) fn build_rename_from(&mut self, arg: &str) -> bool {
        self.rename_from.clear();
        self.rename_from.push_str(&self.cwd);
        path::build(&mut self.rename_from, arg, &mut self.scratch)
    }

    /// Drops the trailing segment the last `build_path` appended.
    pub(crate) fn restore_path(&mut self) {
        path::up_one(&mut self.cwd);
    }
}
