//! Data-channel management: passive listener lifecycle and the
//! per-transfer data socket, in both passive and active mode.
//!
//! The listener survives across transfers within a session; the data
//! socket lives for exactly one transfer. Closing the data socket
//! always resets the mode, so every transfer needs a fresh PASV or
//! PORT.

use super::session::{DataMode, Session};
use super::state::ServerFault;
use crate::storage::Storage;

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpSocket};
use tokio::time::timeout;

impl<S> Session<S>
where
    S: Storage + 'static,
{
    /// Ensures the passive listener exists on the session's data port.
    /// Idempotent; a bind failure is recorded in the server fault
    /// bitmap (it means the port window is broken, not just this
    /// client).
    pub(crate) async fn pasv_open(&mut self) -> Result<(), ()> {
        if self.data_listener.is_some() {
            return Ok(());
        }
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.data_port));
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                self.data_listener = Some(listener);
                Ok(())
            }
            Err(err) => {
                slog::error!(self.logger, "cannot listen on data port";
                    "port" => self.data_port, "error" => %err);
                self.state.fault(ServerFault::DataListenerBind);
                Err(())
            }
        }
    }

    /// Closes and releases the passive listener.
    pub(crate) fn pasv_close(&mut self) {
        self.data_mode = DataMode::Unset;
        self.data_listener = None;
    }

    /// Produces the per-transfer data socket: accepts the client's
    /// connection in passive mode, dials out in active mode.
    pub(crate) async fn data_open(&mut self) -> Result<(), ()> {
        match self.data_mode {
            DataMode::Unset => {
                slog::debug!(self.logger, "no data connection mode negotiated");
                Err(())
            }
            DataMode::Passive => {
                let listener = self.data_listener.as_ref().ok_or(())?;
                match timeout(self.opts.accept_timeout, listener.accept()).await {
                    Ok(Ok((socket, peer))) => {
                        slog::debug!(self.logger, "accepted data connection"; "peer" => %peer);
                        self.data_socket = Some(socket);
                        Ok(())
                    }
                    Ok(Err(err)) => {
                        slog::warn!(self.logger, "data accept failed"; "error" => %err);
                        Err(())
                    }
                    Err(_) => {
                        slog::warn!(self.logger, "client never opened the data connection");
                        Err(())
                    }
                }
            }
            DataMode::Active => {
                let socket = match TcpSocket::new_v4() {
                    Ok(socket) => socket,
                    Err(err) => {
                        slog::warn!(self.logger, "data socket creation failed"; "error" => %err);
                        self.state.fault(ServerFault::DataSocketBind);
                        return Err(());
                    }
                };
                if let Err(err) = socket.bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))) {
                    slog::warn!(self.logger, "data socket bind failed"; "error" => %err);
                    self.state.fault(ServerFault::DataSocketBind);
                    return Err(());
                }
                let peer = SocketAddr::V4(SocketAddrV4::new(self.client_ip, self.data_port));
                match timeout(self.opts.write_timeout, socket.connect(peer)).await {
                    Ok(Ok(stream)) => {
                        self.data_socket = Some(stream);
                        Ok(())
                    }
                    Ok(Err(err)) => {
                        slog::warn!(self.logger, "data connect failed"; "peer" => %peer, "error" => %err);
                        Err(())
                    }
                    Err(_) => {
                        slog::warn!(self.logger, "data connect timed out"; "peer" => %peer);
                        Err(())
                    }
                }
            }
        }
    }

    /// Closes the data socket (if any) and resets the mode.
    pub(crate) fn data_close(&mut self) {
        self.data_mode = DataMode::Unset;
        self.data_socket = None;
    }

    /// Receives one segment from the data socket into the session's
    /// receive buffer. Returns the segment length, zero at end of
    /// stream; an elapsed `window` maps to `TimedOut`.
    pub(crate) async fn data_recv(&mut self, window: Duration) -> io::Result<usize> {
        let Session {
            data_socket, recv_buf, ..
        } = self;
        let socket = data_socket
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no data connection"))?;
        match timeout(window, socket.read(&mut recv_buf[..])).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "data receive timed out")),
        }
    }
}
