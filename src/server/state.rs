//! The process-wide server singleton: lifecycle status, the fault
//! bitmap and the session statistics.
//!
//! Everything here is shared between the supervisor task and the worker
//! tasks, so every field is a single word updated atomically. The fault
//! bitmap is monotonic while the server runs; it is cleared only through
//! an explicit [`clear_faults`](ServerState::clear_faults) while the
//! status is `Error`.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// The lifecycle status of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerStatus {
    /// Not started, or stopped cleanly.
    Idle = 0,
    /// `start` was called; the control listener is being set up.
    Starting = 1,
    /// Accepting clients.
    Running = 2,
    /// `stop` was called; draining workers.
    Stopping = 3,
    /// An internal fault was recorded; draining workers.
    ErrorStopping = 4,
    /// Stopped because of a fault. Inspect [`Server::faults`] and call
    /// [`Server::clear_errors`] before restarting.
    ///
    /// [`Server::faults`]: super::Server::faults
    /// [`Server::clear_errors`]: super::Server::clear_errors
    Error = 5,
}

impl ServerStatus {
    /// True for `ErrorStopping` and `Error`.
    pub fn is_error(self) -> bool {
        matches!(self, ServerStatus::ErrorStopping | ServerStatus::Error)
    }

    fn from_u8(raw: u8) -> ServerStatus {
        match raw {
            1 => ServerStatus::Starting,
            2 => ServerStatus::Running,
            3 => ServerStatus::Stopping,
            4 => ServerStatus::ErrorStopping,
            5 => ServerStatus::Error,
            _ => ServerStatus::Idle,
        }
    }
}

/// One fault kind per bit of the server's fault bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ServerFault {
    /// Binding the control listener failed.
    ListenerBind = 1 << 0,
    /// Writing to a client control socket failed.
    ClientSocketWrite = 1 << 1,
    /// Binding the passive-mode data listener failed.
    DataListenerBind = 1 << 2,
    /// Creating or binding the active-mode data socket failed.
    DataSocketBind = 1 << 3,
    /// The configured control port was zero.
    BindPortZero = 1 << 4,
    /// Workers were still busy when the drain window closed.
    NotAllTasksDisabled = 1 << 5,
}

impl ServerFault {
    /// The bit this fault occupies in [`Server::faults`].
    ///
    /// [`Server::faults`]: super::Server::faults
    pub fn bit(self) -> u32 {
        self as u32
    }
}

/// A snapshot of the session statistics.
///
/// The counters are advisory: they are incremented without interlocks,
/// so exact counts are not guaranteed under concurrent failure.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServerStats {
    /// Sessions currently being served.
    pub clients_active: u32,
    /// Size of the worker pool.
    pub clients_max: u32,
    /// Total clients handed to a worker.
    pub clients_connected: u32,
    /// Total sessions that ended.
    pub clients_disconnected: u32,
    /// Completed downloads (RETR).
    pub files_sent_ok: u32,
    /// Failed downloads.
    pub files_sent_fail: u32,
    /// Completed uploads (STOR).
    pub files_received_ok: u32,
    /// Failed uploads.
    pub files_received_fail: u32,
}

#[derive(Debug, Default)]
pub(crate) struct ServerState {
    status: AtomicU8,
    faults: AtomicU32,
    clients_active: AtomicU32,
    clients_connected: AtomicU32,
    clients_disconnected: AtomicU32,
    files_sent_ok: AtomicU32,
    files_sent_fail: AtomicU32,
    files_received_ok: AtomicU32,
    files_received_fail: AtomicU32,
}

impl ServerState {
    pub(crate) fn new() -> ServerState {
        ServerState::default()
    }

    pub(crate) fn status(&self) -> ServerStatus {
        ServerStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    pub(crate) fn set_status(&self, status: ServerStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    /// Moves to `to` iff the current status is one of `from`.
    pub(crate) fn transition(&self, from: &[ServerStatus], to: ServerStatus) -> bool {
        for &status in from {
            if self
                .status
                .compare_exchange(status as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return true;
            }
        }
        false
    }

    pub(crate) fn fault(&self, fault: ServerFault) {
        self.faults.fetch_or(fault.bit(), Ordering::SeqCst);
    }

    pub(crate) fn faults(&self) -> u32 {
        self.faults.load(Ordering::SeqCst)
    }

    /// Clears the bitmap; a no-op unless the status is `Error`.
    pub(crate) fn clear_faults(&self) {
        if self.status() == ServerStatus::Error {
            self.faults.store(0, Ordering::SeqCst);
        }
    }

    pub(crate) fn client_connected(&self) {
        self.clients_connected.fetch_add(1, Ordering::Relaxed);
        self.clients_active.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn client_disconnected(&self) {
        self.clients_disconnected.fetch_add(1, Ordering::Relaxed);
        self.clients_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn file_sent(&self, ok: bool) {
        let counter = if ok { &self.files_sent_ok } else { &self.files_sent_fail };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn file_received(&self, ok: bool) {
        let counter = if ok {
            &self.files_received_ok
        } else {
            &self.files_received_fail
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, clients_max: u32) -> ServerStats {
        ServerStats {
            clients_active: self.clients_active.load(Ordering::Relaxed),
            clients_max,
            clients_connected: self.clients_connected.load(Ordering::Relaxed),
            clients_disconnected: self.clients_disconnected.load(Ordering::Relaxed),
            files_sent_ok: self.files_sent_ok.load(Ordering::Relaxed),
            files_sent_fail: self.files_sent_fail.load(Ordering::Relaxed),
            files_received_ok: self.files_received_ok.load(Ordering::Relaxed),
            files_received_fail: self.files_received_fail.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_respects_the_dag() {
        let state = ServerState::new();
        assert_eq!(state.status(), ServerStatus::Idle);
        assert!(state.transition(&[ServerStatus::Idle, ServerStatus::Error], ServerStatus::Starting));
        assert!(!state.transition(&[ServerStatus::Idle], ServerStatus::Starting));
        state.set_status(ServerStatus::Running);
        assert!(state.transition(&[ServerStatus::Running], ServerStatus::Stopping));
    }

    #[test]
    fn faults_accumulate_and_clear_only_in_error() {
        let state = ServerState::new();
        state.fault(ServerFault::ListenerBind);
        state.fault(ServerFault::BindPortZero);
        assert_eq!(
            state.faults(),
            ServerFault::ListenerBind.bit() | ServerFault::BindPortZero.bit()
        );

        state.clear_faults();
        assert_ne!(state.faults(), 0, "must not clear outside Error");

        state.set_status(ServerStatus::Error);
        state.clear_faults();
        assert_eq!(state.faults(), 0);
    }
}
