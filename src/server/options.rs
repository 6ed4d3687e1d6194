//! Setup options and their defaults.

use std::time::Duration;

/// Greeting sent on the control channel when a client connects.
pub(crate) const DEFAULT_GREETING: &str = "-> CMS FTP Server, FTP Version 2020-08-20";

pub(crate) const DEFAULT_SERVER_PORT: u16 = 21;
pub(crate) const DEFAULT_DATA_PORT: u16 = 55600;
pub(crate) const DEFAULT_NBR_CLIENTS: u8 = 1;
pub(crate) const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1000);
pub(crate) const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(3000);
pub(crate) const DEFAULT_INACTIVE_CNT: u32 = 60;
pub(crate) const DEFAULT_PSV_ACCEPT_TIMEOUT: Duration = Duration::from_millis(500);
pub(crate) const DEFAULT_PSV_LISTEN_TIMEOUT: Duration = Duration::from_millis(5000);
pub(crate) const DEFAULT_STOR_RECV_TIMEOUT: Duration = Duration::from_millis(5000);
pub(crate) const DEFAULT_BUF_SIZE_MULT: usize = 32;

/// Unit the transfer buffer is sized in; the buffer is
/// `BUF_SIZE_MULT` of these.
pub(crate) const XFER_BUF_UNIT: usize = 1024;

/// DMA-friendly alignment of the transfer buffer.
pub(crate) const XFER_BUF_ALIGN: usize = 32;

/// Largest chunk moved per data-socket operation.
pub(crate) const TCP_MSS: usize = 1460;

/// Passive ports rotate through this window per slot to sidestep
/// TIME_WAIT on the previous session's port.
pub(crate) const PORT_ROTATE_WINDOW: u8 = 25;

/// Bound on the stored username and password, in bytes.
pub(crate) const CREDENTIAL_CAPACITY: usize = 32;

pub(crate) const DEFAULT_USER_NAME: &str = "user";
pub(crate) const DEFAULT_USER_PASS: &str = "pass";

/// The full configuration surface; every field has the compile-time
/// default of the original deployment profile.
#[derive(Debug, Clone)]
pub(crate) struct ServerOptions {
    pub port: u16,
    pub data_port_base: u16,
    pub clients: u8,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub inactive_count: u32,
    pub accept_timeout: Duration,
    pub listen_timeout: Duration,
    pub stor_recv_timeout: Duration,
    pub use_passive: bool,
    pub buf_size_mult: usize,
    pub greeting: String,
}

impl Default for ServerOptions {
    fn default() -> ServerOptions {
        ServerOptions {
            port: DEFAULT_SERVER_PORT,
            data_port_base: DEFAULT_DATA_PORT,
            clients: DEFAULT_NBR_CLIENTS,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            inactive_count: DEFAULT_INACTIVE_CNT,
            accept_timeout: DEFAULT_PSV_ACCEPT_TIMEOUT,
            listen_timeout: DEFAULT_PSV_LISTEN_TIMEOUT,
            stor_recv_timeout: DEFAULT_STOR_RECV_TIMEOUT,
            use_passive: true,
            buf_size_mult: DEFAULT_BUF_SIZE_MULT,
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

impl ServerOptions {
    /// Transfer buffer size in bytes: `1024 × mult`, never below one
    /// unit so the sector-alignment invariant holds.
    pub(crate) fn xfer_buf_size(&self) -> usize {
        XFER_BUF_UNIT * self.buf_size_mult.max(1)
    }
}

/// The single configured login. Truncating setters keep both fields
/// within [`CREDENTIAL_CAPACITY`] bytes.
#[derive(Debug, Clone)]
pub(crate) struct Credentials {
    user: String,
    pass: String,
}

fn truncated(value: &str) -> String {
    let mut end = value.len().min(CREDENTIAL_CAPACITY);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

impl Default for Credentials {
    fn default() -> Credentials {
        Credentials {
            user: DEFAULT_USER_NAME.to_string(),
            pass: DEFAULT_USER_PASS.to_string(),
        }
    }
}

impl Credentials {
    pub(crate) fn set_username(&mut self, name: &str) {
        self.user = truncated(name);
    }

    pub(crate) fn set_password(&mut self, pass: &str) {
        self.pass = truncated(pass);
    }

    pub(crate) fn name_matches(&self, name: &str) -> bool {
        self.user == name
    }

    pub(crate) fn pass_matches(&self, pass: &str) -> bool {
        self.pass == pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_the_deployment_profile() {
        let opts = ServerOptions::default();
        assert_eq!(opts.port, 21);
        assert_eq!(opts.data_port_base, 55600);
        assert_eq!(opts.clients, 1);
        assert_eq!(opts.xfer_buf_size(), 32 * 1024);
        assert!(opts.use_passive);
    }

    #[test]
    fn credential_setters_truncate_to_the_bound() {
        let mut creds = Credentials::default();
        assert!(creds.name_matches("user") && creds.pass_matches("pass"));

        let long = "x".repeat(CREDENTIAL_CAPACITY + 10);
        creds.set_username(&long);
        assert!(creds.name_matches(&long[..CREDENTIAL_CAPACITY]));

        creds.set_password("hunter2");
        assert!(creds.pass_matches("hunter2"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut creds = Credentials::default();
        let name = format!("{}é", "x".repeat(CREDENTIAL_CAPACITY - 1));
        creds.set_username(&name);
        assert!(creds.name_matches(&"x".repeat(CREDENTIAL_CAPACITY - 1)));
    }
}
