//! The RFC 959 Data Port (`PORT`) command: the server will dial the
//! advertised client address for the next transfer.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{host_port, Reply, ReplyCode};
use crate::server::session::{DataMode, Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Port;

#[async_trait]
impl<S> CommandHandler<S> for Port
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        // Switching to active mode retires the passive listener and any
        // stale data socket.
        session.pasv_close();
        session.data_close();

        let args = session.cmd.args.clone();
        if args.is_empty() {
            return session
                .reply(Reply::new(ReplyCode::ParameterSyntaxError, "no parameters given"))
                .await;
        }
        match host_port::parse_port_tuple(&args) {
            None => {
                session
                    .reply(Reply::new(ReplyCode::ParameterSyntaxError, "Can't interpret parameters"))
                    .await
            }
            Some((ip, port)) => {
                session.client_ip = ip;
                session.data_port = port;
                session.data_mode = DataMode::Active;
                slog::debug!(session.logger, "active data target set"; "ip" => %ip, "port" => port);
                session
                    .reply(Reply::new(ReplyCode::CommandOkay, "PORT command successful"))
                    .await
            }
        }
    }
}
