//! The RFC 959 Passive (`PASV`) command.
//
// The client will open the data connection to the address advertised in
// the 227 reply. The port rotates within a 25-port window per slot so a
// TIME_WAIT leftover from the previous session never blocks the next
// one.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{host_port, Reply, ReplyCode};
use crate::server::options::PORT_ROTATE_WINDOW;
use crate::server::session::{DataMode, Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Pasv;

#[async_trait]
impl<S> CommandHandler<S> for Pasv
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        if !session.opts.use_passive {
            session.data_mode = DataMode::Unset;
            return session
                .reply(Reply::new(ReplyCode::ServiceNotAvailable, "Passive mode not available"))
                .await;
        }

        session.data_port = session
            .opts
            .data_port_base
            .wrapping_add(session.data_port_offset as u16)
            .wrapping_add(session.slot_index as u16 * PORT_ROTATE_WINDOW as u16);

        if session.pasv_open().await.is_ok() {
            // Any data socket left over from a previous transfer is stale.
            session.data_close();
            session.data_mode = DataMode::Passive;
            slog::debug!(session.logger, "data port set"; "port" => session.data_port);
            let msg = format!(
                "Entering Passive Mode ({}).",
                host_port::pasv_tuple(session.server_ip, session.data_port)
            );
            session
                .reply(Reply::new_with_string(ReplyCode::EnteringPassiveMode, msg))
                .await
        } else {
            session.data_mode = DataMode::Unset;
            session
                .reply(Reply::new(
                    ReplyCode::CantOpenDataConnection,
                    "Can't set connection management to passive",
                ))
                .await
        }
    }
}
