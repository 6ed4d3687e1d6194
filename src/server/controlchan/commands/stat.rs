//! The RFC 959 Status (`STAT`) command: reports the inactivity
//! disconnect window.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Stat;

#[async_trait]
impl<S> CommandHandler<S> for Stat
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        let minutes =
            session.opts.inactive_count as u128 * session.opts.read_timeout.as_millis() / 60_000;
        let msg = format!(
            "FTP Server status: you will be disconnected after {} minutes of inactivity",
            minutes
        );
        session
            .reply(Reply::new_with_string(ReplyCode::ClosingControlConnection, msg))
            .await
    }
}
