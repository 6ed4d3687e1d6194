//! The RFC 959 No Operation (`NOOP`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Noop;

#[async_trait]
impl<S> CommandHandler<S> for Noop
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        session.reply(Reply::new(ReplyCode::CommandOkay, "Zzz...")).await
    }
}
