//! The RFC 2389 Feature (`FEAT`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Feat;

#[async_trait]
impl<S> CommandHandler<S> for Feat
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        // Each feature line must be indented by a space.
        let lines = [
            "Extensions supported:",
            " MDTM",
            " MLSD",
            " SIZE",
            " SITE FREE",
            "End.",
        ];
        session
            .reply(Reply::new_multiline(ReplyCode::SystemStatus, lines))
            .await
    }
}
