//! The RFC 959 System (`SYST`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Syst;

#[async_trait]
impl<S> CommandHandler<S> for Syst
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        session
            .reply(Reply::new(ReplyCode::SystemType, "FTP Server, V1.0"))
            .await
    }
}
