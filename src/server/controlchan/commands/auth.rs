//! The RFC 2228 Authentication (`AUTH`) command. No TLS here.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Auth;

#[async_trait]
impl<S> CommandHandler<S> for Auth
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        session
            .reply(Reply::new(ReplyCode::CommandNotImplementedForParameter, "Not available"))
            .await
    }
}
