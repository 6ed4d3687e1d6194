//! The RFC 959 Transfer Mode (`MODE`) command. Only Stream mode is
//! supported.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Mode;

#[async_trait]
impl<S> CommandHandler<S> for Mode
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        let reply = if session.cmd.args == "S" {
            Reply::new(ReplyCode::CommandOkay, "S Ok")
        } else {
            Reply::new(
                ReplyCode::CommandNotImplementedForParameter,
                "Only S(tream) is supported",
            )
        };
        session.reply(reply).await
    }
}
