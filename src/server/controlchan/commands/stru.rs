//! The RFC 959 File Structure (`STRU`) command. Only File structure is
//! supported.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Stru;

#[async_trait]
impl<S> CommandHandler<S> for Stru
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        let reply = if session.cmd.args == "F" {
            Reply::new(ReplyCode::CommandOkay, "F Ok")
        } else {
            Reply::new(
                ReplyCode::CommandNotImplementedForParameter,
                "Only F(ile) is supported",
            )
        };
        session.reply(reply).await
    }
}
