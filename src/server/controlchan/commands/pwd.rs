//! The RFC 959 Print Working Directory (`PWD`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Pwd;

#[async_trait]
impl<S> CommandHandler<S> for Pwd
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        let msg = format!("\"{}\" is your current directory", session.cwd);
        session.reply(Reply::new_with_string(ReplyCode::DirCreated, msg)).await
    }
}
