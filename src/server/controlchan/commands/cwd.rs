//! The RFC 959 Change Working Directory (`CWD`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Cwd;

#[async_trait]
impl<S> CommandHandler<S> for Cwd
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        let args = session.cmd.args.clone();
        if args.is_empty() {
            return session
                .reply(Reply::new(ReplyCode::ParameterSyntaxError, "No directory name"))
                .await;
        }
        if !session.build_path(&args) {
            return session
                .reply(Reply::new(ReplyCode::CommandSyntaxError, "Command line too long"))
                .await;
        }

        // The root is always valid without consulting the back-end.
        if session.cwd != "/" {
            let storage = session.storage.clone();
            let target = session.cwd.clone();
            if storage.stat(&target).await.is_err() {
                let msg = format!("Failed to change directory to {}", session.cwd);
                return session.reply(Reply::new_with_string(ReplyCode::FileError, msg)).await;
            }
        }
        session
            .reply(Reply::new(ReplyCode::FileActionOkay, "Directory successfully changed."))
            .await
    }
}
