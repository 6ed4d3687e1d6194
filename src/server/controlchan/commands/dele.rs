//! The RFC 959 Delete (`DELE`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Dele;

#[async_trait]
impl<S> CommandHandler<S> for Dele
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        let args = session.cmd.args.clone();
        if args.is_empty() {
            return session
                .reply(Reply::new(ReplyCode::ParameterSyntaxError, "No file name"))
                .await;
        }
        if !session.build_path(&args) {
            return session
                .reply(Reply::new(ReplyCode::CommandSyntaxError, "Command line too long"))
                .await;
        }

        let storage = session.storage.clone();
        let target = session.cwd.clone();

        if storage.stat(&target).await.is_err() {
            session.restore_path();
            let msg = format!("file {} not found", args);
            return session.reply(Reply::new_with_string(ReplyCode::FileError, msg)).await;
        }
        if storage.unlink(&target).await.is_err() {
            session.restore_path();
            let msg = format!("Can't delete {}", args);
            return session
                .reply(Reply::new_with_string(ReplyCode::TransientFileError, msg))
                .await;
        }

        let msg = format!("Deleted {}", args);
        let result = session.reply(Reply::new_with_string(ReplyCode::FileActionOkay, msg)).await;
        session.restore_path();
        result
    }
}
