//! The RFC 959 Remove Directory (`RMD`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Rmd;

#[async_trait]
impl<S> CommandHandler<S> for Rmd
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

        let storage = session.storage.clone();
        let target = session.cwd.clone();
        slog::debug!(session.logger, "removing directory"; "path" => %target);

        if storage.stat(&target).await.is_err() {
            session.restore_path();
            let msg = format!("Directory \"{}\" not found", args);
            return session.reply(Reply::new_with_string(ReplyCode::FileError, msg)).await;
        }
        if storage.unlink(&target).await.is_err() {
            session.restore_path();
            let msg = format!("Can't delete \"{}\"", args);
            return session
                .reply(Reply::new_with_string(ReplyCode::ParameterSyntaxError, msg))
                .await;
        }

        let msg = format!("\"{}\" removed", args);
        let result = session.reply(Reply::new_with_string(ReplyCode::FileActionOkay, msg)).await;
        session.restore_path();
        result
    }
}
