//! The RFC 959 Rename To (`RNTO`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Rnto;

#[async_trait]
impl<S> CommandHandler<S> for Rnto
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
        if session.rename_from.is_empty() {
            return session
                .reply(Reply::new(ReplyCode::BadCommandSequence, "Need RNFR before RNTO"))
                .await;
        }
        if !session.build_path(&args) {
            return session
                .reply(Reply::new(ReplyCode::CommandSyntaxError, "Command line too long"))
                .await;
        }

        let storage = session.storage.clone();
        let source = session.rename_from.clone();
        let target = session.cwd.clone();

        if storage.stat(&target).await.is_ok() {
            let msg = format!("\"{}\" already exists", args);
            let result = session.reply(Reply::new_with_string(ReplyCode::BadFileName, msg)).await;
            session.restore_path();
            return result;
        }

        slog::debug!(session.logger, "renaming"; "from" => %source, "to" => %target);
        let reply = if storage.rename(&source, &target).await.is_err() {
            Reply::new(ReplyCode::LocalError, "Rename/move failure")
        } else {
            Reply::new(ReplyCode::FileActionOkay, "File successfully renamed or moved")
        };
        let result = session.reply(reply).await;
        session.restore_path();
        result
    }
}
