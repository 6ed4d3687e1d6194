//! The RFC 959 Rename From (`RNFR`) command: remember the source path
//! for the RNTO that should follow.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Rnfr;

#[async_trait]
impl<S> CommandHandler<S> for Rnfr
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
        if !session.build_rename_from(&args) {
            return session
                .reply(Reply::new(ReplyCode::CommandSyntaxError, "Command line too long"))
                .await;
        }

        let storage = session.storage.clone();
        let source = session.rename_from.clone();
        if storage.stat(&source).await.is_err() {
            let msg = format!("file \"{}\" not found", args);
            return session.reply(Reply::new_with_string(ReplyCode::FileError, msg)).await;
        }

        slog::debug!(session.logger, "rename source set"; "path" => %source);
        session
            .reply(Reply::new(
                ReplyCode::FileActionPending,
                "RNFR accepted - file exists, ready for destination",
            ))
            .await
    }
}
