//! The RFC 959 Make Directory (`MKD`) command.
//!
//! On success the working directory stays at the created directory, the
//! way the original behaves.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Mkd;

#[async_trait]
impl<S> CommandHandler<S> for Mkd
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

        if storage.stat(&target).await.is_ok() {
            session.restore_path();
            let msg = format!("\"{}\" directory already exists", args);
            return session
                .reply(Reply::new_with_string(ReplyCode::DirAlreadyExists, msg))
                .await;
        }
        if storage.mkdir(&target).await.is_err() {
            session.restore_path();
            let msg = format!("Can't create \"{}\"", args);
            return session.reply(Reply::new_with_string(ReplyCode::FileError, msg)).await;
        }

        slog::debug!(session.logger, "directory created"; "path" => %target);
        let msg = format!("\"{}\" created", args);
        session.reply(Reply::new_with_string(ReplyCode::DirCreated, msg)).await
    }
}
