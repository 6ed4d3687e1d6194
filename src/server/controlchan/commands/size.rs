//! The RFC 3659 Size (`SIZE`) command. Directories get 550, matching
//! the original.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Size;

#[async_trait]
impl<S> CommandHandler<S> for Size
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

        let reply = match storage.stat(&target).await {
            Ok(info) if !info.is_dir => {
                Reply::new_with_string(ReplyCode::FileStatus, info.size.to_string())
            }
            _ => Reply::new(ReplyCode::FileError, "No such file"),
        };
        let result = session.reply(reply).await;
        session.restore_path();
        result
    }
}
