//! The RFC 3659 Modification Time (`MDTM`) command: with a leading
//! 14-digit timestamp it sets the file's mtime, without one it queries
//! it.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{fat_time, Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Mdtm;

#[async_trait]
impl<S> CommandHandler<S> for Mdtm
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        let args = session.cmd.args.clone();
        let (stamp, file_name) = fat_time::split_stamp_args(&args);
        let file_name = file_name.to_string();

        if file_name.is_empty() {
            return session
                .reply(Reply::new(ReplyCode::ParameterSyntaxError, "No file name"))
                .await;
        }
        if !session.build_path(&file_name) {
            return session
                .reply(Reply::new(ReplyCode::CommandSyntaxError, "Command line too long"))
                .await;
        }

        let storage = session.storage.clone();
        let target = session.cwd.clone();

        let info = match storage.stat(&target).await {
            Ok(info) => info,
            Err(_) => {
                session.restore_path();
                let msg = format!("file \"{}\" not found", args);
                return session.reply(Reply::new_with_string(ReplyCode::FileError, msg)).await;
            }
        };

        match stamp {
            None => {
                session.restore_path();
                session
                    .reply(Reply::new_with_string(
                        ReplyCode::FileStatus,
                        fat_time::format_stamp(info.stamp),
                    ))
                    .await
            }
            Some(stamp) => {
                let touched = storage.utime(&target, stamp).await;
                session.restore_path();
                match touched {
                    Ok(()) => session.reply(Reply::new(ReplyCode::CommandOkay, "Ok")).await,
                    Err(_) => {
                        session
                            .reply(Reply::new(ReplyCode::FileError, "Unable to modify time"))
                            .await
                    }
                }
            }
        }
    }
}
