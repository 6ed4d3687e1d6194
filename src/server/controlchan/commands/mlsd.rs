//! The RFC 3659 machine-parseable listing (`MLSD`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{fat_time, Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

#[derive(Debug)]
pub(crate) struct Mlsd;

#[async_trait]
impl<S> CommandHandler<S> for Mlsd
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        let storage = session.storage.clone();
        let mut dir = match storage.opendir(&session.cwd).await {
            Ok(dir) => dir,
            Err(_) => {
                let msg = format!("Can't open directory {}", session.cmd.args);
                return session.reply(Reply::new_with_string(ReplyCode::FileError, msg)).await;
            }
        };

        if session.data_open().await.is_err() {
            return session
                .reply(Reply::new(ReplyCode::CantOpenDataConnection, "Can't create connection"))
                .await;
        }
        session
            .reply(Reply::new(ReplyCode::FileStatusOkay, "Accepted data connection"))
            .await?;

        let mut matches = 0u32;
        loop {
            let entry = match storage.readdir(&mut dir).await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => {
                    slog::warn!(session.logger, "readdir failed"; "error" => %err);
                    break;
                }
            };
            if entry.name.starts_with('.') {
                continue;
            }

            let kind = if entry.is_dir { "dir" } else { "file" };
            let line = if entry.stamp.is_unset() {
                format!("Type={};Size={}; {}\r\n", kind, entry.size, entry.name)
            } else {
                format!(
                    "Type={};Size={};Modify={}; {}\r\n",
                    kind,
                    entry.size,
                    fat_time::format_stamp(entry.stamp),
                    entry.name
                )
            };

            let Some(socket) = session.data_socket.as_mut() else {
                break;
            };
            if let Err(err) = socket.write_all(line.as_bytes()).await {
                slog::warn!(session.logger, "listing write failed"; "error" => %err);
                break;
            }
            matches += 1;
        }

        session.data_close();
        let msg = format!("Options: -a -l, {} matches total", matches);
        session
            .reply(Reply::new_with_string(ReplyCode::ClosingDataConnection, msg))
            .await
    }
}
