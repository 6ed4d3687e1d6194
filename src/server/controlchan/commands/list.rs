//! The RFC 959 List (`LIST`) and Name List (`NLST`) commands, served by
//! one handler: `LIST` streams EPLF-like lines, `NLST` bare names.
//! Arguments are ignored; the listing is always of the working
//! directory.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

#[derive(Debug)]
pub(crate) struct List;

#[async_trait]
impl<S> CommandHandler<S> for List
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

        let eplf = session.cmd.verb == "LIST";
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

            let line = if !eplf {
                format!("{}\r\n", entry.name)
            } else if entry.is_dir {
                format!("+/,\t{}\r\n", entry.name)
            } else {
                format!("+r,s{},\t{}\r\n", entry.size, entry.name)
            };

            let Some(socket) = session.data_socket.as_mut() else {
                break;
            };
            if let Err(err) = socket.write_all(line.as_bytes()).await {
                slog::warn!(session.logger, "listing write failed"; "error" => %err);
                break;
            }
        }

        session.data_close();
        session
            .reply(Reply::new(ReplyCode::ClosingDataConnection, "Directory send OK."))
            .await
    }
}
