//! The `SITE` command; only `SITE FREE` is provided, reporting volume
//! usage in whole megabytes.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Site;

#[async_trait]
impl<S> CommandHandler<S> for Site
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        let args = session.cmd.args.clone();
        if args != "FREE" {
            let msg = format!("Unknown SITE command {}", args);
            return session.reply(Reply::new_with_string(ReplyCode::FileError, msg)).await;
        }

        let storage = session.storage.clone();
        match storage.getfree().await {
            Ok(usage) => {
                // clusters × sectors-per-cluster × 512 B, expressed in MB.
                let free_mb = usage.free_clusters * usage.cluster_sectors >> 11;
                let total_mb = usage.total_clusters * usage.cluster_sectors >> 11;
                let msg = format!("{} MB free of {} MB capacity", free_mb, total_mb);
                session
                    .reply(Reply::new_with_string(ReplyCode::SystemStatus, msg))
                    .await
            }
            Err(err) => {
                slog::warn!(session.logger, "getfree failed"; "error" => %err);
                session
                    .reply(Reply::new(ReplyCode::LocalError, "Can't read filesystem information"))
                    .await
            }
        }
    }
}
