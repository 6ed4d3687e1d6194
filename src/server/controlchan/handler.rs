//! Common interface for the per-verb command handlers.

use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

/// One FTP verb's implementation.
///
/// Handlers read the parsed command from the session, talk to the
/// storage collaborator and write their own replies (a transfer verb
/// sends several). The returned [`StepResult`] reports only
/// control-channel health: storage failures become 4xx/5xx replies, not
/// errors.
#[async_trait]
pub(crate) trait CommandHandler<S>: Send + Sync
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult;
}
