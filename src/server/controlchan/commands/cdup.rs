//! The RFC 959 Change To Parent Directory (`CDUP`) command.
//!
//! This server resets to the root instead of going one level up; both
//! generations of the original behave this way on purpose.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Cdup;

#[async_trait]
impl<S> CommandHandler<S> for Cdup
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        session.cwd.clear();
        session.cwd.push('/');
        session
            .reply(Reply::new(
                ReplyCode::FileActionOkay,
                "Directory successfully changed to root.",
            ))
            .await
    }
}
