//! The RFC 959 Representation Type (`TYPE`) command. ASCII is accepted
//! but transfers stay byte-transparent either way.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Type;

#[async_trait]
impl<S> CommandHandler<S> for Type
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        let reply = match session.cmd.args.as_str() {
            "A" => Reply::new(ReplyCode::CommandOkay, "TYPE is now ASCII"),
            "I" => Reply::new(ReplyCode::CommandOkay, "TYPE is now 8-bit binary"),
            _ => Reply::new(ReplyCode::CommandNotImplementedForParameter, "Unknown TYPE"),
        };
        session.reply(reply).await
    }
}
