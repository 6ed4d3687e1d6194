//! The RFC 959 Password (`PASS`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult, UserState};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct Pass;

#[async_trait]
impl<S> CommandHandler<S> for Pass
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        if session.user_state == UserState::Anonymous {
            return session
                .reply(Reply::new(ReplyCode::NotLoggedIn, "User not specified"))
                .await;
        }
        let pass = session.cmd.args.clone();
        let accepted = session.credentials.read().await.pass_matches(&pass);
        if accepted {
            session.user_state = UserState::LoggedIn;
            session
                .reply(Reply::new(ReplyCode::UserLoggedIn, "OK, logged in as user"))
                .await
        } else {
            session
                .reply(Reply::new(ReplyCode::NotLoggedIn, "Password not correct"))
                .await
        }
    }
}
