//! The RFC 959 User Name (`USER`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult, UserState};
use crate::storage::Storage;
use async_trait::async_trait;

#[derive(Debug)]
pub(crate) struct User;

#[async_trait]
impl<S> CommandHandler<S> for User
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        let name = session.cmd.args.clone();
        let accepted = session.credentials.read().await.name_matches(&name);
        if accepted {
            session.user_state = UserState::AwaitingPassword;
            session
                .reply(Reply::new(ReplyCode::NeedPassword, "OK. Password required"))
                .await
        } else {
            session
                .reply(Reply::new(ReplyCode::NotLoggedIn, "Username not known"))
                .await
        }
    }
}
