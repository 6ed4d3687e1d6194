//! Maps command verbs to handlers and enforces the login gate.

use super::commands;
use super::handler::CommandHandler;
use super::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult, UserState};
use crate::storage::Storage;

/// Verbs that may be issued before logging in. QUIT never reaches the
/// dispatcher (the session engine answers it inline).
const UNGATED_VERBS: &[&str] = &["USER", "PASS", "AUTH", "FEAT", "SYST"];

/// The ordered command table. Lookup is a linear scan with exact
/// uppercase match; the parser already uppercased the verb.
pub(crate) struct Dispatcher<S>
where
    S: Storage + 'static,
{
    entries: Vec<(&'static str, Box<dyn CommandHandler<S>>)>,
}

impl<S> Dispatcher<S>
where
    S: Storage + 'static,
{
    pub(crate) fn new() -> Dispatcher<S> {
        let entries: Vec<(&'static str, Box<dyn CommandHandler<S>>)> = vec![
            ("PWD", Box::new(commands::Pwd)),
            ("CWD", Box::new(commands::Cwd)),
            ("CDUP", Box::new(commands::Cdup)),
            ("MODE", Box::new(commands::Mode)),
            ("STRU", Box::new(commands::Stru)),
            ("TYPE", Box::new(commands::Type)),
            ("PASV", Box::new(commands::Pasv)),
            ("PORT", Box::new(commands::Port)),
            ("NLST", Box::new(commands::List)),
            ("LIST", Box::new(commands::List)),
            ("MLSD", Box::new(commands::Mlsd)),
            ("DELE", Box::new(commands::Dele)),
            ("NOOP", Box::new(commands::Noop)),
            ("RETR", Box::new(commands::Retr)),
            ("STOR", Box::new(commands::Stor)),
            ("MKD", Box::new(commands::Mkd)),
            ("RMD", Box::new(commands::Rmd)),
            ("RNFR", Box::new(commands::Rnfr)),
            ("RNTO", Box::new(commands::Rnto)),
            ("FEAT", Box::new(commands::Feat)),
            ("MDTM", Box::new(commands::Mdtm)),
            ("SIZE", Box::new(commands::Size)),
            ("SITE", Box::new(commands::Site)),
            ("STAT", Box::new(commands::Stat)),
            ("SYST", Box::new(commands::Syst)),
            ("AUTH", Box::new(commands::Auth)),
            ("USER", Box::new(commands::User)),
            ("PASS", Box::new(commands::Pass)),
        ];
        Dispatcher { entries }
    }

    /// Looks up the session's current verb and runs its handler between
    /// the host's `cmd_begin`/`cmd_end` hooks.
    ///
    /// Before login, every gated verb is a silent no-op: the handler is
    /// not invoked and nothing is sent. Unknown verbs always get `500`.
    pub(crate) async fn dispatch(&self, session: &mut Session<S>) -> StepResult {
        let verb = session.cmd.verb.clone();

        let handler = match self.entries.iter().find(|(name, _)| *name == verb) {
            Some((_, handler)) => handler,
            None => {
                return session
                    .reply(Reply::new(ReplyCode::CommandSyntaxError, "Unknown command"))
                    .await;
            }
        };

        if session.user_state != UserState::LoggedIn && !UNGATED_VERBS.contains(&verb.as_str()) {
            slog::debug!(session.logger, "gated verb before login, staying silent"; "verb" => %verb);
            return Ok(());
        }

        let hooks = session.hooks.clone();
        hooks.cmd_begin(&verb);
        let result = handler.handle(session).await;
        hooks.cmd_end(&verb);
        result
    }
}
