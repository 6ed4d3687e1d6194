//! The parsed shape of one control-channel request.

/// Number of characters a verb can have.
pub(crate) const VERB_CAPACITY: usize = 4;

/// One request from the client: an uppercased verb of at most
/// [`VERB_CAPACITY`] letters, plus its raw argument string.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Command {
    pub(crate) verb: String,
    pub(crate) args: String,
}

impl Command {
    pub(crate) fn new(verb: impl Into<String>, args: impl Into<String>) -> Command {
        Command {
            verb: verb.into(),
            args: args.into(),
        }
    }
}
