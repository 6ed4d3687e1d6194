//! Parse one control-channel line into a [`Command`].

use super::command::{Command, VERB_CAPACITY};
use super::ControlChanError;
use crate::path::PATH_CAPACITY;

/// Arguments must leave room for a terminator in the parameter buffer.
pub(crate) const ARG_CAPACITY: usize = PATH_CAPACITY;

/// Parse the given line into a [`Command`].
///
/// The verb is the leading run of alphabetic bytes, uppercased and
/// capped at four characters. Arguments exist only when the byte right
/// after the verb is a space; leading spaces are skipped and the rest
/// runs up to the first CR or LF. An argument that would overflow the
/// parameter buffer is an error (and ends the session).
pub(crate) fn parse(line: &[u8]) -> Result<Command, ControlChanError> {
    let mut idx = 0;
    let mut verb = String::with_capacity(VERB_CAPACITY);
    while idx < line.len() && idx < VERB_CAPACITY {
        let byte = line[idx];
        if !byte.is_ascii_alphabetic() {
            break;
        }
        verb.push(byte.to_ascii_uppercase() as char);
        idx += 1;
    }

    if line.get(idx) != Some(&b' ') {
        return Ok(Command::new(verb, ""));
    }
    while line.get(idx) == Some(&b' ') {
        idx += 1;
    }

    let start = idx;
    while idx < line.len() && line[idx] != b'\r' && line[idx] != b'\n' {
        idx += 1;
    }
    let raw = &line[start..idx];
    if raw.len() + 1 >= ARG_CAPACITY {
        return Err(ControlChanError::ArgumentTooLong);
    }

    Ok(Command::new(verb, String::from_utf8_lossy(raw)))
}
