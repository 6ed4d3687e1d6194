//! Tokio codec for the control channel: decodes client lines into
//! [`Command`]s and encodes [`Reply`]s.

use super::line_parser::ARG_CAPACITY;
use super::{line_parser, Command, ControlChanError, Reply};

use bytes::BytesMut;
use std::io::Write;
use tokio_util::codec::{Decoder, Encoder};

/// A full line can hold the verb, a space and a maximal argument plus
/// CRLF; anything longer without a newline is a protocol violation.
const LINE_CAPACITY: usize = ARG_CAPACITY + 16;

pub(crate) struct FtpCodec {
    // Index of the next byte to examine for a '\n', so repeated decode
    // calls on a growing buffer stay linear.
    next_index: usize,
}

impl FtpCodec {
    pub(crate) fn new() -> FtpCodec {
        FtpCodec { next_index: 0 }
    }
}

impl Decoder for FtpCodec {
    type Item = Command;
    type Error = ControlChanError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Command>, Self::Error> {
        if let Some(newline_offset) = buf[self.next_index..].iter().position(|b| *b == b'\n') {
            let newline_index = newline_offset + self.next_index;
            let line = buf.split_to(newline_index + 1);
            self.next_index = 0;
            Ok(Some(line_parser::parse(&line)?))
        } else if buf.len() > LINE_CAPACITY {
            Err(ControlChanError::LineTooLong)
        } else {
            self.next_index = buf.len();
            Ok(None)
        }
    }
}

impl Encoder<Reply> for FtpCodec {
    type Error = ControlChanError;

    fn encode(&mut self, reply: Reply, buf: &mut BytesMut) -> Result<(), Self::Error> {
        let mut buffer = vec![];
        match reply {
            Reply::CodeAndMsg { code, msg } => {
                if msg.is_empty() {
                    write!(buffer, "{}\r\n", code as u32)?;
                } else {
                    write!(buffer, "{} {}\r\n", code as u32, msg)?;
                }
            }
            Reply::MultiLine { code, lines } => {
                // Continuation lines are supplied pre-indented and must
                // not start with a digit, or clients would take them for
                // the terminating line.
                match lines.split_last() {
                    None => write!(buffer, "{}\r\n", code as u32)?,
                    Some((last_line, rest)) if rest.is_empty() => {
                        write!(buffer, "{} {}\r\n", code as u32, last_line)?;
                    }
                    Some((last_line, rest)) => {
                        write!(
                            buffer,
                            "{}-{}\r\n{} {}\r\n",
                            code as u32,
                            rest.join("\r\n"),
                            code as u32,
                            last_line
                        )?;
                    }
                }
            }
        }
        buf.extend(&buffer);
        Ok(())
    }
}
