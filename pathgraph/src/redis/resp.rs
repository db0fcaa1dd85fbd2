// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! RESP2 framing
//!
//! Requests are arrays of bulk strings (`*N` then `$len` payload pairs);
//! bare inline commands are accepted as a convenience for line clients.
//! Replies cover the tagged types in [`Reply`]: simple string `+`, error
//! `-`, integer `:`, bulk `$`, array `*`, and the `$-1` null.

use std::io::{self, BufRead, Write};

use crate::error::{GraphError, Result};
use crate::redis::protocol::Reply;

fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let n = reader.read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(
        line.trim_end_matches(|c| c == '\r' || c == '\n').to_string(),
    ))
}

fn unexpected_eof() -> GraphError {
    GraphError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "connection closed mid-command",
    ))
}

/// Read one command as a list of argument strings.
/// Returns `None` on a cleanly closed connection.
pub fn read_command<R: BufRead>(reader: &mut R) -> Result<Option<Vec<String>>> {
    let first = match read_line(reader)? {
        Some(line) => line,
        None => return Ok(None),
    };

    let Some(count) = first.strip_prefix('*') else {
        // Inline command.
        return Ok(Some(
            first.split_whitespace().map(str::to_string).collect(),
        ));
    };

    let count: usize = count
        .parse()
        .map_err(|_| GraphError::BadArgument(format!("invalid array header: {first}")))?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let header = read_line(reader)?.ok_or_else(unexpected_eof)?;
        let len: usize = header
            .strip_prefix('$')
            .and_then(|len| len.parse().ok())
            .ok_or_else(|| GraphError::BadArgument(format!("invalid bulk header: {header}")))?;

        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf)?;
        buf.truncate(len);
        args.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(Some(args))
}

fn write_bulk<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    write!(writer, "${}\r\n", value.len())?;
    writer.write_all(value.as_bytes())?;
    writer.write_all(b"\r\n")
}

/// Encode one reply onto the wire
pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> io::Result<()> {
    match reply {
        Reply::Simple(value) => write!(writer, "+{value}\r\n"),
        Reply::Error(message) => write!(writer, "-{message}\r\n"),
        Reply::Int(value) => write!(writer, ":{value}\r\n"),
        Reply::Bulk(value) => write_bulk(writer, value),
        Reply::Array(items) => {
            write!(writer, "*{}\r\n", items.len())?;
            for item in items {
                write_bulk(writer, item)?;
            }
            Ok(())
        }
        Reply::Nested(arrays) => {
            write!(writer, "*{}\r\n", arrays.len())?;
            for items in arrays {
                write!(writer, "*{}\r\n", items.len())?;
                for item in items {
                    write_bulk(writer, item)?;
                }
            }
            Ok(())
        }
        Reply::Null => writer.write_all(b"$-1\r\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(input: &[u8]) -> Option<Vec<String>> {
        read_command(&mut Cursor::new(input.to_vec())).unwrap()
    }

    fn encode(reply: &Reply) -> String {
        let mut out = Vec::new();
        write_reply(&mut out, reply).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_array_command() {
        let args = parse(b"*3\r\n$11\r\nNODE.CREATE\r\n$1\r\ng\r\n$4\r\nauth\r\n").unwrap();
        assert_eq!(args, vec!["NODE.CREATE", "g", "auth"]);
    }

    #[test]
    fn parses_inline_command() {
        let args = parse(b"PING hello\r\n").unwrap();
        assert_eq!(args, vec!["PING", "hello"]);
    }

    #[test]
    fn bulk_payload_may_contain_spaces_and_newlines() {
        let args = parse(b"*2\r\n$4\r\nPING\r\n$11\r\nhello\r\nthere\r\n").unwrap();
        assert_eq!(args[1], "hello\r\nthere");
    }

    #[test]
    fn eof_before_any_command_is_clean_close() {
        assert!(parse(b"").is_none());
    }

    #[test]
    fn encodes_every_reply_shape() {
        assert_eq!(encode(&Reply::ok()), "+OK\r\n");
        assert_eq!(encode(&Reply::Error("ERR boom".into())), "-ERR boom\r\n");
        assert_eq!(encode(&Reply::Int(42)), ":42\r\n");
        assert_eq!(encode(&Reply::Bulk("hi".into())), "$2\r\nhi\r\n");
        assert_eq!(encode(&Reply::Null), "$-1\r\n");
        assert_eq!(
            encode(&Reply::Array(vec!["a".into(), "b".into()])),
            "*2\r\n$1\r\na\r\n$1\r\nb\r\n"
        );
        assert_eq!(
            encode(&Reply::Nested(vec![vec!["a".into()], vec!["b".into()]])),
            "*2\r\n*1\r\n$1\r\na\r\n*1\r\n$1\r\nb\r\n"
        );
    }
}
