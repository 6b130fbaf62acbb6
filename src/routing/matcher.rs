//! Path token matching.
//!
//! # Responsibilities
//! - Recognize the `/bot` prefix (case-sensitive)
//! - Split the remainder into key token and method suffix
//! - Split the key token into provided key and actual token
//!
//! # Design Decisions
//! - Only the first `/` and the first `_` (literal or `%5F`) are significant
//! - Everything after the first `_` is the token, verbatim
//! - Works on the raw (still percent-encoded) path so upstream receives
//!   exactly the bytes the client sent; only the provided key is decoded

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// Literal prefix of every routable path, inbound and upstream.
pub const BOT_PREFIX: &str = "/bot";

/// Separates the provided key from the actual token.
pub const KEY_DELIMITER: char = '_';

/// A path of the form `/bot{key_token}[/{method}]`, split but not yet checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotPath<'a> {
    /// First segment after the prefix.
    pub key_token: &'a str,
    /// `/` plus the rest of the path, or empty.
    pub method_suffix: &'a str,
}

impl<'a> BotPath<'a> {
    /// Returns `None` when the path does not start with [`BOT_PREFIX`].
    pub fn parse(path: &'a str) -> Option<Self> {
        let rest = path.strip_prefix(BOT_PREFIX)?;
        let (key_token, method_suffix) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };
        Some(Self {
            key_token,
            method_suffix,
        })
    }
}

/// The key token split at its first delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathToken<'a> {
    pub provided_key: &'a str,
    pub actual_token: &'a str,
}

impl<'a> PathToken<'a> {
    /// Returns `None` when the segment has no delimiter.
    pub fn parse(key_token: &'a str) -> Option<Self> {
        let (idx, len) = find_delimiter(key_token)?;
        Some(Self {
            provided_key: &key_token[..idx],
            actual_token: &key_token[idx + len..],
        })
    }

    /// The provided key with percent-escapes decoded, as the client meant it.
    pub fn decoded_key(&self) -> Cow<'a, [u8]> {
        percent_decode_str(self.provided_key).into()
    }
}

/// Position and encoded length of the first delimiter, `_` or `%5F`.
fn find_delimiter(segment: &str) -> Option<(usize, usize)> {
    let bytes = segment.as_bytes();
    bytes.iter().enumerate().find_map(|(i, &b)| match b {
        b'_' => Some((i, 1)),
        b'%' if bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.eq_ignore_ascii_case(b"5f")) =>
        {
            Some((i, 3))
        }
        _ => None,
    })
}
