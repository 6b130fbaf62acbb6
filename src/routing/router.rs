//! Key validation and upstream path reconstruction.

use thiserror::Error;

use crate::config::SecretKey;
use crate::routing::matcher::{BotPath, PathToken, BOT_PREFIX};

/// Why a request was refused. Every variant is answered by dropping the connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Path does not start with the bot prefix.
    #[error("route not recognized")]
    UnknownRoute,

    /// Nothing follows the prefix.
    #[error("empty key token")]
    MalformedToken,

    /// Key token has no delimiter.
    #[error("key token has no delimiter")]
    MissingDelimiter,

    /// Provided key differs from the configured one.
    #[error("invalid key attempt")]
    KeyMismatch { attempted: String },
}

/// Where an accepted request goes upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    path_and_query: String,
    method_suffix: String,
}

impl UpstreamTarget {
    /// `/bot{token}{suffix}[?query]`, ready to append to the upstream origin.
    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    /// The path with key and token masked, safe to log.
    pub fn redacted_path(&self) -> String {
        format!("{BOT_PREFIX}***{}", self.method_suffix)
    }
}

/// Authenticates bot paths against the shared secret.
#[derive(Debug, Clone)]
pub struct Router {
    secret_key: SecretKey,
}

impl Router {
    pub fn new(secret_key: SecretKey) -> Self {
        Self { secret_key }
    }

    /// Validate `path` and build the upstream target, carrying `query` over unchanged.
    pub fn authorize(&self, path: &str, query: Option<&str>) -> Result<UpstreamTarget, Rejection> {
        let bot_path = BotPath::parse(path).ok_or(Rejection::UnknownRoute)?;
        if bot_path.key_token.is_empty() {
            return Err(Rejection::MalformedToken);
        }

        let token = PathToken::parse(bot_path.key_token).ok_or(Rejection::MissingDelimiter)?;
        let provided_key = token.decoded_key();
        if !keys_match(&provided_key, self.secret_key.expose().as_bytes()) {
            return Err(Rejection::KeyMismatch {
                attempted: String::from_utf8_lossy(&provided_key).into_owned(),
            });
        }

        let mut path_and_query = format!(
            "{BOT_PREFIX}{}{}",
            token.actual_token, bot_path.method_suffix
        );
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }

        Ok(UpstreamTarget {
            path_and_query,
            method_suffix: bot_path.method_suffix.to_string(),
        })
    }
}

/// Byte-exact comparison that does not short-circuit on the first differing byte.
fn keys_match(provided: &[u8], expected: &[u8]) -> bool {
    provided.len() == expected.len()
        && provided
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}
