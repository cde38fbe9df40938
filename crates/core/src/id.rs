// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session and correlation identifiers.
//!
//! A [`SessionId`] names the session directory on disk, so its shape is
//! validated strictly: only the 36-character hyphenated UUID text form is
//! accepted. Anything else is rejected *before* a path is ever built from
//! it, which closes off path traversal through the store API.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from identifier parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),
}

/// Unique identifier for a session; UUID v4 in hyphenated text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse an untrusted string into a session id.
    ///
    /// Accepts exactly the 36-character hyphenated hex form; rejects
    /// everything else, including UUIDs in braced or unhyphenated forms.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if !is_uuid_text_form(s) {
            return Err(IdError::InvalidSessionId(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check the exact hyphenated UUID shape: 8-4-4-4-12 hex digits.
///
/// `Uuid::parse_str` alone is too lenient here (it accepts unhyphenated
/// and braced forms), so the shape is checked byte-by-byte first.
fn is_uuid_text_form(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    for (i, b) in s.bytes().enumerate() {
        match i {
            8 | 13 | 18 | 23 => {
                if b != b'-' {
                    return false;
                }
            }
            _ => {
                if !b.is_ascii_hexdigit() {
                    return false;
                }
            }
        }
    }
    Uuid::parse_str(s).is_ok()
}

/// Caller-supplied correlation token.
///
/// Disambiguates which in-flight call an answers document belongs to when
/// several producers share one session tree. Opaque: any non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(String);

impl CallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CallId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
