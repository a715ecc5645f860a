//! Store keys
//!
//! A key is either a numeric id or a short name. On disk it appears as the
//! literal token `"<body>":` immediately before its value.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StoreError};

/// Key of a stored entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Numeric id, rendered in decimal (`"12":`)
    Id(u32),

    /// Caller-supplied name (`"name":`)
    Name(String),
}

impl Key {
    /// Key for a numeric id
    pub fn id(id: u32) -> Self {
        Key::Id(id)
    }

    /// Key for a name
    ///
    /// Names must be non-empty and free of `"`, `\` and control characters,
    /// so the on-disk token never needs escaping.
    pub fn name(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(StoreError::InvalidKey("key name is empty".to_string()));
        }
        if let Some(c) = name
            .chars()
            .find(|c| *c == '"' || *c == '\\' || c.is_control())
        {
            return Err(StoreError::InvalidKey(format!(
                "key name {:?} contains forbidden character {:?}",
                name, c
            )));
        }
        Ok(Key::Name(name))
    }

    /// The key body as it appears between the quotes
    pub fn body(&self) -> String {
        match self {
            Key::Id(id) => id.to_string(),
            Key::Name(name) => name.clone(),
        }
    }

    /// The literal token searched for in the store file: `"<body>":`
    pub fn token(&self) -> Vec<u8> {
        format!("\"{}\":", self.body()).into_bytes()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Id(id) => write!(f, "{}", id),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<u32> for Key {
    fn from(id: u32) -> Self {
        Key::Id(id)
    }
}

impl From<u16> for Key {
    fn from(id: u16) -> Self {
        Key::Id(id as u32)
    }
}

impl TryFrom<&str> for Key {
    type Error = StoreError;

    fn try_from(name: &str) -> Result<Self> {
        Key::name(name)
    }
}

impl FromStr for Key {
    type Err = StoreError;

    /// Canonical decimal strings become ids, anything else a name
    ///
    /// `"007"` stays a name: as an id it would render as `"7"` and miss.
    fn from_str(s: &str) -> Result<Self> {
        let canonical = s == "0" || !s.starts_with('0');
        if canonical && !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = s.parse::<u32>() {
                return Ok(Key::Id(id));
            }
        }
        Key::name(s)
    }
}
