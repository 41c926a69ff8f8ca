use crate::error::{Error, Result};
use std::borrow::Borrow;
use std::fmt;

const MAX_NAME_LEN: usize = 128;

fn validate_name(value: &str, kind: &str, allowed: fn(char) -> bool) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidId(format!("{kind} must not be empty")));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(Error::InvalidId(format!(
            "{kind} length must be <= {MAX_NAME_LEN}"
        )));
    }
    if !trimmed.chars().all(allowed) {
        return Err(Error::InvalidId(format!(
            "{kind} contains invalid characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn is_symbol_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_'
}

fn is_model_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | ':')
}

macro_rules! define_name_type {
    ($(#[$doc:meta])* $name:ident, $kind:expr, $allowed:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
        pub struct $name(String);

        impl $name {
            /// Creates a validated name.
            pub fn new(value: impl AsRef<str>) -> Result<Self> {
                validate_name(value.as_ref(), $kind, $allowed).map(Self)
            }

            /// Creates a name from a trusted string without validation.
            pub(crate) fn from_string(value: String) -> Self {
                Self(value)
            }

            /// Returns the underlying string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<&str> for $name {
            type Error = Error;

            fn try_from(value: &str) -> Result<Self> {
                Self::new(value)
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_name_type!(
    /// Canonical action symbol such as `show` or `index`.
    Action,
    "action",
    is_symbol_char
);
define_name_type!(
    /// Attribute-store key.
    AssignKey,
    "assign key",
    is_symbol_char
);
define_name_type!(
    /// Identity of a resource type, optionally namespaced (`Blog.Post`, `blog::Post`).
    ModelName,
    "model name",
    is_model_char
);

impl Action {
    /// Canonicalises a free-form event name into an action symbol.
    ///
    /// The name is lowercased, every run of characters outside `[a-z0-9_]` becomes
    /// a single `_`, and leading/trailing underscores are trimmed. Returns `None`
    /// when nothing is left.
    pub fn canonical(name: &str) -> Option<Self> {
        let mut out = String::with_capacity(name.len());
        let mut pending_sep = false;
        for ch in name.chars() {
            let ch = ch.to_ascii_lowercase();
            if is_symbol_char(ch) {
                if pending_sep && !out.is_empty() {
                    out.push('_');
                }
                pending_sep = false;
                out.push(ch);
            } else {
                pending_sep = true;
            }
        }
        let trimmed = out.trim_matches('_');
        if trimmed.is_empty() || trimmed.len() > MAX_NAME_LEN {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Returns whether this is the list-all action (`index`).
    pub fn is_index(&self) -> bool {
        self.0 == "index"
    }
}

impl ModelName {
    /// Returns the rightmost segment of a namespaced model name.
    pub fn last_segment(&self) -> &str {
        self.0
            .rsplit(['.', ':'])
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.0)
    }
}
