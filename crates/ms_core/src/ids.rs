//! Identifier tokens (`CompetitorId`, `CompetitionId`, `DisciplineRef`) with a strict charset.
//!
//! Backend ids are opaque strings (Mongo-style hex ids for users and
//! competitions, short codes such as `5N1` or `SC2` for disciplines). We only
//! guarantee they are non-empty, bounded, and free of whitespace/separators.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

fn is_token(s: &str) -> bool {
    let len = s.len();
    if !(1..=64).contains(&len) {
        return false;
    }
    s.bytes().all(|b| {
        matches!(b,
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' |
            b'_' | b'-' | b':' | b'.'
        )
    })
}

macro_rules! def_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if is_token(s) { Ok(Self(s.to_string())) } else { Err(CoreError::InvalidToken(s.to_string())) }
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;
            fn try_from(s: String) -> Result<Self, Self::Error> {
                if is_token(&s) { Ok(Self(s)) } else { Err(CoreError::InvalidToken(s)) }
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String { id.0 }
        }
    };
}

def_token!(
    /// User directory id of a competitor (`_id` on the wire).
    CompetitorId
);
def_token!(CompetitionId);
def_token!(
    /// Discipline code, e.g. `5N1`, `SC2`, `K3`, `15W`.
    DisciplineRef
);
