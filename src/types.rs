use std::fmt;
use std::str::FromStr;

use crate::parsing::{Lexer, ParsingState};

// Convenient for vector indexing
// TODO: add a check like ~ static_assert(sizeof(NodeID) <= sizeof(usize))

/// Represents the unique inner identifier for a node.
pub type NodeID = u32;

/// Represents the name of a node.
pub type NodeName = String;

/// Represents a duration in units (e.g., seconds).
pub type Duration = f64;

/// Represents a date (could represent days since a specific epoch).
pub type Date = f64;

/// Represents the volume of data (in bytes, for example).
pub type Volume = f64;

/// Represents a data transfer rate (in payload-units per second).
pub type DataRate = f64;

/// Represents the count of hops in a routing path.
pub type HopCount = u16;

/// Logical delivery address shared by one or more nodes (anycast).
///
/// Several nodes may carry the same `EndpointId`, in which case route search
/// treats any of them as a valid destination.
pub type EndpointId = u32;

/// Priority level of a bundle or task: higher value outranks lower ones.
///
/// `Bulk` is index 0, `Normal` is index 1, `Expedited` is index 2; the
/// per-contact `mav` array is indexed the same way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Priority {
    Bulk = 0,
    Normal = 1,
    Expedited = 2,
}

impl Priority {
    /// Number of priority levels (and the width of a contact's `mav` array).
    pub const COUNT: usize = 3;

    pub fn as_index(self) -> usize {
        self as u8 as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Priority::Bulk),
            1 => Some(Priority::Normal),
            2 => Some(Priority::Expedited),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Bulk
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Bulk => write!(f, "bulk"),
            Priority::Normal => write!(f, "normal"),
            Priority::Expedited => write!(f, "expedited"),
        }
    }
}

macro_rules! define_opaque_id {
    ($name:ident) => {
        /// Opaque identifier generated by `utils::IdAllocator`, never by an
        /// ambient global.
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

define_opaque_id!(TaskId);
define_opaque_id!(RequestId);

/// Stable string identifier of a Contact: `"frm_to_start"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactId(pub String);

impl ContactId {
    pub fn new(frm: NodeID, to: NodeID, start: Date) -> Self {
        Self(format!("{}_{}_{}", frm, to, start))
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A trait for types that can be parsed from a lexer.
///
/// # Type Parameters
///
/// * `T` - The type that will be parsed from the lexer.
pub trait Token<T> {
    /// Parses a token from the lexer.
    ///
    /// # Parameters
    ///
    /// * `lexer` - A mutable reference to the lexer that provides the token.
    ///
    /// # Returns
    ///
    /// A `ParsingState<T>` indicating the result of the parsing operation.
    fn parse(lexer: &mut dyn Lexer) -> ParsingState<T>;
}

impl<T: FromStr> Token<T> for T {
    /// Implement the `Token` trait for any type that implements `FromStr`.
    fn parse(lexer: &mut dyn Lexer) -> ParsingState<T> {
        let res = lexer.consume_next_token();
        match res {
            ParsingState::EOF => ParsingState::EOF,
            ParsingState::Error(e) => ParsingState::Error(e),
            ParsingState::Finished(token) => match token.parse::<T>() {
                Ok(value) => ParsingState::Finished(value),
                Err(_) => ParsingState::Error(format!(
                    "Parsing failed ({})",
                    lexer.get_current_position()
                )),
            },
        }
    }
}
