//! Type-safe identifiers for backend records
//!
//! The backend assigns every identifier, so unlike locally generated ids these
//! are opaque strings. The marker type keeps a `GroupId` from being passed
//! where a `MealId` is expected.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::str::FromStr;

/// A typed, server-assigned identifier
pub struct Id<T> {
    value: String,
    _phantom: PhantomData<T>,
}

/// Trait for types that can be used as ID markers
pub trait IdType: Send + Sync + 'static {
    /// Human readable kind, used in logs and error messages
    const KIND: &'static str;
}

/// Errors that can occur when working with IDs
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum IdError {
    #[error("Empty {kind} id")]
    #[diagnostic(help("Identifiers are assigned by the server and are never empty"))]
    Empty { kind: &'static str },

    #[error("Invalid {kind} id: '{value}'")]
    #[diagnostic(help("Identifiers cannot contain whitespace or path separators"))]
    InvalidCharacters { kind: &'static str, value: String },
}

impl<T: IdType> Id<T> {
    /// Wrap a server-assigned identifier, validating it is usable in a URL path
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty { kind: T::KIND });
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == '?' || c == '#')
        {
            return Err(IdError::InvalidCharacters {
                kind: T::KIND,
                value: trimmed.to_string(),
            });
        }

        Ok(Self {
            value: trimmed.to_string(),
            _phantom: PhantomData,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> &'static str {
        T::KIND
    }
}

// Manual impls so the marker type doesn't need to implement these traits.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: IdType> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", T::KIND, self.value)
    }
}

impl<T: IdType> Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T: IdType> FromStr for Id<T> {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<T: IdType> From<Id<T>> for String {
    fn from(id: Id<T>) -> Self {
        id.value
    }
}

impl<T: IdType> AsRef<str> for Id<T> {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl<T: IdType> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T: IdType> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

macro_rules! define_id_type {
    ($type_name:ident, $marker:ident, $kind:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $marker;

        impl IdType for $marker {
            const KIND: &'static str = $kind;
        }

        pub type $type_name = Id<$marker>;
    };
}

define_id_type!(UserId, UserIdType, "user");
define_id_type!(GroupId, GroupIdType, "group");
define_id_type!(MealId, MealIdType, "meal");
define_id_type!(GroceryId, GroceryIdType, "grocery");
define_id_type!(InviteId, InviteIdType, "invite");
