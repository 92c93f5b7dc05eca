//! Identifier newtypes
//!
//! Users, posts, comments, and scheduler jobs are all identified by opaque
//! strings minted by the host platform. Each gets its own newtype so the
//! compiler keeps them apart; all serialize transparently as plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw platform identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The raw identifier string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

id_type! {
    /// Stable user identifier minted by the identity collaborator
    UserId
}

id_type! {
    /// Post identifier (drawings, tournaments, collections, pinned posts)
    PostId
}

id_type! {
    /// Comment identifier; doubles as the tournament entry identifier
    CommentId
}

id_type! {
    /// Opaque job identifier returned by the scheduler
    JobId
}
