//! Branded ID newtypes for type safety.
//!
//! Every entity the client talks about has a distinct ID type implemented as
//! a newtype wrapper around `String`. This prevents accidentally passing a
//! task ID where a socket ID is expected.
//!
//! Request IDs are UUID v7 (time-ordered) generated via [`uuid::Uuid::now_v7`];
//! every other ID is assigned by the domain and only ever wrapped.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Correlation token for one outgoing request.
    RequestId
}

impl RequestId {
    /// Create a fresh request ID (UUID v7, time-ordered).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

branded_id! {
    /// Identifier of a task running on the domain.
    TaskId
}

branded_id! {
    /// Domain-side identifier of one client socket (WebSocket or peer channel).
    SocketId
}

branded_id! {
    /// Identifier of a mixer node inside a task.
    MixerId
}

branded_id! {
    /// Identifier of a fixed (hardware) instance node inside a task.
    FixedInstanceNodeId
}

branded_id! {
    /// Identifier of a dynamic (software) instance node inside a task.
    DynamicInstanceNodeId
}

branded_id! {
    /// Name of a declared parameter on an instance node.
    ParameterId
}

branded_id! {
    /// Identifier of a media object produced by a render.
    MediaObjectId
}

branded_id! {
    /// Credential token granting access to a task.
    SecureKey
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
