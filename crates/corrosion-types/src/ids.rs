//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Zones and structures are referenced across threads by id only: the
//! background sampling worker never holds a borrow into the host world.
//! Blocks have no id of their own; a block is addressed by its owning
//! structure plus its grid position (see [`GridCell`]).
//!
//! [`GridCell`]: crate::geometry::GridCell

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a zone (a planet or other named aging region).
    ZoneId
}

define_id! {
    /// Unique identifier for a top-level structure (a grid of blocks).
    StructureId
}
