//! # Domain Identity Newtypes
//!
//! Newtype wrappers for every identifier in the Agri Stack. They serialize
//! as the bare UUID string, so the wire format is unchanged, but the type
//! system keeps the namespaces apart.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user account.
    UserId,
    "user"
);
define_id!(
    /// Unique identifier for a plot of land.
    PlotId,
    "plot"
);
define_id!(
    /// Unique identifier for a crop species.
    CropId,
    "crop"
);
define_id!(
    /// Unique identifier for a crop variety (cultivar).
    VarietyId,
    "variety"
);
define_id!(
    /// Unique identifier for a cultivation season.
    SeasonId,
    "season"
);
define_id!(
    /// Unique identifier for a scheduled task.
    TaskId,
    "task"
);
define_id!(
    /// Unique identifier for an expense line.
    ExpenseId,
    "expense"
);
