//! Strongly-typed identifiers for ledger entities
//!
//! Newtype wrappers around UUIDs prevent accidental mixing of identifier
//! kinds (an `AccountId` can never be passed where a `CostCenterId` is
//! expected).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Chart identifiers
define_id!(AccountId, "ACC");
define_id!(CostCenterId, "CCT");
define_id!(ProjectId, "PRJ");

// Organization identifiers
define_id!(LegalEntityId, "ENT");
define_id!(BranchId, "BRN");
define_id!(PeriodId, "PRD");
define_id!(CurrencyId, "CUR");
define_id!(HistoryCodeId, "HST");
define_id!(UserId, "USR");

// Ledger identifiers
define_id!(EntryId, "JRN");
define_id!(LineId, "LIN");
define_id!(AllocationId, "RAT");
define_id!(BalanceId, "BAL");
