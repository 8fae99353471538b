use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUID-backed identifier newtype.
///
/// Each identifier gets its own type so a `BadgeId` can never be passed where
/// an `EventId` is expected.
macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The nil identifier, used by callers to signal "not provided".
            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Returns true when this is the nil UUID.
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

typed_id!(
    /// Identifier of a platform user (organizer, owner, subscriber, admin).
    UserId
);
typed_id!(
    /// Identifier of a newsletter aggregate.
    NewsletterId
);
typed_id!(
    /// Identifier of a community event aggregate.
    EventId
);
typed_id!(
    /// Identifier of the analytics record kept for one event.
    AnalyticsId
);
typed_id!(
    /// Identifier of a business aggregate.
    BusinessId
);
typed_id!(
    /// Identifier of a badge aggregate.
    BadgeId
);
typed_id!(
    /// Identifier of a sign-up list owned by an event.
    SignUpListId
);
typed_id!(
    /// Identifier of a sign-up item inside a sign-up list.
    SignUpItemId
);
typed_id!(
    /// Identifier of an image attached to an event or business.
    ImageId
);
typed_id!(
    /// Identifier of an email distribution group.
    EmailGroupId
);
typed_id!(
    /// Identifier of a metro area used for newsletter targeting.
    MetroAreaId
);

/// Version number for an aggregate, used for optimistic concurrency control.
///
/// A freshly created aggregate is at version 0. The first commit stores it at
/// version 1 and every later commit increments the stored version by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) for an aggregate that was never stored.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version (1) written by the first commit.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}
