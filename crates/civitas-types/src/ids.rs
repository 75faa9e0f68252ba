//! Identifier newtypes.
//!
//! All institutional identifiers are UUIDs wrapped in distinct types so a
//! member id cannot be passed where a session id is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// A member of the polity, human or artificial.
    MemberId
);
uuid_id!(
    /// A deliberative session.
    SessionId
);
uuid_id!(
    /// A due-process notice.
    NoticeId
);
uuid_id!(
    /// An emergency powers activation.
    ActivationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_and_round_trip() {
        let id = MemberId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let back: MemberId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
