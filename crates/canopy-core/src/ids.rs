//! Identifier newtypes.
//!
//! Every identifier is a caller-chosen string. Wrapping each kind keeps a
//! tenant id from being passed where a resource id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a tenant. Unique across the whole forest.
    TenantId
);
string_id!(RoleId);
string_id!(
    /// Identifier of a resource. Unique only together with its
    /// [`ResourceType`].
    ResourceId
);
string_id!(
    /// Optional type tag of a resource (e.g. `device`).
    ResourceType
);
string_id!(AccountId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_their_raw_value() {
        assert_eq!(TenantId::from("saas").to_string(), "saas");
        assert_eq!(ResourceType::new("device").as_str(), "device");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&AccountId::from("john")).unwrap();
        assert_eq!(json, "\"john\"");

        let back: TenantId = serde_json::from_str("\"chain\"").unwrap();
        assert_eq!(back, TenantId::from("chain"));
    }
}
