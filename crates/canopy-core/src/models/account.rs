//! Account domain model.
//!
//! Accounts are only the key of access grants as far as authorization is
//! concerned; the remaining attributes are carried for reporting.

use serde::{Deserialize, Serialize};

use crate::ids::AccountId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

impl Account {
    pub fn new(id: impl Into<AccountId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
            organization: None,
        }
    }
}
