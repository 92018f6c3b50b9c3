//! # Identity
//!
//! The verified caller handed in by the authorization layer.
//!
//! Roles arrive already resolved (a claim on the verified identity). Nothing
//! in this workspace re-derives a role from emails or any other field.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Role attached to a verified identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// A trusted (user id, role) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub const fn new(user_id: i64, role: Role) -> Self {
        Actor { user_id, role }
    }

    pub const fn buyer(user_id: i64) -> Self {
        Actor::new(user_id, Role::Buyer)
    }

    pub const fn seller(user_id: i64) -> Self {
        Actor::new(user_id, Role::Seller)
    }

    /// Fails with [`CoreError::Forbidden`] unless the actor has `role`.
    pub fn require(&self, role: Role) -> CoreResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "{} role required, caller is {}",
                role, self.role
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_require_matching_role() {
        assert!(Actor::buyer(1).require(Role::Buyer).is_ok());
        assert!(Actor::seller(1).require(Role::Seller).is_ok());
    }

    #[test]
    fn test_require_other_role_is_forbidden() {
        let err = Actor::seller(1).require(Role::Buyer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(
            err.to_string(),
            "Forbidden: buyer role required, caller is seller"
        );
        assert!(Actor::new(1, Role::Admin).require(Role::Seller).is_err());
    }
}
