use std::fmt;

use crate::api::types::Role;
use crate::session::Session;

/// Something a command needs permission to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewReports,
    RecordScores,
    ManageShooters,
    ManageMatches,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ViewReports => write!(f, "view scores and reports"),
            Capability::RecordScores => write!(f, "record scores"),
            Capability::ManageShooters => write!(f, "manage shooters"),
            Capability::ManageMatches => write!(f, "manage matches"),
        }
    }
}

impl Role {
    pub fn grants(&self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::Reporter => matches!(
                capability,
                Capability::ViewReports | Capability::RecordScores
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("Not logged in. Run `scorebook login` first.")]
    NotAuthenticated,
    #[error("{username} ({role}) is not allowed to {capability}")]
    Denied {
        username: String,
        role: Role,
        capability: Capability,
    },
}

/// Proof that the current user was authorized for a capability.
///
/// Only `authorize` can create one. Write endpoints take a `&Permit` and
/// check it carries the capability they need.
#[derive(Debug, Clone)]
pub struct Permit {
    username: String,
    role: Role,
    capability: Capability,
}

impl Permit {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Check this permit covers `capability`. A permit for one capability
    /// covers another only if the role grants both.
    pub fn require(&self, capability: Capability) -> Result<(), AccessError> {
        if self.capability == capability || self.role.grants(capability) {
            Ok(())
        } else {
            Err(AccessError::Denied {
                username: self.username.clone(),
                role: self.role,
                capability,
            })
        }
    }
}

pub fn authorize(session: Option<&Session>, capability: Capability) -> Result<Permit, AccessError> {
    let session = session.ok_or(AccessError::NotAuthenticated)?;
    if session.role.grants(capability) {
        tracing::debug!("{} ({}) authorized to {}", session.username, session.role, capability);
        Ok(Permit {
            username: session.username.clone(),
            role: session.role,
            capability,
        })
    } else {
        Err(AccessError::Denied {
            username: session.username.clone(),
            role: session.role,
            capability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: Role) -> Session {
        Session::new("ana".to_string(), role, "http://localhost:8000/api".to_string())
    }

    #[test]
    fn test_admin_has_every_capability() {
        let s = session(Role::Admin);
        for cap in [
            Capability::ViewReports,
            Capability::RecordScores,
            Capability::ManageShooters,
            Capability::ManageMatches,
        ] {
            assert!(authorize(Some(&s), cap).is_ok(), "admin denied {}", cap);
        }
    }

    #[test]
    fn test_reporter_records_but_does_not_manage() {
        let s = session(Role::Reporter);
        assert!(authorize(Some(&s), Capability::ViewReports).is_ok());
        assert!(authorize(Some(&s), Capability::RecordScores).is_ok());
        let err = authorize(Some(&s), Capability::ManageMatches).unwrap_err();
        assert_eq!(
            err,
            AccessError::Denied {
                username: "ana".to_string(),
                role: Role::Reporter,
                capability: Capability::ManageMatches,
            }
        );
        assert_eq!(err.to_string(), "ana (reporter) is not allowed to manage matches");
    }

    #[test]
    fn test_no_session_is_not_authenticated() {
        assert_eq!(
            authorize(None, Capability::ViewReports).unwrap_err(),
            AccessError::NotAuthenticated
        );
    }

    #[test]
    fn test_permit_require() {
        let s = session(Role::Reporter);
        let permit = authorize(Some(&s), Capability::RecordScores).unwrap();
        assert_eq!(permit.username(), "ana");
        assert!(permit.require(Capability::RecordScores).is_ok());
        assert!(permit.require(Capability::ViewReports).is_ok());
        assert!(permit.require(Capability::ManageShooters).is_err());
    }
}
