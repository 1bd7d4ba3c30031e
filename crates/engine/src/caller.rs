//! The identity every engine operation runs under.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    pub fn can_write(self) -> bool {
        matches!(self, Self::Owner | Self::Editor)
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "owner" => Ok(Self::Owner),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            other => Err(EngineError::InvalidName(format!("invalid role: {other}"))),
        }
    }
}

/// A resolved credential: who is calling and which tenants they may touch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub company_ids: Vec<Uuid>,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, company_ids: Vec<Uuid>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            company_ids,
            role,
        }
    }

    /// Identity used by operator tooling (admin CLI) on a single company.
    pub fn operator(company_id: Uuid) -> Self {
        Self::new("operator", vec![company_id], Role::Owner)
    }

    pub fn can_access(&self, company_id: Uuid) -> bool {
        self.company_ids.contains(&company_id)
    }

    /// Tenant check. Foreign tenants look exactly like unknown ids.
    pub(crate) fn require_company(&self, company_id: Uuid, what: &str) -> ResultEngine<()> {
        if !self.can_access(company_id) {
            return Err(EngineError::KeyNotFound(format!("{what} not exists")));
        }
        Ok(())
    }

    pub(crate) fn require_write(&self) -> ResultEngine<()> {
        if !self.role.can_write() {
            return Err(EngineError::Forbidden(format!(
                "role {} cannot write",
                self.role.as_str()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_cannot_write() {
        let caller = Caller::new("u1", vec![], Role::Viewer);
        assert!(matches!(
            caller.require_write(),
            Err(EngineError::Forbidden(_))
        ));
        assert!(Caller::new("u1", vec![], Role::Editor).require_write().is_ok());
    }

    #[test]
    fn foreign_company_is_not_found() {
        let mine = Uuid::new_v4();
        let caller = Caller::operator(mine);
        assert!(caller.require_company(mine, "company").is_ok());
        assert_eq!(
            caller.require_company(Uuid::new_v4(), "bank account"),
            Err(EngineError::KeyNotFound("bank account not exists".to_string()))
        );
    }
}
