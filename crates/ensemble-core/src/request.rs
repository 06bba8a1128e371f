use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    ApplicationId, DomainError, GroupRef, InvitationId, RequestMessage, RoleId, UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Allow,
    Deny,
}

impl RequestStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }

    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Allow | Self::Deny)
    }
}

impl TryFrom<String> for RequestStatus {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(Self::Pending),
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            _ => Err(DomainError::InvalidRequestStatus),
        }
    }
}

/// Attempted transition out of `Allow`/`Deny`, or back into `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("request is already finished")]
pub struct RequestFinished;

fn transition(from: RequestStatus, to: RequestStatus) -> Result<RequestStatus, RequestFinished> {
    if from.is_finished() || !to.is_finished() {
        return Err(RequestFinished);
    }
    Ok(to)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub id: InvitationId,
    pub user_id: UserId,
    pub operator_id: UserId,
    pub group: GroupRef,
    pub role_id: RoleId,
    pub status: RequestStatus,
    pub message: RequestMessage,
    pub create_time: i64,
}

impl Invitation {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, RequestStatus::Pending)
    }

    /// # Errors
    /// Returns [`RequestFinished`] once the invitation left `Pending`.
    pub fn ensure_pending(&self) -> Result<(), RequestFinished> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(RequestFinished)
        }
    }

    /// # Errors
    /// Returns [`RequestFinished`] if already resolved or `to` is `Pending`.
    pub fn resolved(&self, to: RequestStatus) -> Result<Self, RequestFinished> {
        let status = transition(self.status, to)?;
        Ok(Self {
            status,
            ..self.clone()
        })
    }

    /// # Errors
    /// Returns [`RequestFinished`] once the invitation left `Pending`.
    pub fn with_role(&self, role_id: RoleId) -> Result<Self, RequestFinished> {
        self.ensure_pending()?;
        Ok(Self {
            role_id,
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub operator_id: Option<UserId>,
    pub group: GroupRef,
    pub status: RequestStatus,
    pub message: RequestMessage,
    /// Users holding the review permission when the application was filed.
    pub checker_user_ids: BTreeSet<UserId>,
    pub create_time: i64,
}

impl Application {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, RequestStatus::Pending)
    }

    /// # Errors
    /// Returns [`RequestFinished`] once the application left `Pending`.
    pub fn ensure_pending(&self) -> Result<(), RequestFinished> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(RequestFinished)
        }
    }

    /// # Errors
    /// Returns [`RequestFinished`] if already resolved or `to` is `Pending`.
    pub fn resolved(&self, to: RequestStatus, operator: UserId) -> Result<Self, RequestFinished> {
        let status = transition(self.status, to)?;
        Ok(Self {
            status,
            operator_id: Some(operator),
            ..self.clone()
        })
    }
}
