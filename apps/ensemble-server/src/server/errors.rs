use std::fmt;

use axum::{http::StatusCode, response::IntoResponse, Json};
use ensemble_core::{DomainError, HierarchyDenial, Permission, PermissionSet, RequestFinished};
use ensemble_protocol::ErrorBody;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Group,
    Role,
    Membership,
    Invitation,
    Application,
}

impl Entity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Role => "role",
            Self::Membership => "membership",
            Self::Invitation => "invitation",
            Self::Application => "application",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Invitation,
    Application,
}

impl RequestKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invitation => "invitation",
            Self::Application => "application",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Operator has no role in the group, directly or inherited.
    NotMember,
    MissingPermission(Permission),
    LevelTooLow,
    PermissionExceedsOperator(PermissionSet),
    CreatorRoleFixed,
    SelfTarget,
    NotInvitee,
    NotApplicant,
    ApplyDisabled,
    NotTeamMember,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotMember => f.write_str("operator is not a member of the group"),
            Self::MissingPermission(permission) => {
                write!(f, "missing permission `{permission}`")
            }
            Self::LevelTooLow => f.write_str("role level is not above the target"),
            Self::PermissionExceedsOperator(extra) => write!(
                f,
                "permissions not held by the operator: {}",
                extra.names().join(", ")
            ),
            Self::CreatorRoleFixed => f.write_str("the creator role can not be changed"),
            Self::SelfTarget => f.write_str("operator can not target themselves"),
            Self::NotInvitee => f.write_str("only the invited user can answer"),
            Self::NotApplicant => f.write_str("only the applicant can withdraw"),
            Self::ApplyDisabled => f.write_str("the group does not accept applications"),
            Self::NotTeamMember => f.write_str("only members of the owning team may apply"),
        }
    }
}

impl From<HierarchyDenial> for DenyReason {
    fn from(denial: HierarchyDenial) -> Self {
        match denial {
            HierarchyDenial::MissingPermission(permission) => Self::MissingPermission(permission),
            HierarchyDenial::LevelTooLow => Self::LevelTooLow,
            HierarchyDenial::PermissionExceedsOperator(extra) => {
                Self::PermissionExceedsOperator(extra)
            }
            HierarchyDenial::CreatorRoleFixed => Self::CreatorRoleFixed,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("permission denied: {0}")]
    PermissionDenied(DenyReason),
    #[error("{} not found", .0.as_str())]
    NotFound(Entity),
    #[error("{} already exists", .0.as_str())]
    AlreadyExists(Entity),
    #[error("user is already a member of the group")]
    AlreadyMember,
    #[error("{} is already finished", .0.as_str())]
    Finished(RequestKind),
    #[error("group has reached its member limit")]
    CapacityExceeded,
    #[error("permissions outside the group kind: {}", .0.names().join(", "))]
    InvalidPermissionSet(PermissionSet),
    #[error("group kind is not supported")]
    UnsupportedGroupKind,
    #[error("the creator can not leave the group")]
    CreatorCanNotLeave,
    #[error("invalid request: {0}")]
    InvalidRequest(DomainError),
}

impl GroupError {
    pub(crate) const fn denied(reason: DenyReason) -> Self {
        Self::PermissionDenied(reason)
    }

    pub(crate) fn finished(kind: RequestKind) -> impl Fn(RequestFinished) -> Self {
        move |_| Self::Finished(kind)
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "permission_denied",
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::AlreadyMember => "already_member",
            Self::Finished(_) => "request_finished",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::InvalidPermissionSet(_) => "invalid_permission_set",
            Self::UnsupportedGroupKind => "unsupported_group_kind",
            Self::CreatorCanNotLeave => "creator_can_not_leave",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::PermissionDenied(_) | Self::CreatorCanNotLeave => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_)
            | Self::AlreadyMember
            | Self::Finished(_)
            | Self::CapacityExceeded => StatusCode::CONFLICT,
            Self::InvalidPermissionSet(_) | Self::InvalidRequest(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::UnsupportedGroupKind => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<DomainError> for GroupError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::UnsupportedGroupKind => Self::UnsupportedGroupKind,
            other => Self::InvalidRequest(other),
        }
    }
}

impl IntoResponse for GroupError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status(),
            Json(ErrorBody {
                error: String::from(self.code()),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .with_span_list(true)
        .init();
}
