#![forbid(unsafe_code)]

mod group;
mod permission;
mod request;
mod role;

use ulid::Ulid;

pub use group::{
    AllowApplyType, ApplicationCheckType, Group, GroupKind, GroupRef, GroupScope, GroupVariant,
    Membership, ProjectGroup, TeamGroup,
};
pub use permission::{Permission, PermissionSet};
pub use request::{Application, Invitation, RequestFinished, RequestStatus};
pub use role::{
    check_member_removal, check_member_role_change, check_operator, check_role_grant, outranks,
    HierarchyDenial, Role, SYSTEM_ROLE_CREATOR,
};

/// Returns the project code name.
#[must_use]
pub const fn project_name() -> &'static str {
    "ensemble"
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("name is invalid")]
    InvalidName,
    #[error("email is invalid")]
    InvalidEmail,
    #[error("user id is invalid")]
    InvalidUserId,
    #[error("group id is invalid")]
    InvalidGroupId,
    #[error("role id is invalid")]
    InvalidRoleId,
    #[error("invitation id is invalid")]
    InvalidInvitationId,
    #[error("application id is invalid")]
    InvalidApplicationId,
    #[error("group kind is not supported")]
    UnsupportedGroupKind,
    #[error("permission `{0}` is unknown")]
    UnknownPermission(String),
    #[error("allow apply type is invalid for this group kind")]
    InvalidAllowApplyType,
    #[error("application check type is invalid")]
    InvalidApplicationCheckType,
    #[error("request status is invalid")]
    InvalidRequestStatus,
    #[error("max members must be at least one")]
    InvalidMaxMembers,
    #[error("request message is invalid")]
    InvalidMessage,
    #[error("intro is invalid")]
    InvalidIntro,
}

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident => $error:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Ulid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                let parsed = Ulid::from_string(&value).map_err(|_| DomainError::$error)?;
                Ok(Self(parsed))
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

ulid_id!(UserId => InvalidUserId);
ulid_id!(
    /// Identifies a team or a project. Both kinds share one id space.
    GroupId => InvalidGroupId
);
ulid_id!(RoleId => InvalidRoleId);
ulid_id!(InvitationId => InvalidInvitationId);
ulid_id!(ApplicationId => InvalidApplicationId);

pub const MAX_USER_NAME_CHARS: usize = 32;
pub const MAX_GROUP_NAME_CHARS: usize = 64;
pub const MAX_ROLE_NAME_CHARS: usize = 32;
pub const MAX_INTRO_CHARS: usize = 1_024;
pub const MAX_REQUEST_MESSAGE_CHARS: usize = 512;
const MAX_EMAIL_CHARS: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserName(String);

impl UserName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_name(&value, 2, MAX_USER_NAME_CHARS)?;
        Ok(Self(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupName(String);

impl GroupName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GroupName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_name(&value, 1, MAX_GROUP_NAME_CHARS)?;
        Ok(Self(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleName(String);

impl RoleName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoleName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_name(&value, 1, MAX_ROLE_NAME_CHARS)?;
        Ok(Self(value))
    }
}

/// Lower-cased email address, unique across the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim().to_lowercase();
        if value.is_empty() || value.len() > MAX_EMAIL_CHARS {
            return Err(DomainError::InvalidEmail);
        }
        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::InvalidEmail);
        };
        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || value.chars().any(char::is_whitespace)
        {
            return Err(DomainError::InvalidEmail);
        }
        Ok(Self(value))
    }
}

/// Free text attached to an invitation or application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RequestMessage(String);

impl RequestMessage {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RequestMessage {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_free_text(&value, MAX_REQUEST_MESSAGE_CHARS)
            .map_err(|_| DomainError::InvalidMessage)?;
        Ok(Self(value))
    }
}

/// Free text describing a group or a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Intro(String);

impl Intro {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Intro {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_free_text(&value, MAX_INTRO_CHARS).map_err(|_| DomainError::InvalidIntro)?;
        Ok(Self(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: UserName,
    pub email: Email,
    pub create_time: i64,
}

fn validate_name(value: &str, min: usize, max: usize) -> Result<(), DomainError> {
    let chars = value.chars().count();
    if !(min..=max).contains(&chars) || value.trim() != value {
        return Err(DomainError::InvalidName);
    }

    if value.chars().all(|c| !c.is_control()) {
        return Ok(());
    }

    Err(DomainError::InvalidName)
}

fn validate_free_text(value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::InvalidName);
    }
    if value.contains('\0') {
        return Err(DomainError::InvalidName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        project_name, DomainError, Email, GroupId, GroupName, Intro, RequestMessage, RoleName,
        UserId, UserName,
    };

    #[test]
    fn project_name_is_stable() {
        assert_eq!(project_name(), "ensemble");
    }

    #[test]
    fn names_enforce_bounds_and_reject_control_chars() {
        assert_eq!(
            UserName::try_from(String::from("kana")).unwrap().as_str(),
            "kana"
        );
        assert_eq!(
            GroupName::try_from(String::from("字幕组 Alpha")).unwrap().as_str(),
            "字幕组 Alpha"
        );
        assert_eq!(
            UserName::try_from(String::from("a")).unwrap_err(),
            DomainError::InvalidName
        );
        assert_eq!(
            RoleName::try_from(String::from(" padded")).unwrap_err(),
            DomainError::InvalidName
        );
        assert_eq!(
            GroupName::try_from(String::from("tab\tname")).unwrap_err(),
            DomainError::InvalidName
        );
        assert!(RoleName::try_from("r".repeat(33)).is_err());
    }

    #[test]
    fn email_is_normalized_and_validated() {
        let email = Email::try_from(String::from("  Editor@Example.COM ")).unwrap();
        assert_eq!(email.as_str(), "editor@example.com");
        assert_eq!(
            Email::try_from(String::from("no-at-sign")).unwrap_err(),
            DomainError::InvalidEmail
        );
        assert!(Email::try_from(String::from("a@b@c")).is_err());
        assert!(Email::try_from(String::from("@example.com")).is_err());
    }

    #[test]
    fn free_text_rejects_nul_and_overflow() {
        assert!(RequestMessage::try_from(String::from("please let me in")).is_ok());
        assert_eq!(
            RequestMessage::try_from(String::from("\0")).unwrap_err(),
            DomainError::InvalidMessage
        );
        assert_eq!(
            Intro::try_from("x".repeat(1_025)).unwrap_err(),
            DomainError::InvalidIntro
        );
    }

    #[test]
    fn ids_round_trip_and_reject_garbage() {
        let id = UserId::new();
        assert_eq!(UserId::try_from(id.to_string()).unwrap(), id);
        assert_eq!(
            GroupId::try_from(String::from("not-a-ulid")).unwrap_err(),
            DomainError::InvalidGroupId
        );
    }
}
