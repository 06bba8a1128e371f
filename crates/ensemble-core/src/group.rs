use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{DomainError, GroupId, GroupName, Intro, Permission, PermissionSet, RoleId, UserId};

/// Behavior a concrete group kind plugs in. Roles and memberships of a
/// group carry its `KIND` tag, so `KIND` also names their role and relation
/// kind. [`GroupKind`] dispatches to the implementations exhaustively.
pub trait GroupVariant {
    const KIND: GroupKind;
    /// Every flag a role of this kind may carry.
    const PERMISSIONS: &'static [Permission];

    fn accepts_allow_apply(allow_apply: AllowApplyType) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeamGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProjectGroup;

impl GroupVariant for TeamGroup {
    const KIND: GroupKind = GroupKind::Team;
    const PERMISSIONS: &'static [Permission] = &TEAM_PERMISSIONS;

    fn accepts_allow_apply(allow_apply: AllowApplyType) -> bool {
        matches!(allow_apply, AllowApplyType::None | AllowApplyType::All)
    }
}

impl GroupVariant for ProjectGroup {
    const KIND: GroupKind = GroupKind::Project;
    const PERMISSIONS: &'static [Permission] = &PROJECT_PERMISSIONS;

    fn accepts_allow_apply(allow_apply: AllowApplyType) -> bool {
        match allow_apply {
            AllowApplyType::None | AllowApplyType::All | AllowApplyType::TeamUser => true,
        }
    }
}

const TEAM_PERMISSIONS: [Permission; 10] = [
    Permission::Access,
    Permission::Delete,
    Permission::Change,
    Permission::CheckUser,
    Permission::InviteUser,
    Permission::DeleteUser,
    Permission::ChangeUserRole,
    Permission::CreateProject,
    Permission::CreateTermBank,
    Permission::AutoBecomeProjectAdmin,
];

const PROJECT_PERMISSIONS: [Permission; 16] = [
    Permission::Access,
    Permission::Delete,
    Permission::Change,
    Permission::CheckUser,
    Permission::InviteUser,
    Permission::DeleteUser,
    Permission::ChangeUserRole,
    Permission::Finish,
    Permission::AddFile,
    Permission::DeleteFile,
    Permission::OutputTranslation,
    Permission::AddLabel,
    Permission::DeleteLabel,
    Permission::AddTranslation,
    Permission::ProofreadTranslation,
    Permission::CheckTranslation,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Team,
    Project,
}

impl GroupKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Project => "project",
        }
    }

    #[must_use]
    pub fn permission_universe(self) -> PermissionSet {
        match self {
            Self::Team => TeamGroup::PERMISSIONS.into(),
            Self::Project => ProjectGroup::PERMISSIONS.into(),
        }
    }

    /// Returns the flags of `permissions` that fall outside this kind's universe.
    #[must_use]
    pub fn foreign_permissions(self, permissions: PermissionSet) -> PermissionSet {
        permissions.difference(self.permission_universe())
    }

    #[must_use]
    pub fn accepts_allow_apply(self, allow_apply: AllowApplyType) -> bool {
        match self {
            Self::Team => TeamGroup::accepts_allow_apply(allow_apply),
            Self::Project => ProjectGroup::accepts_allow_apply(allow_apply),
        }
    }
}

impl TryFrom<String> for GroupKind {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "team" => Ok(Self::Team),
            "project" => Ok(Self::Project),
            _ => Err(DomainError::UnsupportedGroupKind),
        }
    }
}

/// Kind tag plus the data only one kind carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupScope {
    Team,
    Project { team_id: GroupId },
}

impl GroupScope {
    #[must_use]
    pub const fn kind(self) -> GroupKind {
        match self {
            Self::Team => GroupKind::Team,
            Self::Project { .. } => GroupKind::Project,
        }
    }

    #[must_use]
    pub const fn team_id(self) -> Option<GroupId> {
        match self {
            Self::Team => None,
            Self::Project { team_id } => Some(team_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupRef {
    pub kind: GroupKind,
    pub id: GroupId,
}

impl core::fmt::Display for GroupRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

/// Who may file an application. `TeamUser` is only meaningful for projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowApplyType {
    None,
    All,
    TeamUser,
}

impl AllowApplyType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::All => "all",
            Self::TeamUser => "team_user",
        }
    }
}

impl TryFrom<String> for AllowApplyType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "none" => Ok(Self::None),
            "all" => Ok(Self::All),
            "team_user" => Ok(Self::TeamUser),
            _ => Err(DomainError::InvalidAllowApplyType),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationCheckType {
    NoNeedCheck,
    AdminCheck,
}

impl ApplicationCheckType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoNeedCheck => "no_need_check",
            Self::AdminCheck => "admin_check",
        }
    }
}

impl TryFrom<String> for ApplicationCheckType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "no_need_check" => Ok(Self::NoNeedCheck),
            "admin_check" => Ok(Self::AdminCheck),
            _ => Err(DomainError::InvalidApplicationCheckType),
        }
    }
}

/// Snapshot of a group. `member_count` is the counter value at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: GroupName,
    pub intro: Intro,
    pub scope: GroupScope,
    pub allow_apply_type: AllowApplyType,
    pub application_check_type: ApplicationCheckType,
    pub max_members: u64,
    pub member_count: u64,
    pub default_role: RoleId,
    pub create_time: i64,
}

impl Group {
    #[must_use]
    pub const fn kind(&self) -> GroupKind {
        self.scope.kind()
    }

    #[must_use]
    pub const fn group_ref(&self) -> GroupRef {
        GroupRef {
            kind: self.scope.kind(),
            id: self.id,
        }
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.member_count >= self.max_members
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub user_id: UserId,
    pub group: GroupRef,
    pub role_id: RoleId,
    pub tags: BTreeSet<String>,
    pub create_time: i64,
}
