use ensemble_core::{
    AllowApplyType, Application, ApplicationCheckType, DomainError, GroupName, Intro, Invitation,
    Membership, PermissionSet, RoleId, RoleName,
};
use ensemble_protocol::{GroupPolicyPayload, RolePayload};

/// Skip/limit window over a listing. A missing limit takes the configured
/// default and every limit is clamped to the configured ceiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub skip: usize,
    pub limit: Option<usize>,
}

impl Page {
    #[must_use]
    pub const fn new(skip: usize, limit: Option<usize>) -> Self {
        Self { skip, limit }
    }
}

/// Attributes of a group about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDraft {
    pub name: GroupName,
    pub intro: Intro,
    pub allow_apply_type: AllowApplyType,
    pub application_check_type: ApplicationCheckType,
    /// Falls back to the configured default of the group's kind.
    pub max_members: Option<u64>,
}

impl GroupDraft {
    /// A closed group that reviews applications and uses default capacity.
    #[must_use]
    pub fn new(name: GroupName) -> Self {
        Self {
            name,
            intro: Intro::default(),
            allow_apply_type: AllowApplyType::None,
            application_check_type: ApplicationCheckType::AdminCheck,
            max_members: None,
        }
    }

    #[must_use]
    pub fn with_intro(self, intro: Intro) -> Self {
        Self { intro, ..self }
    }

    #[must_use]
    pub fn with_policy(
        self,
        allow_apply_type: AllowApplyType,
        application_check_type: ApplicationCheckType,
    ) -> Self {
        Self {
            allow_apply_type,
            application_check_type,
            ..self
        }
    }

    #[must_use]
    pub fn with_max_members(self, max_members: u64) -> Self {
        Self {
            max_members: Some(max_members),
            ..self
        }
    }
}

/// Partial change of a group's join policy. `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupPolicyUpdate {
    pub allow_apply_type: Option<AllowApplyType>,
    pub application_check_type: Option<ApplicationCheckType>,
    pub max_members: Option<u64>,
    pub default_role: Option<RoleId>,
}

impl TryFrom<GroupPolicyPayload> for GroupPolicyUpdate {
    type Error = DomainError;

    fn try_from(value: GroupPolicyPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            allow_apply_type: value
                .allow_apply_type
                .map(AllowApplyType::try_from)
                .transpose()?,
            application_check_type: value
                .application_check_type
                .map(ApplicationCheckType::try_from)
                .transpose()?,
            max_members: value.max_members,
            default_role: value.default_role_id.map(RoleId::try_from).transpose()?,
        })
    }
}

/// Validated attributes of a custom role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDraft {
    pub name: RoleName,
    pub intro: Intro,
    pub level: i32,
    pub permissions: PermissionSet,
}

impl TryFrom<RolePayload> for RoleDraft {
    type Error = DomainError;

    fn try_from(value: RolePayload) -> Result<Self, Self::Error> {
        Ok(Self {
            name: RoleName::try_from(value.name)?,
            intro: Intro::try_from(value.intro)?,
            level: value.level,
            permissions: PermissionSet::try_from_names(&value.permissions)?,
        })
    }
}

/// Filters for listing a group's members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberQuery {
    /// Only members holding one of these roles; empty means any role.
    pub roles: Vec<RoleId>,
    /// Case-insensitive substring of the member's user name.
    pub word: Option<String>,
    pub page: Page,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteOutcome {
    /// A pending invitation now waits for the invitee.
    Invited(Invitation),
    /// The invitee had applied already; the application was allowed.
    Joined {
        application: Application,
        membership: Membership,
    },
    /// The invitee belongs to the project's team and joined directly.
    JoinedViaTeam(Membership),
}

impl InviteOutcome {
    #[must_use]
    pub const fn membership(&self) -> Option<&Membership> {
        match self {
            Self::Invited(_) => None,
            Self::Joined { membership, .. } | Self::JoinedViaTeam(membership) => Some(membership),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A pending application now waits for review.
    Applied(Application),
    /// The group needs no review; the application was allowed on the spot.
    Joined {
        application: Application,
        membership: Membership,
    },
    /// A pending invitation existed and was accepted instead.
    JoinedViaInvitation {
        invitation: Invitation,
        membership: Membership,
    },
    /// The applicant's team role grants project admin.
    JoinedAsAdmin(Membership),
}

impl ApplyOutcome {
    #[must_use]
    pub const fn membership(&self) -> Option<&Membership> {
        match self {
            Self::Applied(_) => None,
            Self::Joined { membership, .. }
            | Self::JoinedViaInvitation { membership, .. }
            | Self::JoinedAsAdmin(membership) => Some(membership),
        }
    }
}
