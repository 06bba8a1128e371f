use ensemble_core::{GroupKind, Permission, SYSTEM_ROLE_CREATOR};

pub(crate) const SYSTEM_ROLE_ADMIN: &str = "admin";
pub(crate) const SYSTEM_ROLE_SENIOR: &str = "senior";
pub(crate) const SYSTEM_ROLE_MEMBER: &str = "member";
pub(crate) const SYSTEM_ROLE_BEGINNER: &str = "beginner";
pub(crate) const SYSTEM_ROLE_CHECKER: &str = "checker";
pub(crate) const SYSTEM_ROLE_PROOFREADER: &str = "proofreader";
pub(crate) const SYSTEM_ROLE_TRANSLATOR: &str = "translator";
pub(crate) const SYSTEM_ROLE_SUPPORTER: &str = "supporter";

/// Project role granted to team members holding `AutoBecomeProjectAdmin`.
pub(crate) const PROJECT_ROLE_FROM_TEAM: &str = SYSTEM_ROLE_ADMIN;

/// One built-in role, seeded once at startup.
#[derive(Debug, Clone, Copy)]
pub struct SystemRoleSeed {
    pub kind: GroupKind,
    pub code: &'static str,
    /// Fallback display name when the catalog has no entry for `code`.
    pub name: &'static str,
    pub level: i32,
    pub permissions: &'static [Permission],
    /// New members join with this role unless the group overrides it.
    pub default: bool,
}

const TEAM_CREATOR: &[Permission] = &[
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

const TEAM_ADMIN: &[Permission] = &[
    Permission::Access,
    Permission::Change,
    Permission::CheckUser,
    Permission::InviteUser,
    Permission::DeleteUser,
    Permission::ChangeUserRole,
    Permission::CreateProject,
    Permission::CreateTermBank,
    Permission::AutoBecomeProjectAdmin,
];

const TEAM_SENIOR: &[Permission] = &[
    Permission::Access,
    Permission::CheckUser,
    Permission::InviteUser,
    Permission::CreateProject,
    Permission::CreateTermBank,
];

const TEAM_MEMBER: &[Permission] = &[Permission::Access, Permission::CreateTermBank];

const TEAM_BEGINNER: &[Permission] = &[Permission::Access];

const PROJECT_CREATOR: &[Permission] = &[
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

const PROJECT_ADMIN: &[Permission] = &[
    Permission::Access,
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

const PROJECT_CHECKER: &[Permission] = &[
    Permission::Access,
    Permission::OutputTranslation,
    Permission::AddLabel,
    Permission::DeleteLabel,
    Permission::AddTranslation,
    Permission::ProofreadTranslation,
    Permission::CheckTranslation,
];

const PROJECT_PROOFREADER: &[Permission] = &[
    Permission::Access,
    Permission::OutputTranslation,
    Permission::AddLabel,
    Permission::AddTranslation,
    Permission::ProofreadTranslation,
];

const PROJECT_TRANSLATOR: &[Permission] = &[
    Permission::Access,
    Permission::OutputTranslation,
    Permission::AddLabel,
    Permission::AddTranslation,
];

const PROJECT_SUPPORTER: &[Permission] = &[Permission::Access, Permission::OutputTranslation];

const fn seed(
    kind: GroupKind,
    code: &'static str,
    name: &'static str,
    level: i32,
    permissions: &'static [Permission],
    default: bool,
) -> SystemRoleSeed {
    SystemRoleSeed {
        kind,
        code,
        name,
        level,
        permissions,
        default,
    }
}

pub const SYSTEM_ROLE_TABLE: &[SystemRoleSeed] = &[
    seed(GroupKind::Team, SYSTEM_ROLE_CREATOR, "Creator", 500, TEAM_CREATOR, false),
    seed(GroupKind::Team, SYSTEM_ROLE_ADMIN, "Admin", 400, TEAM_ADMIN, false),
    seed(GroupKind::Team, SYSTEM_ROLE_SENIOR, "Senior", 300, TEAM_SENIOR, false),
    seed(GroupKind::Team, SYSTEM_ROLE_MEMBER, "Member", 200, TEAM_MEMBER, false),
    seed(GroupKind::Team, SYSTEM_ROLE_BEGINNER, "Beginner", 100, TEAM_BEGINNER, true),
    seed(GroupKind::Project, SYSTEM_ROLE_CREATOR, "Creator", 500, PROJECT_CREATOR, false),
    seed(GroupKind::Project, SYSTEM_ROLE_ADMIN, "Admin", 400, PROJECT_ADMIN, false),
    seed(GroupKind::Project, SYSTEM_ROLE_CHECKER, "Checker", 300, PROJECT_CHECKER, false),
    seed(
        GroupKind::Project,
        SYSTEM_ROLE_PROOFREADER,
        "Proofreader",
        250,
        PROJECT_PROOFREADER,
        false,
    ),
    seed(
        GroupKind::Project,
        SYSTEM_ROLE_TRANSLATOR,
        "Translator",
        200,
        PROJECT_TRANSLATOR,
        false,
    ),
    seed(
        GroupKind::Project,
        SYSTEM_ROLE_SUPPORTER,
        "Supporter",
        100,
        PROJECT_SUPPORTER,
        true,
    ),
];
