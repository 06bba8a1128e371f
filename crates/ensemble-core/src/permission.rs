use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Atomic capability flag. Which flags a group may use is decided by its
/// kind, see [`crate::GroupKind::permission_universe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Access,
    Delete,
    Change,
    CheckUser,
    InviteUser,
    DeleteUser,
    ChangeUserRole,
    CreateProject,
    CreateTermBank,
    AutoBecomeProjectAdmin,
    Finish,
    AddFile,
    DeleteFile,
    OutputTranslation,
    AddLabel,
    DeleteLabel,
    AddTranslation,
    ProofreadTranslation,
    CheckTranslation,
}

impl Permission {
    pub const ALL: [Self; 19] = [
        Self::Access,
        Self::Delete,
        Self::Change,
        Self::CheckUser,
        Self::InviteUser,
        Self::DeleteUser,
        Self::ChangeUserRole,
        Self::CreateProject,
        Self::CreateTermBank,
        Self::AutoBecomeProjectAdmin,
        Self::Finish,
        Self::AddFile,
        Self::DeleteFile,
        Self::OutputTranslation,
        Self::AddLabel,
        Self::DeleteLabel,
        Self::AddTranslation,
        Self::ProofreadTranslation,
        Self::CheckTranslation,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Delete => "delete",
            Self::Change => "change",
            Self::CheckUser => "check_user",
            Self::InviteUser => "invite_user",
            Self::DeleteUser => "delete_user",
            Self::ChangeUserRole => "change_user_role",
            Self::CreateProject => "create_project",
            Self::CreateTermBank => "create_term_bank",
            Self::AutoBecomeProjectAdmin => "auto_become_project_admin",
            Self::Finish => "finish",
            Self::AddFile => "add_file",
            Self::DeleteFile => "delete_file",
            Self::OutputTranslation => "output_translation",
            Self::AddLabel => "add_label",
            Self::DeleteLabel => "delete_label",
            Self::AddTranslation => "add_translation",
            Self::ProofreadTranslation => "proofread_translation",
            Self::CheckTranslation => "check_translation",
        }
    }

    const fn mask(self) -> u64 {
        1 << self as u64
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Permission {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| DomainError::UnknownPermission(value.to_owned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PermissionSet(u64);

impl PermissionSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn contains(self, permission: Permission) -> bool {
        self.0 & permission.mask() != 0
    }

    pub fn insert(&mut self, permission: Permission) {
        self.0 |= permission.mask();
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_subset_of(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Flags present in `self` but not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL
            .into_iter()
            .filter(move |permission| self.contains(*permission))
    }

    /// Parses wire names. Unknown names are rejected, not dropped.
    ///
    /// # Errors
    /// Returns [`DomainError::UnknownPermission`] for the first unknown name.
    pub fn try_from_names<I, S>(names: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::empty();
        for name in names {
            set.insert(Permission::try_from(name.as_ref())?);
        }
        Ok(set)
    }

    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(Permission::as_str).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        let mut set = Self::empty();
        for permission in iter {
            set.insert(permission);
        }
        set
    }
}

impl From<&[Permission]> for PermissionSet {
    fn from(value: &[Permission]) -> Self {
        value.iter().copied().collect()
    }
}
