use crate::{GroupId, GroupKind, GroupRef, Intro, Permission, PermissionSet, RoleId, RoleName};

/// Stable code of the top system role of every kind.
pub const SYSTEM_ROLE_CREATOR: &str = "creator";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub kind: GroupKind,
    /// Verbatim for custom roles; a fallback for system roles, whose display
    /// name is looked up by `system_code`.
    pub name: RoleName,
    pub intro: Intro,
    pub level: i32,
    pub permissions: PermissionSet,
    pub system: bool,
    pub system_code: Option<String>,
    pub owning_group: Option<GroupId>,
}

impl Role {
    #[must_use]
    pub const fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    #[must_use]
    pub fn is_creator(&self) -> bool {
        self.system && self.system_code.as_deref() == Some(SYSTEM_ROLE_CREATOR)
    }

    /// System roles of the group's kind and custom roles owned by the group.
    #[must_use]
    pub fn is_usable_in(&self, group: GroupRef) -> bool {
        if self.kind != group.kind {
            return false;
        }
        if self.system {
            return true;
        }
        self.owning_group == Some(group.id)
    }
}

#[must_use]
pub const fn outranks(actor_level: i32, target_level: i32) -> bool {
    actor_level > target_level
}

/// Why an operator may not perform a hierarchy-guarded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyDenial {
    MissingPermission(Permission),
    LevelTooLow,
    PermissionExceedsOperator(PermissionSet),
    CreatorRoleFixed,
}

/// Operator holds `permission` and strictly outranks every level in `targets`.
///
/// # Errors
/// Returns the first rule the operator fails.
pub fn check_operator(
    operator: &Role,
    permission: Permission,
    targets: &[i32],
) -> Result<(), HierarchyDenial> {
    if !operator.has_permission(permission) {
        return Err(HierarchyDenial::MissingPermission(permission));
    }
    if targets
        .iter()
        .all(|target| outranks(operator.level, *target))
    {
        Ok(())
    } else {
        Err(HierarchyDenial::LevelTooLow)
    }
}

/// An operator may only shape a role strictly below its own level and
/// never with a flag it does not hold itself.
///
/// # Errors
/// Returns the first rule the requested role breaks.
pub fn check_role_grant(
    operator: &Role,
    level: i32,
    permissions: PermissionSet,
) -> Result<(), HierarchyDenial> {
    if !outranks(operator.level, level) {
        return Err(HierarchyDenial::LevelTooLow);
    }
    let extra = permissions.difference(operator.permissions);
    if !extra.is_empty() {
        return Err(HierarchyDenial::PermissionExceedsOperator(extra));
    }
    Ok(())
}

/// # Errors
/// Fails when either role is the creator role, the operator lacks
/// `ChangeUserRole`, or does not outrank both the current and the new role.
pub fn check_member_role_change(
    operator: &Role,
    current_target: &Role,
    new_target: &Role,
) -> Result<(), HierarchyDenial> {
    if current_target.is_creator() || new_target.is_creator() {
        return Err(HierarchyDenial::CreatorRoleFixed);
    }
    check_operator(
        operator,
        Permission::ChangeUserRole,
        &[current_target.level, new_target.level],
    )
}

/// # Errors
/// Fails when the target is the creator, the operator lacks `DeleteUser`,
/// or does not outrank the target.
pub fn check_member_removal(operator: &Role, target: &Role) -> Result<(), HierarchyDenial> {
    if target.is_creator() {
        return Err(HierarchyDenial::CreatorRoleFixed);
    }
    check_operator(operator, Permission::DeleteUser, &[target.level])
}
