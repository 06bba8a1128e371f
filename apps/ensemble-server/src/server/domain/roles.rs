use std::cmp::Reverse;

use ensemble_core::{check_role_grant, outranks, GroupId, Role, RoleId, UserId};

use crate::server::{
    core::{AppState, Directory, GroupRecord},
    errors::{DenyReason, GroupError},
    types::RoleDraft,
};

/// Adds a custom role to a group.
///
/// Without an operator only the kind's permission universe is enforced.
/// With one, the new role must sit strictly below the operator and may not
/// carry a flag the operator lacks.
///
/// # Errors
/// Returns [`GroupError::InvalidPermissionSet`] for flags outside the kind
/// and denies when the operator's role is not high enough.
pub async fn create_role(
    state: &AppState,
    group_id: GroupId,
    draft: RoleDraft,
    operator: Option<UserId>,
) -> Result<Role, GroupError> {
    let mut directory = state.directory.write().await;
    let group = directory.group_record(group_id)?;
    check_draft(&directory, group, &draft, operator, None)?;

    let role = Role {
        id: RoleId::new(),
        kind: group.kind(),
        name: draft.name,
        intro: draft.intro,
        level: draft.level,
        permissions: draft.permissions,
        system: false,
        system_code: None,
        owning_group: Some(group_id),
    };
    tracing::info!(
        event = "role.created",
        group = %group.group_ref(),
        role_id = %role.id,
        level = role.level
    );
    directory.roles.insert(role.id, role.clone());
    Ok(role)
}

/// Replaces a custom role's attributes. The operator must also outrank the
/// role as it stands.
///
/// # Errors
/// Returns [`GroupError::NotFound`] for system roles and roles of other
/// groups; otherwise as [`create_role`].
pub async fn edit_role(
    state: &AppState,
    group_id: GroupId,
    role_id: RoleId,
    draft: RoleDraft,
    operator: Option<UserId>,
) -> Result<Role, GroupError> {
    let mut directory = state.directory.write().await;
    let group = directory.group_record(group_id)?;
    let existing = directory.custom_role(group, role_id)?;
    check_draft(&directory, group, &draft, operator, Some(existing))?;

    let edited = Role {
        name: draft.name,
        intro: draft.intro,
        level: draft.level,
        permissions: draft.permissions,
        ..existing.clone()
    };
    tracing::info!(
        event = "role.edited",
        group = %group.group_ref(),
        role_id = %role_id,
        level = edited.level
    );
    directory.roles.insert(role_id, edited.clone());
    Ok(edited)
}

/// Deletes a custom role. Members holding it, pending invitations offering
/// it and a group default pointing at it all fall back to the kind's
/// default system role.
///
/// # Errors
/// Returns [`GroupError::NotFound`] for system roles and roles of other
/// groups, and denies an operator who does not outrank the role.
pub async fn delete_role(
    state: &AppState,
    group_id: GroupId,
    role_id: RoleId,
    operator: Option<UserId>,
) -> Result<(), GroupError> {
    let mut directory = state.directory.write().await;
    let group = directory.group_record(group_id)?;
    let role = directory.custom_role(group, role_id)?;
    if let Some(operator) = operator {
        let operator_role = directory.require_role(operator, group)?;
        if !outranks(operator_role.level, role.level) {
            return Err(GroupError::denied(DenyReason::LevelTooLow));
        }
    }
    let fallback = directory.default_system_role(group.kind())?.id;
    let group_ref = group.group_ref();

    let mut reassigned = 0_usize;
    for membership in directory.memberships.values_mut() {
        if membership.group.id == group_id && membership.role_id == role_id {
            membership.role_id = fallback;
            reassigned += 1;
        }
    }
    for invitation in directory.invitations.values_mut() {
        if invitation.group.id == group_id && invitation.is_pending() && invitation.role_id == role_id
        {
            invitation.role_id = fallback;
        }
    }
    if let Some(group) = directory.groups.get_mut(&group_id) {
        if group.default_role == role_id {
            group.default_role = fallback;
        }
    }
    directory.roles.remove(&role_id);

    tracing::info!(
        event = "role.deleted",
        group = %group_ref,
        role_id = %role_id,
        reassigned
    );
    Ok(())
}

/// Roles a group may assign, highest level first. System roles are included
/// when `with_system` is set.
///
/// # Errors
/// Returns [`GroupError::NotFound`] for an unknown group.
pub async fn group_roles(
    state: &AppState,
    group_id: GroupId,
    with_system: bool,
) -> Result<Vec<Role>, GroupError> {
    let directory = state.directory.read().await;
    let group = directory.group_record(group_id)?;
    let mut roles: Vec<Role> = directory
        .roles
        .values()
        .filter(|role| role.is_usable_in(group.group_ref()) && (with_system || !role.system))
        .cloned()
        .collect();
    roles.sort_by_key(|role| (Reverse(role.level), role.name.as_str().to_owned()));
    Ok(roles)
}

fn check_draft(
    directory: &Directory,
    group: &GroupRecord,
    draft: &RoleDraft,
    operator: Option<UserId>,
    existing: Option<&Role>,
) -> Result<(), GroupError> {
    let foreign = group.kind().foreign_permissions(draft.permissions);
    if !foreign.is_empty() {
        return Err(GroupError::InvalidPermissionSet(foreign));
    }
    let Some(operator) = operator else {
        return Ok(());
    };

    let operator_role = directory.require_role(operator, group)?;
    if let Some(existing) = existing {
        if !outranks(operator_role.level, existing.level) {
            return Err(GroupError::denied(DenyReason::LevelTooLow));
        }
    }
    check_role_grant(&operator_role, draft.level, draft.permissions).map_err(|denial| {
        tracing::debug!(
            event = "role.grant_denied",
            group = %group.group_ref(),
            operator = %operator,
            level = draft.level
        );
        GroupError::denied(denial.into())
    })
}
