use ensemble_core::{
    check_role_grant, DomainError, Group, GroupId, GroupKind, GroupScope, Permission,
    SYSTEM_ROLE_CREATOR, UserId,
};

use crate::server::{
    core::{AppState, Directory, GroupRecord, RuntimeConfig},
    errors::{DenyReason, Entity, GroupError},
    types::{GroupDraft, GroupPolicyUpdate},
};

/// Creates a team with `creator` as its only member, holding the creator role.
///
/// # Errors
/// Returns [`GroupError::NotFound`] for an unknown creator and
/// [`GroupError::InvalidRequest`] for an invalid policy or capacity.
pub async fn create_team(
    state: &AppState,
    creator: UserId,
    draft: GroupDraft,
) -> Result<Group, GroupError> {
    let mut directory = state.directory.write().await;
    create_group(&mut directory, &state.runtime, creator, GroupScope::Team, draft)
}

/// Creates a project under `team_id`. The creator needs `CreateProject` in
/// the team and becomes the project's creator.
///
/// # Errors
/// Returns [`GroupError::NotFound`] when the team is unknown and
/// [`GroupError::PermissionDenied`] without `CreateProject`.
pub async fn create_project(
    state: &AppState,
    creator: UserId,
    team_id: GroupId,
    draft: GroupDraft,
) -> Result<Group, GroupError> {
    let mut directory = state.directory.write().await;
    let team = directory
        .groups
        .get(&team_id)
        .filter(|group| group.kind() == GroupKind::Team)
        .ok_or(GroupError::NotFound(Entity::Group))?;
    directory.require_permission(creator, team, Permission::CreateProject)?;

    create_group(
        &mut directory,
        &state.runtime,
        creator,
        GroupScope::Project { team_id },
        draft,
    )
}

fn create_group(
    directory: &mut Directory,
    runtime: &RuntimeConfig,
    creator: UserId,
    scope: GroupScope,
    draft: GroupDraft,
) -> Result<Group, GroupError> {
    directory.user_record(creator)?;
    let kind = scope.kind();
    if !kind.accepts_allow_apply(draft.allow_apply_type) {
        return Err(DomainError::InvalidAllowApplyType.into());
    }
    let max_members = draft
        .max_members
        .unwrap_or_else(|| runtime.default_max_members(kind));
    if max_members == 0 {
        return Err(DomainError::InvalidMaxMembers.into());
    }
    let default_role = directory.default_system_role(kind)?.id;
    let creator_role = directory.system_role(kind, SYSTEM_ROLE_CREATOR)?.id;

    let record = GroupRecord::new(
        draft.name,
        draft.intro,
        scope,
        draft.allow_apply_type,
        draft.application_check_type,
        max_members,
        default_role,
    );
    let group_id = record.id;
    directory.groups.insert(group_id, record);
    tracing::info!(
        event = "group.created",
        kind = kind.as_str(),
        group_id = %group_id,
        creator = %creator
    );

    directory.join(creator, group_id, creator_role)?;
    Ok(directory.group_record(group_id)?.snapshot())
}

/// # Errors
/// Returns [`GroupError::NotFound`] for an unknown group.
pub async fn group(state: &AppState, group_id: GroupId) -> Result<Group, GroupError> {
    let directory = state.directory.read().await;
    Ok(directory.group_record(group_id)?.snapshot())
}

/// Whether the group reached its member limit.
///
/// # Errors
/// Returns [`GroupError::NotFound`] for an unknown group.
pub async fn is_full(state: &AppState, group_id: GroupId) -> Result<bool, GroupError> {
    let directory = state.directory.read().await;
    Ok(directory.group_record(group_id)?.is_full())
}

/// Changes the join policy of a group. Requires `Change`.
///
/// # Errors
/// Denies without `Change`, rejects `TeamUser` on a team and a zero
/// capacity. A new default role must be usable by the group, must not be
/// the creator role and must sit strictly below the operator without
/// carrying flags the operator lacks.
pub async fn update_group_policy(
    state: &AppState,
    group_id: GroupId,
    operator: UserId,
    update: GroupPolicyUpdate,
) -> Result<Group, GroupError> {
    let mut directory = state.directory.write().await;
    let group = directory.group_record(group_id)?;
    let operator_role = directory.require_permission(operator, group, Permission::Change)?;

    if let Some(allow_apply_type) = update.allow_apply_type {
        if !group.kind().accepts_allow_apply(allow_apply_type) {
            return Err(DomainError::InvalidAllowApplyType.into());
        }
    }
    if update.max_members == Some(0) {
        return Err(DomainError::InvalidMaxMembers.into());
    }
    if let Some(role_id) = update.default_role {
        let role = directory.usable_role(group, role_id)?;
        if role.is_creator() {
            return Err(GroupError::denied(DenyReason::CreatorRoleFixed));
        }
        check_role_grant(&operator_role, role.level, role.permissions)
            .map_err(|denial| GroupError::denied(denial.into()))?;
    }

    let Some(group) = directory.groups.get_mut(&group_id) else {
        return Err(GroupError::NotFound(Entity::Group));
    };
    if let Some(allow_apply_type) = update.allow_apply_type {
        group.allow_apply_type = allow_apply_type;
    }
    if let Some(application_check_type) = update.application_check_type {
        group.application_check_type = application_check_type;
    }
    if let Some(max_members) = update.max_members {
        group.max_members = max_members;
    }
    if let Some(role_id) = update.default_role {
        group.default_role = role_id;
    }

    tracing::info!(
        event = "group.policy_updated",
        group = %group.group_ref(),
        operator = %operator
    );
    Ok(group.snapshot())
}

/// Deletes a group with everything hanging off it. Requires `Delete`.
///
/// # Errors
/// Returns [`GroupError::NotFound`] for an unknown group and denies
/// without `Delete`.
pub async fn delete_group(
    state: &AppState,
    group_id: GroupId,
    operator: UserId,
) -> Result<(), GroupError> {
    let mut directory = state.directory.write().await;
    let group = directory.group_record(group_id)?;
    directory.require_permission(operator, group, Permission::Delete)?;
    cascade_delete_group(&mut directory, group_id);
    Ok(())
}

/// Removes a team's projects first, then the group's pending and finished
/// requests, memberships, custom roles and finally the group itself.
pub(crate) fn cascade_delete_group(directory: &mut Directory, group_id: GroupId) {
    let projects: Vec<GroupId> = directory
        .groups
        .values()
        .filter(|group| group.scope.team_id() == Some(group_id))
        .map(|group| group.id)
        .collect();
    for project_id in projects {
        cascade_delete_group(directory, project_id);
    }

    directory
        .invitations
        .retain(|_, invitation| invitation.group.id != group_id);
    directory
        .applications
        .retain(|_, application| application.group.id != group_id);

    let members: Vec<UserId> = directory
        .memberships
        .keys()
        .filter(|(_, member_group)| *member_group == group_id)
        .map(|(user_id, _)| *user_id)
        .collect();
    for user_id in &members {
        directory.remove_membership(*user_id, group_id);
    }

    let roles_before = directory.roles.len();
    directory
        .roles
        .retain(|_, role| role.owning_group != Some(group_id));
    let roles = roles_before - directory.roles.len();

    if let Some(group) = directory.groups.remove(&group_id) {
        tracing::info!(
            event = "group.deleted",
            group = %group.group_ref(),
            members = members.len(),
            roles
        );
    }
}
