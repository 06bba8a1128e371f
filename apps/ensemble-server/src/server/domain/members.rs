use std::collections::BTreeSet;

use ensemble_core::{
    check_member_removal, check_member_role_change, Group, GroupId, GroupKind, Membership,
    Permission, Role, RoleId, User, UserId,
};

use crate::server::{
    core::{AppState, Directory, GroupRecord},
    errors::{DenyReason, Entity, GroupError},
    types::{MemberQuery, Page},
};

impl Directory {
    /// Members whose effective role carries `permission`, including team
    /// members inheriting the project admin role.
    pub(crate) fn members_with_permission(
        &self,
        group_id: GroupId,
        permission: Permission,
    ) -> BTreeSet<UserId> {
        let Some(group) = self.groups.get(&group_id) else {
            return BTreeSet::new();
        };
        let mut candidates: BTreeSet<UserId> = self
            .memberships
            .keys()
            .filter(|(_, member_group)| *member_group == group_id)
            .map(|(user_id, _)| *user_id)
            .collect();
        if let Some(team_id) = group.scope.team_id() {
            candidates.extend(
                self.memberships
                    .keys()
                    .filter(|(_, member_group)| *member_group == team_id)
                    .map(|(user_id, _)| *user_id),
            );
        }
        candidates
            .into_iter()
            .filter(|user_id| {
                self.resolve_role(*user_id, group)
                    .is_some_and(|role| role.has_permission(permission))
            })
            .collect()
    }
}

/// Direct members of a group, oldest first, filtered by role and name.
///
/// # Errors
/// Returns [`GroupError::NotFound`] for an unknown group.
pub async fn group_users(
    state: &AppState,
    group_id: GroupId,
    query: MemberQuery,
) -> Result<Vec<User>, GroupError> {
    let directory = state.directory.read().await;
    directory.group_record(group_id)?;
    let word = query
        .word
        .as_deref()
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase);

    let mut members: Vec<(&Membership, &User)> = directory
        .memberships
        .values()
        .filter(|membership| membership.group.id == group_id)
        .filter(|membership| query.roles.is_empty() || query.roles.contains(&membership.role_id))
        .filter_map(|membership| {
            directory
                .users
                .get(&membership.user_id)
                .map(|user| (membership, user))
        })
        .filter(|(_, user)| {
            word.as_ref()
                .is_none_or(|word| user.name.as_str().to_lowercase().contains(word.as_str()))
        })
        .collect();
    members.sort_by_key(|(membership, user)| (membership.create_time, user.id));

    let users = members.into_iter().map(|(_, user)| user.clone()).collect();
    Ok(state.runtime.paginate(users, query.page))
}

/// Members whose effective role carries `permission`.
///
/// # Errors
/// Returns [`GroupError::NotFound`] for an unknown group.
pub async fn users_by_permission(
    state: &AppState,
    group_id: GroupId,
    permission: Permission,
) -> Result<Vec<User>, GroupError> {
    let directory = state.directory.read().await;
    directory.group_record(group_id)?;
    Ok(directory
        .members_with_permission(group_id, permission)
        .into_iter()
        .filter_map(|user_id| directory.users.get(&user_id).cloned())
        .collect())
}

/// Direct membership of a user, if any.
///
/// # Errors
/// Returns [`GroupError::NotFound`] for an unknown group.
pub async fn membership(
    state: &AppState,
    user_id: UserId,
    group_id: GroupId,
) -> Result<Option<Membership>, GroupError> {
    let directory = state.directory.read().await;
    directory.group_record(group_id)?;
    Ok(directory.direct_membership(user_id, group_id).cloned())
}

/// Moves a member to another role of the group.
///
/// An operator needs `ChangeUserRole`, may not target themselves and must
/// outrank both the current and the new role. The creator role is never
/// given or taken this way.
///
/// # Errors
/// Returns [`GroupError::NotFound`] when the target is not a member or the
/// role is not usable in the group, and denies per the rules above.
pub async fn change_user_role(
    state: &AppState,
    group_id: GroupId,
    target: UserId,
    role_id: RoleId,
    operator: Option<UserId>,
) -> Result<Role, GroupError> {
    let mut directory = state.directory.write().await;
    let group = directory.group_record(group_id)?;
    let current = directory
        .direct_membership(target, group_id)
        .ok_or(GroupError::NotFound(Entity::Membership))?;
    let current_role = directory.role_record(current.role_id)?;
    let new_role = directory.usable_role(group, role_id)?;

    if current_role.is_creator() || new_role.is_creator() {
        return Err(GroupError::denied(DenyReason::CreatorRoleFixed));
    }
    if let Some(operator) = operator {
        if operator == target {
            return Err(GroupError::denied(DenyReason::SelfTarget));
        }
        let operator_role = directory.require_role(operator, group)?;
        check_member_role_change(&operator_role, current_role, new_role)
            .map_err(|denial| GroupError::denied(denial.into()))?;
    }

    let new_role = new_role.clone();
    let group_ref = group.group_ref();
    let Some(membership) = directory.memberships.get_mut(&(target, group_id)) else {
        return Err(GroupError::NotFound(Entity::Membership));
    };
    membership.role_id = new_role.id;
    tracing::info!(
        event = "membership.role_changed",
        group = %group_ref,
        user_id = %target,
        role_id = %new_role.id,
        operator = ?operator
    );
    Ok(new_role)
}

/// Removes a member. Removing oneself is always allowed, except for the
/// creator, who can never be removed. Removing someone else needs
/// `DeleteUser` and a role above the target's.
///
/// # Errors
/// Returns [`GroupError::NotFound`] when the target is not a member,
/// [`GroupError::CreatorCanNotLeave`] for the creator, and denies per the
/// rules above.
pub async fn delete_user(
    state: &AppState,
    group_id: GroupId,
    target: UserId,
    operator: Option<UserId>,
) -> Result<(), GroupError> {
    let mut directory = state.directory.write().await;
    let group = directory.group_record(group_id)?;
    let membership = directory
        .direct_membership(target, group_id)
        .ok_or(GroupError::NotFound(Entity::Membership))?;
    let target_role = directory.role_record(membership.role_id)?;
    if target_role.is_creator() {
        return Err(GroupError::CreatorCanNotLeave);
    }
    if let Some(operator) = operator.filter(|operator| *operator != target) {
        let operator_role = directory.require_role(operator, group)?;
        check_member_removal(&operator_role, target_role)
            .map_err(|denial| GroupError::denied(denial.into()))?;
    }

    directory.remove_membership(target, group_id);
    Ok(())
}

/// Removes the caller from the group.
///
/// # Errors
/// As [`delete_user`] with the caller as both operator and target.
pub async fn leave_group(
    state: &AppState,
    group_id: GroupId,
    user_id: UserId,
) -> Result<(), GroupError> {
    delete_user(state, group_id, user_id, Some(user_id)).await
}

/// Groups the user directly belongs to, oldest membership first.
pub async fn user_groups(
    state: &AppState,
    user_id: UserId,
    kind: Option<GroupKind>,
    page: Page,
) -> Vec<Group> {
    let directory = state.directory.read().await;
    let mut memberships: Vec<&Membership> = directory
        .memberships
        .values()
        .filter(|membership| membership.user_id == user_id)
        .filter(|membership| kind.is_none_or(|kind| membership.group.kind == kind))
        .collect();
    memberships.sort_by_key(|membership| (membership.create_time, membership.group.id));

    let groups = memberships
        .into_iter()
        .filter_map(|membership| directory.groups.get(&membership.group.id))
        .map(GroupRecord::snapshot)
        .collect();
    state.runtime.paginate(groups, page)
}
