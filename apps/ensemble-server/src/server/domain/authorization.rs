use ensemble_core::{outranks, GroupId, GroupKind, GroupScope, Permission, Role, UserId};

use crate::server::{
    core::{AppState, Directory, GroupRecord},
    errors::{DenyReason, GroupError},
    permissions::PROJECT_ROLE_FROM_TEAM,
};

impl Directory {
    /// Effective role of `user_id` in `group`.
    ///
    /// A direct membership wins. Otherwise a project member of the owning
    /// team whose team role carries `AutoBecomeProjectAdmin` is treated as
    /// holding the project admin role.
    pub(crate) fn resolve_role(&self, user_id: UserId, group: &GroupRecord) -> Option<&Role> {
        if let Some(membership) = self.direct_membership(user_id, group.id) {
            return self.roles.get(&membership.role_id);
        }
        match group.scope {
            GroupScope::Team => None,
            GroupScope::Project { team_id } => self.inherited_project_role(user_id, team_id),
        }
    }

    fn inherited_project_role(&self, user_id: UserId, team_id: GroupId) -> Option<&Role> {
        let team_role = self.team_role(user_id, team_id)?;
        if !team_role.has_permission(Permission::AutoBecomeProjectAdmin) {
            return None;
        }
        self.system_role(GroupKind::Project, PROJECT_ROLE_FROM_TEAM).ok()
    }

    pub(crate) fn team_role(&self, user_id: UserId, team_id: GroupId) -> Option<&Role> {
        let membership = self.direct_membership(user_id, team_id)?;
        self.roles.get(&membership.role_id)
    }

    /// # Errors
    /// Denies with [`DenyReason::NotMember`] when the user holds no role.
    pub(crate) fn require_role(
        &self,
        user_id: UserId,
        group: &GroupRecord,
    ) -> Result<Role, GroupError> {
        self.resolve_role(user_id, group).cloned().ok_or_else(|| {
            tracing::debug!(
                event = "authorization.denied",
                group = %group.group_ref(),
                user_id = %user_id,
                reason = "not_member"
            );
            GroupError::denied(DenyReason::NotMember)
        })
    }

    /// # Errors
    /// Denies when the user holds no role or the role lacks `permission`.
    pub(crate) fn require_permission(
        &self,
        user_id: UserId,
        group: &GroupRecord,
        permission: Permission,
    ) -> Result<Role, GroupError> {
        let role = self.require_role(user_id, group)?;
        if role.has_permission(permission) {
            return Ok(role);
        }
        tracing::debug!(
            event = "authorization.denied",
            group = %group.group_ref(),
            user_id = %user_id,
            permission = %permission
        );
        Err(GroupError::denied(DenyReason::MissingPermission(permission)))
    }
}

/// Effective role of a user in a group, or `None` for non-members and
/// unknown groups.
pub async fn get_role(state: &AppState, user_id: UserId, group_id: GroupId) -> Option<Role> {
    let directory = state.directory.read().await;
    let group = directory.groups.get(&group_id)?;
    directory.resolve_role(user_id, group).cloned()
}

pub async fn can(
    state: &AppState,
    user_id: UserId,
    group_id: GroupId,
    permission: Permission,
) -> bool {
    get_role(state, user_id, group_id)
        .await
        .is_some_and(|role| role.has_permission(permission))
}

/// Whether `user_id` strictly outranks `other_id` in the group. Both users
/// need an effective role there.
pub async fn is_superior(
    state: &AppState,
    user_id: UserId,
    other_id: UserId,
    group_id: GroupId,
) -> bool {
    let directory = state.directory.read().await;
    let Some(group) = directory.groups.get(&group_id) else {
        return false;
    };
    match (
        directory.resolve_role(user_id, group),
        directory.resolve_role(other_id, group),
    ) {
        (Some(role), Some(other)) => outranks(role.level, other.level),
        _ => false,
    }
}
