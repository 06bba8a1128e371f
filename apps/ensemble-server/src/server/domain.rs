use std::collections::BTreeSet;

use ensemble_core::{
    Application, GroupId, GroupKind, Invitation, Membership, Role, RoleId, User, UserId,
};

mod applications;
mod authorization;
mod groups;
mod invitations;
mod members;
mod roles;
mod users;

pub use applications::{
    allow_application, apply, checkable_applications, delete_application, deny_application,
    group_applications, user_applications,
};
pub use authorization::{can, get_role, is_superior};
pub use groups::{create_project, create_team, delete_group, group, is_full, update_group_policy};
pub use invitations::{
    accept_invitation, cancel_invitation, change_invitation_role, deny_invitation,
    group_invitations, invite, user_invitations,
};
pub use members::{
    change_user_role, delete_user, group_users, leave_group, membership, user_groups,
    users_by_permission,
};
pub use roles::{create_role, delete_role, edit_role, group_roles};
pub use users::{register_user, user, user_by_email};

use super::{
    core::{now_unix, Directory, GroupRecord},
    errors::{Entity, GroupError},
};

impl Directory {
    pub(crate) fn group_record(&self, group_id: GroupId) -> Result<&GroupRecord, GroupError> {
        self.groups
            .get(&group_id)
            .ok_or(GroupError::NotFound(Entity::Group))
    }

    pub(crate) fn user_record(&self, user_id: UserId) -> Result<&User, GroupError> {
        self.users
            .get(&user_id)
            .ok_or(GroupError::NotFound(Entity::User))
    }

    pub(crate) fn role_record(&self, role_id: RoleId) -> Result<&Role, GroupError> {
        self.roles
            .get(&role_id)
            .ok_or(GroupError::NotFound(Entity::Role))
    }

    /// A system role of the group's kind or a custom role the group owns.
    pub(crate) fn usable_role(
        &self,
        group: &GroupRecord,
        role_id: RoleId,
    ) -> Result<&Role, GroupError> {
        self.roles
            .get(&role_id)
            .filter(|role| role.is_usable_in(group.group_ref()))
            .ok_or(GroupError::NotFound(Entity::Role))
    }

    /// Custom roles only; system roles are never edited or deleted.
    pub(crate) fn custom_role(
        &self,
        group: &GroupRecord,
        role_id: RoleId,
    ) -> Result<&Role, GroupError> {
        self.roles
            .get(&role_id)
            .filter(|role| !role.system && role.owning_group == Some(group.id))
            .ok_or(GroupError::NotFound(Entity::Role))
    }

    pub(crate) fn system_role(&self, kind: GroupKind, code: &str) -> Result<&Role, GroupError> {
        self.system_roles
            .get(&(kind, String::from(code)))
            .and_then(|id| self.roles.get(id))
            .ok_or(GroupError::NotFound(Entity::Role))
    }

    pub(crate) fn default_system_role(&self, kind: GroupKind) -> Result<&Role, GroupError> {
        self.default_system_roles
            .get(&kind)
            .and_then(|id| self.roles.get(id))
            .ok_or(GroupError::NotFound(Entity::Role))
    }

    pub(crate) fn direct_membership(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Option<&Membership> {
        self.memberships.get(&(user_id, group_id))
    }

    pub(crate) fn pending_invitation(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Option<&Invitation> {
        self.invitations.values().find(|invitation| {
            invitation.user_id == user_id && invitation.group.id == group_id && invitation.is_pending()
        })
    }

    pub(crate) fn pending_application(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Option<&Application> {
        self.applications.values().find(|application| {
            application.user_id == user_id
                && application.group.id == group_id
                && application.is_pending()
        })
    }

    /// Creates the membership. It needs a free seat and bumps the group's
    /// counter; pending invitations and applications for the same user and
    /// group are discarded.
    pub(crate) fn join(
        &mut self,
        user_id: UserId,
        group_id: GroupId,
        role_id: RoleId,
    ) -> Result<Membership, GroupError> {
        let group = self
            .groups
            .get(&group_id)
            .ok_or(GroupError::NotFound(Entity::Group))?;
        let key = (user_id, group_id);
        if self.memberships.contains_key(&key) {
            return Err(GroupError::AlreadyMember);
        }
        if group.is_full() {
            tracing::debug!(
                event = "membership.rejected",
                group = %group.group_ref(),
                user_id = %user_id,
                max_members = group.max_members
            );
            return Err(GroupError::CapacityExceeded);
        }

        let membership = Membership {
            user_id,
            group: group.group_ref(),
            role_id,
            tags: BTreeSet::new(),
            create_time: now_unix(),
        };
        let member_count = group.increment_members();
        tracing::info!(
            event = "membership.created",
            group = %group.group_ref(),
            user_id = %user_id,
            role_id = %role_id,
            member_count
        );

        self.memberships.insert(key, membership.clone());
        self.discard_pending_requests(user_id, group_id);
        Ok(membership)
    }

    pub(crate) fn remove_membership(
        &mut self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Option<Membership> {
        let removed = self.memberships.remove(&(user_id, group_id))?;
        if let Some(group) = self.groups.get(&group_id) {
            let member_count = group.decrement_members();
            tracing::info!(
                event = "membership.removed",
                group = %group.group_ref(),
                user_id = %user_id,
                member_count
            );
        }
        Some(removed)
    }

    fn discard_pending_requests(&mut self, user_id: UserId, group_id: GroupId) {
        let invitations_before = self.invitations.len();
        self.invitations.retain(|_, invitation| {
            !(invitation.user_id == user_id
                && invitation.group.id == group_id
                && invitation.is_pending())
        });
        let applications_before = self.applications.len();
        self.applications.retain(|_, application| {
            !(application.user_id == user_id
                && application.group.id == group_id
                && application.is_pending())
        });

        let invitations = invitations_before - self.invitations.len();
        let applications = applications_before - self.applications.len();
        if invitations + applications > 0 {
            tracing::debug!(
                event = "requests.discarded",
                group_id = %group_id,
                user_id = %user_id,
                invitations,
                applications
            );
        }
    }
}

#[cfg(test)]
mod tests;
