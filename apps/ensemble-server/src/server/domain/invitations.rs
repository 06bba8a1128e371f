use ensemble_core::{
    check_operator, GroupId, GroupScope, Invitation, InvitationId, Membership, Permission,
    RequestMessage, RequestStatus, RoleId, UserId,
};

use super::applications::allow_pending_application;
use crate::server::{
    core::{now_unix, AppState, Directory},
    errors::{DenyReason, Entity, GroupError, RequestKind},
    types::{InviteOutcome, Page},
};

/// Invites `invitee` into a group with the offered role.
///
/// A pending application of the invitee is allowed on the spot instead, and
/// a member of a project's owning team joins the project directly. Anyone
/// else receives a pending invitation.
///
/// # Errors
/// Fails when the group is full, the inviter lacks `InviteUser` or does not
/// outrank the offered role, the invitee is already a member, or a pending
/// invitation exists.
pub async fn invite(
    state: &AppState,
    group_id: GroupId,
    inviter: UserId,
    invitee: UserId,
    role_id: RoleId,
    message: RequestMessage,
) -> Result<InviteOutcome, GroupError> {
    let mut directory = state.directory.write().await;
    let group = directory.group_record(group_id)?;
    directory.user_record(invitee)?;
    if group.is_full() {
        return Err(GroupError::CapacityExceeded);
    }
    let inviter_role = directory.require_permission(inviter, group, Permission::InviteUser)?;
    let role = directory.usable_role(group, role_id)?;
    check_operator(&inviter_role, Permission::InviteUser, &[role.level])
        .map_err(|denial| GroupError::denied(denial.into()))?;
    if directory.direct_membership(invitee, group_id).is_some() {
        return Err(GroupError::AlreadyMember);
    }
    if directory.pending_invitation(invitee, group_id).is_some() {
        return Err(GroupError::AlreadyExists(Entity::Invitation));
    }

    let group_ref = group.group_ref();
    let scope = group.scope;

    if let Some(application) = directory.pending_application(invitee, group_id).cloned() {
        let (application, membership) =
            allow_pending_application(&mut directory, &application, inviter, Some(role_id))?;
        return Ok(InviteOutcome::Joined {
            application,
            membership,
        });
    }

    if let GroupScope::Project { team_id } = scope {
        if directory.direct_membership(invitee, team_id).is_some() {
            let membership = directory.join(invitee, group_id, role_id)?;
            return Ok(InviteOutcome::JoinedViaTeam(membership));
        }
    }

    let invitation = Invitation {
        id: InvitationId::new(),
        user_id: invitee,
        operator_id: inviter,
        group: group_ref,
        role_id,
        status: RequestStatus::Pending,
        message,
        create_time: now_unix(),
    };
    directory
        .invitations
        .insert(invitation.id, invitation.clone());
    tracing::info!(
        event = "invitation.created",
        group = %group_ref,
        invitation_id = %invitation.id,
        user_id = %invitee,
        operator = %inviter
    );
    Ok(InviteOutcome::Invited(invitation))
}

/// Swaps the role offered by a pending invitation. The operator needs
/// `InviteUser` and must outrank both the old and the new role.
///
/// # Errors
/// Returns [`GroupError::Finished`] once the invitation was answered.
pub async fn change_invitation_role(
    state: &AppState,
    invitation_id: InvitationId,
    role_id: RoleId,
    operator: UserId,
) -> Result<Invitation, GroupError> {
    let mut directory = state.directory.write().await;
    let invitation = pending_invitation(&directory, invitation_id)?;
    let group = directory.group_record(invitation.group.id)?;
    let operator_role = directory.require_permission(operator, group, Permission::InviteUser)?;
    let current_role = directory.role_record(invitation.role_id)?;
    let new_role = directory.usable_role(group, role_id)?;
    check_operator(
        &operator_role,
        Permission::InviteUser,
        &[current_role.level, new_role.level],
    )
    .map_err(|denial| GroupError::denied(denial.into()))?;

    let updated = invitation
        .with_role(role_id)
        .map_err(GroupError::finished(RequestKind::Invitation))?;
    directory.invitations.insert(updated.id, updated.clone());
    tracing::info!(
        event = "invitation.role_changed",
        invitation_id = %invitation_id,
        role_id = %role_id,
        operator = %operator
    );
    Ok(updated)
}

/// Accepts an invitation on behalf of the invitee.
///
/// # Errors
/// Denies anyone but the invitee and returns [`GroupError::Finished`] once
/// answered or [`GroupError::CapacityExceeded`] when the group filled up.
pub async fn accept_invitation(
    state: &AppState,
    invitation_id: InvitationId,
    caller: UserId,
) -> Result<Membership, GroupError> {
    let mut directory = state.directory.write().await;
    let invitation = invitee_invitation(&directory, invitation_id, caller)?;
    let (_, membership) = accept_pending_invitation(&mut directory, &invitation)?;
    Ok(membership)
}

/// Declines an invitation on behalf of the invitee.
///
/// # Errors
/// Denies anyone but the invitee and returns [`GroupError::Finished`] once
/// answered.
pub async fn deny_invitation(
    state: &AppState,
    invitation_id: InvitationId,
    caller: UserId,
) -> Result<Invitation, GroupError> {
    let mut directory = state.directory.write().await;
    let invitation = invitee_invitation(&directory, invitation_id, caller)?;
    let denied = invitation
        .resolved(RequestStatus::Deny)
        .map_err(GroupError::finished(RequestKind::Invitation))?;
    directory.invitations.insert(denied.id, denied.clone());
    tracing::info!(
        event = "invitation.denied",
        group = %denied.group,
        invitation_id = %invitation_id,
        user_id = %caller
    );
    Ok(denied)
}

/// Withdraws a pending invitation. The operator needs `InviteUser` and must
/// outrank the offered role.
///
/// # Errors
/// Returns [`GroupError::Finished`] once answered and denies per the rules
/// above.
pub async fn cancel_invitation(
    state: &AppState,
    invitation_id: InvitationId,
    operator: UserId,
) -> Result<(), GroupError> {
    let mut directory = state.directory.write().await;
    let invitation = pending_invitation(&directory, invitation_id)?;
    let group = directory.group_record(invitation.group.id)?;
    let operator_role = directory.require_permission(operator, group, Permission::InviteUser)?;
    let offered = directory.role_record(invitation.role_id)?;
    check_operator(&operator_role, Permission::InviteUser, &[offered.level])
        .map_err(|denial| GroupError::denied(denial.into()))?;

    directory.invitations.remove(&invitation_id);
    tracing::info!(
        event = "invitation.cancelled",
        group = %invitation.group,
        invitation_id = %invitation_id,
        operator = %operator
    );
    Ok(())
}

/// Invitations addressed to a user, newest first.
pub async fn user_invitations(
    state: &AppState,
    user_id: UserId,
    status: Option<RequestStatus>,
    page: Page,
) -> Vec<Invitation> {
    let directory = state.directory.read().await;
    let invitations = sorted_invitations(&directory, |invitation| {
        invitation.user_id == user_id && status.is_none_or(|status| invitation.status == status)
    });
    state.runtime.paginate(invitations, page)
}

/// Invitations sent by a group, newest first. Requires `InviteUser`.
///
/// # Errors
/// Returns [`GroupError::NotFound`] for an unknown group and denies without
/// `InviteUser`.
pub async fn group_invitations(
    state: &AppState,
    group_id: GroupId,
    operator: UserId,
    status: Option<RequestStatus>,
    page: Page,
) -> Result<Vec<Invitation>, GroupError> {
    let directory = state.directory.read().await;
    let group = directory.group_record(group_id)?;
    directory.require_permission(operator, group, Permission::InviteUser)?;
    let invitations = sorted_invitations(&directory, |invitation| {
        invitation.group.id == group_id && status.is_none_or(|status| invitation.status == status)
    });
    Ok(state.runtime.paginate(invitations, page))
}

/// Resolves the invitation as allowed and creates the membership it offers.
pub(crate) fn accept_pending_invitation(
    directory: &mut Directory,
    invitation: &Invitation,
) -> Result<(Invitation, Membership), GroupError> {
    let accepted = invitation
        .resolved(RequestStatus::Allow)
        .map_err(GroupError::finished(RequestKind::Invitation))?;
    let membership = directory.join(invitation.user_id, invitation.group.id, invitation.role_id)?;
    directory.invitations.insert(accepted.id, accepted.clone());
    tracing::info!(
        event = "invitation.accepted",
        group = %accepted.group,
        invitation_id = %accepted.id,
        user_id = %accepted.user_id
    );
    Ok((accepted, membership))
}

fn pending_invitation(
    directory: &Directory,
    invitation_id: InvitationId,
) -> Result<Invitation, GroupError> {
    let invitation = directory
        .invitations
        .get(&invitation_id)
        .ok_or(GroupError::NotFound(Entity::Invitation))?;
    invitation
        .ensure_pending()
        .map_err(GroupError::finished(RequestKind::Invitation))?;
    Ok(invitation.clone())
}

fn invitee_invitation(
    directory: &Directory,
    invitation_id: InvitationId,
    caller: UserId,
) -> Result<Invitation, GroupError> {
    let invitation = directory
        .invitations
        .get(&invitation_id)
        .ok_or(GroupError::NotFound(Entity::Invitation))?;
    if invitation.user_id != caller {
        return Err(GroupError::denied(DenyReason::NotInvitee));
    }
    invitation
        .ensure_pending()
        .map_err(GroupError::finished(RequestKind::Invitation))?;
    Ok(invitation.clone())
}

fn sorted_invitations(
    directory: &Directory,
    keep: impl Fn(&Invitation) -> bool,
) -> Vec<Invitation> {
    let mut invitations: Vec<Invitation> = directory
        .invitations
        .values()
        .filter(|&invitation| keep(invitation))
        .cloned()
        .collect();
    invitations.sort_by(|a, b| b.create_time.cmp(&a.create_time).then(b.id.cmp(&a.id)));
    invitations
}
