use ensemble_core::{
    AllowApplyType, Application, ApplicationCheckType, ApplicationId, GroupId, GroupKind,
    GroupScope, Membership, Permission, RequestMessage, RequestStatus, RoleId, UserId,
};

use super::invitations::accept_pending_invitation;
use crate::server::{
    core::{now_unix, AppState, Directory, GroupRecord},
    errors::{DenyReason, Entity, GroupError, RequestKind},
    permissions::PROJECT_ROLE_FROM_TEAM,
    types::{ApplyOutcome, Page},
};

/// Files an application to join a group.
///
/// Team members whose team role grants project admin join a project as
/// admins at once. A pending invitation is accepted instead of applying.
/// Groups that need no review admit the applicant immediately; everyone else
/// waits for a reviewer holding `CheckUser`.
///
/// # Errors
/// Fails when the group is full, the applicant is already a member or has a
/// pending application, or the group's policy does not admit them.
pub async fn apply(
    state: &AppState,
    group_id: GroupId,
    applicant: UserId,
    message: RequestMessage,
) -> Result<ApplyOutcome, GroupError> {
    let mut directory = state.directory.write().await;
    let group = directory.group_record(group_id)?;
    directory.user_record(applicant)?;
    if group.is_full() {
        return Err(GroupError::CapacityExceeded);
    }
    if directory.direct_membership(applicant, group_id).is_some() {
        return Err(GroupError::AlreadyMember);
    }

    if let GroupScope::Project { team_id } = group.scope {
        let becomes_admin = directory
            .team_role(applicant, team_id)
            .is_some_and(|role| role.has_permission(Permission::AutoBecomeProjectAdmin));
        if becomes_admin {
            let admin = directory
                .system_role(GroupKind::Project, PROJECT_ROLE_FROM_TEAM)?
                .id;
            let membership = directory.join(applicant, group_id, admin)?;
            return Ok(ApplyOutcome::JoinedAsAdmin(membership));
        }
    }

    if directory.pending_application(applicant, group_id).is_some() {
        return Err(GroupError::AlreadyExists(Entity::Application));
    }
    if let Some(invitation) = directory.pending_invitation(applicant, group_id).cloned() {
        let (invitation, membership) = accept_pending_invitation(&mut directory, &invitation)?;
        return Ok(ApplyOutcome::JoinedViaInvitation {
            invitation,
            membership,
        });
    }

    let group = directory.group_record(group_id)?;
    ensure_apply_allowed(&directory, group, applicant)?;
    let check_type = group.application_check_type;
    let group_ref = group.group_ref();

    let application = Application {
        id: ApplicationId::new(),
        user_id: applicant,
        operator_id: None,
        group: group_ref,
        status: RequestStatus::Pending,
        message,
        checker_user_ids: directory.members_with_permission(group_id, Permission::CheckUser),
        create_time: now_unix(),
    };
    directory
        .applications
        .insert(application.id, application.clone());
    tracing::info!(
        event = "application.created",
        group = %group_ref,
        application_id = %application.id,
        user_id = %applicant,
        checkers = application.checker_user_ids.len()
    );

    match check_type {
        ApplicationCheckType::AdminCheck => Ok(ApplyOutcome::Applied(application)),
        ApplicationCheckType::NoNeedCheck => {
            let (application, membership) =
                allow_pending_application(&mut directory, &application, applicant, None)?;
            Ok(ApplyOutcome::Joined {
                application,
                membership,
            })
        }
    }
}

/// Admits the applicant with the group's default role. Requires `CheckUser`.
///
/// # Errors
/// Returns [`GroupError::Finished`] once reviewed,
/// [`GroupError::CapacityExceeded`] when the group filled up, and denies
/// without `CheckUser`.
pub async fn allow_application(
    state: &AppState,
    application_id: ApplicationId,
    operator: UserId,
) -> Result<Membership, GroupError> {
    let mut directory = state.directory.write().await;
    let application = reviewable_application(&directory, application_id, operator)?;
    let (_, membership) =
        allow_pending_application(&mut directory, &application, operator, None)?;
    Ok(membership)
}

/// Rejects an application. Requires `CheckUser`.
///
/// # Errors
/// Returns [`GroupError::Finished`] once reviewed and denies without
/// `CheckUser`.
pub async fn deny_application(
    state: &AppState,
    application_id: ApplicationId,
    operator: UserId,
) -> Result<Application, GroupError> {
    let mut directory = state.directory.write().await;
    let application = reviewable_application(&directory, application_id, operator)?;
    let denied = application
        .resolved(RequestStatus::Deny, operator)
        .map_err(GroupError::finished(RequestKind::Application))?;
    directory.applications.insert(denied.id, denied.clone());
    tracing::info!(
        event = "application.denied",
        group = %denied.group,
        application_id = %application_id,
        operator = %operator
    );
    Ok(denied)
}

/// Withdraws a pending application. Only the applicant may do so.
///
/// # Errors
/// Denies anyone but the applicant and returns [`GroupError::Finished`] once
/// reviewed.
pub async fn delete_application(
    state: &AppState,
    application_id: ApplicationId,
    caller: UserId,
) -> Result<(), GroupError> {
    let mut directory = state.directory.write().await;
    let application = directory
        .applications
        .get(&application_id)
        .ok_or(GroupError::NotFound(Entity::Application))?;
    if application.user_id != caller {
        return Err(GroupError::denied(DenyReason::NotApplicant));
    }
    application
        .ensure_pending()
        .map_err(GroupError::finished(RequestKind::Application))?;

    directory.applications.remove(&application_id);
    tracing::info!(
        event = "application.withdrawn",
        application_id = %application_id,
        user_id = %caller
    );
    Ok(())
}

/// Applications filed by a user, newest first.
pub async fn user_applications(
    state: &AppState,
    user_id: UserId,
    status: Option<RequestStatus>,
    page: Page,
) -> Vec<Application> {
    let directory = state.directory.read().await;
    let applications = sorted_applications(&directory, |application| {
        application.user_id == user_id && status.is_none_or(|status| application.status == status)
    });
    state.runtime.paginate(applications, page)
}

/// Applications the user was listed as a reviewer for when they were filed.
pub async fn checkable_applications(
    state: &AppState,
    checker: UserId,
    status: Option<RequestStatus>,
    page: Page,
) -> Vec<Application> {
    let directory = state.directory.read().await;
    let applications = sorted_applications(&directory, |application| {
        application.checker_user_ids.contains(&checker)
            && status.is_none_or(|status| application.status == status)
    });
    state.runtime.paginate(applications, page)
}

/// Applications filed to a group, newest first. Requires `CheckUser`.
///
/// # Errors
/// Returns [`GroupError::NotFound`] for an unknown group and denies without
/// `CheckUser`.
pub async fn group_applications(
    state: &AppState,
    group_id: GroupId,
    operator: UserId,
    status: Option<RequestStatus>,
    page: Page,
) -> Result<Vec<Application>, GroupError> {
    let directory = state.directory.read().await;
    let group = directory.group_record(group_id)?;
    directory.require_permission(operator, group, Permission::CheckUser)?;
    let applications = sorted_applications(&directory, |application| {
        application.group.id == group_id
            && status.is_none_or(|status| application.status == status)
    });
    Ok(state.runtime.paginate(applications, page))
}

/// Resolves the application as allowed and admits the applicant with `role`,
/// or the group's default role.
pub(crate) fn allow_pending_application(
    directory: &mut Directory,
    application: &Application,
    operator: UserId,
    role: Option<RoleId>,
) -> Result<(Application, Membership), GroupError> {
    let allowed = application
        .resolved(RequestStatus::Allow, operator)
        .map_err(GroupError::finished(RequestKind::Application))?;
    let role_id = match role {
        Some(role_id) => role_id,
        None => directory.group_record(application.group.id)?.default_role,
    };
    let membership = directory.join(application.user_id, application.group.id, role_id)?;
    directory.applications.insert(allowed.id, allowed.clone());
    tracing::info!(
        event = "application.allowed",
        group = %allowed.group,
        application_id = %allowed.id,
        user_id = %allowed.user_id,
        operator = %operator
    );
    Ok((allowed, membership))
}

fn ensure_apply_allowed(
    directory: &Directory,
    group: &GroupRecord,
    applicant: UserId,
) -> Result<(), GroupError> {
    let reason = match (group.allow_apply_type, group.scope) {
        (AllowApplyType::All, _) => return Ok(()),
        (AllowApplyType::TeamUser, GroupScope::Project { team_id }) => {
            if directory.direct_membership(applicant, team_id).is_some() {
                return Ok(());
            }
            DenyReason::NotTeamMember
        }
        (AllowApplyType::None | AllowApplyType::TeamUser, _) => DenyReason::ApplyDisabled,
    };
    tracing::debug!(
        event = "application.rejected",
        group = %group.group_ref(),
        user_id = %applicant,
        allow_apply_type = group.allow_apply_type.as_str()
    );
    Err(GroupError::denied(reason))
}

fn reviewable_application(
    directory: &Directory,
    application_id: ApplicationId,
    operator: UserId,
) -> Result<Application, GroupError> {
    let application = directory
        .applications
        .get(&application_id)
        .ok_or(GroupError::NotFound(Entity::Application))?;
    application
        .ensure_pending()
        .map_err(GroupError::finished(RequestKind::Application))?;
    let group = directory.group_record(application.group.id)?;
    directory.require_permission(operator, group, Permission::CheckUser)?;
    Ok(application.clone())
}

fn sorted_applications(
    directory: &Directory,
    keep: impl Fn(&Application) -> bool,
) -> Vec<Application> {
    let mut applications: Vec<Application> = directory
        .applications
        .values()
        .filter(|&application| keep(application))
        .cloned()
        .collect();
    applications.sort_by(|a, b| b.create_time.cmp(&a.create_time).then(b.id.cmp(&a.id)));
    applications
}
