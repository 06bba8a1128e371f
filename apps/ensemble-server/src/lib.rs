#![forbid(unsafe_code)]

mod server;

pub use server::{
    accept_invitation, allow_application, application_view, apply, build_router, can,
    cancel_invitation, change_invitation_role, change_user_role, checkable_applications,
    create_project, create_role, create_team, delete_application, delete_group, delete_role,
    delete_user, deny_application, deny_invitation, edit_role, get_role, group,
    group_applications, group_invitations, group_roles, group_users, group_view, init_tracing,
    invitation_view, invite, is_full, is_superior, leave_group, membership, membership_view,
    register_user, role_view, router_with_state, update_group_policy, user, user_applications,
    user_by_email, user_groups, user_invitations, users_by_permission, AppConfig, AppState,
    ApplyOutcome, DenyReason, Entity, GroupDraft, GroupError, GroupPolicyUpdate, InviteOutcome,
    MemberQuery, MessageCatalog, Page, RequestKind, RoleDraft, SystemRoleSeed,
    SYSTEM_ROLE_TABLE,
};
