pub(crate) mod bootstrap;
pub(crate) mod core;
pub(crate) mod domain;
pub(crate) mod errors;
pub(crate) mod i18n;
pub(crate) mod permissions;
pub(crate) mod router;
pub(crate) mod types;
pub(crate) mod wire;

pub use core::{AppConfig, AppState};
pub use domain::{
    accept_invitation, allow_application, apply, can, cancel_invitation, change_invitation_role,
    change_user_role, checkable_applications, create_project, create_role, create_team,
    delete_application, delete_group, delete_role, delete_user, deny_application,
    deny_invitation, edit_role, get_role, group, group_applications, group_invitations,
    group_roles, group_users, invite, is_full, is_superior, leave_group, membership,
    register_user, update_group_policy, user, user_applications, user_by_email, user_groups,
    user_invitations, users_by_permission,
};
pub use errors::{init_tracing, DenyReason, Entity, GroupError, RequestKind};
pub use i18n::MessageCatalog;
pub use permissions::{SystemRoleSeed, SYSTEM_ROLE_TABLE};
pub use router::{build_router, router_with_state};
pub use types::{
    ApplyOutcome, GroupDraft, GroupPolicyUpdate, InviteOutcome, MemberQuery, Page, RoleDraft,
};
pub use wire::{application_view, group_view, invitation_view, membership_view, role_view};
