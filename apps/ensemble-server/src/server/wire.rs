use ensemble_core::{Application, Group, GroupScope, Invitation, Membership, Role};
use ensemble_protocol::{
    ApplicationView, ApplyOutcomeView, GroupScopeView, GroupView, InvitationView,
    InviteOutcomeView, MembershipView, RoleView,
};

use super::{
    i18n::MessageCatalog,
    types::{ApplyOutcome, InviteOutcome},
};

#[must_use]
pub fn role_view(role: &Role, catalog: &MessageCatalog) -> RoleView {
    RoleView {
        id: role.id.to_string(),
        name: catalog.role_display_name(role),
        intro: String::from(role.intro.as_str()),
        level: role.level,
        permissions: role
            .permissions
            .names()
            .into_iter()
            .map(String::from)
            .collect(),
        system: role.system,
        system_code: role.system_code.clone(),
        group_id: role.owning_group.map(|id| id.to_string()),
    }
}

#[must_use]
pub fn group_view(group: &Group) -> GroupView {
    let scope = match group.scope {
        GroupScope::Team => GroupScopeView::Team,
        GroupScope::Project { team_id } => GroupScopeView::Project {
            team_id: team_id.to_string(),
        },
    };
    GroupView {
        id: group.id.to_string(),
        name: String::from(group.name.as_str()),
        intro: String::from(group.intro.as_str()),
        scope,
        allow_apply_type: String::from(group.allow_apply_type.as_str()),
        application_check_type: String::from(group.application_check_type.as_str()),
        max_members: group.max_members,
        member_count: group.member_count,
        default_role_id: group.default_role.to_string(),
        create_time: group.create_time,
    }
}

#[must_use]
pub fn membership_view(membership: &Membership) -> MembershipView {
    MembershipView {
        user_id: membership.user_id.to_string(),
        group_kind: String::from(membership.group.kind.as_str()),
        group_id: membership.group.id.to_string(),
        role_id: membership.role_id.to_string(),
        tags: membership.tags.iter().cloned().collect(),
        create_time: membership.create_time,
    }
}

#[must_use]
pub fn invitation_view(invitation: &Invitation) -> InvitationView {
    InvitationView {
        id: invitation.id.to_string(),
        user_id: invitation.user_id.to_string(),
        operator_id: invitation.operator_id.to_string(),
        group_kind: String::from(invitation.group.kind.as_str()),
        group_id: invitation.group.id.to_string(),
        role_id: invitation.role_id.to_string(),
        status: String::from(invitation.status.as_str()),
        message: String::from(invitation.message.as_str()),
        create_time: invitation.create_time,
    }
}

#[must_use]
pub fn application_view(application: &Application) -> ApplicationView {
    ApplicationView {
        id: application.id.to_string(),
        user_id: application.user_id.to_string(),
        operator_id: application.operator_id.map(|id| id.to_string()),
        group_kind: String::from(application.group.kind.as_str()),
        group_id: application.group.id.to_string(),
        status: String::from(application.status.as_str()),
        message: String::from(application.message.as_str()),
        create_time: application.create_time,
    }
}

impl InviteOutcome {
    #[must_use]
    pub fn to_view(&self) -> InviteOutcomeView {
        match self {
            Self::Invited(invitation) => InviteOutcomeView::Invited {
                invitation: invitation_view(invitation),
            },
            Self::Joined {
                application,
                membership,
            } => InviteOutcomeView::Joined {
                application: application_view(application),
                membership: membership_view(membership),
            },
            Self::JoinedViaTeam(membership) => InviteOutcomeView::JoinedViaTeam {
                membership: membership_view(membership),
            },
        }
    }
}

impl ApplyOutcome {
    #[must_use]
    pub fn to_view(&self) -> ApplyOutcomeView {
        match self {
            Self::Applied(application) => ApplyOutcomeView::Applied {
                application: application_view(application),
            },
            Self::Joined {
                application,
                membership,
            } => ApplyOutcomeView::Joined {
                application: application_view(application),
                membership: membership_view(membership),
            },
            Self::JoinedViaInvitation {
                invitation,
                membership,
            } => ApplyOutcomeView::JoinedViaInvitation {
                invitation: invitation_view(invitation),
                membership: membership_view(membership),
            },
            Self::JoinedAsAdmin(membership) => ApplyOutcomeView::JoinedAsAdmin {
                membership: membership_view(membership),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use ensemble_core::{
        GroupId, GroupKind, GroupRef, Intro, Membership, Permission, Role, RoleId, RoleName,
        UserId,
    };
    use ensemble_protocol::InviteOutcomeView;

    use super::role_view;
    use crate::server::{i18n::MessageCatalog, types::InviteOutcome};

    #[test]
    fn role_view_lists_permission_names_and_localizes_system_roles() {
        let role = Role {
            id: RoleId::new(),
            kind: GroupKind::Project,
            name: RoleName::try_from(String::from("Checker")).unwrap(),
            intro: Intro::default(),
            level: 300,
            permissions: [Permission::Access, Permission::CheckTranslation]
                .as_slice()
                .into(),
            system: true,
            system_code: Some(String::from("checker")),
            owning_group: None,
        };
        let view = role_view(&role, &MessageCatalog::for_locale("zh-CN"));
        assert_eq!(view.name, "监修");
        assert_eq!(view.permissions, vec!["access", "check_translation"]);
        assert_eq!(view.group_id, None);
    }

    #[test]
    fn outcome_view_keeps_the_membership() {
        let membership = Membership {
            user_id: UserId::new(),
            group: GroupRef {
                kind: GroupKind::Project,
                id: GroupId::new(),
            },
            role_id: RoleId::new(),
            tags: BTreeSet::from([String::from("typeset")]),
            create_time: 7,
        };
        let InviteOutcomeView::JoinedViaTeam { membership: view } =
            InviteOutcome::JoinedViaTeam(membership.clone()).to_view()
        else {
            panic!("team members join directly");
        };
        assert_eq!(view.user_id, membership.user_id.to_string());
        assert_eq!(view.group_kind, "project");
        assert_eq!(view.tags, vec!["typeset"]);
    }
}
