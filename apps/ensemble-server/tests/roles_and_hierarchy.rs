use ensemble_core::{
    GroupId, GroupName, Intro, Permission, PermissionSet, RequestMessage, RoleId, RoleName,
    UserId,
};
use ensemble_server::{
    accept_invitation, create_role, create_team, delete_role, edit_role, group, group_roles,
    invite, membership, register_user, update_group_policy, AppConfig, AppState, DenyReason,
    Entity, GroupDraft, GroupError, GroupPolicyUpdate, InviteOutcome, RoleDraft,
};

async fn register(state: &AppState, name: &str) -> UserId {
    register_user(state, String::from(name), format!("{name}@example.com"))
        .await
        .unwrap()
        .id
}

async fn system_role(state: &AppState, group_id: GroupId, code: &str) -> RoleId {
    group_roles(state, group_id, true)
        .await
        .unwrap()
        .into_iter()
        .find(|role| role.system_code.as_deref() == Some(code))
        .unwrap()
        .id
}

async fn add_member(
    state: &AppState,
    group_id: GroupId,
    inviter: UserId,
    invitee: UserId,
    role_id: RoleId,
) {
    let InviteOutcome::Invited(invitation) =
        invite(state, group_id, inviter, invitee, role_id, RequestMessage::default())
            .await
            .unwrap()
    else {
        panic!("fresh users receive a pending invitation");
    };
    accept_invitation(state, invitation.id, invitee).await.unwrap();
}

fn role_draft(name: &str, level: i32, permissions: &[Permission]) -> RoleDraft {
    RoleDraft {
        name: RoleName::try_from(String::from(name)).unwrap(),
        intro: Intro::default(),
        level,
        permissions: PermissionSet::from(permissions),
    }
}

struct Fixture {
    state: AppState,
    team: GroupId,
    owner: UserId,
    admin: UserId,
}

async fn fixture() -> Fixture {
    let state = AppState::new(&AppConfig::default()).unwrap();
    let owner = register(&state, "owner").await;
    let admin = register(&state, "admin").await;
    let team = create_team(
        &state,
        owner,
        GroupDraft::new(GroupName::try_from(String::from("Night Owls")).unwrap()),
    )
    .await
    .unwrap()
    .id;
    let admin_role = system_role(&state, team, "admin").await;
    add_member(&state, team, owner, admin, admin_role).await;
    Fixture {
        state,
        team,
        owner,
        admin,
    }
}

#[tokio::test]
async fn operator_creates_roles_strictly_below_itself() {
    let Fixture {
        state, team, admin, ..
    } = fixture().await;

    let role = create_role(
        &state,
        team,
        role_draft("lead", 350, &[Permission::Access, Permission::InviteUser]),
        Some(admin),
    )
    .await
    .unwrap();
    assert_eq!(role.level, 350);
    assert!(!role.system);
    assert_eq!(role.owning_group, Some(team));

    for level in [400, 450, 500] {
        assert_eq!(
            create_role(
                &state,
                team,
                role_draft("too-high", level, &[Permission::Access]),
                Some(admin),
            )
            .await
            .unwrap_err(),
            GroupError::PermissionDenied(DenyReason::LevelTooLow),
            "level {level}"
        );
    }
}

#[tokio::test]
async fn operator_can_not_grant_flags_it_lacks() {
    let Fixture {
        state, team, admin, ..
    } = fixture().await;

    let error = create_role(
        &state,
        team,
        role_draft("deleter", 100, &[Permission::Access, Permission::Delete]),
        Some(admin),
    )
    .await
    .unwrap_err();
    let GroupError::PermissionDenied(DenyReason::PermissionExceedsOperator(extra)) = error else {
        panic!("unexpected error {error:?}");
    };
    assert!(extra.contains(Permission::Delete));
    assert!(!extra.contains(Permission::Access));
}

#[tokio::test]
async fn roles_stay_inside_the_kind_universe() {
    let Fixture {
        state, team, owner, ..
    } = fixture().await;

    let error = create_role(
        &state,
        team,
        role_draft("finisher", 100, &[Permission::Access, Permission::Finish]),
        Some(owner),
    )
    .await
    .unwrap_err();
    let GroupError::InvalidPermissionSet(foreign) = error else {
        panic!("unexpected error {error:?}");
    };
    assert!(foreign.contains(Permission::Finish));

    let unchecked = create_role(
        &state,
        team,
        role_draft("anything", 999, &[Permission::Delete]),
        None,
    )
    .await
    .unwrap();
    assert_eq!(unchecked.level, 999);
}

#[tokio::test]
async fn system_roles_are_never_edited_or_deleted() {
    let Fixture {
        state, team, owner, ..
    } = fixture().await;
    let beginner = system_role(&state, team, "beginner").await;

    assert_eq!(
        edit_role(
            &state,
            team,
            beginner,
            role_draft("renamed", 50, &[Permission::Access]),
            Some(owner),
        )
        .await
        .unwrap_err(),
        GroupError::NotFound(Entity::Role)
    );
    assert_eq!(
        delete_role(&state, team, beginner, None).await.unwrap_err(),
        GroupError::NotFound(Entity::Role)
    );
}

#[tokio::test]
async fn editing_needs_rank_over_the_role_as_it_stands() {
    let Fixture {
        state,
        team,
        owner,
        admin,
    } = fixture().await;
    let senior = create_role(
        &state,
        team,
        role_draft("veteran", 450, &[Permission::Access]),
        Some(owner),
    )
    .await
    .unwrap();

    assert_eq!(
        edit_role(
            &state,
            team,
            senior.id,
            role_draft("veteran", 100, &[Permission::Access]),
            Some(admin),
        )
        .await
        .unwrap_err(),
        GroupError::PermissionDenied(DenyReason::LevelTooLow)
    );

    let edited = edit_role(
        &state,
        team,
        senior.id,
        role_draft("elder", 420, &[Permission::Access, Permission::CheckUser]),
        Some(owner),
    )
    .await
    .unwrap();
    assert_eq!(edited.id, senior.id);
    assert_eq!(edited.name.as_str(), "elder");
    assert!(edited.has_permission(Permission::CheckUser));
}

#[tokio::test]
async fn deleting_a_role_moves_holders_and_default_to_the_system_default() {
    let Fixture {
        state,
        team,
        owner,
        admin,
    } = fixture().await;
    let typesetter = create_role(
        &state,
        team,
        role_draft("typesetter", 150, &[Permission::Access]),
        Some(owner),
    )
    .await
    .unwrap();
    let holder = register(&state, "holder").await;
    add_member(&state, team, owner, holder, typesetter.id).await;
    update_group_policy(
        &state,
        team,
        owner,
        GroupPolicyUpdate {
            default_role: Some(typesetter.id),
            ..GroupPolicyUpdate::default()
        },
    )
    .await
    .unwrap();

    let outsider = register(&state, "outsider").await;
    assert_eq!(
        delete_role(&state, team, typesetter.id, Some(outsider))
            .await
            .unwrap_err(),
        GroupError::PermissionDenied(DenyReason::NotMember)
    );

    delete_role(&state, team, typesetter.id, Some(admin))
        .await
        .unwrap();

    let beginner = system_role(&state, team, "beginner").await;
    let moved = membership(&state, holder, team).await.unwrap().unwrap();
    assert_eq!(moved.role_id, beginner);
    assert_eq!(group(&state, team).await.unwrap().default_role, beginner);
    assert!(group_roles(&state, team, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn role_listing_is_ordered_by_level() {
    let Fixture {
        state, team, owner, ..
    } = fixture().await;
    create_role(
        &state,
        team,
        role_draft("typesetter", 150, &[Permission::Access]),
        Some(owner),
    )
    .await
    .unwrap();

    let roles = group_roles(&state, team, true).await.unwrap();
    let levels: Vec<i32> = roles.iter().map(|role| role.level).collect();
    assert_eq!(levels, vec![500, 400, 300, 200, 150, 100]);

    let custom = group_roles(&state, team, false).await.unwrap();
    assert_eq!(custom.len(), 1);
    assert_eq!(custom[0].name.as_str(), "typesetter");
}
