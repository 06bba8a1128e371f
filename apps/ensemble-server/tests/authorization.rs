use ensemble_core::{GroupId, GroupName, Permission, RequestMessage, RoleId, UserId};
use ensemble_server::{
    accept_invitation, can, change_user_role, create_project, create_team, delete_user, get_role,
    group, group_roles, invite, is_superior, leave_group, membership, register_user,
    users_by_permission, AppConfig, AppState, DenyReason, Entity, GroupDraft, GroupError,
    InviteOutcome,
};

async fn register(state: &AppState, name: &str) -> UserId {
    register_user(state, String::from(name), format!("{name}@example.com"))
        .await
        .unwrap()
        .id
}

fn draft(name: &str) -> GroupDraft {
    GroupDraft::new(GroupName::try_from(String::from(name)).unwrap())
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

/// Owner (creator), two admins and a beginner in one team.
struct Crew {
    state: AppState,
    team: GroupId,
    owner: UserId,
    admin: UserId,
    other_admin: UserId,
    rookie: UserId,
}

async fn crew() -> Crew {
    let state = AppState::new(&AppConfig::default()).unwrap();
    let owner = register(&state, "owner").await;
    let admin = register(&state, "admin").await;
    let other_admin = register(&state, "deputy").await;
    let rookie = register(&state, "rookie").await;
    let team = create_team(&state, owner, draft("Night Owls")).await.unwrap().id;
    let admin_role = system_role(&state, team, "admin").await;
    add_member(&state, team, owner, admin, admin_role).await;
    add_member(&state, team, owner, other_admin, admin_role).await;
    let beginner = system_role(&state, team, "beginner").await;
    add_member(&state, team, owner, rookie, beginner).await;
    Crew {
        state,
        team,
        owner,
        admin,
        other_admin,
        rookie,
    }
}

#[tokio::test]
async fn roles_answer_permission_questions() {
    let Crew {
        state,
        team,
        owner,
        admin,
        rookie,
        ..
    } = crew().await;
    let stranger = register(&state, "stranger").await;

    let creator = get_role(&state, owner, team).await.unwrap();
    assert!(creator.is_creator());
    assert_eq!(creator.level, 500);
    assert_eq!(get_role(&state, stranger, team).await, None);
    assert_eq!(get_role(&state, owner, GroupId::new()).await, None);

    assert!(can(&state, owner, team, Permission::Delete).await);
    assert!(!can(&state, admin, team, Permission::Delete).await);
    assert!(can(&state, admin, team, Permission::ChangeUserRole).await);
    assert!(can(&state, rookie, team, Permission::Access).await);
    assert!(!can(&state, rookie, team, Permission::InviteUser).await);
    assert!(!can(&state, stranger, team, Permission::Access).await);

    assert!(is_superior(&state, owner, admin, team).await);
    assert!(is_superior(&state, admin, rookie, team).await);
    assert!(!is_superior(&state, rookie, admin, team).await);
    assert!(!is_superior(&state, admin, admin, team).await);
    assert!(!is_superior(&state, owner, stranger, team).await);
}

#[tokio::test]
async fn team_admins_inherit_the_project_admin_role() {
    let Crew {
        state,
        team,
        owner,
        admin,
        rookie,
        ..
    } = crew().await;
    let project = create_project(&state, admin, team, draft("Volume 1"))
        .await
        .unwrap()
        .id;
    let project_admin = system_role(&state, project, "admin").await;

    let creator = get_role(&state, admin, project).await.unwrap();
    assert!(creator.is_creator());

    let inherited = get_role(&state, owner, project).await.unwrap();
    assert_eq!(inherited.id, project_admin);
    assert_eq!(membership(&state, owner, project).await.unwrap(), None);
    assert!(can(&state, owner, project, Permission::CheckTranslation).await);
    assert!(!can(&state, owner, project, Permission::Delete).await);

    assert_eq!(get_role(&state, rookie, project).await, None);
    assert!(!can(&state, rookie, project, Permission::Access).await);
    assert!(is_superior(&state, admin, owner, project).await);

    let checkers: Vec<UserId> = users_by_permission(&state, project, Permission::CheckUser)
        .await
        .unwrap()
        .into_iter()
        .map(|user| user.id)
        .collect();
    assert_eq!(checkers.len(), 3);
    assert!(checkers.contains(&owner));
    assert!(checkers.contains(&admin));
    assert!(!checkers.contains(&rookie));
    assert_eq!(group(&state, project).await.unwrap().member_count, 1);
}

#[tokio::test]
async fn role_changes_respect_the_hierarchy() {
    let Crew {
        state,
        team,
        owner,
        admin,
        other_admin,
        rookie,
    } = crew().await;
    let senior = system_role(&state, team, "senior").await;
    let admin_role = system_role(&state, team, "admin").await;
    let creator_role = system_role(&state, team, "creator").await;

    let promoted = change_user_role(&state, team, rookie, senior, Some(admin))
        .await
        .unwrap();
    assert_eq!(promoted.id, senior);
    assert_eq!(
        membership(&state, rookie, team).await.unwrap().unwrap().role_id,
        senior
    );

    assert_eq!(
        change_user_role(&state, team, rookie, admin_role, Some(admin))
            .await
            .unwrap_err(),
        GroupError::PermissionDenied(DenyReason::LevelTooLow)
    );
    assert_eq!(
        change_user_role(&state, team, other_admin, senior, Some(admin))
            .await
            .unwrap_err(),
        GroupError::PermissionDenied(DenyReason::LevelTooLow)
    );
    assert_eq!(
        change_user_role(&state, team, admin, senior, Some(admin))
            .await
            .unwrap_err(),
        GroupError::PermissionDenied(DenyReason::SelfTarget)
    );
    assert_eq!(
        change_user_role(&state, team, owner, senior, Some(admin))
            .await
            .unwrap_err(),
        GroupError::PermissionDenied(DenyReason::CreatorRoleFixed)
    );
    assert_eq!(
        change_user_role(&state, team, rookie, creator_role, Some(owner))
            .await
            .unwrap_err(),
        GroupError::PermissionDenied(DenyReason::CreatorRoleFixed)
    );
    assert_eq!(
        change_user_role(&state, team, admin, senior, Some(rookie))
            .await
            .unwrap_err(),
        GroupError::PermissionDenied(DenyReason::MissingPermission(Permission::ChangeUserRole))
    );

    let demoted = change_user_role(&state, team, other_admin, senior, None)
        .await
        .unwrap();
    assert_eq!(demoted.id, senior);
}

#[tokio::test]
async fn removal_needs_rank_and_spares_the_creator() {
    let Crew {
        state,
        team,
        owner,
        admin,
        other_admin,
        rookie,
    } = crew().await;

    assert_eq!(
        delete_user(&state, team, admin, Some(rookie))
            .await
            .unwrap_err(),
        GroupError::PermissionDenied(DenyReason::MissingPermission(Permission::DeleteUser))
    );
    assert_eq!(
        delete_user(&state, team, other_admin, Some(admin))
            .await
            .unwrap_err(),
        GroupError::PermissionDenied(DenyReason::LevelTooLow)
    );
    assert_eq!(
        delete_user(&state, team, owner, Some(admin))
            .await
            .unwrap_err(),
        GroupError::CreatorCanNotLeave
    );
    assert_eq!(
        leave_group(&state, team, owner).await.unwrap_err(),
        GroupError::CreatorCanNotLeave
    );

    delete_user(&state, team, rookie, Some(admin)).await.unwrap();
    assert_eq!(membership(&state, rookie, team).await.unwrap(), None);
    assert_eq!(
        delete_user(&state, team, rookie, Some(admin))
            .await
            .unwrap_err(),
        GroupError::NotFound(Entity::Membership)
    );

    leave_group(&state, team, other_admin).await.unwrap();
    assert_eq!(group(&state, team).await.unwrap().member_count, 2);
}
