use ensemble_core::{
    AllowApplyType, ApplicationCheckType, GroupId, GroupName, Intro, Permission, RequestMessage,
    RoleName, UserId,
};

use super::{
    apply, create_project, create_role, create_team, delete_group, delete_user, invite,
    leave_group, register_user,
};
use crate::server::{
    core::{AppConfig, AppState, Directory},
    errors::GroupError,
    types::{ApplyOutcome, GroupDraft, InviteOutcome, RoleDraft},
};

async fn user(state: &AppState, name: &str) -> UserId {
    register_user(state, String::from(name), format!("{name}@example.com"))
        .await
        .unwrap()
        .id
}

fn draft(name: &str) -> GroupDraft {
    GroupDraft::new(GroupName::try_from(String::from(name)).unwrap())
}

fn assert_counters_match(directory: &Directory) {
    for group in directory.groups.values() {
        let members = directory
            .memberships
            .keys()
            .filter(|(_, group_id)| *group_id == group.id)
            .count();
        let members = u64::try_from(members).unwrap();
        assert_eq!(group.member_count(), members, "{}", group.group_ref());
    }
}

#[tokio::test]
async fn counters_follow_every_membership_path() {
    let state = AppState::new(&AppConfig::default()).unwrap();
    let owner = user(&state, "owner").await;
    let guest = user(&state, "guest").await;
    let drifter = user(&state, "drifter").await;

    let team = create_team(
        &state,
        owner,
        draft("scanlators").with_policy(AllowApplyType::All, ApplicationCheckType::NoNeedCheck),
    )
    .await
    .unwrap();
    assert_eq!(team.member_count, 1);

    let outcome = apply(&state, team.id, guest, RequestMessage::default())
        .await
        .unwrap();
    assert!(matches!(outcome, ApplyOutcome::Joined { .. }));

    let default_role = team.default_role;
    let outcome = invite(
        &state,
        team.id,
        owner,
        drifter,
        default_role,
        RequestMessage::default(),
    )
    .await
    .unwrap();
    assert!(matches!(outcome, InviteOutcome::Invited(_)));

    leave_group(&state, team.id, guest).await.unwrap();
    assert_counters_match(&*state.directory.read().await);

    let project = create_project(&state, owner, team.id, draft("volume-1"))
        .await
        .unwrap();
    assert_eq!(project.member_count, 1);
    assert_counters_match(&*state.directory.read().await);
}

#[tokio::test]
async fn joining_discards_competing_requests() {
    let state = AppState::new(&AppConfig::default()).unwrap();
    let owner = user(&state, "owner").await;
    let guest = user(&state, "guest").await;
    let team = create_team(
        &state,
        owner,
        draft("raws").with_policy(AllowApplyType::All, ApplicationCheckType::AdminCheck),
    )
    .await
    .unwrap();

    let ApplyOutcome::Applied(application) =
        apply(&state, team.id, guest, RequestMessage::default())
            .await
            .unwrap()
    else {
        panic!("reviewed groups keep applications pending");
    };

    let mut directory = state.directory.write().await;
    directory.join(guest, team.id, team.default_role).unwrap();
    assert!(!directory.applications.contains_key(&application.id));
    assert!(directory.pending_application(guest, team.id).is_none());
}

#[tokio::test]
async fn joining_twice_is_refused_without_touching_the_counter() {
    let state = AppState::new(&AppConfig::default()).unwrap();
    let owner = user(&state, "owner").await;
    let team = create_team(&state, owner, draft("raws")).await.unwrap();

    let mut directory = state.directory.write().await;
    assert_eq!(
        directory.join(owner, team.id, team.default_role),
        Err(GroupError::AlreadyMember)
    );
    let creator = directory.direct_membership(owner, team.id).unwrap();
    assert_ne!(creator.role_id, team.default_role);
    assert_eq!(directory.group_record(team.id).unwrap().member_count(), 1);
}

#[tokio::test]
async fn unknown_groups_are_not_found() {
    let state = AppState::new(&AppConfig::default()).unwrap();
    let owner = user(&state, "owner").await;
    let missing = GroupId::new();

    assert!(matches!(
        delete_group(&state, missing, owner).await,
        Err(GroupError::NotFound(_))
    ));
    assert!(matches!(
        delete_user(&state, missing, owner, None).await,
        Err(GroupError::NotFound(_))
    ));
    let role = RoleDraft {
        name: RoleName::try_from(String::from("typesetter")).unwrap(),
        intro: Intro::default(),
        level: 100,
        permissions: [Permission::Access].as_slice().into(),
    };
    assert!(matches!(
        create_role(&state, missing, role, None).await,
        Err(GroupError::NotFound(_))
    ));
}
