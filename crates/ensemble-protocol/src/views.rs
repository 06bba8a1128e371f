use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleView {
    pub id: String,
    pub name: String,
    pub intro: String,
    pub level: i32,
    pub permissions: Vec<String>,
    pub system: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// Kind tag of a group on the wire. Projects carry their owning team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupScopeView {
    Team,
    Project { team_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    pub id: String,
    pub name: String,
    pub intro: String,
    #[serde(flatten)]
    pub scope: GroupScopeView,
    pub allow_apply_type: String,
    pub application_check_type: String,
    pub max_members: u64,
    pub member_count: u64,
    pub default_role_id: String,
    pub create_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipView {
    pub user_id: String,
    pub group_kind: String,
    pub group_id: String,
    pub role_id: String,
    pub tags: Vec<String>,
    pub create_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationView {
    pub id: String,
    pub user_id: String,
    pub operator_id: String,
    pub group_kind: String,
    pub group_id: String,
    pub role_id: String,
    pub status: String,
    pub message: String,
    pub create_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationView {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
    pub group_kind: String,
    pub group_id: String,
    pub status: String,
    pub message: String,
    pub create_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InviteOutcomeView {
    Invited {
        invitation: InvitationView,
    },
    Joined {
        application: ApplicationView,
        membership: MembershipView,
    },
    JoinedViaTeam {
        membership: MembershipView,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApplyOutcomeView {
    Applied {
        application: ApplicationView,
    },
    Joined {
        application: ApplicationView,
        membership: MembershipView,
    },
    JoinedViaInvitation {
        invitation: InvitationView,
        membership: MembershipView,
    },
    JoinedAsAdmin {
        membership: MembershipView,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{GroupScopeView, GroupView, InviteOutcomeView, MembershipView};

    fn membership() -> MembershipView {
        MembershipView {
            user_id: String::from("01ARZ3NDEKTSV4RRFFQ69G5FAV"),
            group_kind: String::from("project"),
            group_id: String::from("01BX5ZZKBKACTAV9WEVGEMMVRZ"),
            role_id: String::from("01BX5ZZKBKACTAV9WEVGEMMVS0"),
            tags: Vec::new(),
            create_time: 1_700_000_000,
        }
    }

    #[test]
    fn project_view_flattens_kind_and_team() {
        let view = GroupView {
            id: String::from("g1"),
            name: String::from("Volume 3"),
            intro: String::new(),
            scope: GroupScopeView::Project {
                team_id: String::from("t1"),
            },
            allow_apply_type: String::from("team_user"),
            application_check_type: String::from("admin_check"),
            max_members: 50,
            member_count: 1,
            default_role_id: String::from("r1"),
            create_time: 0,
        };
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["kind"], "project");
        assert_eq!(value["team_id"], "t1");
        assert_eq!(value["member_count"], 1);
    }

    #[test]
    fn team_view_has_no_team_id() {
        let value = serde_json::to_value(GroupScopeView::Team).unwrap();
        assert_eq!(value, json!({"kind": "team"}));
    }

    #[test]
    fn outcome_views_are_tagged() {
        let value = serde_json::to_value(InviteOutcomeView::JoinedViaTeam {
            membership: membership(),
        })
        .unwrap();
        assert_eq!(value["outcome"], "joined_via_team");
        assert_eq!(value["membership"]["group_kind"], "project");
    }
}
