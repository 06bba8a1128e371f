use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::anyhow;
use ensemble_core::{
    AllowApplyType, Application, ApplicationCheckType, ApplicationId, Email, Group, GroupId,
    GroupKind, GroupName, GroupRef, GroupScope, Intro, Invitation, InvitationId, Membership,
    Role, RoleId, User, UserId,
};
use tokio::sync::RwLock;

use super::{
    bootstrap::bootstrap_system_roles,
    i18n::MessageCatalog,
    permissions::{SystemRoleSeed, SYSTEM_ROLE_TABLE},
    types::Page,
};

pub const DEFAULT_JSON_BODY_LIMIT_BYTES: usize = ensemble_protocol::MAX_PAYLOAD_BYTES;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TEAM_MAX_MEMBERS: u64 = 10_000;
pub const DEFAULT_PROJECT_MAX_MEMBERS: u64 = 1_000;
pub const DEFAULT_LIST_LIMIT: usize = 20;
pub const DEFAULT_LIST_LIMIT_MAX: usize = 100;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
    /// Capacity given to new teams when the draft leaves it unset.
    pub default_team_max_members: u64,
    pub default_project_max_members: u64,
    pub list_limit_default: usize,
    pub list_limit_max: usize,
    /// Locale used to render system role names.
    pub locale: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_JSON_BODY_LIMIT_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            default_team_max_members: DEFAULT_TEAM_MAX_MEMBERS,
            default_project_max_members: DEFAULT_PROJECT_MAX_MEMBERS,
            list_limit_default: DEFAULT_LIST_LIMIT,
            list_limit_max: DEFAULT_LIST_LIMIT_MAX,
            locale: String::from("en"),
        }
    }
}

impl AppConfig {
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        if self.max_body_bytes == 0 || self.max_body_bytes > ensemble_protocol::MAX_PAYLOAD_BYTES
        {
            return Err(anyhow!(
                "body limit must be between 1 and {} bytes",
                ensemble_protocol::MAX_PAYLOAD_BYTES
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow!("request timeout must be at least 1 second"));
        }
        if self.default_team_max_members == 0 || self.default_project_max_members == 0 {
            return Err(anyhow!("default group capacity must be at least 1 member"));
        }
        if self.list_limit_max == 0 {
            return Err(anyhow!("list limit max must be at least 1 record per page"));
        }
        if self.list_limit_default == 0 || self.list_limit_default > self.list_limit_max {
            return Err(anyhow!(
                "default list limit must be between 1 and {}",
                self.list_limit_max
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct RuntimeConfig {
    pub(crate) default_team_max_members: u64,
    pub(crate) default_project_max_members: u64,
    pub(crate) list_limit_default: usize,
    pub(crate) list_limit_max: usize,
}

impl RuntimeConfig {
    pub(crate) const fn default_max_members(&self, kind: GroupKind) -> u64 {
        match kind {
            GroupKind::Team => self.default_team_max_members,
            GroupKind::Project => self.default_project_max_members,
        }
    }

    /// Applies the configured default and ceiling to a caller's page.
    pub(crate) fn paginate<T>(&self, items: Vec<T>, page: Page) -> Vec<T> {
        let limit = page
            .limit
            .unwrap_or(self.list_limit_default)
            .clamp(1, self.list_limit_max);
        items.into_iter().skip(page.skip).take(limit).collect()
    }
}

/// Shared engine state. Every mutation runs under the directory write lock,
/// so membership creation and its counter update are never interleaved.
#[derive(Clone)]
pub struct AppState {
    pub(crate) directory: Arc<RwLock<Directory>>,
    pub(crate) catalog: Arc<MessageCatalog>,
    pub(crate) runtime: Arc<RuntimeConfig>,
}

impl AppState {
    /// Builds the state and seeds the built-in system roles.
    ///
    /// # Errors
    /// Returns an error if the config or the system role table is invalid.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        Self::with_system_roles(config, SYSTEM_ROLE_TABLE)
    }

    /// # Errors
    /// Returns an error if the config or `table` is invalid.
    pub fn with_system_roles(config: &AppConfig, table: &[SystemRoleSeed]) -> anyhow::Result<Self> {
        config.validate()?;
        let mut directory = Directory::default();
        bootstrap_system_roles(&mut directory, table)?;

        Ok(Self {
            directory: Arc::new(RwLock::new(directory)),
            catalog: Arc::new(MessageCatalog::for_locale(&config.locale)),
            runtime: Arc::new(RuntimeConfig {
                default_team_max_members: config.default_team_max_members,
                default_project_max_members: config.default_project_max_members,
                list_limit_default: config.list_limit_default,
                list_limit_max: config.list_limit_max,
            }),
        })
    }

    /// Number of seeded system roles across both kinds.
    pub async fn system_role_count(&self) -> usize {
        self.directory.read().await.system_roles.len()
    }

    #[must_use]
    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }
}

#[derive(Debug, Default)]
pub(crate) struct Directory {
    pub(crate) users: HashMap<UserId, User>,
    pub(crate) user_emails: HashMap<Email, UserId>,
    pub(crate) groups: HashMap<GroupId, GroupRecord>,
    pub(crate) roles: HashMap<RoleId, Role>,
    pub(crate) system_roles: HashMap<(GroupKind, String), RoleId>,
    pub(crate) default_system_roles: HashMap<GroupKind, RoleId>,
    pub(crate) memberships: HashMap<(UserId, GroupId), Membership>,
    pub(crate) invitations: HashMap<InvitationId, Invitation>,
    pub(crate) applications: HashMap<ApplicationId, Application>,
}

#[derive(Debug)]
pub(crate) struct GroupRecord {
    pub(crate) id: GroupId,
    pub(crate) name: GroupName,
    pub(crate) intro: Intro,
    pub(crate) scope: GroupScope,
    pub(crate) allow_apply_type: AllowApplyType,
    pub(crate) application_check_type: ApplicationCheckType,
    pub(crate) max_members: u64,
    pub(crate) default_role: RoleId,
    pub(crate) create_time: i64,
    member_count: AtomicU64,
}

impl GroupRecord {
    pub(crate) fn new(
        name: GroupName,
        intro: Intro,
        scope: GroupScope,
        allow_apply_type: AllowApplyType,
        application_check_type: ApplicationCheckType,
        max_members: u64,
        default_role: RoleId,
    ) -> Self {
        Self {
            id: GroupId::new(),
            name,
            intro,
            scope,
            allow_apply_type,
            application_check_type,
            max_members,
            default_role,
            create_time: now_unix(),
            member_count: AtomicU64::new(0),
        }
    }

    pub(crate) const fn kind(&self) -> GroupKind {
        self.scope.kind()
    }

    pub(crate) const fn group_ref(&self) -> GroupRef {
        GroupRef {
            kind: self.scope.kind(),
            id: self.id,
        }
    }

    pub(crate) fn member_count(&self) -> u64 {
        self.member_count.load(Ordering::Acquire)
    }

    pub(crate) fn is_full(&self) -> bool {
        self.member_count() >= self.max_members
    }

    pub(crate) fn increment_members(&self) -> u64 {
        self.member_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn decrement_members(&self) -> u64 {
        let previous = self
            .member_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                Some(count.saturating_sub(1))
            })
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    pub(crate) fn snapshot(&self) -> Group {
        Group {
            id: self.id,
            name: self.name.clone(),
            intro: self.intro.clone(),
            scope: self.scope,
            allow_apply_type: self.allow_apply_type,
            application_check_type: self.application_check_type,
            max_members: self.max_members,
            member_count: self.member_count(),
            default_role: self.default_role,
            create_time: self.create_time,
        }
    }
}

pub(crate) fn now_unix() -> i64 {
    let now = SystemTime::now();
    let seconds = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs();
    i64::try_from(seconds).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ensemble_core::{
        AllowApplyType, ApplicationCheckType, GroupName, GroupScope, Intro, RoleId,
    };

    use super::{AppConfig, GroupRecord, RuntimeConfig};
    use crate::server::types::Page;

    fn record(max_members: u64) -> GroupRecord {
        GroupRecord::new(
            GroupName::try_from(String::from("subs")).unwrap(),
            Intro::default(),
            GroupScope::Team,
            AllowApplyType::All,
            ApplicationCheckType::AdminCheck,
            max_members,
            RoleId::new(),
        )
    }

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn config_rejects_zero_limits() {
        let config = AppConfig {
            list_limit_max: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            request_timeout: Duration::ZERO,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            default_project_max_members: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn member_counter_tracks_fullness_and_never_underflows() {
        let group = record(2);
        assert!(!group.is_full());
        assert_eq!(group.increment_members(), 1);
        assert_eq!(group.increment_members(), 2);
        assert!(group.is_full());
        assert_eq!(group.snapshot().member_count, 2);
        assert_eq!(group.decrement_members(), 1);
        assert_eq!(group.decrement_members(), 0);
        assert_eq!(group.decrement_members(), 0);
    }

    #[test]
    fn pagination_clamps_to_configured_ceiling() {
        let runtime = RuntimeConfig {
            default_team_max_members: 10,
            default_project_max_members: 10,
            list_limit_default: 2,
            list_limit_max: 3,
        };
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(runtime.paginate(items.clone(), Page::default()), vec![0, 1]);
        assert_eq!(
            runtime.paginate(items.clone(), Page::new(4, Some(50))),
            vec![4, 5, 6]
        );
        assert_eq!(runtime.paginate(items.clone(), Page::new(1, Some(0))), vec![1]);
        assert!(runtime.paginate(items, Page::new(20, None)).is_empty());
    }
}
