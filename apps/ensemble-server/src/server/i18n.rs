use std::collections::HashMap;

use ensemble_core::{GroupKind, Role};

type RoleNameEntry = (GroupKind, &'static str, &'static str);

const EN_ROLE_NAMES: &[RoleNameEntry] = &[
    (GroupKind::Team, "creator", "Creator"),
    (GroupKind::Team, "admin", "Admin"),
    (GroupKind::Team, "senior", "Senior member"),
    (GroupKind::Team, "member", "Member"),
    (GroupKind::Team, "beginner", "Beginner"),
    (GroupKind::Project, "creator", "Creator"),
    (GroupKind::Project, "admin", "Admin"),
    (GroupKind::Project, "checker", "Checker"),
    (GroupKind::Project, "proofreader", "Proofreader"),
    (GroupKind::Project, "translator", "Translator"),
    (GroupKind::Project, "supporter", "Supporter"),
];

const ZH_CN_ROLE_NAMES: &[RoleNameEntry] = &[
    (GroupKind::Team, "creator", "创建人"),
    (GroupKind::Team, "admin", "管理员"),
    (GroupKind::Team, "senior", "资深成员"),
    (GroupKind::Team, "member", "成员"),
    (GroupKind::Team, "beginner", "见习成员"),
    (GroupKind::Project, "creator", "创建人"),
    (GroupKind::Project, "admin", "管理员"),
    (GroupKind::Project, "checker", "监修"),
    (GroupKind::Project, "proofreader", "校对"),
    (GroupKind::Project, "translator", "翻译"),
    (GroupKind::Project, "supporter", "嵌字"),
];

/// Display names of system roles, keyed by kind and stable code.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    locale: &'static str,
    role_names: HashMap<(GroupKind, &'static str), &'static str>,
}

impl MessageCatalog {
    /// Unknown locales fall back to English.
    #[must_use]
    pub fn for_locale(locale: &str) -> Self {
        let (locale, entries) = match locale.to_ascii_lowercase().replace('_', "-").as_str() {
            "zh" | "zh-cn" => ("zh-CN", ZH_CN_ROLE_NAMES),
            _ => ("en", EN_ROLE_NAMES),
        };
        Self {
            locale,
            role_names: entries
                .iter()
                .map(|(kind, code, name)| ((*kind, *code), *name))
                .collect(),
        }
    }

    #[must_use]
    pub const fn locale(&self) -> &'static str {
        self.locale
    }

    /// Custom roles keep their own name; system roles are resolved by code.
    #[must_use]
    pub fn role_display_name(&self, role: &Role) -> String {
        let localized = role
            .system_code
            .as_deref()
            .filter(|_| role.system)
            .and_then(|code| self.role_names.get(&(role.kind, code)));
        localized.map_or_else(|| String::from(role.name.as_str()), |name| String::from(*name))
    }
}
