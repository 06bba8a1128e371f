use std::collections::HashSet;

use anyhow::anyhow;
use ensemble_core::{GroupKind, Intro, PermissionSet, Role, RoleId, RoleName, SYSTEM_ROLE_CREATOR};

use super::{core::Directory, permissions::SystemRoleSeed};

/// Seeds the system roles of both group kinds from `table`.
///
/// Runs once while the state is built; an entry already present for a
/// `(kind, code)` pair is left untouched.
///
/// # Errors
/// Returns an error if the table gives a kind no creator, no default role or
/// more than one, names a flag outside the kind's universe, or makes the
/// creator the default.
pub(crate) fn bootstrap_system_roles(
    directory: &mut Directory,
    table: &[SystemRoleSeed],
) -> anyhow::Result<()> {
    validate_table(table)?;

    let mut seeded = 0_usize;
    for seed in table {
        let key = (seed.kind, String::from(seed.code));
        if directory.system_roles.contains_key(&key) {
            continue;
        }
        let name = RoleName::try_from(String::from(seed.name))
            .map_err(|e| anyhow!("system role {} has an invalid name: {e}", seed.code))?;
        let role = Role {
            id: RoleId::new(),
            kind: seed.kind,
            name,
            intro: Intro::default(),
            level: seed.level,
            permissions: PermissionSet::from(seed.permissions),
            system: true,
            system_code: Some(String::from(seed.code)),
            owning_group: None,
        };
        if seed.default {
            directory.default_system_roles.insert(seed.kind, role.id);
        }
        directory.system_roles.insert(key, role.id);
        directory.roles.insert(role.id, role);
        seeded += 1;
    }

    tracing::info!(event = "roles.bootstrapped", seeded);
    Ok(())
}

fn validate_table(table: &[SystemRoleSeed]) -> anyhow::Result<()> {
    for kind in [GroupKind::Team, GroupKind::Project] {
        let seeds: Vec<&SystemRoleSeed> = table.iter().filter(|seed| seed.kind == kind).collect();
        if !seeds.iter().any(|seed| seed.code == SYSTEM_ROLE_CREATOR) {
            return Err(anyhow!("{} system roles lack a creator", kind.as_str()));
        }
        let defaults: Vec<_> = seeds.iter().filter(|seed| seed.default).collect();
        match defaults.as_slice() {
            [only] if only.code == SYSTEM_ROLE_CREATOR => {
                return Err(anyhow!(
                    "{} default role can not be the creator",
                    kind.as_str()
                ));
            }
            [_] => {}
            _ => {
                return Err(anyhow!(
                    "{} system roles need exactly one default",
                    kind.as_str()
                ));
            }
        }

        let mut codes = HashSet::new();
        for seed in &seeds {
            if !codes.insert(seed.code) {
                return Err(anyhow!(
                    "{} system role {} is declared twice",
                    kind.as_str(),
                    seed.code
                ));
            }
            let foreign = kind.foreign_permissions(PermissionSet::from(seed.permissions));
            if !foreign.is_empty() {
                return Err(anyhow!(
                    "{} system role {} names foreign permissions: {}",
                    kind.as_str(),
                    seed.code,
                    foreign.names().join(", ")
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ensemble_core::{GroupKind, Permission, SYSTEM_ROLE_CREATOR};

    use super::bootstrap_system_roles;
    use crate::server::{
        core::Directory,
        permissions::{SystemRoleSeed, SYSTEM_ROLE_TABLE},
    };

    #[test]
    fn seeds_every_role_once() {
        let mut directory = Directory::default();
        bootstrap_system_roles(&mut directory, SYSTEM_ROLE_TABLE).unwrap();
        assert_eq!(directory.system_roles.len(), SYSTEM_ROLE_TABLE.len());
        assert_eq!(directory.roles.len(), SYSTEM_ROLE_TABLE.len());

        bootstrap_system_roles(&mut directory, SYSTEM_ROLE_TABLE).unwrap();
        assert_eq!(directory.roles.len(), SYSTEM_ROLE_TABLE.len());

        for kind in [GroupKind::Team, GroupKind::Project] {
            let default = directory.default_system_roles[&kind];
            let role = &directory.roles[&default];
            assert!(role.system);
            assert_eq!(role.kind, kind);
            assert!(!role.is_creator());
        }
    }

    #[test]
    fn rejects_tables_without_a_default() {
        let table = [
            SystemRoleSeed {
                kind: GroupKind::Team,
                code: SYSTEM_ROLE_CREATOR,
                name: "Creator",
                level: 500,
                permissions: &[Permission::Access],
                default: false,
            },
            SystemRoleSeed {
                kind: GroupKind::Project,
                code: SYSTEM_ROLE_CREATOR,
                name: "Creator",
                level: 500,
                permissions: &[Permission::Access],
                default: false,
            },
        ];
        let mut directory = Directory::default();
        assert!(bootstrap_system_roles(&mut directory, &table).is_err());
        assert!(directory.roles.is_empty());
    }

    #[test]
    fn rejects_foreign_flags() {
        let mut table = SYSTEM_ROLE_TABLE.to_vec();
        let beginner = table
            .iter_mut()
            .find(|seed| seed.kind == GroupKind::Team && seed.default)
            .unwrap();
        beginner.permissions = &[Permission::Access, Permission::AddTranslation];

        let mut directory = Directory::default();
        let error = bootstrap_system_roles(&mut directory, &table).unwrap_err();
        assert!(error.to_string().contains("add_translation"));
    }
}
