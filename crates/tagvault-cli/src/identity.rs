//! Startup access gate.
//!
//! The principal is the account the process runs as. On unix that is the
//! effective uid; the account is an administrator when it is root or a
//! member of one of [`ADMIN_GROUPS`]. Nothing in the environment can raise
//! privileges. Only the list of authorized principals comes from
//! configuration.

use tracing::{info, warn};

use crate::error::CliError;

/// Groups whose members pass the gate without being listed.
pub const ADMIN_GROUPS: [&str; 3] = ["wheel", "admin", "sudo"];

/// Who is running the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub is_admin: bool,
}

/// The operating system account behind the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsAccount {
    pub name: String,
    pub is_superuser: bool,
    /// Names of supplementary and primary groups the account belongs to.
    pub groups: Vec<String>,
}

impl OsAccount {
    /// Look up the effective user and its group memberships.
    #[cfg(unix)]
    pub fn current() -> Result<Self, CliError> {
        use nix::unistd::{Group, User, geteuid};

        let uid = geteuid();
        let user = User::from_uid(uid)
            .map_err(|e| CliError::Unauthorized(format!("cannot look up uid {uid}: {e}")))?;
        let Some(user) = user else {
            return Ok(Self {
                name: uid.to_string(),
                is_superuser: uid.is_root(),
                groups: Vec::new(),
            });
        };

        let mut groups = Vec::new();
        if let Ok(Some(primary)) = Group::from_gid(user.gid) {
            groups.push(primary.name);
        }
        for name in ADMIN_GROUPS {
            if let Ok(Some(group)) = Group::from_name(name) {
                if group.mem.iter().any(|member| member == &user.name) {
                    groups.push(group.name);
                }
            }
        }

        Ok(Self {
            name: user.name,
            is_superuser: uid.is_root(),
            groups,
        })
    }

    /// Without a unix account database the logon name is used and the
    /// account is never an administrator.
    #[cfg(not(unix))]
    pub fn current() -> Result<Self, CliError> {
        let name = std::env::var("USERNAME")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| CliError::Unauthorized("no logon name available".to_string()))?;
        Ok(Self {
            name,
            is_superuser: false,
            groups: Vec::new(),
        })
    }
}

impl Principal {
    /// Resolve the principal from the account the process runs as.
    pub fn current() -> Result<Self, CliError> {
        Ok(Self::from_account(&OsAccount::current()?))
    }

    pub fn from_account(account: &OsAccount) -> Self {
        let in_admin_group = account
            .groups
            .iter()
            .any(|group| ADMIN_GROUPS.contains(&group.as_str()));
        Self {
            id: account.name.clone(),
            is_admin: account.is_superuser || in_admin_group,
        }
    }
}

/// Authorized principals from configuration.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    authorized: Vec<String>,
}

impl AccessPolicy {
    pub fn new(authorized: impl IntoIterator<Item = String>) -> Self {
        Self {
            authorized: authorized.into_iter().collect(),
        }
    }

    /// Administrators always pass; others must be listed (case-insensitive).
    pub fn authorize(&self, principal: &Principal) -> Result<(), CliError> {
        if principal.is_admin {
            info!(principal = %principal.id, "Administrator access granted");
            return Ok(());
        }
        if self
            .authorized
            .iter()
            .any(|id| id.eq_ignore_ascii_case(&principal.id))
        {
            return Ok(());
        }
        warn!(principal = %principal.id, "Access denied");
        Err(CliError::Unauthorized(format!(
            "{} is not an authorized user",
            principal.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str, is_superuser: bool, groups: &[&str]) -> OsAccount {
        OsAccount {
            name: name.to_string(),
            is_superuser,
            groups: groups.iter().map(|g| (*g).to_string()).collect(),
        }
    }

    #[test]
    fn test_admin_comes_from_superuser_or_admin_group() {
        let plain = Principal::from_account(&account("traffic", false, &["staff", "audio"]));
        assert_eq!(plain.id, "traffic");
        assert!(!plain.is_admin);

        assert!(Principal::from_account(&account("ops", false, &["staff", "wheel"])).is_admin);
        assert!(Principal::from_account(&account("root", true, &[])).is_admin);
    }

    #[cfg(unix)]
    #[test]
    fn test_current_principal_is_the_effective_user() {
        use nix::unistd::{User, geteuid};

        let principal = Principal::current().unwrap();
        let expected = User::from_uid(geteuid())
            .unwrap()
            .map_or_else(|| geteuid().to_string(), |user| user.name);
        assert_eq!(principal.id, expected);
        if geteuid().is_root() {
            assert!(principal.is_admin);
        }
    }

    #[test]
    fn test_policy_admits_listed_and_admins() {
        let policy = AccessPolicy::new(vec!["Traffic".to_string()]);
        let listed = Principal {
            id: "traffic".to_string(),
            is_admin: false,
        };
        let admin = Principal {
            id: "someone".to_string(),
            is_admin: true,
        };
        let stranger = Principal {
            id: "guest".to_string(),
            is_admin: false,
        };
        assert!(policy.authorize(&listed).is_ok());
        assert!(policy.authorize(&admin).is_ok());
        assert_eq!(policy.authorize(&stranger).unwrap_err().exit_code(), 77);
    }
}
