//! Logical database name to profile group resolution.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ConfigError;
use crate::domain::{ConnectionProfile, LogicalDatabaseName};
use crate::error::CoreError;
use crate::ports::ReplicaEndpoint;

/// A configured profile paired with the endpoint that serves it.
#[derive(Clone)]
pub struct ProfileHandle {
    profile: ConnectionProfile,
    endpoint: Arc<dyn ReplicaEndpoint>,
}

impl ProfileHandle {
    pub fn new(profile: ConnectionProfile, endpoint: Arc<dyn ReplicaEndpoint>) -> Self {
        Self { profile, endpoint }
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn endpoint(&self) -> &dyn ReplicaEndpoint {
        self.endpoint.as_ref()
    }
}

impl fmt::Debug for ProfileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileHandle")
            .field("name", &self.profile.name)
            .finish_non_exhaustive()
    }
}

/// Registered profile groups.
///
/// Every registered group holds at least one profile; registration rejects
/// empty groups so resolution never hands out an empty list.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    groups: HashMap<LogicalDatabaseName, Arc<[ProfileHandle]>>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a group.
    pub fn register(
        &mut self,
        name: LogicalDatabaseName,
        handles: Vec<ProfileHandle>,
    ) -> Result<(), ConfigError> {
        if handles.is_empty() {
            return Err(ConfigError::EmptyProfileGroup(name.to_string()));
        }
        self.groups.insert(name, handles.into());
        Ok(())
    }

    /// Resolve a group in configuration order.
    pub fn resolve(&self, name: &LogicalDatabaseName) -> Result<Arc<[ProfileHandle]>, CoreError> {
        self.groups
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownDatabase(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockReplicaEndpoint;

    #[test]
    fn test_register_rejects_empty_group() {
        let mut registry = ProfileRegistry::new();
        let err = registry
            .register(LogicalDatabaseName::from("schedule"), Vec::new())
            .unwrap_err();
        assert_eq!(err, ConfigError::EmptyProfileGroup("schedule".to_string()));
    }

    #[test]
    fn test_resolve_preserves_order_and_rejects_unknown() {
        let mut registry = ProfileRegistry::new();
        let handles = ["a", "b"]
            .into_iter()
            .map(|n| {
                ProfileHandle::new(
                    ConnectionProfile::new(n, "sqlite::memory:"),
                    Arc::new(MockReplicaEndpoint::new()),
                )
            })
            .collect();
        registry
            .register(LogicalDatabaseName::from("schedule"), handles)
            .unwrap();

        let group = registry.resolve(&LogicalDatabaseName::from("schedule")).unwrap();
        let names: Vec<&str> = group.iter().map(ProfileHandle::name).collect();
        assert_eq!(names, vec!["a", "b"]);

        assert!(matches!(
            registry.resolve(&LogicalDatabaseName::from("other")),
            Err(CoreError::UnknownDatabase(_))
        ));
    }
}
