//! Configuration version resolution
//!
//! Sub-objects of a security configuration are read from the latest version
//! and written to a modifiable one. A version is modifiable while it is
//! neither active nor pending activation on staging or production; otherwise
//! a new version is cloned from it. Callers resolve once per operation and reuse the number.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::provider::{ErrorKind, ProviderError, ProviderResult};

/// Boxed error returned by a version source
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Activation state of a version on one network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivationStatus {
    #[default]
    Inactive,
    Pending,
    Active,
}

impl ActivationStatus {
    /// Map a platform status such as `"Active"` or `"Deactivated"`
    pub fn parse(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "active" => ActivationStatus::Active,
            "pending" => ActivationStatus::Pending,
            _ => ActivationStatus::Inactive,
        }
    }
}

/// Latest version of one configuration and where it is activated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigVersions {
    pub config_id: i64,
    pub latest_version: i64,
    pub staging: ActivationStatus,
    pub production: ActivationStatus,
}

impl ConfigVersions {
    /// Whether the latest version can still be edited in place
    pub fn latest_is_editable(&self) -> bool {
        self.staging == ActivationStatus::Inactive && self.production == ActivationStatus::Inactive
    }
}

/// Remote lookups needed to resolve versions
#[async_trait]
pub trait ConfigVersionSource: Send + Sync {
    /// Version summary of a configuration; fails if it does not exist
    async fn config_versions(&self, config_id: i64) -> Result<ConfigVersions, SourceError>;

    /// Clone `from_version` into a new version and return its number
    async fn clone_version(&self, config_id: i64, from_version: i64) -> Result<i64, SourceError>;
}

/// Resolves the version an operation reads from or writes to
#[derive(Clone)]
pub struct VersionResolver {
    source: Arc<dyn ConfigVersionSource>,
}

impl VersionResolver {
    pub fn new(source: Arc<dyn ConfigVersionSource>) -> Self {
        Self { source }
    }

    async fn versions(&self, config_id: i64) -> ProviderResult<ConfigVersions> {
        self.source
            .config_versions(config_id)
            .await
            .map_err(|e| resolution_error(config_id, e))
    }

    /// Highest version of the configuration
    pub async fn latest(&self, config_id: i64) -> ProviderResult<i64> {
        let versions = self.versions(config_id).await?;
        debug!(
            "config {} latest version {}",
            config_id, versions.latest_version
        );
        Ok(versions.latest_version)
    }

    /// Latest version if editable, otherwise a new version cloned from it.
    /// `rule_name` only labels the log line.
    pub async fn modifiable(&self, config_id: i64, rule_name: &str) -> ProviderResult<i64> {
        let versions = self.versions(config_id).await?;
        if versions.latest_is_editable() {
            debug!(
                "{}: config {} version {} is editable",
                rule_name, config_id, versions.latest_version
            );
            return Ok(versions.latest_version);
        }

        let version = self
            .source
            .clone_version(config_id, versions.latest_version)
            .await
            .map_err(|e| resolution_error(config_id, e))?;
        debug!(
            "{}: config {} version {} is {:?} on staging and {:?} on production, cloned to version {}",
            rule_name,
            config_id,
            versions.latest_version,
            versions.staging,
            versions.production,
            version
        );
        Ok(version)
    }
}

fn resolution_error(config_id: i64, cause: SourceError) -> ProviderError {
    ProviderError {
        kind: ErrorKind::VersionResolution,
        message: format!(
            "could not resolve version of configuration {}: {}",
            config_id, cause
        ),
        resource_id: None,
        cause: Some(cause),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory version source shared with the reconciler tests
    pub(crate) struct FakeVersions {
        pub versions: Mutex<ConfigVersions>,
        pub clones: Mutex<Vec<(i64, i64)>>,
    }

    impl FakeVersions {
        /// `staging` and `production` are the versions active there
        pub(crate) fn new(latest: i64, staging: Option<i64>, production: Option<i64>) -> Self {
            let active = |version: Option<i64>| {
                if version == Some(latest) {
                    ActivationStatus::Active
                } else {
                    ActivationStatus::Inactive
                }
            };
            Self::with_status(latest, active(staging), active(production))
        }

        pub(crate) fn with_status(
            latest: i64,
            staging: ActivationStatus,
            production: ActivationStatus,
        ) -> Self {
            Self {
                versions: Mutex::new(ConfigVersions {
                    config_id: 43253,
                    latest_version: latest,
                    staging,
                    production,
                }),
                clones: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ConfigVersionSource for FakeVersions {
        async fn config_versions(&self, config_id: i64) -> Result<ConfigVersions, SourceError> {
            let versions = self.versions.lock().unwrap().clone();
            if versions.config_id != config_id {
                return Err(format!("configuration {} not found", config_id).into());
            }
            Ok(versions)
        }

        async fn clone_version(
            &self,
            config_id: i64,
            from_version: i64,
        ) -> Result<i64, SourceError> {
            self.clones.lock().unwrap().push((config_id, from_version));
            let mut versions = self.versions.lock().unwrap();
            versions.latest_version += 1;
            versions.staging = ActivationStatus::Inactive;
            versions.production = ActivationStatus::Inactive;
            Ok(versions.latest_version)
        }
    }

    #[tokio::test]
    async fn latest_returns_highest_version() {
        let resolver = VersionResolver::new(Arc::new(FakeVersions::new(15, Some(14), None)));
        assert_eq!(resolver.latest(43253).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn modifiable_reuses_editable_latest() {
        let source = Arc::new(FakeVersions::new(15, Some(14), Some(13)));
        let resolver = VersionResolver::new(source.clone());

        assert_eq!(resolver.modifiable(43253, "test").await.unwrap(), 15);
        assert!(source.clones.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn modifiable_clones_active_version() {
        let source = Arc::new(FakeVersions::new(15, None, Some(15)));
        let resolver = VersionResolver::new(source.clone());

        assert_eq!(resolver.modifiable(43253, "test").await.unwrap(), 16);
        assert_eq!(*source.clones.lock().unwrap(), vec![(43253, 15)]);
    }

    #[tokio::test]
    async fn modifiable_clones_version_pending_activation() {
        for (staging, production) in [
            (ActivationStatus::Pending, ActivationStatus::Inactive),
            (ActivationStatus::Inactive, ActivationStatus::Pending),
        ] {
            let source = Arc::new(FakeVersions::with_status(15, staging, production));
            let resolver = VersionResolver::new(source.clone());

            assert_eq!(resolver.modifiable(43253, "test").await.unwrap(), 16);
            assert_eq!(*source.clones.lock().unwrap(), vec![(43253, 15)]);
        }
    }

    #[test]
    fn platform_status_names() {
        assert_eq!(ActivationStatus::parse("Active"), ActivationStatus::Active);
        assert_eq!(ActivationStatus::parse("PENDING"), ActivationStatus::Pending);
        assert_eq!(ActivationStatus::parse("Deactivated"), ActivationStatus::Inactive);
        assert_eq!(ActivationStatus::parse("Inactive"), ActivationStatus::Inactive);
    }

    #[tokio::test]
    async fn missing_configuration_fails() {
        let resolver = VersionResolver::new(Arc::new(FakeVersions::new(15, None, None)));

        let err = resolver.latest(1).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::VersionResolution);
        assert!(err.message.contains("configuration 1 not found"));
    }
}
