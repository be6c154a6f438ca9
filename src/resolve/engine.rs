//! Concurrent plugin resolution
//!
//! Every requested plugin is resolved by its own task; a semaphore bounds how
//! many run at once. A task fetches the wanted release, gates it through the
//! [`CompatibilityPolicy`], falls back to the declared release when it is
//! rejected, walks the dependencies of the chosen release and finally commits
//! it to the shared [`ResolvedSet`].
//!
//! ```text
//! fetch wanted ──▶ policy ──accept──▶ chosen ──▶ walk deps ──▶ commit
//!                    │                  ▲
//!                    └──reject──▶ fetch declared
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::{DependencyPolicy, ResolverConfig};
use crate::resolve::checker::{CompatibilityPolicy, Verdict};
use crate::resolve::resolved::ResolvedSet;
use crate::version::error::ResolveError;
use crate::version::fetcher::MetadataFetcher;
use crate::version::registry::PluginSource;
use crate::version::types::{DependencyRef, PluginRecord, PluginRequest};

/// State of one resolution run
///
/// Owns the metadata cache and the resolved set, so nothing leaks between
/// runs. Shared with the worker tasks through an `Arc`.
pub struct Resolver {
    requests: Vec<PluginRequest>,
    fetcher: MetadataFetcher,
    policy: CompatibilityPolicy,
    resolved: ResolvedSet,
    dependency_policy: DependencyPolicy,
    concurrency: usize,
}

impl Resolver {
    pub fn new(
        source: Arc<dyn PluginSource>,
        config: &ResolverConfig,
        requests: Vec<PluginRequest>,
    ) -> Result<Self, ResolveError> {
        let locked: HashMap<String, String> = requests
            .iter()
            .filter(|request| request.locked)
            .map(|request| (request.name.clone(), request.declared_version.clone()))
            .collect();

        let mut policy = CompatibilityPolicy::new(&config.jenkins_version)?.with_locked(locked);
        if let Some(java_version) = &config.java_version {
            policy = policy.with_runtime_version(java_version)?;
        }

        Ok(Self {
            requests,
            fetcher: MetadataFetcher::new(source, &config.jenkins_version),
            policy,
            resolved: ResolvedSet::new(),
            dependency_policy: config.dependency_policy,
            concurrency: config.concurrency.max(1),
        })
    }

    /// Resolve every request and return the chosen records sorted by name.
    ///
    /// Returns once all tasks have committed. The first fatal error aborts the
    /// tasks still running and is returned instead.
    pub async fn run(self: Arc<Self>) -> Result<BTreeMap<String, PluginRecord>, ResolveError> {
        info!(
            "Resolving {} plugins against Jenkins {} with {} workers",
            self.requests.len(),
            self.policy.platform_version(),
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for index in 0..self.requests.len() {
            let resolver = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                resolver.resolve_request(&resolver.requests[index]).await
            });
        }

        // Dropping the set on error aborts the remaining tasks
        while let Some(joined) = tasks.join_next().await {
            joined??;
        }

        let resolved = self.resolved.snapshot()?;
        info!("Resolved {} plugins", resolved.len());
        Ok(resolved)
    }

    async fn resolve_request(&self, request: &PluginRequest) -> Result<(), ResolveError> {
        let candidate = self
            .fetch_backfilled(&request.name, request.wanted_version(), &request.declared_version)
            .await?;

        let verdict = self.policy.evaluate(&candidate, &self.resolved)?;
        let mut chosen = if verdict.is_accept() {
            candidate
        } else {
            log_rejection(&candidate, &verdict);
            self.fetch_declared(request).await?
        };

        if verdict.is_accept()
            && self.dependency_policy == DependencyPolicy::AllOrNothing
            && let Some(dependency) = self.first_rejected_dependency(&chosen).await?
        {
            info!(
                "{} {} needs {} {} which cannot be installed, keeping {}",
                chosen.name,
                chosen.version,
                dependency.name,
                dependency.min_version,
                display_declared(request)
            );
            chosen = self.fetch_declared(request).await?;
        }

        if chosen.version.is_empty() {
            return Err(ResolveError::MissingVersion(request.name.clone()));
        }

        let mut path = vec![request.name.clone()];
        self.walk_dependencies(&chosen, &mut path).await?;

        debug!("Committing {} {}", request.name, chosen.version);
        self.resolved.insert(&request.name, chosen)?;
        Ok(())
    }

    /// Forced fallback to the declared release, trusted without a second check
    async fn fetch_declared(&self, request: &PluginRequest) -> Result<PluginRecord, ResolveError> {
        self.fetch_backfilled(
            &request.name,
            &request.declared_version,
            &request.declared_version,
        )
        .await
    }

    async fn fetch_backfilled(
        &self,
        name: &str,
        version: &str,
        declared_version: &str,
    ) -> Result<PluginRecord, ResolveError> {
        Ok(self
            .fetcher
            .fetch(name, version)
            .await?
            .with_version_or(declared_version))
    }

    async fn first_rejected_dependency(
        &self,
        record: &PluginRecord,
    ) -> Result<Option<DependencyRef>, ResolveError> {
        for dependency in &record.dependencies {
            let candidate = self
                .fetch_backfilled(&dependency.name, &dependency.min_version, &dependency.min_version)
                .await?;
            if !self.policy.accepts(&candidate, &self.resolved)? {
                return Ok(Some(dependency.clone()));
            }
        }
        Ok(None)
    }

    /// Bring in the dependencies of `record`, depth first.
    ///
    /// `path` holds the names from the requested plugin down to `record`; a
    /// dependency already on it closes a cycle. Rejected dependencies are
    /// skipped without failing the parent.
    fn walk_dependencies<'a>(
        &'a self,
        record: &'a PluginRecord,
        path: &'a mut Vec<String>,
    ) -> BoxFuture<'a, Result<(), ResolveError>> {
        async move {
            for dependency in &record.dependencies {
                if path.contains(&dependency.name) {
                    let mut cycle = path.clone();
                    cycle.push(dependency.name.clone());
                    return Err(ResolveError::DependencyCycle(cycle));
                }

                let candidate = self
                    .fetch_backfilled(&dependency.name, &dependency.min_version, &dependency.min_version)
                    .await?;

                let verdict = self.policy.evaluate(&candidate, &self.resolved)?;
                if !verdict.is_accept() {
                    log_rejection(&candidate, &verdict);
                    continue;
                }

                let previous = self.resolved.insert(&dependency.name, candidate.clone())?;
                if previous.is_some_and(|p| p.version == candidate.version) {
                    continue;
                }
                debug!(
                    "{} brings in {} {}",
                    path.last().map(String::as_str).unwrap_or_default(),
                    dependency.name,
                    candidate.version
                );

                path.push(dependency.name.clone());
                self.walk_dependencies(&candidate, path).await?;
                path.pop();
            }
            Ok(())
        }
        .boxed()
    }
}

/// Resolve `requests` against the plugins served by `source`
pub async fn resolve_plugins(
    source: Arc<dyn PluginSource>,
    config: &ResolverConfig,
    requests: Vec<PluginRequest>,
) -> Result<BTreeMap<String, PluginRecord>, ResolveError> {
    Arc::new(Resolver::new(source, config, requests)?).run().await
}

fn log_rejection(candidate: &PluginRecord, verdict: &Verdict) {
    match verdict {
        Verdict::Accept => {}
        Verdict::Downgrade { resolved_version } => debug!(
            "Skipping {} {}: {} already resolved",
            candidate.name, candidate.version, resolved_version
        ),
        Verdict::Locked { locked_version } => info!(
            "Skipping {} {}: locked to {}",
            candidate.name, candidate.version, locked_version
        ),
        Verdict::PlatformTooOld { required } => info!(
            "Skipping {} {}: requires Jenkins {}",
            candidate.name, candidate.version, required
        ),
        Verdict::RuntimeTooOld { required } => info!(
            "Skipping {} {}: requires Java {}",
            candidate.name, candidate.version, required
        ),
    }
}

fn display_declared(request: &PluginRequest) -> &str {
    if request.declared_version.is_empty() {
        "the latest release"
    } else {
        &request.declared_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::error::FetchError;
    use crate::version::manifest::{
        JENKINS_VERSION, Manifest, PLUGIN_DEPENDENCIES, PLUGIN_VERSION, SHORT_NAME,
    };
    use crate::version::registry::MockPluginSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory update center keyed by (name, version), "" for latest
    #[derive(Default)]
    struct StaticSource {
        releases: HashMap<(String, String), Manifest>,
    }

    impl StaticSource {
        fn with(mut self, name: &str, version: &str, latest: bool, jenkins: &str, deps: &str) -> Self {
            let manifest: Manifest = [
                (SHORT_NAME, name),
                (PLUGIN_VERSION, version),
                (JENKINS_VERSION, jenkins),
                (PLUGIN_DEPENDENCIES, deps),
            ]
            .into_iter()
            .collect();
            if latest {
                self.releases
                    .insert((name.to_string(), String::new()), manifest.clone());
            }
            self.releases
                .insert((name.to_string(), version.to_string()), manifest);
            self
        }
    }

    #[async_trait::async_trait]
    impl PluginSource for StaticSource {
        async fn fetch_manifest(&self, name: &str, version: &str) -> Result<Manifest, FetchError> {
            self.releases
                .get(&(name.to_string(), version.to_string()))
                .cloned()
                .ok_or_else(|| FetchError::NotFound(format!("{name}@{version}")))
        }
    }

    fn config() -> ResolverConfig {
        ResolverConfig {
            concurrency: 4,
            ..ResolverConfig::default()
        }
    }

    async fn resolve(
        source: StaticSource,
        config: &ResolverConfig,
        requests: Vec<PluginRequest>,
    ) -> Result<BTreeMap<String, PluginRecord>, ResolveError> {
        resolve_plugins(Arc::new(source), config, requests).await
    }

    fn versions(resolved: &BTreeMap<String, PluginRecord>) -> Vec<(&str, &str)> {
        resolved
            .iter()
            .map(|(name, record)| (name.as_str(), record.version.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn unlocked_plugin_moves_to_compatible_latest() {
        let source = StaticSource::default()
            .with("foo", "1.0", false, "2.100", "")
            .with("foo", "2.0", true, "2.200", "");

        let resolved = resolve(source, &config(), vec![PluginRequest::new("foo", "1.0", false)])
            .await
            .unwrap();

        assert_eq!(versions(&resolved), vec![("foo", "2.0")]);
    }

    #[tokio::test]
    async fn locked_plugin_keeps_declared_version() {
        let source = StaticSource::default()
            .with("bar", "1.5", false, "2.100", "")
            .with("bar", "2.0", true, "2.200", "");

        let resolved = resolve(source, &config(), vec![PluginRequest::new("bar", "1.5", true)])
            .await
            .unwrap();

        assert_eq!(versions(&resolved), vec![("bar", "1.5")]);
    }

    #[tokio::test]
    async fn incompatible_latest_falls_back_to_declared_version() {
        let source = StaticSource::default()
            .with("foo", "1.0", false, "2.100", "")
            .with("foo", "3.0", true, "2.300", "");

        let resolved = resolve(source, &config(), vec![PluginRequest::new("foo", "1.0", false)])
            .await
            .unwrap();

        assert_eq!(versions(&resolved), vec![("foo", "1.0")]);
    }

    #[tokio::test]
    async fn unknown_plugin_keeps_declared_version() {
        let resolved = resolve(
            StaticSource::default(),
            &config(),
            vec![PluginRequest::new("baz", "1.0", false)],
        )
        .await
        .unwrap();

        assert_eq!(versions(&resolved), vec![("baz", "1.0")]);
        assert_eq!(resolved["baz"].long_name, "baz");
    }

    #[tokio::test]
    async fn unknown_plugin_without_declared_version_is_an_error() {
        let result = resolve(
            StaticSource::default(),
            &config(),
            vec![PluginRequest::new("baz", "", false)],
        )
        .await;

        assert!(matches!(result, Err(ResolveError::MissingVersion(name)) if name == "baz"));
    }

    #[tokio::test]
    async fn compatible_dependencies_are_added() {
        let source = StaticSource::default()
            .with("git", "4.3.0", true, "2.200", "credentials:2.3.0,scm-api:2.6.3")
            .with("credentials", "2.3.0", false, "2.150", "")
            .with("scm-api", "2.6.3", false, "2.150", "");

        let resolved = resolve(source, &config(), vec![PluginRequest::new("git", "4.2.2", false)])
            .await
            .unwrap();

        assert_eq!(
            versions(&resolved),
            vec![("credentials", "2.3.0"), ("git", "4.3.0"), ("scm-api", "2.6.3")]
        );
    }

    #[tokio::test]
    async fn dependencies_are_walked_transitively() {
        let source = StaticSource::default()
            .with("git", "4.3.0", true, "2.200", "git-client:3.2.1")
            .with("git-client", "3.2.1", false, "2.150", "jsch:0.1.55")
            .with("jsch", "0.1.55", false, "2.150", "");

        let resolved = resolve(source, &config(), vec![PluginRequest::new("git", "4.2.2", false)])
            .await
            .unwrap();

        assert_eq!(
            versions(&resolved),
            vec![("git", "4.3.0"), ("git-client", "3.2.1"), ("jsch", "0.1.55")]
        );
    }

    #[tokio::test]
    async fn incompatible_dependency_is_skipped_with_best_effort() {
        let source = StaticSource::default()
            .with("qux", "1.0", false, "2.100", "")
            .with("qux", "2.0", true, "2.200", "dep:1.0")
            .with("dep", "1.0", false, "9.9.9", "");

        let resolved = resolve(source, &config(), vec![PluginRequest::new("qux", "1.0", false)])
            .await
            .unwrap();

        assert_eq!(versions(&resolved), vec![("qux", "2.0")]);
    }

    #[tokio::test]
    async fn incompatible_dependency_keeps_declared_version_with_all_or_nothing() {
        let source = StaticSource::default()
            .with("qux", "1.0", false, "2.100", "")
            .with("qux", "2.0", true, "2.200", "dep:1.0")
            .with("dep", "1.0", false, "9.9.9", "");
        let config = ResolverConfig {
            dependency_policy: DependencyPolicy::AllOrNothing,
            ..config()
        };

        let resolved = resolve(source, &config, vec![PluginRequest::new("qux", "1.0", false)])
            .await
            .unwrap();

        assert_eq!(versions(&resolved), vec![("qux", "1.0")]);
    }

    #[tokio::test]
    async fn dependency_never_downgrades_requested_plugin() {
        let source = StaticSource::default()
            .with("git", "4.3.0", true, "2.200", "credentials:2.1.0")
            .with("credentials", "2.1.0", false, "2.150", "")
            .with("credentials", "2.3.0", true, "2.150", "");
        let config = ResolverConfig {
            concurrency: 1,
            ..config()
        };

        let resolved = resolve(
            source,
            &config,
            vec![
                PluginRequest::new("credentials", "2.1.0", false),
                PluginRequest::new("git", "4.2.2", false),
            ],
        )
        .await
        .unwrap();

        assert_eq!(resolved["credentials"].version, "2.3.0");
    }

    #[tokio::test]
    async fn dependency_never_overrides_a_lock() {
        let source = StaticSource::default()
            .with("git", "4.3.0", true, "2.200", "mailer:1.32")
            .with("mailer", "1.30", false, "2.100", "")
            .with("mailer", "1.32", true, "2.100", "");

        let resolved = resolve(
            source,
            &config(),
            vec![
                PluginRequest::new("git", "4.2.2", false),
                PluginRequest::new("mailer", "1.30", true),
            ],
        )
        .await
        .unwrap();

        assert_eq!(resolved["mailer"].version, "1.30");
    }

    #[tokio::test]
    async fn dependency_cycle_is_reported() {
        let source = StaticSource::default()
            .with("a", "1.0", true, "2.100", "b:1.0")
            .with("b", "1.0", false, "2.100", "a:1.0");

        let result = resolve(source, &config(), vec![PluginRequest::new("a", "1.0", false)]).await;

        assert!(matches!(
            result,
            Err(ResolveError::DependencyCycle(path)) if path == vec!["a", "b", "a"]
        ));
    }

    #[tokio::test]
    async fn shared_dependency_is_resolved_once() {
        let source = StaticSource::default()
            .with("git", "4.3.0", true, "2.200", "credentials:2.3.0")
            .with("ssh-agent", "1.19", true, "2.200", "credentials:2.3.0")
            .with("credentials", "2.3.0", false, "2.150", "");

        let resolved = resolve(
            source,
            &config(),
            vec![
                PluginRequest::new("git", "4.2.2", false),
                PluginRequest::new("ssh-agent", "1.17", false),
            ],
        )
        .await
        .unwrap();

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved["credentials"].version, "2.3.0");
    }

    /// Source that records how many fetches are in flight at once
    #[derive(Default)]
    struct SlowSource {
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl PluginSource for SlowSource {
        async fn fetch_manifest(&self, name: &str, _version: &str) -> Result<Manifest, FetchError> {
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok([(SHORT_NAME, name), (PLUGIN_VERSION, "1.0")]
                .into_iter()
                .collect())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_bounds_fetches_in_flight() {
        let source = Arc::new(SlowSource::default());
        let requests = (0..20)
            .map(|i| PluginRequest::new(format!("plugin-{i}"), "1.0", false))
            .collect();
        let config = ResolverConfig {
            concurrency: 3,
            ..config()
        };

        let resolved = resolve_plugins(source.clone(), &config, requests)
            .await
            .unwrap();

        assert_eq!(resolved.len(), 20);
        assert!(source.max_active.load(Ordering::SeqCst) <= 3);
        assert!(source.max_active.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn fatal_fetch_error_aborts_resolution() {
        let mut source = MockPluginSource::new();
        source.expect_fetch_manifest().returning(|name, _| {
            Err(FetchError::UnexpectedStatus {
                status: 500,
                url: format!("/latest/{name}.hpi"),
            })
        });

        let result = resolve_plugins(
            Arc::new(source),
            &config(),
            vec![
                PluginRequest::new("git", "4.2.2", false),
                PluginRequest::new("mailer", "1.30", false),
            ],
        )
        .await;

        assert!(matches!(
            result,
            Err(ResolveError::Fetch(FetchError::UnexpectedStatus { status: 500, .. }))
        ));
    }

    #[tokio::test]
    async fn repeated_fetches_hit_the_cache() {
        let mut source = MockPluginSource::new();
        source
            .expect_fetch_manifest()
            .withf(|name, version| name == "credentials" && version == "2.3.0")
            .times(1)
            .returning(|_, _| {
                Ok([(SHORT_NAME, "credentials"), (PLUGIN_VERSION, "2.3.0")]
                    .into_iter()
                    .collect())
            });
        source
            .expect_fetch_manifest()
            .withf(|_, version| version.is_empty())
            .times(2)
            .returning(|name, _| {
                Ok([
                    (SHORT_NAME, name),
                    (PLUGIN_VERSION, "1.0"),
                    (PLUGIN_DEPENDENCIES, "credentials:2.3.0"),
                ]
                .into_iter()
                .collect())
            });
        let config = ResolverConfig {
            concurrency: 1,
            ..config()
        };

        let resolved = resolve_plugins(
            Arc::new(source),
            &config,
            vec![
                PluginRequest::new("git", "1.0", false),
                PluginRequest::new("ssh-agent", "1.0", false),
            ],
        )
        .await
        .unwrap();

        assert_eq!(resolved.len(), 3);
    }
}
