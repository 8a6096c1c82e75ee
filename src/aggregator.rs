//! Fans one identity out to every registered probe and merges the results.

use crate::config::ProbeSettings;
use crate::identity::normalize;
use crate::probe::{Probe, ProbeCache, ProbeRegistry};
use crate::types::{AggregateReport, ProbeFault, ProbeResult, ReportEntry, Result};
use futures::stream::{self, StreamExt};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Runs every probe in the registry against one identity.
pub struct Aggregator {
    registry: ProbeRegistry,
    dispatch: Dispatch,
}

/// Per-probe execution shared by all spawned probe tasks.
#[derive(Clone)]
struct Dispatch {
    cache: ProbeCache,
    rate_limiter: Arc<DirectRateLimiter>,
    probe_timeout: Duration,
}

impl Aggregator {
    /// Create an aggregator over the standard providers.
    pub fn new(settings: &ProbeSettings) -> Result<Self> {
        let registry = ProbeRegistry::from_settings(settings)?;
        Ok(Self::with_registry(registry, settings))
    }

    /// Create an aggregator over an explicit registry.
    pub fn with_registry(registry: ProbeRegistry, settings: &ProbeSettings) -> Self {
        let rate = NonZeroU32::new(settings.rate_limit).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(rate)));

        Self {
            registry,
            dispatch: Dispatch {
                cache: ProbeCache::new(settings.cache_ttl),
                rate_limiter,
                probe_timeout: settings.timeout,
            },
        }
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Check one identity against every provider.
    ///
    /// The identity is normalized once and the same value goes to every probe.
    /// Entries follow registry order regardless of completion order, and a
    /// failing probe only ever contributes its own policy-mapped entry.
    /// Dropping the returned future aborts any probes still in flight.
    pub async fn check(&self, raw: &str) -> AggregateReport {
        let start_time = Instant::now();
        let identity = normalize(raw).to_string();
        let probes = self.registry.probes();
        debug!("Checking '{}' as '{}' against {} providers", raw, identity, probes.len());

        let mut tasks = JoinSet::new();
        for (idx, probe) in probes.iter().enumerate() {
            let probe = Arc::clone(probe);
            let dispatch = self.dispatch.clone();
            let identity = identity.clone();
            tasks.spawn(async move { (idx, dispatch.run(probe.as_ref(), &identity).await) });
        }

        // Wait for every probe before building the report
        let mut results: Vec<Option<ProbeResult>> = vec![None; probes.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => results[idx] = Some(result),
                Err(e) => warn!("Probe task for '{}' failed: {}", identity, e),
            }
        }

        let entries = probes
            .iter()
            .zip(results)
            .map(|(probe, result)| {
                let result = result.unwrap_or_else(|| {
                    ProbeResult::from_fault(
                        ProbeFault::Transport("probe task failed".to_string()),
                        &probe.fault_policy(),
                    )
                });
                ReportEntry {
                    provider: probe.name().to_string(),
                    presence: result.presence,
                    reported: result.presence.as_reported(probe.indeterminate_as()),
                    fault: result.fault.map(|f| f.to_string()),
                }
            })
            .collect();

        AggregateReport {
            identity: raw.to_string(),
            normalized: identity,
            entries,
            duration_secs: start_time.elapsed().as_secs_f64(),
        }
    }

    /// Check several identities, returning reports in input order.
    pub async fn check_multiple(&self, identities: &[String], parallel: usize) -> Vec<AggregateReport> {
        self.check_multiple_with(identities, parallel, |_| {}).await
    }

    /// Like [`check_multiple`](Self::check_multiple), calling `on_report` as
    /// each report completes.
    pub async fn check_multiple_with<F>(
        &self,
        identities: &[String],
        parallel: usize,
        on_report: F,
    ) -> Vec<AggregateReport>
    where
        F: Fn(&AggregateReport),
    {
        let on_report = &on_report;
        let mut indexed: Vec<(usize, AggregateReport)> = stream::iter(identities.iter().enumerate())
            .map(|(idx, identity)| async move {
                let report = self.check(identity).await;
                on_report(&report);
                (idx, report)
            })
            .buffer_unordered(parallel.max(1))
            .collect()
            .await;

        indexed.sort_by_key(|(idx, _)| *idx);
        indexed.into_iter().map(|(_, report)| report).collect()
    }
}

impl Dispatch {
    async fn run(&self, probe: &dyn Probe, identity: &str) -> ProbeResult {
        if let Some(presence) = self.cache.get(probe.name(), identity) {
            trace!("Cache hit for {} on '{}'", probe.name(), identity);
            return ProbeResult::definitive(presence);
        }

        self.rate_limiter.until_ready().await;

        let result = match tokio::time::timeout(self.probe_timeout, probe.probe(identity)).await {
            Ok(result) => result,
            Err(_) => {
                let fault = ProbeFault::Transport(format!(
                    "timed out after {}ms",
                    self.probe_timeout.as_millis()
                ));
                warn!("{} probe for '{}': {}", probe.name(), identity, fault);
                ProbeResult::from_fault(fault, &probe.fault_policy())
            }
        };

        if result.fault.is_none() {
            self.cache.set(probe.name(), identity, result.presence);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderEndpoints;
    use crate::probe::registry::{GITHUB, GITLAB, REDDIT, TIKTOK, YOUTUBE};
    use crate::test_support::{refused_endpoint, stalled_endpoint, CannedServer};
    use crate::types::{FaultPolicy, Presence};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeProbe {
        name: String,
        result: ProbeResult,
        delay: Duration,
        policy: FaultPolicy,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl FakeProbe {
        fn new(name: &str, presence: Presence) -> Self {
            Self {
                name: name.to_string(),
                result: ProbeResult::definitive(presence),
                delay: Duration::ZERO,
                policy: FaultPolicy::cautious(),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(name: &str, fault: ProbeFault) -> Self {
            let policy = FaultPolicy::cautious();
            let mut probe = Self::new(name, Presence::Indeterminate);
            probe.result = ProbeResult::from_fault(fault, &policy);
            probe
        }

        fn delayed(mut self, millis: u64) -> Self {
            self.delay = Duration::from_millis(millis);
            self
        }
    }

    #[async_trait]
    impl Probe for FakeProbe {
        fn name(&self) -> &str {
            &self.name
        }

        fn fault_policy(&self) -> FaultPolicy {
            self.policy
        }

        async fn probe(&self, identity: &str) -> ProbeResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(identity.to_string());
            tokio::time::sleep(self.delay).await;
            self.result.clone()
        }
    }

    fn settings() -> ProbeSettings {
        ProbeSettings {
            timeout: Duration::from_secs(5),
            rate_limit: 1000,
            system_proxy: false,
            ..ProbeSettings::default()
        }
    }

    fn aggregator(probes: Vec<Arc<FakeProbe>>, settings: &ProbeSettings) -> Aggregator {
        let probes = probes.into_iter().map(|p| p as Arc<dyn Probe>).collect();
        Aggregator::with_registry(ProbeRegistry::new(probes), settings)
    }

    #[tokio::test]
    async fn test_normalizes_once_for_every_probe() {
        let a = Arc::new(FakeProbe::new("A", Presence::Present));
        let b = Arc::new(FakeProbe::new("B", Presence::Absent));
        let agg = aggregator(vec![a.clone(), b.clone()], &settings());

        let report = agg.check("@alice").await;

        assert_eq!(report.identity, "@alice");
        assert_eq!(report.normalized, "alice");
        assert_eq!(*a.seen.lock().unwrap(), vec!["alice"]);
        assert_eq!(*b.seen.lock().unwrap(), vec!["alice"]);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_batch() {
        let probes = vec![
            Arc::new(FakeProbe::new("A", Presence::Present)),
            Arc::new(FakeProbe::new("B", Presence::Absent)),
            Arc::new(FakeProbe::failing("C", ProbeFault::Transport("connection refused".into()))),
            Arc::new(FakeProbe::new("D", Presence::Present)),
            Arc::new(FakeProbe::new("E", Presence::Absent)),
        ];
        let agg = aggregator(probes, &settings());

        let report = agg.check("bob").await;

        assert_eq!(report.entries.len(), 5);
        let failed = report.entry("C").unwrap();
        assert_eq!(failed.presence, Presence::Indeterminate);
        assert!(!failed.reported);
        assert_eq!(
            failed.fault.as_deref(),
            Some("transport failure: connection refused")
        );
        assert_eq!(report.present_count(), 2);
    }

    #[tokio::test]
    async fn test_display_order_independent_of_completion_order() {
        let fast_first = vec![
            Arc::new(FakeProbe::new("A", Presence::Present).delayed(60)),
            Arc::new(FakeProbe::new("B", Presence::Absent).delayed(30)),
            Arc::new(FakeProbe::new("C", Presence::Present)),
        ];
        let slow_first = vec![
            Arc::new(FakeProbe::new("A", Presence::Present)),
            Arc::new(FakeProbe::new("B", Presence::Absent).delayed(30)),
            Arc::new(FakeProbe::new("C", Presence::Present).delayed(60)),
        ];

        let first = aggregator(fast_first, &settings()).check("carol").await;
        let second = aggregator(slow_first, &settings()).check("carol").await;

        let names: Vec<&str> = first.entries.iter().map(|e| e.provider.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(first.entries, second.entries);
        assert_eq!(first.render(), second.render());
    }

    #[tokio::test]
    async fn test_slow_probe_times_out_as_indeterminate() {
        let slow = Arc::new(FakeProbe::new("Slow", Presence::Present).delayed(5_000));
        let fast = Arc::new(FakeProbe::new("Fast", Presence::Present));
        let settings = ProbeSettings {
            timeout: Duration::from_millis(50),
            ..settings()
        };
        let agg = aggregator(vec![slow, fast], &settings);

        let report = agg.check("dave").await;

        let slow = report.entry("Slow").unwrap();
        assert_eq!(slow.presence, Presence::Indeterminate);
        assert!(slow.fault.as_deref().unwrap().contains("timed out"));
        assert_eq!(report.entry("Fast").unwrap().presence, Presence::Present);
    }

    #[tokio::test]
    async fn test_definitive_results_are_cached() {
        let good = Arc::new(FakeProbe::new("Good", Presence::Present));
        let bad = Arc::new(FakeProbe::failing("Bad", ProbeFault::UnexpectedStatus(503)));
        let agg = aggregator(vec![good.clone(), bad.clone()], &settings());

        agg.check("erin").await;
        agg.check("@erin").await;

        assert_eq!(good.calls.load(Ordering::SeqCst), 1);
        assert_eq!(bad.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_check_multiple_preserves_input_order() {
        let probe = Arc::new(FakeProbe::new("A", Presence::Absent).delayed(10));
        let agg = aggregator(vec![probe], &settings());
        let identities: Vec<String> = ["x", "@y", "z", "w"].iter().map(|s| s.to_string()).collect();

        let reports = agg.check_multiple(&identities, 4).await;

        let order: Vec<&str> = reports.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(order, vec!["x", "@y", "z", "w"]);
    }

    #[tokio::test]
    async fn test_check_multiple_reports_each_completion() {
        let probe = Arc::new(FakeProbe::new("A", Presence::Present).delayed(5));
        let agg = aggregator(vec![probe], &settings());
        let identities: Vec<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        let completed = Mutex::new(Vec::new());

        let reports = agg
            .check_multiple_with(&identities, 2, |report| {
                completed.lock().unwrap().push(report.identity.clone())
            })
            .await;

        let mut completed = completed.into_inner().unwrap();
        completed.sort();
        assert_eq!(completed, vec!["x", "y", "z"]);
        assert_eq!(reports.len(), 3);
    }

    #[tokio::test]
    async fn test_dropped_check_aborts_running_probes() {
        let slow = Arc::new(FakeProbe::new("Slow", Presence::Present).delayed(150));
        let agg = aggregator(vec![slow.clone()], &settings());

        let dropped = tokio::time::timeout(Duration::from_millis(20), agg.check("frank")).await;
        assert!(dropped.is_err());

        // An orphaned probe would have finished and cached its result by now
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(slow.calls.load(Ordering::SeqCst), 1);

        let report = agg.check("frank").await;
        assert_eq!(report.entry("Slow").unwrap().presence, Presence::Present);
        assert_eq!(slow.calls.load(Ordering::SeqCst), 2);
    }

    fn loopback_settings(endpoints: ProviderEndpoints) -> ProbeSettings {
        ProbeSettings {
            endpoints,
            youtube_api_key: Some("fake-key".to_string()),
            timeout: Duration::from_secs(2),
            ..settings()
        }
    }

    #[tokio::test]
    async fn test_end_to_end_against_loopback_providers() {
        let reddit = CannedServer::start(200, "false").await;
        let youtube = CannedServer::start(200, r#"{"kind":"youtube#channelListResponse"}"#).await;
        let tiktok = CannedServer::start(200, vec![b'x'; 184_000]).await;
        let gitlab = CannedServer::start(
            200,
            r#"[{"username":"bob","id":9,"web_url":"https://gitlab.com/bob"}]"#,
        )
        .await;
        let github = CannedServer::start(404, r#"{"message":"Not Found"}"#).await;

        let settings = loopback_settings(ProviderEndpoints {
            reddit: format!("{}/api/username_available.json?user={{identity}}", reddit.url),
            youtube: format!("{}/channels?forUsername={{identity}}&key={{key}}", youtube.url),
            tiktok: format!("{}/@{{identity}}", tiktok.url),
            gitlab: format!("{}/api/v4/users?username={{identity}}", gitlab.url),
            github: format!("{}/users/{{identity}}", github.url),
        });
        let agg = Aggregator::new(&settings).unwrap();

        let report = agg.check("@alice").await;

        assert_eq!(
            report.render(),
            "Search results for username '@alice':\n\
             - Reddit: true\n\
             - YouTube: false\n\
             - TikTok: false\n\
             - GitLab: true\n\
             - GitHub: false\n"
        );
        assert!(github.requests()[0].starts_with("GET /users/alice "));
        assert!(youtube.requests()[0].contains("key=fake-key"));
        assert!(report.entries.iter().all(|e| e.fault.is_none()));
    }

    #[tokio::test]
    async fn test_end_to_end_with_unreachable_providers() {
        let refused = refused_endpoint().await;
        let stalled = stalled_endpoint().await;
        let reddit = CannedServer::start(200, "true").await;
        let gitlab = CannedServer::start(200, "[]").await;

        let mut settings = loopback_settings(ProviderEndpoints {
            reddit: format!("{}/r?user={{identity}}", reddit.url),
            youtube: format!("{}/c?forUsername={{identity}}&key={{key}}", refused),
            tiktok: format!("{}/@{{identity}}", stalled),
            gitlab: format!("{}/u?username={{identity}}", gitlab.url),
            github: format!("{}/users/{{identity}}", refused),
        });
        settings.timeout = Duration::from_millis(300);
        let agg = Aggregator::new(&settings).unwrap();

        let report = agg.check("carol").await;

        assert_eq!(report.entries.len(), 5);
        assert_eq!(report.entry(REDDIT).unwrap().presence, Presence::Absent);
        assert_eq!(report.entry(GITLAB).unwrap().presence, Presence::Absent);
        for name in [YOUTUBE, TIKTOK, GITHUB] {
            let entry = report.entry(name).unwrap();
            assert_eq!(entry.presence, Presence::Indeterminate, "{}", name);
            assert!(!entry.reported);
            assert!(entry.fault.is_some());
        }
    }
}
