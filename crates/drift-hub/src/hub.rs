use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use drift_cache::{GlobalCache, HubCache};
use drift_domain::{Job, JobStatus, Perspective, Provider as ProviderKind};
use drift_engine::{AnalysisMode, AnalysisRequest as EngineRequest};
use drift_graph::{Edge, ResourceNode};
use drift_provider::{DiscoverOptions, ProviderError, ProviderRegistry};
use serde_json::json;
use tokio::sync::{RwLock, Semaphore};
use tracing::{info, warn};
use uuid::Uuid;

use crate::bus::{Event, EventBus};
use crate::drift_store::DriftStore;
use crate::error::HubError;
use crate::job::JobRegistry;

#[derive(Debug, Clone)]
pub struct DiscoveryRequest {
    pub provider: ProviderKind,
    pub regions: Vec<String>,
    pub options: DiscoverOptions,
}

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub cache_ttl: StdDuration,
    pub discovery_timeout: StdDuration,
    pub max_parallel_regions: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            cache_ttl: StdDuration::from_secs(300),
            discovery_timeout: StdDuration::from_secs(300),
            max_parallel_regions: 5,
        }
    }
}

/// Orchestrates discovery jobs: consults the Global Cache, fans out to the
/// provider registry under a bounded semaphore, merges results into the Hub
/// cache, and announces progress on the event bus. Owns no lock itself; all
/// mutable state lives in `HubCache`/`GlobalCache`/`JobRegistry`.
#[derive(Clone)]
pub struct DiscoveryHub {
    providers: Arc<ProviderRegistry>,
    hub_cache: HubCache,
    global_cache: GlobalCache,
    jobs: JobRegistry,
    drift_store: DriftStore,
    last_graph: Arc<RwLock<Option<(Vec<ResourceNode>, Vec<Edge>)>>>,
    bus: EventBus,
    config: HubConfig,
}

impl DiscoveryHub {
    pub fn new(
        providers: Arc<ProviderRegistry>,
        hub_cache: HubCache,
        global_cache: GlobalCache,
        jobs: JobRegistry,
        bus: EventBus,
        config: HubConfig,
    ) -> Self {
        Self {
            providers,
            hub_cache,
            global_cache,
            jobs,
            drift_store: DriftStore::new(),
            last_graph: Arc::new(RwLock::new(None)),
            bus,
            config,
        }
    }

    pub fn jobs(&self) -> &JobRegistry {
        &self.jobs
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn hub_cache(&self) -> &HubCache {
        &self.hub_cache
    }

    pub fn global_cache(&self) -> &GlobalCache {
        &self.global_cache
    }

    pub fn drift_store(&self) -> &DriftStore {
        &self.drift_store
    }

    /// The dependency graph built by the most recent `analyze` call, if any.
    pub async fn last_graph(&self) -> Option<(Vec<ResourceNode>, Vec<Edge>)> {
        self.last_graph.read().await.clone()
    }

    fn cache_key(provider: ProviderKind, regions: &[String]) -> String {
        let mut sorted = regions.to_vec();
        sorted.sort();
        format!("discovery:{}:{}", provider, sorted.join(","))
    }

    /// On a Global Cache hit, returns an already-completed pseudo-job
    /// immediately. On a miss, records a `running` job and spawns the
    /// background worker, returning its id without waiting for completion.
    pub async fn start_discovery(&self, request: DiscoveryRequest) -> Result<String, HubError> {
        let now = Utc::now();
        let key = Self::cache_key(request.provider, &request.regions);

        if let Some(hit) = self.global_cache.get_with_age(&key, now).await {
            let job_id = Uuid::new_v4().to_string();
            let count = hit.value.as_array().map(|a| a.len()).unwrap_or(0);
            let job = Job::cache_hit(job_id.clone(), request.provider, request.regions.clone(), now, count, hit.age_seconds);
            self.jobs.insert(job).await;
            self.bus
                .publish(Event::new(
                    "discovery_cache_hit",
                    Some(job_id.clone()),
                    json!({
                        "provider": request.provider.to_string(),
                        "resource_count": count,
                        "age_seconds": hit.age_seconds,
                    }),
                    now,
                ))
                .await;
            return Ok(job_id);
        }

        let job_id = Uuid::new_v4().to_string();
        let job = Job::new(job_id.clone(), request.provider, request.regions.clone(), now);
        self.jobs.insert(job).await;
        self.bus
            .publish(Event::new(
                "discovery_started",
                Some(job_id.clone()),
                json!({"provider": request.provider.to_string(), "regions": request.regions}),
                now,
            ))
            .await;

        let hub = self.clone();
        let job_id_task = job_id.clone();
        tokio::spawn(async move {
            hub.run_discovery(job_id_task, request, key).await;
        });

        Ok(job_id)
    }

    async fn run_discovery(&self, job_id: String, request: DiscoveryRequest, cache_key: String) {
        let provider = match self.providers.for_provider(request.provider) {
            Ok(p) => p,
            Err(e) => {
                self.fail_job(&job_id, e.to_string()).await;
                return;
            }
        };

        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_regions.max(1)));
        let total = request.regions.len().max(1);
        let mut tasks = Vec::new();
        for region in request.regions.clone() {
            let provider = Arc::clone(&provider);
            let semaphore = Arc::clone(&semaphore);
            let options = request.options.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
                provider.discover(&region, &options).await
            }));
        }

        let work = async {
            let mut resources = Vec::new();
            let mut errors = Vec::new();
            for (i, task) in tasks.into_iter().enumerate() {
                match task.await {
                    Ok(Ok((mut found, summary))) => {
                        resources.append(&mut found);
                        let progress = (((i + 1) * 90) / total) as u8;
                        let _ = self
                            .jobs
                            .set_progress(&job_id, progress, format!("scanned region {}", summary.region))
                            .await;
                        self.bus
                            .publish(Event::new(
                                "discovery_progress",
                                Some(job_id.clone()),
                                json!({"progress": progress, "region": summary.region, "found": summary.resource_count}),
                                Utc::now(),
                            ))
                            .await;
                    }
                    Ok(Err(ProviderError::PartialFailure { results, errors: region_errors })) => {
                        resources.extend(results);
                        let region_name = request.regions.get(i).cloned().unwrap_or_else(|| "unknown".to_string());
                        self.bus
                            .publish(Event::new(
                                "terminal_output",
                                Some(job_id.clone()),
                                json!({
                                    "text": format!("partial failure in region {}: {}", region_name, region_errors.join("; ")),
                                    "kind": "warn",
                                }),
                                Utc::now(),
                            ))
                            .await;
                        errors.extend(region_errors);
                    }
                    Ok(Err(e)) => errors.push(e.to_string()),
                    Err(e) => errors.push(format!("discovery task panicked: {}", e)),
                }
            }
            (resources, errors)
        };

        let outcome = tokio::time::timeout(self.config.discovery_timeout, work).await;

        if let Some(job) = self.jobs.get(&job_id).await {
            if job.status == JobStatus::Cancelled {
                return;
            }
        }

        let (resources, errors) = match outcome {
            Ok(result) => result,
            Err(_) => {
                self.fail_job(&job_id, format!("discovery timed out after {:?}", self.config.discovery_timeout))
                    .await;
                return;
            }
        };

        if resources.is_empty() && !errors.is_empty() {
            self.fail_job(&job_id, errors.join("; ")).await;
            return;
        }

        let now = Utc::now();
        let count = resources.len();
        if let Err(e) = self.hub_cache.merge(resources.clone(), now).await {
            self.fail_job(&job_id, e.to_string()).await;
            return;
        }
        let value = serde_json::to_value(&resources).unwrap_or_else(|_| json!([]));
        self.global_cache.set(cache_key, value, self.config.cache_ttl, now).await;

        if let Err(e) = self.jobs.complete(&job_id, now, count).await {
            warn!(job_id, error = %e, "failed to mark discovery job completed");
        }
        self.bus
            .publish(Event::new(
                "discovery_progress",
                Some(job_id.clone()),
                json!({"progress": 100}),
                now,
            ))
            .await;
        self.bus
            .publish(Event::new(
                "terminal_status",
                Some(job_id.clone()),
                json!({"status": "completed", "resource_count": count, "errors": errors}),
                now,
            ))
            .await;
        info!(job_id, count, "discovery job completed");
    }

    async fn fail_job(&self, job_id: &str, message: String) {
        let now = Utc::now();
        if let Err(e) = self.jobs.fail(job_id, now, message.clone()).await {
            warn!(job_id, error = %e, "failed to mark discovery job failed");
        }
        self.bus
            .publish(Event::new(
                "terminal_status",
                Some(job_id.to_string()),
                json!({"status": "failed", "error": message}),
                now,
            ))
            .await;
    }

    /// Cooperative: flips the job to `cancelled`. The worker observes this on
    /// its next poll after the in-flight provider calls finish or time out.
    pub async fn cancel_discovery(&self, job_id: &str) -> Result<(), HubError> {
        self.jobs.cancel(job_id, Utc::now()).await
    }

    /// Run the Drift Engine against a declared state document and the
    /// current Hub cache snapshot for `provider` (optionally narrowed to
    /// `region`). Synchronous: state parsing and correlation are CPU-bound,
    /// not I/O-bound, so there is no background job to poll. The resulting
    /// drift records are retained under a fresh job id so `GET /drift` and
    /// job cleanup stay in lockstep, and the graph built along the way is
    /// cached for `GET /graph`.
    pub async fn analyze(
        &self,
        provider: ProviderKind,
        region: Option<String>,
        state_body: String,
        mode: AnalysisMode,
    ) -> Result<(String, Perspective), HubError> {
        let now = Utc::now();
        let job_id = Uuid::new_v4().to_string();
        let regions = region.clone().into_iter().collect::<Vec<_>>();
        self.jobs.insert(Job::new(job_id.clone(), provider, regions, now)).await;

        let mut live = self.hub_cache.list().await;
        live.retain(|r| r.provider == provider && region.as_deref().map(|r2| r.region == r2).unwrap_or(true));

        let request = EngineRequest { provider, region: region.clone(), state_body, live, mode };
        let outcome = match drift_engine::analyze(request, now) {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(update_err) = self.jobs.fail(&job_id, now, e.to_string()).await {
                    warn!(job_id, error = %update_err, "failed to mark analysis job failed");
                }
                return Err(e.into());
            }
        };

        *self.last_graph.write().await = Some((outcome.graph_nodes.clone(), outcome.graph_edges.clone()));
        self.drift_store.insert(job_id.clone(), outcome.perspective.drifts.clone()).await;

        if let Err(e) = self.jobs.complete(&job_id, now, outcome.perspective.drifts.len()).await {
            warn!(job_id, error = %e, "failed to mark analysis job completed");
        }
        self.bus
            .publish(Event::new(
                "drift_summary",
                Some(job_id.clone()),
                json!({
                    "total_drifted": outcome.perspective.summary.total_drifted,
                    "critical_count": outcome.perspective.summary.critical_count,
                }),
                now,
            ))
            .await;
        for drift in &outcome.perspective.drifts {
            self.bus
                .publish(Event::new("drift_detected", Some(job_id.clone()), json!(drift), now))
                .await;
        }

        Ok((job_id, outcome.perspective))
    }

    /// Background sweep pruning terminal jobs and their retained drift
    /// records, mirroring `GlobalCache::spawn_sweeper`.
    pub fn spawn_job_cleanup(self: &Arc<Self>, interval: StdDuration, max_age: chrono::Duration) -> tokio::task::JoinHandle<()> {
        let hub = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = hub.jobs.cleanup(max_age, Utc::now()).await;
                if !removed.is_empty() {
                    hub.drift_store.prune(&removed).await;
                    tracing::debug!(count = removed.len(), "job registry cleanup pruned terminal jobs");
                }
            }
        })
    }
}
