//! Requeue orchestrator - reprocesses the jobs skipped behind a retried job.

use requeue_config::RequeueSettings;
use requeue_core::dag::DagError;
use requeue_core::status::{self, Transition};
use requeue_core::{BridgeReset, BridgeResetter, Error, JobStatus, JobStore, ResourceId};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ordering::order_for_processing;
use crate::resolver::dependents_of;
use crate::retry::{LockOutcome, retry_lock};

/// Errors that abort a whole requeue before any job is touched.
#[derive(Debug, Error)]
pub enum RequeueError {
    #[error("job '{job}' could not be retried because its dependency graph is invalid: {source}")]
    InvalidGraph {
        job: String,
        #[source]
        source: DagError,
    },

    #[error(transparent)]
    Store(#[from] Error),
}

/// What processing did to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    /// The job left `skipped` and is now in `status`.
    Requeued { status: JobStatus },
    /// The job stays skipped because these needs still block it.
    Unchanged { blocking: Vec<String> },
}

/// A job that was processed.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedJob {
    pub id: ResourceId,
    pub name: String,
    pub outcome: JobOutcome,
    pub attempts: u32,
}

/// Why a job could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// Every attempt lost the optimistic-lock race.
    ConflictExhausted { attempts: u32 },
    /// The job no longer exists.
    Missing,
    /// The job was no longer skipped when its turn came.
    UnexpectedState { status: JobStatus },
    /// Any other store error.
    Store { message: String },
}

/// A job that was skipped over because processing it failed.
#[derive(Debug, Clone, Serialize)]
pub struct JobFailure {
    pub id: ResourceId,
    pub name: String,
    pub reason: FailureReason,
}

/// What happened to the pipeline's source bridge.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BridgeOutcome {
    NoBridge,
    NotDependent,
    /// The bridge was reset to pending.
    Reset { bridge: String },
    /// The bridge was reset, but requeueing its upstream dependents failed.
    CascadeFailed { bridge: String, message: String },
    /// The reset itself failed.
    Failed { message: String },
}

/// Result of one requeue.
#[derive(Debug, Clone, Serialize)]
pub struct RequeueReport {
    /// The retried job.
    pub job: String,
    pub pipeline: String,
    /// Jobs processed, in processing order.
    pub processed: Vec<ProcessedJob>,
    pub failures: Vec<JobFailure>,
    pub bridge: BridgeOutcome,
    /// Report for the upstream pipeline when the bridge reset cascaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<Box<RequeueReport>>,
}

impl RequeueReport {
    /// No per-job failures here or upstream.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.upstream.as_ref().is_none_or(|u| u.is_clean())
    }

    /// Names of jobs that left `skipped`, in processing order.
    pub fn requeued(&self) -> Vec<&str> {
        self.processed
            .iter()
            .filter(|p| matches!(p.outcome, JobOutcome::Requeued { .. }))
            .map(|p| p.name.as_str())
            .collect()
    }
}

/// Reprocesses the dependents of a retried job.
pub struct RequeueOrchestrator {
    store: Arc<dyn JobStore>,
    bridges: Arc<dyn BridgeResetter>,
    settings: RequeueSettings,
}

impl RequeueOrchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        bridges: Arc<dyn BridgeResetter>,
        settings: RequeueSettings,
    ) -> Self {
        Self {
            store,
            bridges,
            settings,
        }
    }

    /// Reprocess every skipped job that depends on `job_id`, then reset the
    /// pipeline's source bridge.
    ///
    /// The processing order is computed and validated before anything is
    /// written, so an invalid dependency graph fails without side effects.
    /// Failures on individual jobs are collected in the report.
    pub async fn requeue(&self, job_id: ResourceId) -> Result<RequeueReport, RequeueError> {
        self.requeue_at_depth(job_id, 0).await
    }

    #[async_recursion::async_recursion]
    async fn requeue_at_depth(
        &self,
        job_id: ResourceId,
        depth: u32,
    ) -> Result<RequeueReport, RequeueError> {
        let job = self.store.job(job_id).await?;
        let pipeline = self.store.pipeline(job.pipeline_id).await?;

        let candidates = dependents_of(&job, &pipeline, self.settings.use_dag_resolution);
        let ordered: Vec<(ResourceId, String)> = order_for_processing(candidates, &pipeline)
            .map_err(|source| RequeueError::InvalidGraph {
                job: job.name.clone(),
                source,
            })?
            .into_iter()
            .map(|j| (j.id, j.name.clone()))
            .collect();

        info!(
            job = %job.name,
            pipeline = %pipeline.name,
            dependents = ordered.len(),
            dag = self.settings.use_dag_resolution,
            "Requeueing dependent jobs"
        );

        let mut processed = Vec::with_capacity(ordered.len());
        let mut failures = Vec::new();
        for (id, name) in ordered {
            match self.process(id, &name).await {
                Ok(p) => processed.push(p),
                Err(f) => failures.push(f),
            }
        }

        let (bridge, upstream) = self.reset_source_bridge(pipeline.id, depth).await;

        info!(
            job = %job.name,
            processed = processed.len(),
            failed = failures.len(),
            "Requeue finished"
        );

        Ok(RequeueReport {
            job: job.name,
            pipeline: pipeline.name,
            processed,
            failures,
            bridge,
            upstream,
        })
    }

    /// One attempt of the `process` transition, on a fresh read of the job.
    async fn attempt(&self, id: ResourceId) -> requeue_core::Result<JobOutcome> {
        let current = self.store.job(id).await?;
        let needed = self
            .store
            .jobs_named(current.pipeline_id, &current.needs)
            .await?;

        match status::process(&current, &needed)? {
            Transition::Requeue { to } => {
                let updated = self
                    .store
                    .update_status(id, current.lock_version, to)
                    .await?;
                Ok(JobOutcome::Requeued {
                    status: updated.status,
                })
            }
            Transition::Blocked { blocking } => Ok(JobOutcome::Unchanged { blocking }),
        }
    }

    /// Apply the `process` transition to one job under optimistic locking.
    async fn process(&self, id: ResourceId, name: &str) -> Result<ProcessedJob, JobFailure> {
        let outcome = retry_lock(&self.settings.lock_retry, name, || self.attempt(id)).await;

        let failure = |reason: FailureReason| JobFailure {
            id,
            name: name.to_string(),
            reason,
        };

        match outcome {
            LockOutcome::Applied { value, attempts } => {
                debug!(job = %name, outcome = ?value, attempts, "Processed job");
                Ok(ProcessedJob {
                    id,
                    name: name.to_string(),
                    outcome: value,
                    attempts,
                })
            }
            LockOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                warn!(
                    job = %name,
                    attempts,
                    error = %last_error,
                    "Gave up processing job after lock conflicts"
                );
                Err(failure(FailureReason::ConflictExhausted { attempts }))
            }
            LockOutcome::Failed { error, .. } => {
                warn!(job = %name, error = %error, "Skipping job that could not be processed");
                let reason = match error {
                    Error::NotFound(_) => FailureReason::Missing,
                    Error::UnexpectedState { status, .. } => {
                        FailureReason::UnexpectedState { status }
                    }
                    other => FailureReason::Store {
                        message: other.to_string(),
                    },
                };
                Err(failure(reason))
            }
        }
    }

    async fn reset_source_bridge(
        &self,
        pipeline_id: ResourceId,
        depth: u32,
    ) -> (BridgeOutcome, Option<Box<RequeueReport>>) {
        let bridge = match self.bridges.reset_source_bridge(pipeline_id).await {
            Ok(BridgeReset::NoBridge) => return (BridgeOutcome::NoBridge, None),
            Ok(BridgeReset::NotDependent) => return (BridgeOutcome::NotDependent, None),
            Ok(BridgeReset::Reset { bridge }) => bridge,
            Err(e) => {
                warn!(pipeline = %pipeline_id, error = %e, "Failed to reset source bridge");
                return (
                    BridgeOutcome::Failed {
                        message: e.to_string(),
                    },
                    None,
                );
            }
        };

        info!(bridge = %bridge.name, "Reset source bridge");

        if !self.settings.cascade_upstream {
            return (BridgeOutcome::Reset { bridge: bridge.name }, None);
        }
        if depth >= self.settings.max_upstream_depth {
            warn!(bridge = %bridge.name, depth, "Upstream cascade depth reached");
            return (BridgeOutcome::Reset { bridge: bridge.name }, None);
        }

        match self.requeue_at_depth(bridge.id, depth + 1).await {
            Ok(upstream) => (
                BridgeOutcome::Reset { bridge: bridge.name },
                Some(Box::new(upstream)),
            ),
            Err(e) => {
                warn!(bridge = %bridge.name, error = %e, "Failed to requeue upstream of bridge");
                (
                    BridgeOutcome::CascadeFailed {
                        bridge: bridge.name,
                        message: e.to_string(),
                    },
                    None,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use requeue_config::RetryPolicy;
    use requeue_core::{BridgeStrategy, Job, Pipeline, SourceBridge};
    use requeue_db::MemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Memory store that can make one job always conflict, or delete one job
    /// the first time it is read on its own (after the pipeline snapshot).
    struct FlakyStore {
        inner: MemoryStore,
        conflicting: Option<ResourceId>,
        deleted_on_read: Option<ResourceId>,
        conflict_attempts: AtomicU32,
    }

    impl FlakyStore {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                conflicting: None,
                deleted_on_read: None,
                conflict_attempts: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl JobStore for FlakyStore {
        async fn job(&self, id: ResourceId) -> requeue_core::Result<Job> {
            if self.deleted_on_read == Some(id) {
                self.inner.remove_job(id).await;
            }
            self.inner.job(id).await
        }

        async fn pipeline(&self, id: ResourceId) -> requeue_core::Result<Pipeline> {
            self.inner.pipeline(id).await
        }

        async fn jobs_named(
            &self,
            pipeline_id: ResourceId,
            names: &[String],
        ) -> requeue_core::Result<Vec<Job>> {
            self.inner.jobs_named(pipeline_id, names).await
        }

        async fn update_status(
            &self,
            id: ResourceId,
            expected_version: u64,
            status: JobStatus,
        ) -> requeue_core::Result<Job> {
            if self.conflicting == Some(id) {
                self.conflict_attempts.fetch_add(1, Ordering::SeqCst);
                return Err(Error::StaleVersion {
                    job: id,
                    expected: expected_version,
                    actual: expected_version + 1,
                });
            }
            self.inner.update_status(id, expected_version, status).await
        }
    }

    fn settings() -> RequeueSettings {
        RequeueSettings {
            lock_retry: RetryPolicy::immediate(3),
            ..RequeueSettings::default()
        }
    }

    fn orchestrator(store: Arc<MemoryStore>, settings: RequeueSettings) -> RequeueOrchestrator {
        RequeueOrchestrator::new(store.clone(), store, settings)
    }

    async fn status_of(store: &MemoryStore, id: ResourceId) -> JobStatus {
        store.job(id).await.unwrap().status
    }

    /// build (stage 0) is being retried; everything after it was skipped.
    fn scenario() -> Pipeline {
        let mut p = Pipeline::new("app");
        let id = p.id;
        p.push(Job::new(id, "build", 0, JobStatus::Pending));
        p.push(Job::new(id, "test_a", 1, JobStatus::Skipped).with_needs(["build"]));
        p.push(Job::new(id, "test_b", 1, JobStatus::Skipped));
        p.push(Job::new(id, "deploy", 2, JobStatus::Skipped).with_needs(["test_a", "test_b"]));
        p
    }

    #[tokio::test]
    async fn test_end_to_end_requeue() {
        let p = scenario();
        let build = p.job_named("build").unwrap().id;
        let deploy = p.job_named("deploy").unwrap().id;
        let store = Arc::new(MemoryStore::with_pipelines([p]));

        let report = orchestrator(store.clone(), settings())
            .requeue(build)
            .await
            .unwrap();

        let order: Vec<_> = report.processed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(order.len(), 3);
        assert_eq!(order[2], "deploy");
        assert_eq!(report.requeued(), order);
        assert!(report.is_clean());
        assert!(matches!(report.bridge, BridgeOutcome::NoBridge));
        assert_eq!(status_of(&store, deploy).await, JobStatus::Created);
    }

    #[tokio::test]
    async fn test_blocked_need_keeps_dependents_skipped() {
        let mut p = Pipeline::new("app");
        let id = p.id;
        let build = p.push(Job::new(id, "build", 0, JobStatus::Pending));
        p.push(Job::new(id, "lint", 0, JobStatus::Failed));
        let test = p.push(
            Job::new(id, "test", 1, JobStatus::Skipped).with_needs(["build", "lint"]),
        );
        let deploy = p.push(Job::new(id, "deploy", 2, JobStatus::Skipped).with_needs(["test"]));
        let docs = p.push(Job::new(id, "docs", 2, JobStatus::Skipped));
        let store = Arc::new(MemoryStore::with_pipelines([p]));

        let report = orchestrator(store.clone(), settings())
            .requeue(build)
            .await
            .unwrap();

        assert_eq!(report.requeued(), vec!["docs"]);
        let test_outcome = &report.processed[0];
        assert_eq!(test_outcome.name, "test");
        assert_eq!(
            test_outcome.outcome,
            JobOutcome::Unchanged {
                blocking: vec!["lint".to_string()]
            }
        );
        assert_eq!(status_of(&store, test).await, JobStatus::Skipped);
        assert_eq!(status_of(&store, deploy).await, JobStatus::Skipped);
        assert_eq!(status_of(&store, docs).await, JobStatus::Created);
    }

    #[tokio::test]
    async fn test_conflict_on_one_job_does_not_stop_the_rest() {
        let mut p = Pipeline::new("app");
        let id = p.id;
        let root = p.push(Job::new(id, "root", 0, JobStatus::Pending));
        let a = p.push(Job::new(id, "A", 1, JobStatus::Skipped));
        let b = p.push(Job::new(id, "B", 2, JobStatus::Skipped));
        let c = p.push(Job::new(id, "C", 3, JobStatus::Skipped));

        let memory = MemoryStore::with_pipelines([p]);
        let mut flaky = FlakyStore::new(memory);
        flaky.conflicting = Some(b);
        let flaky = Arc::new(flaky);

        let bridges = Arc::new(MemoryStore::new());
        let orchestrator = RequeueOrchestrator::new(flaky.clone(), bridges, settings());
        let report = orchestrator.requeue(root).await.unwrap();

        assert_eq!(report.requeued(), vec!["A", "C"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "B");
        assert_eq!(
            report.failures[0].reason,
            FailureReason::ConflictExhausted { attempts: 3 }
        );
        assert_eq!(flaky.conflict_attempts.load(Ordering::SeqCst), 3);

        assert_eq!(status_of(&flaky.inner, a).await, JobStatus::Created);
        assert_eq!(status_of(&flaky.inner, b).await, JobStatus::Skipped);
        assert_eq!(status_of(&flaky.inner, c).await, JobStatus::Created);
    }

    #[tokio::test]
    async fn test_job_deleted_mid_requeue_is_skipped() {
        let p = scenario();
        let pipeline_id = p.id;
        let build = p.job_named("build").unwrap().id;
        let test_b = p.job_named("test_b").unwrap().id;

        let mut flaky = FlakyStore::new(MemoryStore::with_pipelines([p]));
        flaky.deleted_on_read = Some(test_b);
        let flaky = Arc::new(flaky);

        let orchestrator =
            RequeueOrchestrator::new(flaky.clone(), Arc::new(MemoryStore::new()), settings());
        let report = orchestrator.requeue(build).await.unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].reason, FailureReason::Missing);
        assert_eq!(report.requeued(), vec!["test_a"]);
        // deploy still needs test_b, which no longer exists
        assert_eq!(
            report.processed.last().unwrap().outcome,
            JobOutcome::Unchanged {
                blocking: vec!["test_b".to_string()]
            }
        );
        assert!(flaky.inner.job(test_b).await.is_err());
        let snapshot = flaky.inner.pipeline(pipeline_id).await.unwrap();
        assert_eq!(snapshot.jobs.len(), 3);
    }

    #[tokio::test]
    async fn test_cycle_aborts_without_side_effects() {
        let mut upstream = Pipeline::new("upstream");
        let upstream_id = upstream.id;
        let bridge = upstream.push(Job::new(upstream_id, "trigger", 0, JobStatus::Failed));

        let mut p = Pipeline::new("app");
        let id = p.id;
        p.source_bridge = Some(SourceBridge {
            pipeline_id: upstream_id,
            job_id: bridge,
            strategy: BridgeStrategy::Depend,
        });
        let build = p.push(Job::new(id, "build", 0, JobStatus::Pending));
        let lint = p.push(Job::new(id, "lint", 1, JobStatus::Skipped));
        let a = p.push(Job::new(id, "a", 1, JobStatus::Skipped).with_needs(["b"]));
        p.push(Job::new(id, "b", 1, JobStatus::Skipped).with_needs(["a"]));
        let store = Arc::new(MemoryStore::with_pipelines([upstream, p]));

        let err = orchestrator(store.clone(), settings())
            .requeue(build)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RequeueError::InvalidGraph {
                source: DagError::Cycle { .. },
                ..
            }
        ));
        assert!(err.to_string().contains("dependency graph is invalid"));
        assert_eq!(status_of(&store, lint).await, JobStatus::Skipped);
        assert_eq!(status_of(&store, a).await, JobStatus::Skipped);
        assert_eq!(status_of(&store, bridge).await, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_unknown_need_aborts() {
        let mut p = Pipeline::new("app");
        let id = p.id;
        let build = p.push(Job::new(id, "build", 0, JobStatus::Pending));
        p.push(Job::new(id, "test", 1, JobStatus::Skipped).with_needs(["ghost"]));
        let store = Arc::new(MemoryStore::with_pipelines([p]));

        let err = orchestrator(store, settings())
            .requeue(build)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RequeueError::InvalidGraph {
                source: DagError::MissingNode { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_retried_job_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let err = orchestrator(store, settings())
            .requeue(ResourceId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RequeueError::Store(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_legacy_resolution_ignores_same_stage_needs() {
        let mut p = Pipeline::new("app");
        let id = p.id;
        let build = p.push(Job::new(id, "build", 1, JobStatus::Pending));
        let package = p.push(Job::new(id, "package", 1, JobStatus::Skipped).with_needs(["build"]));
        let store = Arc::new(MemoryStore::with_pipelines([p]));

        let legacy = RequeueSettings {
            use_dag_resolution: false,
            ..settings()
        };
        let report = orchestrator(store.clone(), legacy)
            .requeue(build)
            .await
            .unwrap();
        assert!(report.processed.is_empty());
        assert_eq!(status_of(&store, package).await, JobStatus::Skipped);

        let report = orchestrator(store.clone(), settings())
            .requeue(build)
            .await
            .unwrap();
        assert_eq!(report.requeued(), vec!["package"]);
        assert_eq!(status_of(&store, package).await, JobStatus::Created);
    }

    fn bridged_pipelines() -> (Pipeline, Pipeline) {
        let mut upstream = Pipeline::new("upstream");
        let upstream_id = upstream.id;
        let trigger = upstream.push(Job::new(upstream_id, "trigger", 0, JobStatus::Failed));
        upstream.push(
            Job::new(upstream_id, "notify", 1, JobStatus::Skipped).with_needs(["trigger"]),
        );

        let mut downstream = scenario();
        downstream.source_bridge = Some(SourceBridge {
            pipeline_id: upstream_id,
            job_id: trigger,
            strategy: BridgeStrategy::Depend,
        });
        (upstream, downstream)
    }

    #[tokio::test]
    async fn test_bridge_reset_cascades_upstream() {
        let (upstream, downstream) = bridged_pipelines();
        let trigger = upstream.job_named("trigger").unwrap().id;
        let notify = upstream.job_named("notify").unwrap().id;
        let build = downstream.job_named("build").unwrap().id;
        let store = Arc::new(MemoryStore::with_pipelines([upstream, downstream]));

        let report = orchestrator(store.clone(), settings())
            .requeue(build)
            .await
            .unwrap();

        assert!(matches!(&report.bridge, BridgeOutcome::Reset { bridge } if bridge == "trigger"));
        let upstream = report.upstream.as_ref().unwrap();
        assert_eq!(upstream.pipeline, "upstream");
        assert_eq!(upstream.requeued(), vec!["notify"]);
        assert!(matches!(upstream.bridge, BridgeOutcome::NoBridge));

        assert_eq!(status_of(&store, trigger).await, JobStatus::Pending);
        assert_eq!(status_of(&store, notify).await, JobStatus::Created);
    }

    #[tokio::test]
    async fn test_bridge_reset_without_cascade() {
        let (upstream, downstream) = bridged_pipelines();
        let trigger = upstream.job_named("trigger").unwrap().id;
        let notify = upstream.job_named("notify").unwrap().id;
        let build = downstream.job_named("build").unwrap().id;
        let store = Arc::new(MemoryStore::with_pipelines([upstream, downstream]));

        let no_cascade = RequeueSettings {
            cascade_upstream: false,
            ..settings()
        };
        let report = orchestrator(store.clone(), no_cascade)
            .requeue(build)
            .await
            .unwrap();

        assert!(matches!(report.bridge, BridgeOutcome::Reset { .. }));
        assert!(report.upstream.is_none());
        assert_eq!(status_of(&store, trigger).await, JobStatus::Pending);
        assert_eq!(status_of(&store, notify).await, JobStatus::Skipped);
    }

    #[tokio::test]
    async fn test_concurrent_requeues_process_each_job_once() {
        let p = scenario();
        let build = p.job_named("build").unwrap().id;
        let store = Arc::new(MemoryStore::with_pipelines([p]));

        let first = orchestrator(store.clone(), settings());
        let second = orchestrator(store.clone(), settings());
        let (a, b) = futures::join!(first.requeue(build), second.requeue(build));
        let (a, b) = (a.unwrap(), b.unwrap());

        for name in ["test_a", "test_b", "deploy"] {
            let wins = a
                .requeued()
                .into_iter()
                .chain(b.requeued())
                .filter(|n| *n == name)
                .count();
            assert_eq!(wins, 1, "{} requeued {} times", name, wins);
        }

        let snapshot = store.pipeline(store.job(build).await.unwrap().pipeline_id).await.unwrap();
        assert!(snapshot.skipped_jobs().next().is_none());
    }

    #[test]
    fn test_report_serializes() {
        let report = RequeueReport {
            job: "build".into(),
            pipeline: "app".into(),
            processed: vec![ProcessedJob {
                id: ResourceId::new(),
                name: "test".into(),
                outcome: JobOutcome::Requeued {
                    status: JobStatus::Created,
                },
                attempts: 1,
            }],
            failures: vec![],
            bridge: BridgeOutcome::NoBridge,
            upstream: None,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["processed"][0]["outcome"]["outcome"], "requeued");
        assert_eq!(json["processed"][0]["outcome"]["status"], "created");
        assert_eq!(json["bridge"]["result"], "no_bridge");
        assert!(json.get("upstream").is_none());
    }
}
