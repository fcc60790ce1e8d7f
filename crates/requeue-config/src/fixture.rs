//! Pipeline fixture parsing.
//!
//! A fixture describes one or more pipelines and the current state of their
//! jobs:
//!
//! ```kdl
//! pipeline "app" {
//!     stages "build" "test" "deploy"
//!     triggered-by pipeline="upstream" job="trigger-app" strategy="depend"
//!     job "build" stage="build" status="pending"
//!     job "test" stage="test" status="skipped" needs="build"
//! }
//! ```

use crate::nodes::{
    all_string_args, bool_value, first_string_arg, string_list_prop, string_prop,
};
use crate::{ConfigError, ConfigResult};
use kdl::{KdlDocument, KdlNode};
use requeue_core::dag::check_acyclic;
use requeue_core::{
    BridgeStrategy, DependencyGraph, Job, JobStatus, Pipeline, ResourceId, SourceBridge,
};

/// Pipelines parsed from a fixture document, in document order.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub pipelines: Vec<Pipeline>,
}

impl Fixture {
    pub fn pipeline(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.name == name)
    }
}

/// Unresolved `triggered-by` reference.
struct BridgeRef {
    pipeline: String,
    job: String,
    strategy: BridgeStrategy,
}

/// Parse a fixture document containing one or more pipelines.
pub fn parse_fixture(kdl: &str) -> ConfigResult<Fixture> {
    let doc: KdlDocument = kdl.parse()?;

    let mut parsed: Vec<(Pipeline, Option<BridgeRef>)> = Vec::new();
    for node in doc.nodes() {
        if node.name().value() == "pipeline" {
            let (pipeline, bridge) = parse_pipeline_node(node)?;
            if parsed.iter().any(|(p, _)| p.name == pipeline.name) {
                return Err(ConfigError::Duplicate(format!("pipeline '{}'", pipeline.name)));
            }
            parsed.push((pipeline, bridge));
        }
    }

    if parsed.is_empty() {
        return Err(ConfigError::MissingField("pipeline".to_string()));
    }

    // Resolve bridges once every pipeline has its ids
    let mut bridges = Vec::with_capacity(parsed.len());
    for (pipeline, bridge) in &parsed {
        let resolved = match bridge {
            Some(bridge) => Some(resolve_bridge(&pipeline.name, bridge, &parsed)?),
            None => None,
        };
        bridges.push(resolved);
    }

    let pipelines = parsed
        .into_iter()
        .zip(bridges)
        .map(|((mut pipeline, _), bridge)| {
            pipeline.source_bridge = bridge;
            pipeline
        })
        .collect();

    Ok(Fixture { pipelines })
}

/// Parse a fixture and return its first pipeline.
pub fn parse_pipeline(kdl: &str) -> ConfigResult<Pipeline> {
    parse_fixture(kdl)?
        .pipelines
        .into_iter()
        .next()
        .ok_or_else(|| ConfigError::MissingField("pipeline".to_string()))
}

fn parse_pipeline_node(node: &KdlNode) -> ConfigResult<(Pipeline, Option<BridgeRef>)> {
    let name = first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField("pipeline name".to_string()))?;

    let mut pipeline = Pipeline::new(name);
    let mut bridge = None;

    let Some(children) = node.children() else {
        return Ok((pipeline, None));
    };

    let stages: Vec<String> = children
        .nodes()
        .iter()
        .find(|child| child.name().value() == "stages")
        .map(all_string_args)
        .unwrap_or_default();

    for child in children.nodes() {
        match child.name().value() {
            "job" => {
                let job = parse_job(child, &stages)?;
                if pipeline.job_named(&job.name).is_some() {
                    return Err(ConfigError::Duplicate(format!(
                        "job '{}' in pipeline '{}'",
                        job.name, pipeline.name
                    )));
                }
                pipeline.push(job);
            }
            "triggered-by" => {
                bridge = Some(parse_bridge_ref(child)?);
            }
            _ => {} // stages, and anything unknown
        }
    }

    validate_needs(&pipeline)?;

    Ok((pipeline, bridge))
}

fn parse_job(node: &KdlNode, stages: &[String]) -> ConfigResult<Job> {
    let name = first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField("job name".to_string()))?;

    let stage_index = match node.get("stage") {
        None => 0,
        Some(value) => {
            if let Some(index) = value.as_integer() {
                u32::try_from(index).map_err(|_| ConfigError::InvalidValue {
                    field: format!("stage of job '{}'", name),
                    message: format!("stage index out of range: {}", index),
                })?
            } else if let Some(stage) = value.as_string() {
                let position = stages.iter().position(|s| s == stage).ok_or_else(|| {
                    ConfigError::InvalidReference(format!(
                        "job '{}' is in unknown stage '{}'",
                        name, stage
                    ))
                })?;
                position as u32
            } else {
                return Err(ConfigError::InvalidValue {
                    field: format!("stage of job '{}'", name),
                    message: format!("expected a stage name or index, got {}", value),
                });
            }
        }
    };

    let status = match string_prop(node, "status") {
        Some(status) => status
            .parse::<JobStatus>()
            .map_err(|e| ConfigError::InvalidValue {
                field: format!("status of job '{}'", name),
                message: e.to_string(),
            })?,
        None => JobStatus::Created,
    };

    let allow_failure = match node.get("allow-failure") {
        Some(value) => bool_value(value, "allow-failure")?,
        None => false,
    };

    let needs = string_list_prop(node, "needs");

    // The pipeline id is assigned when the job is pushed.
    Ok(Job::new(ResourceId::new(), name, stage_index, status)
        .with_needs(needs)
        .with_allow_failure(allow_failure))
}

fn parse_bridge_ref(node: &KdlNode) -> ConfigResult<BridgeRef> {
    let pipeline = string_prop(node, "pipeline")
        .ok_or_else(|| ConfigError::MissingField("triggered-by pipeline".to_string()))?;
    let job = string_prop(node, "job")
        .ok_or_else(|| ConfigError::MissingField("triggered-by job".to_string()))?;

    let strategy = match string_prop(node, "strategy").as_deref() {
        None | Some("none") => BridgeStrategy::None,
        Some("depend") => BridgeStrategy::Depend,
        Some(other) => {
            return Err(ConfigError::InvalidValue {
                field: "strategy".to_string(),
                message: format!("unknown bridge strategy: {}", other),
            });
        }
    };

    Ok(BridgeRef {
        pipeline,
        job,
        strategy,
    })
}

fn resolve_bridge(
    downstream: &str,
    bridge: &BridgeRef,
    parsed: &[(Pipeline, Option<BridgeRef>)],
) -> ConfigResult<SourceBridge> {
    let upstream = parsed
        .iter()
        .map(|(p, _)| p)
        .find(|p| p.name == bridge.pipeline)
        .ok_or_else(|| {
            ConfigError::InvalidReference(format!(
                "pipeline '{}' is triggered by unknown pipeline '{}'",
                downstream, bridge.pipeline
            ))
        })?;

    if upstream.name == downstream {
        return Err(ConfigError::InvalidReference(format!(
            "pipeline '{}' cannot trigger itself",
            downstream
        )));
    }

    let job = upstream.job_named(&bridge.job).ok_or_else(|| {
        ConfigError::InvalidReference(format!(
            "pipeline '{}' is triggered by unknown job '{}' in '{}'",
            downstream, bridge.job, bridge.pipeline
        ))
    })?;

    Ok(SourceBridge {
        pipeline_id: upstream.id,
        job_id: job.id,
        strategy: bridge.strategy,
    })
}

/// Needs must name a job of the same pipeline in the same or an earlier
/// stage, and must not form a cycle.
fn validate_needs(pipeline: &Pipeline) -> ConfigResult<()> {
    for job in &pipeline.jobs {
        for need in &job.needs {
            let Some(needed) = pipeline.job_named(need) else {
                return Err(ConfigError::InvalidReference(format!(
                    "job '{}' needs unknown job '{}'",
                    job.name, need
                )));
            };
            if needed.stage_index > job.stage_index {
                return Err(ConfigError::InvalidReference(format!(
                    "job '{}' needs '{}', which is in a later stage",
                    job.name, need
                )));
            }
        }
    }

    check_acyclic(&DependencyGraph::from_jobs(&pipeline.jobs))?;
    Ok(())
}
