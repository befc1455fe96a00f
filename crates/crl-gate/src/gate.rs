use std::time::{Duration, Instant};

use crl_crypto::ContentHasher;
use tracing::debug;
use uuid::Uuid;

use crate::config::GateConfig;
use crate::error::GateError;
use crate::stage::{AccessRequest, GateContext, GateStage, RequestState, StageDecision, StageResult};
use crate::stages::{CapabilityStage, RegistrationStage, RoleStage};

// ---------------------------------------------------------------------------
// GateResult
// ---------------------------------------------------------------------------

/// The outcome of running a request through the full gate pipeline.
#[derive(Clone, Debug)]
pub struct GateResult {
    /// The request this result answers.
    pub request: Uuid,
    /// Final state of the request state machine.
    pub state: RequestState,
    /// BLAKE3 hash of the gate configuration that was active.
    pub config_hash: [u8; 32],
    /// Per-stage results in evaluation order.
    pub stage_results: Vec<StageResult>,
    /// Total wall-clock time for the pipeline evaluation.
    pub elapsed: Duration,
}

impl GateResult {
    /// Returns `true` if the request was authorized.
    pub fn is_authorized(&self) -> bool {
        self.state.is_authorized()
    }

    /// The denial reason, if the request was denied.
    pub fn denial_reason(&self) -> Option<&str> {
        match &self.state {
            RequestState::Denied { reason } => Some(reason),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// AccessGate
// ---------------------------------------------------------------------------

/// The access gate: a pipeline of stages that every request must pass
/// through before it can reach the ledger or the resolver.
///
/// The gate is the ONLY path to patient data — no bypass is possible.
pub struct AccessGate {
    stages: Vec<Box<dyn GateStage>>,
    config: GateConfig,
}

impl AccessGate {
    /// Create a new gate with the given configuration and an empty
    /// pipeline. Use [`Self::add_stage`] to add stages, or
    /// [`Self::with_default_stages`] for the standard pipeline.
    pub fn new(config: GateConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// Create a gate with the default stage pipeline:
    /// Registration -> Role -> Capability
    pub fn with_default_stages(config: GateConfig) -> Self {
        let mut gate = Self::new(config);
        gate.add_stage(Box::new(RegistrationStage));
        gate.add_stage(Box::new(RoleStage));
        gate.add_stage(Box::new(CapabilityStage));
        gate
    }

    /// Append a stage to the end of the pipeline.
    pub fn add_stage(&mut self, stage: Box<dyn GateStage>) {
        self.stages.push(stage);
    }

    /// The current configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Evaluate a request through the full pipeline.
    ///
    /// The pipeline is **fail-fast**: the first stage that fails stops
    /// evaluation and the request ends `Denied`. A request whose
    /// registration stage passed is `Authenticated`; one that clears
    /// every stage is `Authorized`.
    pub fn evaluate(
        &self,
        request: &AccessRequest,
        context: &mut GateContext,
    ) -> Result<GateResult, GateError> {
        let pipeline_start = Instant::now();
        let config_hash = self.compute_config_hash();

        // In permissive mode, skip all stage evaluations and authorize.
        if self.config.permissive {
            return Ok(GateResult {
                request: request.id,
                state: RequestState::Authorized(request.caller),
                config_hash,
                stage_results: Vec::new(),
                elapsed: pipeline_start.elapsed(),
            });
        }

        let mut state = RequestState::Unauthenticated;
        let mut stage_results = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let stage_start = Instant::now();
            let decision = stage.evaluate(request, context)?;
            let elapsed = stage_start.elapsed();

            let (passed, reason) = match &decision {
                StageDecision::Pass => (true, None),
                StageDecision::Fail { reason } => (false, Some(reason.clone())),
            };

            let result = StageResult {
                stage_name: stage.name().to_string(),
                passed,
                reason,
                elapsed,
            };
            stage_results.push(result.clone());
            context.previous_stages.push(result);

            // Fail-fast: stop on first failure.
            if let StageDecision::Fail { reason } = decision {
                debug!(
                    request = %request.id,
                    caller = %request.caller,
                    operation = request.operation.name(),
                    stage = stage.name(),
                    %reason,
                    "request denied"
                );
                return Ok(GateResult {
                    request: request.id,
                    state: RequestState::Denied { reason },
                    config_hash,
                    stage_results,
                    elapsed: pipeline_start.elapsed(),
                });
            }

            // A passing registration stage authenticates the caller.
            if state == RequestState::Unauthenticated {
                state = RequestState::Authenticated(request.caller);
            }
        }

        debug!(
            request = %request.id,
            caller = %request.caller,
            operation = request.operation.name(),
            "request authorized"
        );
        Ok(GateResult {
            request: request.id,
            state: RequestState::Authorized(request.caller),
            config_hash,
            stage_results,
            elapsed: pipeline_start.elapsed(),
        })
    }

    /// Compute a BLAKE3 hash of the active gate configuration.
    fn compute_config_hash(&self) -> [u8; 32] {
        let hasher = ContentHasher::new("crl-gate-config-v1");
        match hasher.hash_json(&self.config) {
            Ok(id) => *id.as_bytes(),
            Err(_) => [0u8; 32],
        }
    }
}
