use crate::error::GateError;
use crate::stage::{AccessRequest, GateContext, GateStage, StageDecision};

/// Capability verification stage.
///
/// For patient-scoped operations by anyone other than the patient, the
/// caller must hold an Active capability from that patient. Revoked and
/// never-granted read the same here: no active capability.
pub struct CapabilityStage;

impl GateStage for CapabilityStage {
    fn name(&self) -> &str {
        "capability"
    }

    fn evaluate(
        &self,
        request: &AccessRequest,
        context: &GateContext,
    ) -> Result<StageDecision, GateError> {
        let patient = match request.operation.patient_scope(&request.caller) {
            Some(patient) => patient,
            // Not patient-scoped; nothing to verify.
            None => return Ok(StageDecision::Pass),
        };

        if patient == request.caller {
            // Acting on one's own data never needs a capability.
            return Ok(StageDecision::Pass);
        }

        if !context.has_active_grant {
            return Ok(StageDecision::Fail {
                reason: format!(
                    "no active capability from {patient} (absent or revoked)"
                ),
            });
        }

        Ok(StageDecision::Pass)
    }
}
