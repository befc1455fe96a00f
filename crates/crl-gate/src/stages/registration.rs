use crate::error::GateError;
use crate::stage::{AccessRequest, GateContext, GateStage, StageDecision};

/// Registration verification stage.
///
/// Confirms every identity the request touches has completed
/// registration: the caller, the patient in scope, and the grant target.
/// Passing this stage is what moves a request from `Unauthenticated` to
/// `Authenticated`.
pub struct RegistrationStage;

impl GateStage for RegistrationStage {
    fn name(&self) -> &str {
        "registration"
    }

    fn evaluate(
        &self,
        request: &AccessRequest,
        context: &GateContext,
    ) -> Result<StageDecision, GateError> {
        if context.caller_role.is_none() {
            return Ok(StageDecision::Fail {
                reason: format!("unregistered identity: {}", request.caller),
            });
        }

        if let Some(patient) = request.operation.patient_scope(&request.caller) {
            if context.patient_role.is_none() {
                return Ok(StageDecision::Fail {
                    reason: format!("target patient {patient} is not registered"),
                });
            }
        }

        if let Some(grantee) = request.operation.grantee() {
            if context.grantee_role.is_none() {
                return Ok(StageDecision::Fail {
                    reason: format!("grant target {grantee} is not registered"),
                });
            }
        }

        Ok(StageDecision::Pass)
    }
}
