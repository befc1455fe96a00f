use crl_types::Role;

use crate::error::GateError;
use crate::stage::{AccessRequest, GateContext, GateStage, Operation, StageDecision};

/// Role constraint stage.
///
/// Enforces which roles may perform which operations: grants are managed
/// only by patients over their own identity and can only target doctors;
/// roster reads are doctor-only; record operations target a registered
/// patient, and a patient caller may only touch their own index.
pub struct RoleStage;

impl GateStage for RoleStage {
    fn name(&self) -> &str {
        "role"
    }

    fn evaluate(
        &self,
        request: &AccessRequest,
        context: &GateContext,
    ) -> Result<StageDecision, GateError> {
        match request.operation {
            Operation::AppendRecord { patient } | Operation::ReadRecords { patient } => {
                if context.patient_role != Some(Role::Patient) {
                    return Ok(StageDecision::Fail {
                        reason: format!("target {patient} is not a patient"),
                    });
                }
                if context.caller_role == Some(Role::Patient) && request.caller != patient {
                    return Ok(StageDecision::Fail {
                        reason: "a patient may only access their own records".into(),
                    });
                }
            }
            Operation::GrantAccess { doctor } | Operation::RevokeAccess { doctor } => {
                if context.caller_role != Some(Role::Patient) {
                    return Ok(StageDecision::Fail {
                        reason: "only a patient may manage access grants".into(),
                    });
                }
                if context.grantee_role != Some(Role::Doctor) {
                    return Ok(StageDecision::Fail {
                        reason: format!("grant target {doctor} is not a doctor"),
                    });
                }
            }
            Operation::ReadRoster => {
                if context.caller_role != Some(Role::Doctor) {
                    return Ok(StageDecision::Fail {
                        reason: "only a doctor may read their patient roster".into(),
                    });
                }
            }
        }

        Ok(StageDecision::Pass)
    }
}
