//! Built-in gate stages.

pub mod capability;
pub mod registration;
pub mod role;

pub use capability::CapabilityStage;
pub use registration::RegistrationStage;
pub use role::RoleStage;
