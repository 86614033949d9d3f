//! Domain types shared by the core, the analyzers and the job store.
//!
//! - analyzer input (`DamageObservation`, `Severity`, `DamageInput`)
//! - core outputs (`CostEstimate`, `RiskSummary`, `HealthGrade`)
//! - job bookkeeping (`JobMeta`, `JobStatus`, `DamageReport`)

pub mod assessment;
pub mod job;
pub mod observation;

pub use assessment::*;
pub use job::*;
pub use observation::*;
