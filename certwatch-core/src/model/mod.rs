//! Record types flowing through the pipeline

pub mod run;
pub mod anomaly;
pub mod snapshot;

pub use run::VerificationRun;
pub use anomaly::AnomalyRecord;
pub use snapshot::DashboardSnapshot;
