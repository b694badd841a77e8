pub mod collaborators;
pub mod orchestrator;
pub mod placement;
pub mod stage;

pub use collaborators::{ConflictSink, LogConflictSink, PickRequest, SourcePicker};
pub use orchestrator::{InstallOutcome, ModInstaller, SharedInstance};
pub use stage::{InstallStage, StageTracker};
