pub mod controller;
pub mod diagnosis;
pub mod exec;
pub mod history;
pub mod prompt;
pub mod reasoner;
pub mod truncate;

pub use controller::{ExecutionMode, LoopController, TurnAction};
pub use diagnosis::{Diagnosis, NextStep};
pub use exec::{CommandRunner, ExecutionReport, ShellRunner};
pub use history::{recent_commands, HistoryEntry, Role};
pub use prompt::compose;
pub use reasoner::StructuredReasoner;
pub use truncate::truncate_middle;
