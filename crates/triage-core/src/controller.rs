use crate::diagnosis::{Diagnosis, NextStep};
use serde::Deserialize;

/// Whether proposed commands run server-side or are handed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Autonomous,
    Manual,
}

/// Outcome of one turn decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnAction {
    /// Terminal for this request: respond with a message, no command.
    Reply(String),
    /// Run the command server-side now (autonomous mode).
    Execute(String),
    /// Surface the command for the caller to run (manual mode).
    Surface(String),
}

/// The turn state machine: Start -> Reasoning -> {Command, Message};
/// Command -> {Executing, Blocked}; Message -> Terminal.
///
/// Holds no per-thread state itself; the thread's prior-command list is the
/// memory the repeat safeguard needs, and it is supplied per call.
pub struct LoopController {
    mode: ExecutionMode,
}

impl LoopController {
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Decide what happens with a reasoning result.
    ///
    /// Repeat-command safeguard: a command already issued in this thread,
    /// re-proposed while the request carries no new command output, is
    /// blocked and the turn degrades to a message naming the pending
    /// command. It stays blocked until new output arrives; a blocked
    /// command is never executed.
    pub fn decide(
        &self,
        diagnosis: &Diagnosis,
        prior_commands: &[String],
        new_output_supplied: bool,
    ) -> TurnAction {
        match diagnosis.next_step {
            NextStep::Message => TurnAction::Reply(diagnosis.message.clone()),
            NextStep::Command => {
                let command = diagnosis.command.as_str();
                if !new_output_supplied && prior_commands.iter().any(|c| c == command) {
                    tracing::info!(command = %command, "repeat command blocked pending output");
                    return TurnAction::Reply(format!(
                        "You still need to run the previously suggested command and share its output: {command}"
                    ));
                }
                match self.mode {
                    ExecutionMode::Autonomous => TurnAction::Execute(command.to_string()),
                    ExecutionMode::Manual => TurnAction::Surface(command.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command_diagnosis(cmd: &str) -> Diagnosis {
        Diagnosis {
            message: "running a check".into(),
            command: cmd.into(),
            next_step: NextStep::Command,
        }
        .normalized()
    }

    #[test]
    fn test_message_is_terminal() {
        let controller = LoopController::new(ExecutionMode::Autonomous);
        let action = controller.decide(&Diagnosis::reply("all done"), &[], false);
        assert_eq!(action, TurnAction::Reply("all done".into()));
    }

    #[test]
    fn test_fresh_command_executes_in_autonomous_mode() {
        // Scenario: first turn on "disk is full", no prior commands
        let controller = LoopController::new(ExecutionMode::Autonomous);
        let action = controller.decide(&command_diagnosis("df -h"), &[], false);
        assert_eq!(action, TurnAction::Execute("df -h".into()));
    }

    #[test]
    fn test_fresh_command_surfaces_in_manual_mode() {
        let controller = LoopController::new(ExecutionMode::Manual);
        let action = controller.decide(&command_diagnosis("df -h"), &[], false);
        assert_eq!(action, TurnAction::Surface("df -h".into()));
    }

    #[test]
    fn test_repeat_without_output_is_blocked() {
        // Scenario: same thread re-proposes the same command, no new output
        let controller = LoopController::new(ExecutionMode::Autonomous);
        let prior = vec!["df -h".to_string()];
        let action = controller.decide(&command_diagnosis("df -h"), &prior, false);
        match action {
            TurnAction::Reply(msg) => assert!(msg.contains("df -h")),
            other => panic!("expected Reply, got {other:?}"),
        }
    }

    #[test]
    fn test_repeat_with_new_output_proceeds() {
        let controller = LoopController::new(ExecutionMode::Autonomous);
        let prior = vec!["df -h".to_string()];
        let action = controller.decide(&command_diagnosis("df -h"), &prior, true);
        assert_eq!(action, TurnAction::Execute("df -h".into()));
    }

    #[test]
    fn test_safeguard_holds_in_both_modes() {
        let prior = vec!["free -m".to_string()];
        for mode in [ExecutionMode::Autonomous, ExecutionMode::Manual] {
            let controller = LoopController::new(mode);
            let action = controller.decide(&command_diagnosis("free -m"), &prior, false);
            assert!(matches!(action, TurnAction::Reply(_)));
        }
    }
}
