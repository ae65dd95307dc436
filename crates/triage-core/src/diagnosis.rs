use serde::{Deserialize, Serialize};

/// Structured result of one reasoning step.
///
/// `next_step = Command` means the assistant wants a command executed;
/// `next_step = Message` means it is replying (or done) with no command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub message: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub next_step: NextStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NextStep {
    Command,
    #[default]
    Message,
}

impl Diagnosis {
    /// A plain message with no command attached.
    pub fn reply(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            command: String::new(),
            next_step: NextStep::Message,
        }
    }

    /// Enforce the invariant `next_step == Command` iff `command` is non-empty.
    ///
    /// Model output is loosely shaped; the command field is authoritative.
    /// A whitespace-only command counts as empty.
    pub fn normalized(mut self) -> Self {
        if self.command.trim().is_empty() {
            self.command.clear();
            self.next_step = NextStep::Message;
        } else {
            self.next_step = NextStep::Command;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_forces_message() {
        let d = Diagnosis {
            message: "done".into(),
            command: "   ".into(),
            next_step: NextStep::Command,
        }
        .normalized();
        assert_eq!(d.next_step, NextStep::Message);
        assert!(d.command.is_empty());
    }

    #[test]
    fn test_nonempty_command_forces_command() {
        let d = Diagnosis {
            message: "checking disk".into(),
            command: "df -h".into(),
            next_step: NextStep::Message,
        }
        .normalized();
        assert_eq!(d.next_step, NextStep::Command);
        assert_eq!(d.command, "df -h");
    }

    #[test]
    fn test_deserialize_defaults() {
        let d: Diagnosis = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(d.command, "");
        assert_eq!(d.next_step, NextStep::Message);
    }

    #[test]
    fn test_next_step_wire_format() {
        let d: Diagnosis = serde_json::from_str(
            r#"{"message":"m","command":"ls","next_step":"command"}"#,
        )
        .unwrap();
        assert_eq!(d.next_step, NextStep::Command);
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains(r#""next_step":"command""#));
    }
}
