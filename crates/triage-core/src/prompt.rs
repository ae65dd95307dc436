use crate::history::HistoryEntry;
use crate::truncate::truncate_middle;

/// Max turns rendered into the history block.
pub const HISTORY_WINDOW: usize = 5;
/// Per-entry command output bound inside the history block.
pub const HISTORY_OUTPUT_LIMIT: usize = 500;
/// Bound for the current turn's command output.
pub const CURRENT_OUTPUT_LIMIT: usize = 1000;
/// Max previously issued commands listed in the do-not-repeat block.
pub const COMMAND_MEMORY: usize = 10;

const INSTRUCTION_TEMPLATE: &str = r#"You are a system administrator helping diagnose technical issues.

ORIGINAL PROBLEM: {problem}

PREVIOUS STEPS:
{history_section}

{command_output_section}

CONTEXT AWARENESS:
- Review the conversation history to understand what has been tried
- Build upon previous findings and command outputs
- Don't repeat commands that were already executed
- Progress logically through the diagnostic process

CRITICAL RULES:
- Start with a diagnostic command unless you already have enough information for a final answer
- Suggest one command at a time, then analyze its output before deciding the next step
- Use POSIX shell syntax (df -h, free -m, top -bn1, ss -tlnp, ping -c 3 ...)
- Keep the message concise and practical

Respond with ONLY a JSON object, no markdown, matching:
{"message": "<what you are doing or concluding>", "command": "<shell command or empty string>", "next_step": "command" | "message"}

- "message" is always required
- If you provide a command, set "next_step" to "command"
- If no command is needed, use an empty "command" and set "next_step" to "message"

Examples:
- {"message": "Checking disk usage first.", "command": "df -h", "next_step": "command"}
- {"message": "The disk is full because of /var/log; rotate or delete old logs.", "command": "", "next_step": "message"}
"#;

/// Render the full reasoning prompt. Pure: no logging, no side effects.
pub fn compose(
    problem: &str,
    history: &[HistoryEntry],
    current_output: Option<&str>,
    prior_commands: &[String],
) -> String {
    let history_section = render_history(history);
    let command_output_section = match current_output {
        Some(output) if !output.trim().is_empty() => format!(
            "Latest command output provided by the user:\n{}",
            truncate_middle(output, CURRENT_OUTPUT_LIMIT)
        ),
        _ => "No command output provided yet.".to_string(),
    };

    let mut prompt = INSTRUCTION_TEMPLATE
        .replace("{problem}", problem)
        .replace("{history_section}", &history_section)
        .replace("{command_output_section}", &command_output_section);

    if !prior_commands.is_empty() {
        let listed: Vec<String> = prior_commands
            .iter()
            .rev()
            .take(COMMAND_MEMORY)
            .rev()
            .map(|c| format!("- {c}"))
            .collect();
        prompt.push_str(
            "\nPreviously suggested commands (do not repeat unless new output requires it):\n",
        );
        prompt.push_str(&listed.join("\n"));
        prompt.push('\n');
    }

    prompt
}

fn render_history(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "No previous steps.".to_string();
    }

    let window_start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut lines = Vec::new();
    for entry in &history[window_start..] {
        let mut line = format!("[{}] message: {}", entry.timestamp.to_rfc3339(), entry.message);
        if let Some(cmd) = &entry.command {
            line.push_str(&format!(" | command: {cmd}"));
        }
        if let Some(output) = &entry.command_output {
            line.push_str(&format!(
                " | output: {}",
                truncate_middle(output, HISTORY_OUTPUT_LIMIT)
            ));
        }
        lines.push(line);
    }
    lines.join("\n")
}
