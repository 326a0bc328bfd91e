use chrono::NaiveDate;

use crate::config::AgentConfig;

/// Render the system prompt for `config` as of `today`.
pub fn render_system_prompt(config: &AgentConfig, today: NaiveDate) -> String {
    let mut prompt = format!(
        "You are {name}, an assistant that talks with users, answers their questions, \
         and uses the tools available to it when a task calls for them.\n\n\
         Current date: {date}\n\n\
         Your purpose is: {purpose}",
        name = config.name,
        date = today.format("%Y-%m-%d %A"),
        purpose = config.purpose,
    );
    if !config.notes.trim().is_empty() {
        prompt.push_str("\n\nNotes to help you with your purpose:\n```\n");
        prompt.push_str(config.notes.trim());
        prompt.push_str("\n```");
    }
    prompt
}
