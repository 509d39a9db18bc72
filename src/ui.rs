use colored::*;

use crate::agent::NormalizedEvent;

/// Render one event for a human reader
pub fn format_event(event: &NormalizedEvent) -> String {
    match event {
        NormalizedEvent::TextChunk { text } => text.clone(),
        NormalizedEvent::ToolInvoked { name, invocation_id, .. } => {
            format!("  {} {} {}", "⚙".cyan(), name.cyan().bold(), invocation_id.black().bold())
        }
        NormalizedEvent::SessionUpdated { new_session_id } => {
            format!("  {} sandbox session {}", "•".green(), new_session_id.green())
        }
        NormalizedEvent::RunCompleted { run_session_id } => {
            format!("  {} run session {}", "✓".green().bold(), run_session_id.green())
        }
    }
}

pub fn print_event(event: &NormalizedEvent) {
    println!("{}", format_event(event));
}

pub fn print_step(msg: &str) {
    println!("  {} {}", "•".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("  {} {}", "⚠️ ".yellow().bold(), msg.yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("  {} {}", "❌".red().bold(), msg.red());
}
