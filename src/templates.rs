//! Instruction templates for the main agent and its sub-agents.
//!
//! Templates are embedded at compile time from the `templates/` directory.
//! This ensures they're always available and versioned with the codebase.

/// System instructions for the main agent: tool usage and delegation policy
pub const SYSTEM: &str = include_str!("../templates/SYSTEM.md");

/// Instructions for the `code-analyst` sub-agent
pub const CODE_ANALYST: &str = include_str!("../templates/CODE_ANALYST.md");

/// Prefix a task prompt with the sandbox session already established in this
/// conversation, so the agent keeps using it instead of allocating a new one.
pub fn with_sandbox_session(prompt: &str, session_id: &str) -> String {
    if session_id.is_empty() {
        return prompt.to_string();
    }
    format!(
        "[Active Code Interpreter session: code_int_session_id=\"{}\". Reuse it for every Code Interpreter call.]\n\n{}",
        session_id, prompt
    )
}
