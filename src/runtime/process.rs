//! Agent CLI run service - one child process per run
//!
//! The CLI is started in streaming-JSON mode: the prompt goes in as one JSON
//! line on stdin, native messages come back as JSON lines on stdout.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, warn};

use crate::agent::{NativeMessage, RunConfig};
use crate::error::Error;
use crate::Result;

use super::{NativeStream, RunService};

/// Stderr lines kept for the error report of a failed run
const STDERR_TAIL_LINES: usize = 20;

/// How long a CLI that refused the prompt gets to exit on its own
const PROMPT_EXIT_GRACE: Duration = Duration::from_secs(2);

/// Runs the agent CLI as a child process
#[derive(Debug, Clone)]
pub struct ProcessRunService {
    program: PathBuf,
    launcher_args: Vec<String>,
}

impl ProcessRunService {
    pub fn new(cli_path: impl Into<PathBuf>) -> Self {
        Self {
            program: cli_path.into(),
            launcher_args: Vec::new(),
        }
    }

    /// Arguments placed before the CLI flags, for launchers such as `node cli.js`.
    pub fn with_launcher_args(mut self, args: Vec<String>) -> Self {
        self.launcher_args = args;
        self
    }
}

/// CLI flags for one run
pub(crate) fn build_args(config: &RunConfig) -> Result<Vec<String>> {
    let allowed_tools = config
        .capabilities()
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let mcp_config = json!({ "mcpServers": config.mcp_servers() });
    let agents = serde_json::to_string(config.subagents())?;

    let mut args: Vec<String> = vec![
        "--print".into(),
        "--verbose".into(),
        "--output-format".into(),
        "stream-json".into(),
        "--input-format".into(),
        "stream-json".into(),
        "--model".into(),
        config.model_id().to_string(),
        "--allowedTools".into(),
        allowed_tools,
        "--system-prompt".into(),
        config.system_instructions().to_string(),
        "--mcp-config".into(),
        mcp_config.to_string(),
        "--agents".into(),
        agents,
    ];

    if let Some(token) = config.resume_token() {
        args.push("--resume".into());
        args.push(token.to_string());
    }

    Ok(args)
}

/// The prompt as a streaming-JSON user message line
fn prompt_line(prompt: &str) -> String {
    let mut line = json!({
        "type": "user",
        "message": { "role": "user", "content": prompt },
    })
    .to_string();
    line.push('\n');
    line
}

/// Parse one stdout line into a native message
pub(crate) fn parse_line(line: &str) -> Result<NativeMessage> {
    serde_json::from_str(line)
        .map_err(|e| Error::Protocol(format!("Unparseable agent output ({}): {}", e, line)))
}

#[async_trait]
impl RunService for ProcessRunService {
    async fn open(&self, config: &RunConfig, prompt: &str) -> Result<NativeStream> {
        let args = build_args(config)?;
        debug!(
            "Starting agent CLI {:?} (resume: {})",
            self.program,
            config.resume_token().unwrap_or("<none>")
        );

        let mut child = Command::new(&self.program)
            .args(&self.launcher_args)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Run(format!("Failed to start agent CLI {:?}: {}", self.program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Run("Agent CLI stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Run("Agent CLI stderr not captured".to_string()))?;

        // Closing stdin after the prompt tells the CLI no further turns follow.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(prompt_line(prompt).as_bytes()).await {
                // A CLI that exits without reading reports itself through its
                // exit status below. One that stays alive would run promptless.
                match tokio::time::timeout(PROMPT_EXIT_GRACE, child.wait()).await {
                    Ok(Ok(status)) => warn!("Agent CLI exited ({}) before taking the prompt: {}", status, e),
                    _ => {
                        return Err(Error::Run(format!("Failed to submit prompt to agent CLI: {}", e)));
                    }
                }
            }
        }

        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
            while let Ok(Some(line)) = lines.next_line().await {
                error!("agent stderr: {}", line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Vec::from(tail)
        });

        let stream = async_stream::stream! {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match parse_line(&line) {
                            Ok(message) => yield Ok(message),
                            Err(e) => warn!("{}", e),
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(Error::Io(e));
                        return;
                    }
                }
            }

            match child.wait().await {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    let tail = stderr_task.await.unwrap_or_default();
                    yield Err(Error::Process {
                        exit_code: status.code(),
                        stderr: tail.join("\n"),
                    });
                }
                Err(e) => yield Err(Error::Io(e)),
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::RunConfigBuilder;
    use crate::config::Config;
    use futures_util::StreamExt;

    fn run_config(resume: Option<&str>) -> RunConfig {
        RunConfigBuilder::new(&Config::default(), None).build(resume)
    }

    /// `sh -c <script> agent <cli flags...>`
    fn scripted_cli(script: &str) -> ProcessRunService {
        ProcessRunService::new("sh")
            .with_launcher_args(vec!["-c".to_string(), script.to_string(), "agent".to_string()])
    }

    fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_build_args_fresh_run() {
        let args = build_args(&run_config(None)).unwrap();

        assert_eq!(flag_value(&args, "--output-format"), Some("stream-json"));
        assert_eq!(flag_value(&args, "--model"), Some("us.anthropic.claude-opus-4-6-v1"));
        assert_eq!(
            flag_value(&args, "--allowedTools"),
            Some("mcp__codeint__execute_code,mcp__codeint__execute_command,mcp__codeint__write_files,mcp__codeint__read_files,Task")
        );
        assert!(!args.contains(&"--resume".to_string()));

        let mcp: serde_json::Value =
            serde_json::from_str(flag_value(&args, "--mcp-config").unwrap()).unwrap();
        assert_eq!(mcp["mcpServers"]["codeint"]["type"], "stdio");

        let agents: serde_json::Value =
            serde_json::from_str(flag_value(&args, "--agents").unwrap()).unwrap();
        assert_eq!(agents["code-analyst"]["model"], "sonnet");
    }

    #[test]
    fn test_build_args_resume() {
        let args = build_args(&run_config(Some("t1"))).unwrap();
        assert_eq!(flag_value(&args, "--resume"), Some("t1"));
    }

    #[test]
    fn test_prompt_line() {
        let line = prompt_line("hello \"world\"");
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["message"]["content"], "hello \"world\"");
    }

    #[test]
    fn test_parse_line_errors_are_protocol_errors() {
        assert!(matches!(parse_line("not json"), Err(Error::Protocol(_))));
        assert_eq!(
            parse_line(r#"{"type":"result","session_id":"r1"}"#).unwrap(),
            NativeMessage::Result {
                session_id: "r1".to_string(),
                subtype: None,
                is_error: false,
                num_turns: None,
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_streams_stdout_messages() {
        let service = scripted_cli(
            r#"cat >/dev/null
echo '{"type":"system","subtype":"init","session_id":"r1"}'
echo 'progress: warming up'
echo '{"type":"assistant","message":{"content":[{"type":"text","text":"hi"}]}}'
echo '{"type":"result","subtype":"success","session_id":"r1"}'"#,
        );

        let stream = service.open(&run_config(None), "say hi").await.unwrap();
        let messages: Vec<NativeMessage> = stream.map(|m| m.unwrap()).collect().await;

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], NativeMessage::init("r1"));
        assert!(matches!(messages[2], NativeMessage::Result { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_process_failure() {
        let service = scripted_cli(
            r#"cat >/dev/null
echo 'No conversation found with session ID: t1' >&2
exit 1"#,
        );

        let mut stream = service.open(&run_config(Some("t1")), "continue").await.unwrap();
        let item = stream.next().await.unwrap();
        match item {
            Err(Error::Process { exit_code, stderr }) => {
                assert_eq!(exit_code, Some(1));
                assert!(stderr.contains("No conversation found"));
            }
            other => panic!("expected process failure, got {:?}", other),
        }
        assert!(stream.next().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resume_flag_reaches_cli() {
        let service = scripted_cli(
            r#"cat >/dev/null
case "$*" in
  *"--resume t1"*) echo '{"type":"result","session_id":"resumed"}' ;;
  *) echo '{"type":"result","session_id":"fresh"}' ;;
esac"#,
        );

        let mut stream = service.open(&run_config(Some("t1")), "go").await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(
            first,
            NativeMessage::Result {
                session_id: "resumed".to_string(),
                subtype: None,
                is_error: false,
                num_turns: None,
            }
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_process_failure() {
        let service = ProcessRunService::new("/nonexistent/agent-cli");
        let result = service.open(&run_config(Some("t1")), "go").await;
        match result {
            Err(err) => assert!(!err.is_process_failure()),
            Ok(_) => panic!("spawn should fail"),
        }
    }

    /// Larger than a pipe buffer, so the write blocks until the CLI reads or
    /// closes its stdin.
    fn oversized_prompt() -> String {
        "x".repeat(512 * 1024)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_live_cli_refusing_prompt_is_run_error() {
        let service = scripted_cli("exec 0<&-; sleep 30");

        match service.open(&run_config(Some("t1")), &oversized_prompt()).await {
            Err(err) => {
                assert!(matches!(err, Error::Run(_)));
                assert!(!err.is_process_failure());
            }
            Ok(_) => panic!("open should fail when the prompt cannot be submitted"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exited_cli_refusing_prompt_reports_exit() {
        let service = scripted_cli(
            r#"exec 0<&-
echo 'No conversation found with session ID: t1' >&2
exit 1"#,
        );

        let mut stream = service
            .open(&run_config(Some("t1")), &oversized_prompt())
            .await
            .unwrap();
        match stream.next().await.unwrap() {
            Err(Error::Process { exit_code, stderr }) => {
                assert_eq!(exit_code, Some(1));
                assert!(stderr.contains("No conversation found"));
            }
            other => panic!("expected process failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stderr_tail_keeps_last_lines() {
        let service = scripted_cli(
            r#"cat >/dev/null
i=1
while [ $i -le 30 ]; do echo "line $i" >&2; i=$((i+1)); done
exit 3"#,
        );

        let mut stream = service.open(&run_config(None), "go").await.unwrap();
        match stream.next().await.unwrap() {
            Err(Error::Process { stderr, .. }) => {
                let lines: Vec<&str> = stderr.lines().collect();
                assert_eq!(lines.len(), STDERR_TAIL_LINES);
                assert_eq!(lines[0], "line 11");
                assert_eq!(lines[STDERR_TAIL_LINES - 1], "line 30");
            }
            other => panic!("expected process failure, got {:?}", other),
        }
    }
}
