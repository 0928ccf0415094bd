//! Container execution over `docker exec`.
//!
//! The Docker socket is a single shared channel, so invocations are
//! serialized behind a mutex rather than multiplexed. The child process is
//! armed with kill-on-drop: when the dispatcher's deadline fires and the
//! handler future is dropped, the command dies with it instead of running on
//! in the container.

use fathom_core::config::{Credentials, TerminalConfig};
use fathom_core::{
    Handler, HandlerError, ParamSpec, ParamType, RegistryError, ToolDefinition, ToolRegistry,
    ToolSpec, ValidatedArgs,
};
use serde_json::{json, Value};
use std::process::Stdio;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Exit codes the docker CLI reserves for its own failures, as opposed to
/// the command's.
const DOCKER_DAEMON_ERROR: i32 = 125;

pub fn register(
    registry: &mut ToolRegistry,
    creds: &Arc<Credentials>,
) -> Result<(), RegistryError> {
    registry.register(ToolDefinition::new(
        ToolSpec::new(
            "execute_command",
            "Run a shell command inside the sandbox container and return stdout, stderr and the exit code",
        )
        .with_param(ParamSpec::required("command", ParamType::String, "Shell command line"))
        .with_param(ParamSpec::optional(
            "workdir",
            ParamType::String,
            "Absolute working directory inside the container",
            None,
        )),
        Arc::new(ExecuteCommand {
            creds: creds.clone(),
            channel: Arc::new(Mutex::new(())),
        }),
    ))?;

    Ok(())
}

struct ExecuteCommand {
    creds: Arc<Credentials>,
    /// Serializes access to the one Docker exec channel.
    channel: Arc<Mutex<()>>,
}

#[async_trait::async_trait]
impl Handler for ExecuteCommand {
    async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
        let config = self.creds.terminal.as_ref().ok_or_else(|| {
            HandlerError::Unavailable(
                "terminal tools not configured; set FATHOM_TERMINAL_CONTAINER".to_string(),
            )
        })?;

        let command = args.str("command").unwrap_or_default();
        if command.trim().is_empty() {
            return Err(HandlerError::Rejected("command must not be empty".to_string()));
        }
        let workdir = match args.str("workdir") {
            Some(dir) if !dir.starts_with('/') => {
                return Err(HandlerError::Rejected(format!(
                    "workdir must be an absolute path, got {dir:?}"
                )));
            }
            other => other,
        };

        let _channel = self.channel.lock().await;

        let output = tokio::process::Command::new("docker")
            .args(docker_args(config, workdir, command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                HandlerError::Unavailable(format!("cannot reach the docker CLI: {e}"))
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if exit_code == DOCKER_DAEMON_ERROR {
            return Err(HandlerError::Unavailable(format!(
                "docker could not run the command: {}",
                stderr.trim()
            )));
        }

        // A failing command is still a successful invocation; the exit code
        // is the caller's to interpret.
        Ok(json!({
            "stdout": String::from_utf8_lossy(&output.stdout).into_owned(),
            "stderr": stderr,
            "exit_code": exit_code,
        }))
    }
}

fn docker_args(config: &TerminalConfig, workdir: Option<&str>, command: &str) -> Vec<String> {
    let mut args = vec!["exec".to_string()];
    if let Some(dir) = workdir {
        args.push("--workdir".to_string());
        args.push(dir.to_string());
    }
    args.push(config.container.clone());
    args.push(config.shell.clone());
    args.push("-c".to_string());
    args.push(command.to_string());
    args
}
