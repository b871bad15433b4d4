//! Subprocess execution port (spec §6 "Process port", §4.3.3).

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::PortsError;

/// A subprocess invocation request.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    /// Command or script to run.
    pub command: String,
    /// Positional arguments; empty when the command is a full shell line.
    pub args: Vec<String>,
    /// Run through a shell (`sh -c`) instead of exec-ing directly.
    pub shell: bool,
    /// Environment variables materialised as `K=V`, merged over the
    /// inherited process environment.
    pub env: HashMap<String, String>,
    /// Stream stdout/stderr incrementally rather than buffering to completion.
    pub stream: bool,
}

impl ProcessSpec {
    /// Construct a shell-mode spec running `command` with no extra env.
    #[must_use]
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            shell: true,
            env: HashMap::new(),
            stream: false,
        }
    }
}

/// Captured output of a finished subprocess.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Process exit code; `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    /// Returns `true` if the process exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Port for running subprocesses.
#[async_trait]
pub trait ProcessPort: Send + Sync {
    /// Run a process to completion (or until cancelled) and capture its output.
    async fn run(&self, spec: ProcessSpec) -> Result<ProcessOutput, PortsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_constructor_defaults() {
        let spec = ProcessSpec::shell("echo hi");
        assert!(spec.shell);
        assert!(spec.args.is_empty());
        assert!(!spec.stream);
    }

    #[test]
    fn success_requires_zero_exit_code() {
        let ok = ProcessOutput {
            exit_code: Some(0),
            ..Default::default()
        };
        let failed = ProcessOutput {
            exit_code: Some(1),
            ..Default::default()
        };
        let killed = ProcessOutput {
            exit_code: None,
            ..Default::default()
        };
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }

    #[test]
    fn port_is_object_safe() {
        fn _assert(_: &dyn ProcessPort) {}
    }
}
