//! `ExecBlock` / `PythonBlock` — typed bodies of subprocess run steps (spec §3, §4.3.3).

use std::collections::HashMap;

use kestrel_core::Timestamp;
use serde::{Deserialize, Serialize};

/// The typed body of a shell-exec run step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecBlock {
    /// Shell command line to run.
    pub command: String,
    /// Environment variables merged over the inherited process environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
    /// Captured standard output, filled in by the handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    /// Captured standard error, filled in by the handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// Path stdout was additionally persisted to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Per-step timeout, in seconds; defaults to 60s (spec §4.2.2) when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_duration: Option<u64>,
    /// Watermark written by the handler on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl ExecBlock {
    /// Construct a minimal exec block with only the command set.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            env: None,
            stdout: None,
            stderr: None,
            file: None,
            timeout_duration: None,
            timestamp: None,
        }
    }
}

/// The typed body of a Python-script run step.
///
/// Identical shape to [`ExecBlock`] except for the field name (`script`
/// rather than `command`) and the environment-activation bracketing
/// described in spec §4.3.3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PythonBlock {
    /// Python script source or path to run.
    pub script: String,
    /// Environment variables merged over the inherited process environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
    /// Captured standard output, filled in by the handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    /// Captured standard error, filled in by the handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// Path stdout was additionally persisted to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Per-step timeout, in seconds; defaults to 60s (spec §4.2.2) when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_duration: Option<u64>,
    /// Watermark written by the handler on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    /// Name of a conda/venv environment to activate before running and
    /// deactivate after, even on error (spec §4.3.3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

impl PythonBlock {
    /// Construct a minimal python block with only the script set.
    #[must_use]
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            env: None,
            stdout: None,
            stderr: None,
            file: None,
            timeout_duration: None,
            timestamp: None,
            environment: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_block_serde_roundtrip() {
        let mut block = ExecBlock::new("echo hi");
        block.stdout = Some("hi\n".into());
        let json = serde_json::to_string(&block).unwrap();
        let back: ExecBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(block, back);
    }

    #[test]
    fn python_block_serde_roundtrip() {
        let mut block = PythonBlock::new("print('hi')");
        block.environment = Some("kdeps-env".into());
        let json = serde_json::to_string(&block).unwrap();
        let back: PythonBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(block, back);
    }
}
