//! Exec and Python resource handlers (spec §4.3.3).

use std::collections::HashMap;
use std::sync::Arc;

use kestrel_core::codec;
use kestrel_ports::{FilesystemPort, ProcessPort, ProcessSpec};
use kestrel_workflow::{ExecBlock, PythonBlock};

use crate::context::HandlerContext;
use crate::error::ActionError;
use crate::ResourceHandler;

fn decode_if_base64(raw: &str) -> String {
    if codec::is_base64(raw) {
        codec::decode(raw).unwrap_or_else(|_| raw.to_owned())
    } else {
        raw.to_owned()
    }
}

fn decode_env(env: &Option<HashMap<String, String>>) -> HashMap<String, String> {
    env.as_ref()
        .map(|map| {
            map.iter()
                .map(|(k, v)| (k.clone(), decode_if_base64(v)))
                .collect()
        })
        .unwrap_or_default()
}

/// Single-quote a shell argument, escaping embedded single quotes.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

async fn run_and_store(
    process: &Arc<dyn ProcessPort>,
    filesystem: &Arc<dyn FilesystemPort>,
    ctx: &HandlerContext,
    spec: ProcessSpec,
) -> Result<(String, String, Option<i32>), ActionError> {
    let output = process.run(spec).await?;

    let dir = ctx.artifact_dir();
    filesystem.mkdir_all(&dir).await?;
    let stdout_path = dir.join(format!("{}-stdout", ctx.storage_collection().replace([':', '@', '/'], "_")));
    filesystem.write(&stdout_path, output.stdout.as_bytes()).await?;

    let collection = ctx.storage_collection();
    ctx.store.set(ctx.request_id, &collection, "stdout", &output.stdout)?;
    ctx.store.set(ctx.request_id, &collection, "stderr", &output.stderr)?;
    ctx.store
        .set(ctx.request_id, &collection, "path", &stdout_path.to_string_lossy())?;
    if let Some(code) = output.exit_code {
        ctx.store.set(ctx.request_id, &collection, "exitCode", &code.to_string())?;
    }
    let timestamp = ctx.clock.now();
    ctx.store
        .set(ctx.request_id, &collection, "timestamp", &timestamp.as_nanos().to_string())?;

    Ok((output.stdout, output.stderr, output.exit_code))
}

/// The shell-exec resource handler.
pub struct ExecHandler {
    process: Arc<dyn ProcessPort>,
    filesystem: Arc<dyn FilesystemPort>,
}

impl ExecHandler {
    /// Construct a handler over the process and filesystem ports.
    #[must_use]
    pub fn new(process: Arc<dyn ProcessPort>, filesystem: Arc<dyn FilesystemPort>) -> Self {
        Self { process, filesystem }
    }
}

#[async_trait::async_trait]
impl ResourceHandler<ExecBlock> for ExecHandler {
    async fn handle(&self, ctx: &HandlerContext, block: &mut ExecBlock) -> Result<(), ActionError> {
        let command = decode_if_base64(&block.command);
        let env = decode_env(&block.env);
        let spec = ProcessSpec {
            command: command.clone(),
            args: Vec::new(),
            shell: true,
            env,
            stream: false,
        };

        let (stdout, stderr, exit_code) = run_and_store(&self.process, &self.filesystem, ctx, spec).await?;

        block.stdout = Some(stdout);
        block.stderr = Some(stderr);
        block.timestamp = Some(ctx.clock.now());
        let _ = exit_code;
        Ok(())
    }
}

/// The Python-script resource handler.
///
/// When the block declares `environment`, the invocation is bracketed by
/// activation and deactivation of that conda/venv environment; deactivation
/// runs even if the script itself fails (spec §4.3.3).
pub struct PythonHandler {
    process: Arc<dyn ProcessPort>,
    filesystem: Arc<dyn FilesystemPort>,
}

impl PythonHandler {
    /// Construct a handler over the process and filesystem ports.
    #[must_use]
    pub fn new(process: Arc<dyn ProcessPort>, filesystem: Arc<dyn FilesystemPort>) -> Self {
        Self { process, filesystem }
    }

    fn command_for(script: &str, environment: Option<&str>) -> String {
        let script_arg = shell_quote(script);
        match environment {
            Some(env_name) => {
                let env_arg = shell_quote(env_name);
                format!(
                    "source activate {env_arg} && python3 -c {script_arg}; __kestrel_status=$?; conda deactivate; exit $__kestrel_status"
                )
            }
            None => format!("python3 -c {script_arg}"),
        }
    }
}

#[async_trait::async_trait]
impl ResourceHandler<PythonBlock> for PythonHandler {
    async fn handle(&self, ctx: &HandlerContext, block: &mut PythonBlock) -> Result<(), ActionError> {
        let script = decode_if_base64(&block.script);
        let env = decode_env(&block.env);
        let command = Self::command_for(&script, block.environment.as_deref());
        let spec = ProcessSpec {
            command,
            args: Vec::new(),
            shell: true,
            env,
            stream: false,
        };

        let (stdout, stderr, exit_code) = run_and_store(&self.process, &self.filesystem, ctx, spec).await?;

        block.stdout = Some(stdout);
        block.stderr = Some(stderr);
        block.timestamp = Some(ctx.clock.now());
        let _ = exit_code;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn command_without_environment_is_bare_python() {
        let command = PythonHandler::command_for("print(1)", None);
        assert_eq!(command, "python3 -c 'print(1)'");
    }

    #[test]
    fn command_with_environment_brackets_activation() {
        let command = PythonHandler::command_for("print(1)", Some("kdeps-env"));
        assert!(command.starts_with("source activate 'kdeps-env' &&"));
        assert!(command.contains("conda deactivate"));
        assert!(command.ends_with("exit $__kestrel_status"));
    }

    #[test]
    fn decode_env_decodes_base64_values() {
        let mut env = HashMap::new();
        env.insert("TOKEN".to_owned(), codec::encode_idempotent("secret"));
        let decoded = decode_env(&Some(env));
        assert_eq!(decoded["TOKEN"], "secret");
    }
}
