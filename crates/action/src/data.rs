//! Data-registration resource handler (spec §4.3.4).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use kestrel_core::codec;
use kestrel_ports::FilesystemPort;
use kestrel_workflow::DataBlock;

use crate::context::HandlerContext;
use crate::error::ActionError;
use crate::ResourceHandler;

/// The data-file registration resource handler.
///
/// Populates the file registry by enumerating `data_root`, one level deep
/// per agent-version directory, base64-encoding every file's contents. No
/// process is run (spec §4.3.4).
pub struct DataHandler {
    filesystem: Arc<dyn FilesystemPort>,
    data_root: PathBuf,
}

impl DataHandler {
    /// Construct a handler rooted at the shared data directory.
    #[must_use]
    pub fn new(filesystem: Arc<dyn FilesystemPort>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            filesystem,
            data_root: data_root.into(),
        }
    }
}

#[async_trait::async_trait]
impl ResourceHandler<DataBlock> for DataHandler {
    async fn handle(&self, ctx: &HandlerContext, block: &mut DataBlock) -> Result<(), ActionError> {
        let mut files: HashMap<String, HashMap<String, String>> = HashMap::new();

        if self.filesystem.exists(&self.data_root).await? {
            for agent_version_dir in self.list_agent_version_dirs().await? {
                let Some(agent_version) = agent_version_dir
                    .strip_prefix(&self.data_root)
                    .ok()
                    .and_then(|p| p.components().next())
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                else {
                    continue;
                };

                let entries = files.entry(agent_version).or_default();
                for file_path in self.filesystem.walk(&agent_version_dir).await? {
                    let Some(filename) = file_path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                        continue;
                    };
                    let contents = self.filesystem.read(&file_path).await?;
                    let encoded = codec::encode_idempotent(&String::from_utf8_lossy(&contents));
                    entries.insert(filename, encoded);
                }
            }
        }

        block.files = files;

        let collection = ctx.storage_collection();
        ctx.store
            .set(ctx.request_id, &collection, "files", &serde_json::to_string(&block.files)?)?;
        ctx.store
            .set(ctx.request_id, &collection, "timestamp", &ctx.clock.now().as_nanos().to_string())?;

        Ok(())
    }
}

impl DataHandler {
    async fn list_agent_version_dirs(&self) -> Result<Vec<PathBuf>, ActionError> {
        let mut dirs = std::collections::BTreeSet::new();
        for file_path in self.filesystem.walk(&self.data_root).await? {
            if let Ok(relative) = file_path.strip_prefix(&self.data_root) {
                if let Some(top) = relative.components().next() {
                    dirs.insert(self.data_root.join(top));
                }
            }
        }
        Ok(dirs.into_iter().collect())
    }
}
