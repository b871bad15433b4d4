//! Manifest parser and template evaluator ports (spec §6 "Parser/evaluator").
//!
//! Both are deliberately out of scope (spec §1): the core consumes a typed
//! document and a string-rendering call, never the template language itself.

use async_trait::async_trait;
use std::path::Path;

use crate::error::PortsError;

/// Port for loading a resource (or the workflow document) from its source file.
///
/// Returns the parsed document as JSON; the workflow crate is responsible
/// for validating it into a typed `Workflow`/`Resource`.
#[async_trait]
pub trait ResourceLoaderPort: Send + Sync {
    /// Load and parse the file at `path`.
    async fn load(&self, path: &Path) -> Result<serde_json::Value, PortsError>;
}

/// Port for rendering a template string against a variable scope.
#[async_trait]
pub trait TemplateEvaluatorPort: Send + Sync {
    /// Render `template` with `vars` bound, returning the rendered string.
    async fn eval(&self, template: &str, vars: &serde_json::Value) -> Result<String, PortsError>;
}
