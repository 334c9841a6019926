//! The engine compile step.
//!
//! The engine exports a native project for one platform. The pipeline only
//! needs to know whether the export succeeded.

use crate::bundler::command::ErrorPolicy;
use crate::bundler::context::BuildContext;
use crate::bundler::error::{Error, Result};
use crate::bundler::settings::BuildOptions;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

/// Compiles the game into a native project.
#[async_trait]
pub trait EngineCompiler: Send + Sync {
    /// Exports the native project into `project_dir`.
    ///
    /// Returns the engine's error report. An empty report means success.
    async fn compile(
        &self,
        ctx: &BuildContext,
        project_dir: &Path,
        options: BuildOptions,
    ) -> Result<String>;
}

#[derive(Serialize)]
struct EngineCommandData<'a> {
    project: String,
    platform: String,
    output: String,
    scenes: String,
    development: bool,
    options: &'a BuildOptions,
}

/// Runs the `[engine] command` template.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandEngine;

#[async_trait]
impl EngineCompiler for CommandEngine {
    async fn compile(
        &self,
        ctx: &BuildContext,
        project_dir: &Path,
        options: BuildOptions,
    ) -> Result<String> {
        let settings = ctx.settings();
        let template = settings.engine().command.as_deref().ok_or_else(|| {
            Error::GenericError("no engine command configured, set [engine] command".into())
        })?;
        let request = ctx.request();
        let data = EngineCommandData {
            project: settings.layout().engine_project_dir.display().to_string(),
            platform: request.platform().to_string(),
            output: project_dir.display().to_string(),
            scenes: request.scenes().join(","),
            development: options.development,
            options: &options,
        };

        log::info!(
            "Start build {} with option {:?} to {}",
            request.platform(),
            options,
            project_dir.display()
        );
        let output = ctx
            .runner()
            .run_template(template, &data, None, ErrorPolicy::Ignore)
            .await?;

        Ok(match output.exit_code {
            Some(0) => String::new(),
            code => {
                let text = output.text();
                if text.trim().is_empty() {
                    format!("engine exited with {code:?}")
                } else {
                    text
                }
            }
        })
    }
}
