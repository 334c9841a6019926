//! The build pipeline state machine.

use super::{HookRegistry, PostBuildArgs, PreBuildArgs};
use crate::bundler::context::BuildContext;
use crate::bundler::engine::EngineCompiler;
use crate::bundler::error::{Error, HookStage, Result};
use crate::bundler::utils::fs;

/// Where a pipeline run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started
    Idle,
    /// Running pre-build hooks
    PreHooksRunning,
    /// Waiting for the engine export
    EngineCompiling,
    /// Running post-build hooks
    PostHooksRunning,
    /// Finished successfully
    Done,
    /// Aborted; absorbing
    Failed,
}

/// Runs pre-hooks, the engine compile and post-hooks, in that order.
pub struct HookPipeline {
    registry: HookRegistry,
    engine: Box<dyn EngineCompiler>,
    state: PipelineState,
}

impl std::fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookPipeline")
            .field("registry", &self.registry)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl HookPipeline {
    /// Creates an idle pipeline.
    pub fn new(registry: HookRegistry, engine: Box<dyn EngineCompiler>) -> Self {
        Self {
            registry,
            engine,
            state: PipelineState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Runs the whole pipeline once.
    ///
    /// # Errors
    ///
    /// - [`Error::NoHook`] if either stage has no hook, before anything runs
    /// - [`Error::Compile`] if the engine reports an error
    /// - the first hook error otherwise
    ///
    /// A failed pipeline stays [`PipelineState::Failed`] and can't be rerun.
    pub async fn run(&mut self, ctx: &BuildContext) -> Result<()> {
        if self.state != PipelineState::Idle {
            return Err(Error::GenericError(format!(
                "pipeline already ran, state {:?}",
                self.state
            )));
        }
        let result = self.drive(ctx).await;
        self.state = match result {
            Ok(()) => PipelineState::Done,
            Err(_) => PipelineState::Failed,
        };
        result
    }

    async fn drive(&mut self, ctx: &BuildContext) -> Result<()> {
        if self.registry.pre_len() == 0 {
            return Err(Error::NoHook {
                stage: HookStage::PreBuild,
            });
        }
        if self.registry.post_len() == 0 {
            return Err(Error::NoHook {
                stage: HookStage::PostBuild,
            });
        }

        let request = ctx.request();
        let platform = request.platform();

        self.state = PipelineState::PreHooksRunning;
        log::info!("Generic build pre build");
        let pre_args = PreBuildArgs {
            scenes: request.scenes(),
            target: request.target(),
            platform,
            options: request.options(),
        };
        for (order, hook) in self.registry.pre_hooks() {
            log::info!("Invoke pre-build hook {} ({order})", hook.name());
            hook.run(ctx, &pre_args).await?;
        }

        self.state = PipelineState::EngineCompiling;
        let project_dir = request.project_dir();
        let options = request.compile_options(ctx.settings().engine().release_version);
        if project_dir.exists() {
            log::info!("Remove stale export {}", project_dir.display());
            fs::remove_dir_all(&project_dir).await?;
        }
        let report = self.engine.compile(ctx, &project_dir, options).await?;
        if !report.is_empty() {
            return Err(Error::Compile(report));
        }
        log::info!("✓ Engine exported {}", project_dir.display());

        self.state = PipelineState::PostHooksRunning;
        log::info!("Generic build post build");
        let post_args = PostBuildArgs {
            platform,
            project_dir: &project_dir,
            target: request.target(),
        };
        for (order, hook) in self.registry.post_hooks() {
            log::info!("Invoke post-build hook {} ({order})", hook.name());
            hook.run(ctx, &post_args).await?;
        }
        Ok(())
    }
}
