use rolldown_plugin::{
    HookTransformArgs, HookTransformReturn, HookUsage, Plugin, TransformPluginContext,
};
use std::borrow::Cow;
use std::sync::Arc;

use super::{PhasedPlugin, PluginPhase, SharedState, is_static_file, is_stylesheet};

/// Plugin that records every module's final source during bundling.
///
/// Runs after all other transforms, so the recorded source is what the
/// bundler actually sees. Virtual modules and extracted assets are skipped;
/// stylesheet sources are recorded by the stylesheet plugin instead.
#[derive(Debug)]
pub(crate) struct ModuleCollectionPlugin {
    state: SharedState,
}

impl ModuleCollectionPlugin {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

fn should_collect(id: &str) -> bool {
    !id.starts_with('\0') && !is_stylesheet(id) && !is_static_file(id)
}

impl Plugin for ModuleCollectionPlugin {
    fn name(&self) -> Cow<'static, str> {
        "heft:module-collection".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: Arc<TransformPluginContext>,
        args: &HookTransformArgs,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        if should_collect(args.id) {
            self.state
                .lock()
                .modules
                .push((args.id.to_string(), args.code.to_string()));
        }

        // Don't modify the code
        async move { Ok(None) }
    }
}

impl PhasedPlugin for ModuleCollectionPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::PostProcess
    }
}
