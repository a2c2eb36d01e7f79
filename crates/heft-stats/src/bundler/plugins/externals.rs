use rolldown_common::{ModuleType, ResolvedExternal};
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs, HookResolveIdOutput,
    HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};
use std::borrow::Cow;
use std::sync::Arc;

use super::{EMPTY_MODULE_PREFIX, PhasedPlugin, PluginPhase};
use crate::bundler::{BundlerConfig, ModuleRule};

/// Applies the externals predicate, the ignore list and built-in stubs.
#[derive(Debug)]
pub(crate) struct ExternalsPlugin {
    config: Arc<BundlerConfig>,
}

impl ExternalsPlugin {
    pub fn new(config: Arc<BundlerConfig>) -> Self {
        Self { config }
    }
}

fn is_bare(specifier: &str) -> bool {
    !(specifier.starts_with('.')
        || specifier.starts_with('/')
        || specifier.starts_with('\0')
        || std::path::Path::new(specifier).is_absolute())
}

impl Plugin for ExternalsPlugin {
    fn name(&self) -> Cow<'static, str> {
        "heft:externals".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let rule = if is_bare(&specifier) {
            self.config.rule_for(&specifier)
        } else {
            ModuleRule::Bundle
        };

        async move {
            match rule {
                ModuleRule::Bundle => Ok(None),
                ModuleRule::External => Ok(Some(HookResolveIdOutput {
                    id: specifier.into(),
                    external: Some(ResolvedExternal::Bool(true)),
                    ..Default::default()
                })),
                ModuleRule::Ignored | ModuleRule::EmptyStub => Ok(Some(HookResolveIdOutput {
                    id: format!("{EMPTY_MODULE_PREFIX}{specifier}").into(),
                    external: Some(ResolvedExternal::Bool(false)),
                    ..Default::default()
                })),
            }
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let is_stub = args.id.starts_with(EMPTY_MODULE_PREFIX);

        async move {
            if !is_stub {
                return Ok(None);
            }

            Ok(Some(HookLoadOutput {
                code: "module.exports = {};".to_string().into(),
                module_type: Some(ModuleType::Js),
                ..Default::default()
            }))
        }
    }
}

impl PhasedPlugin for ExternalsPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Resolve
    }
}
