//! Rolldown plugins implementing the loader chain, plus the registry that
//! orders them by phase.

mod collection;
mod externals;
mod rewrite;
mod stylesheet;

pub(crate) use collection::ModuleCollectionPlugin;
pub(crate) use externals::ExternalsPlugin;
pub(crate) use rewrite::SourceRewritePlugin;
pub(crate) use stylesheet::StylesheetPlugin;

use parking_lot::Mutex;
use rolldown_plugin::__inner::SharedPluginable;
use std::path::Path;
use std::sync::Arc;

use super::{STATIC_FILE_EXTENSIONS, STYLESHEET_EXTENSIONS};

/// Plugin execution phases
///
/// Plugins are executed in phase order (lower numbers first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum PluginPhase {
    /// Module resolution (externals, stubs)
    Resolve = 10,

    /// Content transformation (shebangs, license comments)
    Transform = 20,

    /// Stylesheets and static files
    Assets = 30,

    /// Module collection, runs last
    PostProcess = 100,
}

/// A rolldown plugin that knows which phase it belongs to.
pub(crate) trait PhasedPlugin: rolldown_plugin::Plugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Transform
    }
}

/// Plugin registry that maintains plugins in phase order
#[derive(Default)]
pub(crate) struct PluginRegistry {
    plugins: Vec<(PluginPhase, SharedPluginable)>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<P: PhasedPlugin + 'static>(&mut self, plugin: Arc<P>) {
        let phase = plugin.phase();
        let plugin: SharedPluginable = plugin;
        self.plugins.push((phase, plugin));
    }

    /// Plugins sorted by phase. Sorting is stable, so plugins within one
    /// phase keep their registration order.
    pub fn into_rolldown_plugins(mut self) -> Vec<SharedPluginable> {
        self.plugins.sort_by_key(|(phase, _)| *phase);
        self.plugins.into_iter().map(|(_, plugin)| plugin).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }
}

/// A stylesheet pulled out of the module graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExtractedStylesheet {
    pub id: String,
    pub source: String,
    /// Minified output, or the raw source when it does not parse as CSS.
    pub css: String,
}

/// A font or image emitted next to the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EmittedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

/// Data the plugins gather during one bundle.
#[derive(Debug, Default)]
pub(crate) struct CollectedState {
    /// `(module id, transformed source)` in first-seen order.
    pub modules: Vec<(String, String)>,
    pub stylesheets: Vec<ExtractedStylesheet>,
    pub static_files: Vec<EmittedFile>,
}

pub(crate) type SharedState = Arc<Mutex<CollectedState>>;

pub(crate) fn extension(id: &str) -> Option<&str> {
    Path::new(id).extension().and_then(|e| e.to_str())
}

pub(crate) fn is_stylesheet(id: &str) -> bool {
    extension(id).is_some_and(|ext| STYLESHEET_EXTENSIONS.contains(&ext))
}

pub(crate) fn is_static_file(id: &str) -> bool {
    extension(id).is_some_and(|ext| STATIC_FILE_EXTENSIONS.contains(&ext))
}

/// Prefix of the virtual modules standing in for stubbed imports.
pub(crate) const EMPTY_MODULE_PREFIX: &str = "\0heft-empty:";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_classification() {
        assert!(is_stylesheet("/a/b/theme.scss"));
        assert!(is_stylesheet("x.less"));
        assert!(!is_stylesheet("x.js"));
        assert!(is_static_file("/fonts/inter.woff2"));
        assert!(is_static_file("logo.svg"));
        assert!(!is_static_file("logo.svg.js"));
    }

    #[test]
    fn test_registry_orders_by_phase() {
        let state = SharedState::default();
        let mut registry = PluginRegistry::new();
        registry.add(Arc::new(ModuleCollectionPlugin::new(Arc::clone(&state))));
        registry.add(Arc::new(SourceRewritePlugin::new(true, true)));
        registry.add(Arc::new(StylesheetPlugin::new(Arc::clone(&state), true, true)));
        assert_eq!(registry.len(), 3);

        registry.plugins.sort_by_key(|(phase, _)| *phase);
        let phases: Vec<PluginPhase> = registry.plugins.iter().map(|(p, _)| *p).collect();
        assert_eq!(
            phases,
            vec![PluginPhase::Transform, PluginPhase::Assets, PluginPhase::PostProcess]
        );
        assert_eq!(registry.into_rolldown_plugins().len(), 3);
    }
}
