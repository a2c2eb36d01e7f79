use rolldown_plugin::{
    HookTransformArgs, HookTransformOutput, HookTransformReturn, HookUsage, Plugin,
    TransformPluginContext,
};
use std::borrow::Cow;
use std::sync::Arc;

use super::{PhasedPlugin, PluginPhase, extension};
use crate::bundler::neutralize_license_comments;

/// Shebang stripping and license-comment demotion for script sources.
#[derive(Debug)]
pub(crate) struct SourceRewritePlugin {
    strip_shebang: bool,
    mangle_license_comments: bool,
}

impl SourceRewritePlugin {
    pub fn new(strip_shebang: bool, mangle_license_comments: bool) -> Self {
        Self {
            strip_shebang,
            mangle_license_comments,
        }
    }

    /// Returns `None` when the source is left untouched.
    pub fn rewrite(&self, code: &str) -> Option<String> {
        let mut rewritten = Cow::Borrowed(code);

        if self.strip_shebang && rewritten.starts_with("#!") {
            let body = match rewritten.find('\n') {
                Some(newline) => rewritten[newline..].to_string(),
                None => String::new(),
            };
            rewritten = Cow::Owned(body);
        }

        if self.mangle_license_comments {
            let mangled = neutralize_license_comments(&rewritten);
            if mangled != rewritten {
                rewritten = Cow::Owned(mangled);
            }
        }

        match rewritten {
            Cow::Borrowed(_) => None,
            Cow::Owned(code) => Some(code),
        }
    }
}

impl Plugin for SourceRewritePlugin {
    fn name(&self) -> Cow<'static, str> {
        "heft:source-rewrite".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: Arc<TransformPluginContext>,
        args: &HookTransformArgs,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let applies = matches!(extension(args.id), Some("js" | "cjs" | "mjs"));
        let rewritten = if applies { self.rewrite(args.code) } else { None };

        async move {
            Ok(rewritten.map(|code| HookTransformOutput {
                code: Some(code),
                map: None,
                side_effects: None,
                module_type: None,
            }))
        }
    }
}

impl PhasedPlugin for SourceRewritePlugin {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_shebang_keeping_line_count() {
        let plugin = SourceRewritePlugin::new(true, false);
        assert_eq!(
            plugin.rewrite("#!/usr/bin/env node\nmodule.exports = 1;").as_deref(),
            Some("\nmodule.exports = 1;")
        );
        assert_eq!(plugin.rewrite("#!/usr/bin/env node").as_deref(), Some(""));
    }

    #[test]
    fn test_mangles_license_comments() {
        let plugin = SourceRewritePlugin::new(false, true);
        assert_eq!(
            plugin.rewrite("/*! lib v1 | @license MIT */").as_deref(),
            Some("/* lib v1 | @silence MIT */")
        );
    }

    #[test]
    fn test_untouched_source() {
        let plugin = SourceRewritePlugin::new(true, true);
        assert_eq!(plugin.rewrite("export const a = 1;"), None);

        let disabled = SourceRewritePlugin::new(false, false);
        assert_eq!(disabled.rewrite("#!/bin/sh\n/*! x */"), None);
    }
}
