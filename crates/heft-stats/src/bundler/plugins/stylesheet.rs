//! Stylesheet extraction and static file emission.

use lightningcss::{
    printer::PrinterOptions,
    stylesheet::{MinifyOptions, ParserOptions, StyleSheet},
};
use rolldown_common::ModuleType;
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookUsage, Plugin, PluginContext,
};
use std::borrow::Cow;
use std::path::Path;

use super::{
    EmittedFile, ExtractedStylesheet, PhasedPlugin, PluginPhase, SharedState, is_static_file,
    is_stylesheet,
};
use crate::bundler::BUNDLE_INFIX;

/// Pulls stylesheets and static files out of the JS module graph.
///
/// Stylesheets are recorded (minified when they parse as plain CSS) and
/// replaced by an empty module; the compiler concatenates them into
/// `<entry>.bundle.css`. Fonts and images are recorded as
/// `<file>.bundle.<ext>` and replaced by a module exporting that name.
#[derive(Debug)]
pub(crate) struct StylesheetPlugin {
    state: SharedState,
    extract_stylesheets: bool,
    emit_static_files: bool,
}

impl StylesheetPlugin {
    pub fn new(state: SharedState, extract_stylesheets: bool, emit_static_files: bool) -> Self {
        Self {
            state,
            extract_stylesheets,
            emit_static_files,
        }
    }
}

/// Minify `source` with lightningcss, or `None` if it is not valid CSS
/// (SCSS, LESS and SASS usually are not).
pub(crate) fn minify_css(path: &str, source: &str) -> Option<String> {
    let mut stylesheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: path.to_string(),
            ..Default::default()
        },
    )
    .ok()?;
    stylesheet.minify(MinifyOptions::default()).ok()?;
    let printed = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .ok()?;
    Some(printed.code)
}

/// `dir/logo.svg` is emitted as `logo.bundle.svg`.
pub(crate) fn emitted_name(id: &str) -> String {
    let path = Path::new(id);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("asset");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("bin");
    format!("{stem}{BUNDLE_INFIX}{ext}")
}

impl Plugin for StylesheetPlugin {
    fn name(&self) -> Cow<'static, str> {
        "heft:stylesheet".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Load
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let state = SharedState::clone(&self.state);
        let extract_stylesheets = self.extract_stylesheets;
        let emit_static_files = self.emit_static_files;

        async move {
            if extract_stylesheets && is_stylesheet(&id) {
                let Ok(source) = tokio::fs::read_to_string(&id).await else {
                    return Ok(None);
                };
                let css = minify_css(&id, &source).unwrap_or_else(|| source.clone());
                tracing::trace!(id = %id, raw = source.len(), minified = css.len(), "Extracted stylesheet");

                state.lock().stylesheets.push(ExtractedStylesheet { id, source, css });
                return Ok(Some(HookLoadOutput {
                    code: "export {};".to_string().into(),
                    module_type: Some(ModuleType::Js),
                    ..Default::default()
                }));
            }

            if emit_static_files && is_static_file(&id) {
                let Ok(contents) = tokio::fs::read(&id).await else {
                    return Ok(None);
                };
                let name = emitted_name(&id);
                let code = format!("export default {};", serde_json::Value::from(name.as_str()));

                state.lock().static_files.push(EmittedFile { name, contents });
                return Ok(Some(HookLoadOutput {
                    code: code.into(),
                    module_type: Some(ModuleType::Js),
                    ..Default::default()
                }));
            }

            Ok(None)
        }
    }
}

impl PhasedPlugin for StylesheetPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_css() {
        let css = minify_css("a.css", ".button {\n  color: red;\n  margin: 0px;\n}\n").unwrap();
        assert_eq!(css, ".button{color:red;margin:0}");
    }

    #[test]
    fn test_minify_css_rejects_scss() {
        assert_eq!(minify_css("a.scss", "$c: red;\n.a { .b { color: $c; } }"), None);
    }

    #[test]
    fn test_emitted_name() {
        assert_eq!(emitted_name("/pkg/fonts/inter.woff2"), "inter.bundle.woff2");
        assert_eq!(emitted_name("logo.svg"), "logo.bundle.svg");
    }
}
