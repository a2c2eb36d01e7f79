//! JavaScript minification backends.
//!
//! Both backends run on oxc. `Compress` applies the full compressor without
//! mangling, the slower and more configurable choice. `Fast` only mangles
//! and strips whitespace.

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{CompressOptions, MangleOptions, Minifier as OxcMinifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Minifier used for bundles and dependency sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Minifier {
    /// Full compression, no mangling.
    #[default]
    #[serde(rename = "compress", alias = "terser")]
    Compress,
    /// Mangle and whitespace removal only.
    #[serde(rename = "fast", alias = "esbuild")]
    Fast,
}

impl Minifier {
    /// Parse a minifier name (case-insensitive).
    ///
    /// `terser` and `esbuild` are accepted as aliases for `compress` and
    /// `fast` respectively.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "compress" | "terser" => Ok(Self::Compress),
            "fast" | "esbuild" => Ok(Self::Fast),
            _ => Err(format!(
                "Invalid minifier: '{s}'. Expected: compress, fast"
            )),
        }
    }

    fn options(self) -> MinifierOptions {
        match self {
            Self::Compress => MinifierOptions {
                mangle: None,
                compress: Some(CompressOptions::smallest()),
            },
            Self::Fast => MinifierOptions {
                mangle: Some(MangleOptions::default()),
                compress: None,
            },
        }
    }
}

impl std::fmt::Display for Minifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compress => write!(f, "compress"),
            Self::Fast => write!(f, "fast"),
        }
    }
}

impl FromStr for Minifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A minification failure, carrying the parser's messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifyFailure {
    pub messages: Vec<String>,
}

impl MinifyFailure {
    pub fn message(&self) -> String {
        self.messages.join("\n")
    }
}

impl std::fmt::Display for MinifyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Rewrite license markers so minifiers treat them as ordinary comments.
///
/// Minifiers keep `/*!`, `//!` and `@license` comments verbatim, which
/// would otherwise count towards the measured size.
pub fn neutralize_license_comments(code: &str) -> String {
    code.replace("@license", "@silence")
        .replace("//!", "//")
        .replace("/*!", "/*")
}

/// Minify `code` with `minifier`.
///
/// The source is parsed as a module first and as a script if that fails,
/// so CommonJS that uses script-only syntax still minifies.
pub fn minify_js(code: &str, minifier: Minifier) -> Result<String, MinifyFailure> {
    let code = match minifier {
        Minifier::Fast => neutralize_license_comments(code),
        Minifier::Compress => code.to_string(),
    };

    let allocator = Allocator::default();
    let mut ret = Parser::new(&allocator, &code, SourceType::mjs()).parse();
    if !ret.errors.is_empty() || ret.panicked {
        let script = Parser::new(&allocator, &code, SourceType::cjs()).parse();
        if !script.errors.is_empty() || script.panicked {
            return Err(MinifyFailure {
                messages: ret.errors.iter().map(|e| e.to_string()).collect(),
            });
        }
        ret = script;
    }

    let mut program = ret.program;
    let minified = OxcMinifier::new(minifier.options()).minify(&allocator, &mut program);

    Ok(Codegen::new()
        .with_options(CodegenOptions::minify())
        .with_scoping(minified.scoping)
        .build(&program)
        .code)
}
