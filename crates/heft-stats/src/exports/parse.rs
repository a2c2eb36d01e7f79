//! Export extraction from a single module.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPattern, BindingPatternKind, Declaration, ExportNamedDeclaration, ModuleDeclaration,
    ModuleExportName,
};
use oxc_parser::Parser;
use oxc_span::SourceType;

/// What one module exports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportDetails {
    /// Named exports, plus `default`, in declaration order.
    pub exports: Vec<String>,
    /// Specifiers of `export * from "<specifier>"` statements.
    pub export_all_locations: Vec<String>,
}

fn export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

/// Collect every name bound by `pattern`.
pub(crate) fn binding_names(pattern: &BindingPattern<'_>, names: &mut Vec<String>) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(ident) => names.push(ident.name.to_string()),
        BindingPatternKind::ObjectPattern(object) => {
            for property in &object.properties {
                binding_names(&property.value, names);
            }
            if let Some(rest) = &object.rest {
                binding_names(&rest.argument, names);
            }
        }
        BindingPatternKind::ArrayPattern(array) => {
            for element in array.elements.iter().flatten() {
                binding_names(element, names);
            }
            if let Some(rest) = &array.rest {
                binding_names(&rest.argument, names);
            }
        }
        BindingPatternKind::AssignmentPattern(assignment) => {
            binding_names(&assignment.left, names);
        }
    }
}

fn named_exports(named: &ExportNamedDeclaration<'_>, names: &mut Vec<String>) {
    if named.export_kind.is_type() {
        return;
    }

    let Some(declaration) = &named.declaration else {
        names.extend(
            named
                .specifiers
                .iter()
                .filter(|specifier| !specifier.export_kind.is_type())
                .map(|specifier| export_name(&specifier.exported)),
        );
        return;
    };

    match declaration {
        Declaration::VariableDeclaration(variable) if !variable.declare => {
            for declarator in &variable.declarations {
                binding_names(&declarator.id, names);
            }
        }
        Declaration::FunctionDeclaration(function) if !function.declare => {
            if let Some(id) = &function.id {
                names.push(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(class) if !class.declare => {
            if let Some(id) = &class.id {
                names.push(id.name.to_string());
            }
        }
        Declaration::TSEnumDeclaration(enumeration) if !enumeration.declare => {
            names.push(enumeration.id.name.to_string());
        }
        // Type-only and ambient declarations have no runtime binding.
        _ => {}
    }
}

/// Parse `code` and list its exports.
///
/// Syntax errors the parser recovers from are ignored; only an
/// unrecoverable parse is an error.
pub fn get_exports_details(code: &str, source_type: SourceType) -> Result<ExportDetails, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, source_type).parse();
    if ret.panicked {
        let messages: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
        return Err(messages.join("\n"));
    }

    let mut details = ExportDetails::default();
    for statement in &ret.program.body {
        let Some(module_decl) = statement.as_module_declaration() else {
            continue;
        };
        match module_decl {
            ModuleDeclaration::ExportNamedDeclaration(named) => {
                named_exports(named, &mut details.exports);
            }
            ModuleDeclaration::ExportDefaultDeclaration(_) => {
                details.exports.push("default".to_string());
            }
            ModuleDeclaration::ExportAllDeclaration(all) if !all.export_kind.is_type() => {
                match &all.exported {
                    // `export * as ns from` binds a single name
                    Some(exported) => details.exports.push(export_name(exported)),
                    None => details
                        .export_all_locations
                        .push(all.source.value.to_string()),
                }
            }
            _ => {}
        }
    }

    Ok(details)
}
