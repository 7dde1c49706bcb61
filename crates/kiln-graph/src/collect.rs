//! Import extraction from script sources.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, CallExpression, ExportAllDeclaration, ExportNamedDeclaration, Expression,
    ImportDeclaration, ImportExpression,
};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// How a module reaches its dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportKind {
    /// `import` / `export ... from`
    Static,
    /// `import()`; the edge crosses an async boundary
    Dynamic,
    /// CommonJS `require()`
    Require,
}

impl ImportKind {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, ImportKind::Dynamic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub specifier: String,
    pub kind: ImportKind,
}

#[derive(Default)]
struct ImportCollector {
    records: Vec<ImportRecord>,
}

impl ImportCollector {
    fn push(&mut self, specifier: &str, kind: ImportKind) {
        self.records.push(ImportRecord {
            specifier: specifier.to_string(),
            kind,
        });
    }
}

impl<'a> Visit<'a> for ImportCollector {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        if !decl.import_kind.is_type() {
            self.push(decl.source.value.as_str(), ImportKind::Static);
        }
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        if !decl.export_kind.is_type() {
            self.push(decl.source.value.as_str(), ImportKind::Static);
        }
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &decl.source {
            if !decl.export_kind.is_type() {
                self.push(source.value.as_str(), ImportKind::Static);
            }
        }
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        // Only literal specifiers can be followed statically
        if let Expression::StringLiteral(lit) = &expr.source {
            self.push(lit.value.as_str(), ImportKind::Dynamic);
        }
        walk::walk_import_expression(self, expr);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if call.callee.is_specific_id("require") && call.arguments.len() == 1 {
            if let Some(Argument::StringLiteral(lit)) = call.arguments.first() {
                self.push(lit.value.as_str(), ImportKind::Require);
            }
        }
        walk::walk_call_expression(self, call);
    }
}

/// Parse `source` and return its imports in source order.
///
/// # Errors
///
/// Returns `GraphError::Parse` with the first syntax error when the file
/// does not parse.
pub fn collect_imports(path: &Path, source: &str) -> Result<Vec<ImportRecord>> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or(SourceType::mjs());
    let ret = Parser::new(&allocator, source, source_type).parse();

    if let Some(error) = ret.errors.first() {
        return Err(GraphError::Parse {
            path: path.to_path_buf(),
            message: error.to_string(),
        });
    }

    let mut collector = ImportCollector::default();
    collector.visit_program(&ret.program);
    Ok(collector.records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specifiers(source: &str) -> Vec<(String, ImportKind)> {
        collect_imports(Path::new("test.js"), source)
            .unwrap()
            .into_iter()
            .map(|r| (r.specifier, r.kind))
            .collect()
    }

    #[test]
    fn collects_static_and_reexports_in_order() {
        let found = specifiers(
            "import a from './a';\nexport * from './b';\nexport { c } from './c';\nimport '../scss/style.scss';",
        );
        let names: Vec<_> = found.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, ["./a", "./b", "./c", "../scss/style.scss"]);
        assert!(found.iter().all(|(_, k)| *k == ImportKind::Static));
    }

    #[test]
    fn collects_dynamic_and_require() {
        let found = specifiers(
            "const lazy = () => import('./lazy');\nconst dep = require('./dep');\nimport(name);",
        );
        assert_eq!(
            found,
            vec![
                ("./lazy".to_string(), ImportKind::Dynamic),
                ("./dep".to_string(), ImportKind::Require),
            ]
        );
    }

    #[test]
    fn skips_type_only_imports() {
        let found = collect_imports(
            Path::new("types.ts"),
            "import type { A } from './types';\nimport { b } from './b';",
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].specifier, "./b");
    }

    #[test]
    fn reports_syntax_errors() {
        let result = collect_imports(Path::new("broken.js"), "import { from './a';");
        assert!(matches!(result, Err(GraphError::Parse { .. })));
    }
}
