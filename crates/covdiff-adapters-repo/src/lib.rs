//! Repository source adapters.
//!
//! [`GoFunctionBodies`] reads Go files from a checkout and restricts
//! measurement to the lines inside top-level function and method bodies.

use std::path::{Path, PathBuf};

use covdiff_ports::StructureProvider;
use covdiff_types::{Interval, StructuralScope};
use thiserror::Error;
use tracing::debug;
use tree_sitter::{Language, Node, Parser};

/// Errors raised while extracting function bodies from Go source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("failed to load Go grammar: {0}")]
    Language(String),

    #[error("failed to parse Go source")]
    Parse,

    #[error("syntax error at line {line}")]
    Syntax { line: usize },
}

/// Line intervals of every top-level function and method body in `source`.
///
/// Each interval runs from the line holding the opening `{` to the line
/// holding the closing `}`. Declarations without a body are skipped. When
/// `ignore_main` is set and the file belongs to `package main`, the result is
/// empty.
///
/// # Examples
///
/// ```
/// use covdiff_adapters_repo::function_body_intervals;
/// use covdiff_types::Interval;
///
/// let src = "package calc\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n";
/// let bodies = function_body_intervals(src, false).unwrap();
/// assert_eq!(bodies, vec![Interval::new(3, 5)]);
/// ```
pub fn function_body_intervals(
    source: &str,
    ignore_main: bool,
) -> Result<Vec<Interval>, SourceError> {
    let mut parser = Parser::new();
    let language: Language = tree_sitter_go::LANGUAGE.into();
    parser
        .set_language(&language)
        .map_err(|e| SourceError::Language(e.to_string()))?;

    let tree = parser.parse(source, None).ok_or(SourceError::Parse)?;
    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(root).unwrap_or(root.start_position().row + 1);
        return Err(SourceError::Syntax { line });
    }

    if ignore_main && package_name(root, source) == Some("main") {
        return Ok(Vec::new());
    }

    let mut intervals = Vec::new();
    let mut cursor = root.walk();
    for decl in root.named_children(&mut cursor) {
        if !matches!(decl.kind(), "function_declaration" | "method_declaration") {
            continue;
        }
        let Some(body) = decl.child_by_field_name("body") else {
            continue;
        };
        let start = (body.start_position().row + 1) as u32;
        let end = (body.end_position().row + 1) as u32;
        intervals.push(Interval::new(start, end.max(start)));
    }

    Ok(intervals)
}

fn package_name<'s>(root: Node<'_>, source: &'s str) -> Option<&'s str> {
    let mut cursor = root.walk();
    let clause = root
        .named_children(&mut cursor)
        .find(|n| n.kind() == "package_clause")?;
    let mut cursor = clause.walk();
    let ident = clause
        .named_children(&mut cursor)
        .find(|n| n.kind() == "package_identifier")?;
    ident.utf8_text(source.as_bytes()).ok()
}

fn first_error_line(node: Node<'_>) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find_map(first_error_line);
    found
}

// ============================================================================
// Structure Provider
// ============================================================================

/// Filesystem-backed provider of Go function-body scopes.
#[derive(Debug, Clone)]
pub struct GoFunctionBodies {
    root: PathBuf,
    ignore_main: bool,
}

impl GoFunctionBodies {
    /// Create a provider reading files relative to `root`.
    pub fn new(root: impl Into<PathBuf>, ignore_main: bool) -> Self {
        Self {
            root: root.into(),
            ignore_main,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StructureProvider for GoFunctionBodies {
    fn structural_scope(&self, path: &str) -> Result<StructuralScope, String> {
        let full_path = self.root.join(path);
        let source = std::fs::read_to_string(&full_path)
            .map_err(|e| format!("failed to read {}: {e}", full_path.display()))?;
        let bodies = function_body_intervals(&source, self.ignore_main)
            .map_err(|e| format!("{}: {e}", full_path.display()))?;
        debug!(path, bodies = bodies.len(), "function bodies");
        Ok(StructuralScope::Restricted(bodies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALC: &str = r#"package calc

import "fmt"

// Add returns the sum.
func Add(a, b int) int {
	return a + b
}

type Box struct{ v int }

func (b *Box) String() string {
	return fmt.Sprint(b.v)
}

func Noop() {}
"#;

    #[test]
    fn finds_function_and_method_bodies() {
        let bodies = function_body_intervals(CALC, false).unwrap();
        assert_eq!(
            bodies,
            vec![Interval::new(6, 8), Interval::new(12, 14), Interval::new(16, 16)]
        );
    }

    #[test]
    fn ignore_main_empties_main_package() {
        let src = "package main\n\nfunc main() {\n\trun()\n}\n";
        assert!(function_body_intervals(src, true).unwrap().is_empty());
        assert_eq!(
            function_body_intervals(src, false).unwrap(),
            vec![Interval::new(3, 5)]
        );
    }

    #[test]
    fn ignore_main_keeps_other_packages() {
        let bodies = function_body_intervals(CALC, true).unwrap();
        assert_eq!(bodies.len(), 3);
    }

    #[test]
    fn closures_inside_bodies_are_not_reported_separately() {
        let src = "package p\n\nfunc F() {\n\tg := func() {\n\t\th()\n\t}\n\tg()\n}\n";
        assert_eq!(
            function_body_intervals(src, false).unwrap(),
            vec![Interval::new(3, 8)]
        );
    }

    #[test]
    fn file_without_functions_is_empty() {
        let src = "package p\n\nconst X = 1\n\nvar Y = 2\n";
        assert!(function_body_intervals(src, false).unwrap().is_empty());
    }

    #[test]
    fn syntax_error_is_reported() {
        let src = "package p\n\nfunc F( {\n";
        assert!(matches!(
            function_body_intervals(src, false),
            Err(SourceError::Syntax { .. })
        ));
    }

    #[test]
    fn provider_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pkg/calc")).unwrap();
        std::fs::write(dir.path().join("pkg/calc/calc.go"), CALC).unwrap();

        let provider = GoFunctionBodies::new(dir.path(), false);
        let scope = provider.structural_scope("pkg/calc/calc.go").unwrap();
        match scope {
            StructuralScope::Restricted(bodies) => assert_eq!(bodies.len(), 3),
            StructuralScope::Unrestricted => panic!("expected restricted scope"),
        }
    }

    #[test]
    fn provider_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = GoFunctionBodies::new(dir.path(), false);
        let err = provider.structural_scope("missing.go").unwrap_err();
        assert!(err.contains("missing.go"));
    }
}
