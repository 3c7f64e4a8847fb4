//! Go language analyzer using tree-sitter.
//!
//! Function boundaries, parameters, locals and call sites come from the parse
//! tree. Line-level metrics (NLOC, CCN, nesting) come from the shared text
//! primitives so that Go and the heuristic dialects are measured alike.
//!
//! Function literals are reported as functions of their own, named
//! `@<start>-<end>`, and their lines are excluded from the enclosing function.

use std::collections::BTreeSet;
use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor};

use crate::analysis::assemble::{FileMetricsBuilder, FunctionDraft, SmellThresholds};
use crate::analysis::text::{LineRange, SourceText};
use crate::analysis::{LanguageAnalyzer, ParseError};
use crate::model::{CodeSmellKind, FileMetrics, Language};

/// Tree-sitter query for Go functions and package-level state.
const DECLARATION_QUERY: &str = r#"
; Function declarations
(function_declaration
  name: (identifier) @name
  body: (block)
) @function

; Method declarations (receiver is not a parameter)
(method_declaration
  name: (field_identifier) @name
  body: (block)
) @function

; Package-level variables
(source_file
  (var_declaration) @global
)
"#;

/// Go language analyzer.
pub struct GoAnalyzer {
    language: tree_sitter::Language,
    /// Compiled once per analyzer; a compile failure surfaces on every parse.
    query: Result<Query, String>,
    thresholds: SmellThresholds,
}

impl GoAnalyzer {
    /// Create a new Go analyzer.
    pub fn new() -> Self {
        Self::with_thresholds(SmellThresholds::default())
    }

    pub fn with_thresholds(thresholds: SmellThresholds) -> Self {
        let language: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();
        let query = Query::new(&language, DECLARATION_QUERY).map_err(|e| e.to_string());
        Self {
            language,
            query,
            thresholds,
        }
    }

    /// Create a new parser for this thread.
    fn create_parser(&self) -> Result<Parser, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::Setup(e.to_string()))?;
        Ok(parser)
    }

    /// Record one declared function or method.
    fn add_declaration(&self, builder: &mut FileMetricsBuilder<'_>, node: Node, name: &str, src: &[u8]) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };

        let mut literals = Vec::new();
        collect_literals(body, &mut literals);

        builder.function(FunctionDraft {
            name: name.to_string(),
            signature: signature(node, body, src),
            start_line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            parameters: node
                .child_by_field_name("parameters")
                .map(count_parameters)
                .unwrap_or(0),
            locals: Some(count_locals(body, src)),
            callees: callees(body, src),
            is_public: name.chars().next().is_some_and(|c| c.is_uppercase()),
            is_documented: has_doc_comment(node),
            excluded: literals.iter().map(|n| line_range(*n)).collect(),
        });

        for literal in literals {
            self.add_literal(builder, literal, src);
        }
    }

    /// Record a function literal and, recursively, the literals inside it.
    fn add_literal(&self, builder: &mut FileMetricsBuilder<'_>, node: Node, src: &[u8]) {
        let range = line_range(node);
        let name = format!("@{}-{}", range.start, range.end);

        let mut nested = Vec::new();
        let body = node.child_by_field_name("body");
        if let Some(body) = body {
            collect_literals(body, &mut nested);
        }

        builder.function(FunctionDraft {
            signature: name.clone(),
            name,
            start_line: range.start,
            end_line: range.end,
            parameters: node
                .child_by_field_name("parameters")
                .map(count_parameters)
                .unwrap_or(0),
            locals: Some(body.map(|b| count_locals(b, src)).unwrap_or(0)),
            callees: body.map(|b| callees(b, src)).unwrap_or_default(),
            is_public: false,
            is_documented: false,
            excluded: nested.iter().map(|n| line_range(*n)).collect(),
        });

        for literal in nested {
            self.add_literal(builder, literal, src);
        }
    }

    /// Report every name declared in a package-level `var`.
    fn add_globals(&self, builder: &mut FileMetricsBuilder<'_>, node: Node, src: &[u8]) {
        let mut specs = Vec::new();
        collect_kind(node, "var_spec", &mut specs);
        for spec in specs {
            let mut cursor = spec.walk();
            for name in spec.children_by_field_name("name", &mut cursor) {
                let ident = node_text(name, src);
                if ident == "_" {
                    continue;
                }
                builder.smell(
                    CodeSmellKind::GlobalState,
                    format!("package-level variable `{}`", ident),
                    Some(name.start_position().row + 1),
                );
            }
        }
    }
}

impl Default for GoAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for GoAnalyzer {
    fn language(&self) -> Language {
        Language::Go
    }

    fn name(&self) -> &'static str {
        "go"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn parse(&self, path: &Path, source: &[u8]) -> Result<FileMetrics, ParseError> {
        let mut parser = self.create_parser()?;
        let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;
        let root = tree.root_node();

        if root.has_error() {
            return Err(ParseError::Syntax {
                line: first_error_line(root),
            });
        }

        let query = self
            .query
            .as_ref()
            .map_err(|e| ParseError::Setup(e.clone()))?;
        let text = SourceText::from_bytes(source);
        let mut builder = FileMetricsBuilder::new(
            path.to_string_lossy(),
            Language::Go,
            &text,
            self.thresholds,
        );

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, root, source);

        while let Some(m) = matches.next() {
            let mut name = None;
            let mut decl = None;

            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "name" => name = Some(node_text(capture.node, source)),
                    "function" => decl = Some(capture.node),
                    "global" => self.add_globals(&mut builder, capture.node, source),
                    _ => {}
                }
            }

            if let (Some(name), Some(node)) = (name, decl) {
                self.add_declaration(&mut builder, node, name, source);
            }
        }

        Ok(builder.build())
    }
}

fn node_text<'s>(node: Node, src: &'s [u8]) -> &'s str {
    node.utf8_text(src).unwrap_or("")
}

fn line_range(node: Node) -> LineRange {
    LineRange::new(node.start_position().row + 1, node.end_position().row + 1)
}

/// Line of the first ERROR or missing node, depth first.
fn first_error_line(root: Node) -> usize {
    fn find(node: Node) -> Option<usize> {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        children.into_iter().filter(|c| c.has_error()).find_map(find)
    }
    find(root).unwrap_or(1)
}

/// Outermost `func_literal` nodes below `node`.
fn collect_literals<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "func_literal" {
            out.push(child);
        } else {
            collect_literals(child, out);
        }
    }
}

/// Every node of `kind` below `node`, not entering function literals.
fn collect_kind<'t>(node: Node<'t>, kind: &str, out: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == kind {
            out.push(child);
        }
        if child.kind() != "func_literal" {
            collect_kind(child, kind, out);
        }
    }
}

/// `a, b int` counts 2; an unnamed parameter counts 1.
fn count_parameters(list: Node) -> usize {
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter(|p| {
            matches!(
                p.kind(),
                "parameter_declaration" | "variadic_parameter_declaration"
            )
        })
        .map(|p| {
            let mut names = p.walk();
            p.children_by_field_name("name", &mut names).count().max(1)
        })
        .sum()
}

/// Names introduced by `:=` (including range clauses) and `var` specs.
fn count_locals(body: Node, src: &[u8]) -> usize {
    let mut count = 0;

    let mut short_vars = Vec::new();
    collect_kind(body, "short_var_declaration", &mut short_vars);
    let mut ranges = Vec::new();
    collect_kind(body, "range_clause", &mut ranges);
    ranges.retain(|r| {
        let mut cursor = r.walk();
        let defines = r.children(&mut cursor).any(|c| c.kind() == ":=");
        defines
    });

    for node in short_vars.into_iter().chain(ranges) {
        if let Some(left) = node.child_by_field_name("left") {
            let mut cursor = left.walk();
            count += left
                .named_children(&mut cursor)
                .filter(|n| n.kind() == "identifier" && node_text(*n, src) != "_")
                .count();
        }
    }

    let mut specs = Vec::new();
    collect_kind(body, "var_spec", &mut specs);
    for spec in specs {
        let mut cursor = spec.walk();
        count += spec
            .children_by_field_name("name", &mut cursor)
            .filter(|n| node_text(*n, src) != "_")
            .count();
    }

    count
}

/// Bare-identifier call targets, outside nested literals.
fn callees(body: Node, src: &[u8]) -> BTreeSet<String> {
    let mut calls = Vec::new();
    collect_kind(body, "call_expression", &mut calls);
    calls
        .into_iter()
        .filter_map(|call| call.child_by_field_name("function"))
        .filter(|f| f.kind() == "identifier")
        .map(|f| node_text(f, src).to_string())
        .collect()
}

/// A comment ending on the line directly above the declaration.
fn has_doc_comment(node: Node) -> bool {
    node.prev_sibling()
        .filter(|prev| prev.kind() == "comment")
        .map(|prev| prev.end_position().row + 1 == node.start_position().row)
        .unwrap_or(false)
}

/// Declaration text up to the body, whitespace collapsed.
fn signature(node: Node, body: Node, src: &[u8]) -> String {
    let head = src
        .get(node.start_byte()..body.start_byte())
        .map(String::from_utf8_lossy)
        .unwrap_or_default();
    head.split_whitespace().collect::<Vec<_>>().join(" ")
}
