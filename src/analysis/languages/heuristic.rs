//! Line-scanner analyzer for C-family languages.
//!
//! There is no parse tree here. Function headers are recognized by
//! accumulating consecutive code lines until a `{` appears and matching the
//! text before the brace against "identifier followed by a parenthesized
//! parameter list". The body then extends until brace balance returns to
//! zero. Signatures with unbalanced braces, call-like macros followed by `{`,
//! and K&R-style definitions are known to be misread.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::assemble::{FileMetricsBuilder, FunctionDraft, SmellThresholds};
use crate::analysis::text::{extract_call_names, is_control_keyword, LineKind, SourceText};
use crate::analysis::{LanguageAnalyzer, ParseError};
use crate::model::{FileMetrics, Language};

lazy_static! {
    static ref FUNCTION_HEADER: Regex = Regex::new(
        r"\b([A-Za-z_]\w*)\s*\(([^()]*)\)(?:\s*(?:const|noexcept|override|final))*\s*$"
    )
    .unwrap();
}

/// How a dialect decides that a function is part of the public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Public unless declared `static` (C, C++).
    UnlessStatic,
    /// Public only with an explicit `public` modifier (C#).
    PublicKeyword,
}

/// Configuration for one C-family dialect.
#[derive(Debug, Clone)]
pub struct Dialect {
    pub language: Language,
    /// Analyzer name (e.g., "c", "cpp")
    pub name: &'static str,
    /// Extensions without dot, lowercase
    pub extensions: &'static [&'static str],
    pub visibility: Visibility,
}

impl Dialect {
    pub fn c() -> Self {
        Self {
            language: Language::C,
            name: "c",
            extensions: &["c", "h"],
            visibility: Visibility::UnlessStatic,
        }
    }

    pub fn cpp() -> Self {
        Self {
            language: Language::Cpp,
            name: "cpp",
            extensions: &["cpp", "hpp", "cc", "hh", "cxx"],
            visibility: Visibility::UnlessStatic,
        }
    }

    pub fn csharp() -> Self {
        Self {
            language: Language::CSharp,
            name: "csharp",
            extensions: &["cs"],
            visibility: Visibility::PublicKeyword,
        }
    }
}

/// Heuristic analyzer for one dialect.
pub struct HeuristicAnalyzer {
    dialect: Dialect,
    thresholds: SmellThresholds,
}

/// A recognized header waiting for its closing brace.
struct OpenFunction {
    name: String,
    header: String,
    params: String,
    start: usize,
    depth: i64,
}

impl HeuristicAnalyzer {
    pub fn new(dialect: Dialect) -> Self {
        Self::with_thresholds(dialect, SmellThresholds::default())
    }

    pub fn with_thresholds(dialect: Dialect, thresholds: SmellThresholds) -> Self {
        Self {
            dialect,
            thresholds,
        }
    }

    fn is_public(&self, header: &str) -> bool {
        let has_word = |word: &str| {
            header
                .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .any(|w| w == word)
        };
        match self.dialect.visibility {
            Visibility::UnlessStatic => !has_word("static"),
            Visibility::PublicKeyword => has_word("public"),
        }
    }

    fn finish(&self, builder: &mut FileMetricsBuilder<'_>, text: &SourceText, open: OpenFunction, end: usize) {
        let body: String = (open.start..=end)
            .filter_map(|n| text.line(n))
            .map(|l| l.code.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let body = body.split_once('{').map(|(_, rest)| rest).unwrap_or("");

        let is_documented = open
            .start
            .checked_sub(1)
            .and_then(|n| text.line(n))
            .map(|l| l.kind == LineKind::Comment)
            .unwrap_or(false);

        builder.function(FunctionDraft {
            is_public: self.is_public(&open.header),
            signature: open.header,
            parameters: count_parameters(&open.params),
            name: open.name,
            start_line: open.start,
            end_line: end,
            locals: None,
            callees: extract_call_names(body),
            is_documented,
            excluded: Vec::new(),
        });
    }
}

impl LanguageAnalyzer for HeuristicAnalyzer {
    fn language(&self) -> Language {
        self.dialect.language
    }

    fn name(&self) -> &'static str {
        self.dialect.name
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        self.dialect.extensions
    }

    fn parse(&self, path: &Path, source: &[u8]) -> Result<FileMetrics, ParseError> {
        let text = SourceText::from_bytes(source);
        let mut builder = FileMetricsBuilder::new(
            path.to_string_lossy(),
            self.dialect.language,
            &text,
            self.thresholds,
        );

        let mut header = String::new();
        let mut header_start = 0;
        let mut open: Option<OpenFunction> = None;

        for (i, line) in text.lines().iter().enumerate() {
            let number = i + 1;

            if let Some(func) = open.as_mut() {
                func.depth += brace_delta(&line.code);
                if func.depth <= 0 {
                    if let Some(func) = open.take() {
                        self.finish(&mut builder, &text, func, number);
                    }
                }
                continue;
            }

            let code = line.code.trim();
            if line.kind != LineKind::Code || code.is_empty() {
                header.clear();
                continue;
            }
            if code.starts_with('}') {
                header.clear();
                continue;
            }

            if header.is_empty() {
                header_start = number;
            } else {
                header.push(' ');
            }
            header.push_str(code);

            if let Some((before, _)) = header.split_once('{') {
                if let Some(caps) = FUNCTION_HEADER.captures(before.trim()) {
                    let name = &caps[1];
                    if !is_control_keyword(name) {
                        let func = OpenFunction {
                            name: name.to_string(),
                            header: before.split_whitespace().collect::<Vec<_>>().join(" "),
                            params: caps[2].to_string(),
                            start: header_start,
                            depth: brace_delta(&header),
                        };
                        if func.depth <= 0 {
                            self.finish(&mut builder, &text, func, number);
                        } else {
                            open = Some(func);
                        }
                    }
                }
                header.clear();
            } else if code.ends_with(';') {
                header.clear();
            }
        }

        // A function still open at end of file was never closed; it is dropped.
        Ok(builder.build())
    }
}

fn brace_delta(code: &str) -> i64 {
    code.matches('{').count() as i64 - code.matches('}').count() as i64
}

/// Count comma-separated entries, ignoring commas inside template arguments.
fn count_parameters(params: &str) -> usize {
    let params = params.trim();
    if params.is_empty() || params == "void" {
        return 0;
    }

    let mut depth = 0usize;
    let mut count = 1;
    for c in params.chars() {
        match c {
            '<' | '[' => depth += 1,
            '>' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => count += 1,
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    const C_SOURCE: &str = r#"#include <stdio.h>

/* Adds two numbers. */
int add(int a, int b) { if (a > 0 && b > 0) return a + b; return 0; }

static int
clamp(int v,
      int lo, int hi)
{
    if (v < lo) {
        return lo;
    }
    return v > hi ? hi : v;
}

int main(void) {
    printf("%d\n", add(1, 2));
    return clamp(sizeof(int), 0, 3);
}
"#;

    fn analyze(dialect: Dialect, source: &str, file: &str) -> FileMetrics {
        HeuristicAnalyzer::new(dialect)
            .parse(Path::new(file), source.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_one_line_function() {
        let fm = analyze(Dialect::c(), C_SOURCE, "sample.c");
        let add = &fm.functions[0];
        assert_eq!(add.name, "add");
        assert_eq!(add.start_line, 4);
        assert_eq!(add.end_line, 4);
        assert_eq!(add.ccn, 3);
        assert_eq!(add.parameters, 2);
        assert!(add.is_public);
        assert!(add.is_documented);
        assert!(add.callees.is_empty());
    }

    #[test]
    fn test_multi_line_static_header() {
        let fm = analyze(Dialect::c(), C_SOURCE, "sample.c");
        let clamp = &fm.functions[1];
        assert_eq!(clamp.name, "clamp");
        assert_eq!(clamp.start_line, 6);
        assert_eq!(clamp.end_line, 14);
        assert_eq!(clamp.parameters, 3);
        assert_eq!(clamp.ccn, 3);
        assert_eq!(clamp.max_nesting, 2);
        assert!(!clamp.is_public);
        assert!(!clamp.is_documented);
        assert_eq!(clamp.signature, "static int clamp(int v, int lo, int hi)");
    }

    #[test]
    fn test_callees_skip_keywords_and_sizeof() {
        let fm = analyze(Dialect::c(), C_SOURCE, "sample.c");
        assert_eq!(fm.functions.len(), 3);
        let main = &fm.functions[2];
        assert_eq!(main.parameters, 0);
        assert_eq!(main.callees, vec!["add", "clamp", "printf"]);
        assert_eq!(main.fan_out, 3);
        assert_eq!(fm.summary.functions_count, 3);
    }

    #[test]
    fn test_control_blocks_are_not_functions() {
        let source = "void f(int x) {\n}\nwhile (x) {\n}\nif (y) {\n}\n";
        let fm = analyze(Dialect::c(), source, "f.c");
        assert_eq!(fm.functions.len(), 1);
    }

    #[test]
    fn test_declarations_reset_header() {
        let source = "int counter;\nstruct point { int x; };\nint get(void)\n{\n    return counter;\n}\n";
        let fm = analyze(Dialect::c(), source, "g.c");
        assert_eq!(fm.functions.len(), 1);
        assert_eq!(fm.functions[0].name, "get");
        assert_eq!(fm.functions[0].start_line, 3);
        assert_eq!(fm.functions[0].end_line, 6);
    }

    #[test]
    fn test_cpp_qualifiers() {
        let source = "int Shape::area() const {\n    return w * h;\n}\n";
        let fm = analyze(Dialect::cpp(), source, "shape.cpp");
        assert_eq!(fm.language, Language::Cpp);
        assert_eq!(fm.functions.len(), 1);
        assert_eq!(fm.functions[0].name, "area");
    }

    #[test]
    fn test_csharp_visibility_and_docs() {
        let source = r#"namespace Demo {
    public class Calc {
        /// <summary>Adds.</summary>
        public int Add(int a, int b) {
            return a + b;
        }

        private void Log(string msg) {
            foreach (var c in msg) {
                Console.Write(c);
            }
        }
    }
}
"#;
        let fm = analyze(Dialect::csharp(), source, "Calc.cs");
        assert_eq!(fm.functions.len(), 2);

        let add = &fm.functions[0];
        assert_eq!(add.name, "Add");
        assert_eq!((add.start_line, add.end_line), (4, 6));
        assert!(add.is_public);
        assert!(add.is_documented);

        let log = &fm.functions[1];
        assert_eq!(log.name, "Log");
        assert_eq!(log.end_line, 12);
        assert!(!log.is_public);
        assert_eq!(log.callees, vec!["Write"]);
        assert!((fm.comments.public_api_doc_pct - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_header_with_trailing_block_comment() {
        let source = "int g(int a) { /* entry */\n    return a;\n}\n\nint h(int b)\n{\n    return g(b);\n}\n";
        let fm = analyze(Dialect::c(), source, "g.c");
        let names: Vec<_> = fm.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["g", "h"]);

        let g = &fm.functions[0];
        assert_eq!((g.start_line, g.end_line), (1, 3));
        assert_eq!(g.parameters, 1);
        assert!((g.comment_density - 1.0 / 4.0).abs() < 1e-9);
        assert_eq!(fm.functions[1].callees, vec!["g"]);
    }

    #[test]
    fn test_unterminated_function_is_dropped() {
        let fm = analyze(Dialect::c(), "void f() {\n    g();\n", "h.c");
        assert!(fm.functions.is_empty());
    }

    #[test]
    fn test_count_parameters() {
        assert_eq!(count_parameters(""), 0);
        assert_eq!(count_parameters(" void "), 0);
        assert_eq!(count_parameters("int a"), 1);
        assert_eq!(count_parameters("Dictionary<string, int> d, int n"), 2);
    }

    #[test]
    fn test_supports() {
        let cpp = HeuristicAnalyzer::new(Dialect::cpp());
        assert!(cpp.supports(Path::new("x.HPP")));
        assert!(!cpp.supports(Path::new("x.c")));
    }
}
