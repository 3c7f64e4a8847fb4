//! Line-oriented metric primitives shared by every analyzer.
//!
//! The source is lexed once into [`SourceText`]: each line keeps its raw text,
//! a "code" view with string contents and comments removed, and a
//! [`LineKind`]. All range metrics are then computed from that view, so the
//! structured and heuristic analyzers agree on what a comment, a blank line or
//! a decision point is.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DECISION: Regex = Regex::new(r"\b(if|for|while|case|switch)\b").unwrap();
    static ref BOOL_OP: Regex = Regex::new(r"&&|\|\||\?").unwrap();
    static ref CALL: Regex = Regex::new(r"\b([A-Za-z_]\w*)\s*\(").unwrap();
    /// `int x = 0;`, `char *p;`, `auto v = f();`, `List<int> xs = ...`
    static ref C_DECLARATION: Regex = Regex::new(
        r"^(?:(?:const|static|unsigned|signed|struct|volatile|register)\s+)*(?:int|char|float|double|long|short|bool|auto|size_t|string|[A-Z]\w*|[a-z_]\w*_t)(?:\s*<[^<>]*>)?[\s\*&]+[A-Za-z_]\w*\s*(?:=[^=]|;|\[)"
    )
    .unwrap();
}

/// Names that look like calls but are control flow.
pub const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "return", "catch", "foreach", "using", "lock", "else",
    "do", "case",
];

/// Operators that take a parenthesized operand.
const SIZE_OPERATORS: &[&str] = &["sizeof", "alignof", "typeof", "nameof", "decltype"];

pub fn is_control_keyword(name: &str) -> bool {
    CONTROL_KEYWORDS.contains(&name)
}

/// Lexer state carried between characters (and, for block comments and raw
/// strings, between lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexical {
    Code,
    Single,
    Double,
    Raw,
    Block,
}

/// Result of lexing one line.
struct Lexed {
    code: String,
    opened_block: bool,
}

/// Lex a single line starting in `state`, leaving `state` as it is at the end
/// of the line. With `comments` unset, comment markers are ordinary text.
fn lex_line(line: &str, state: &mut Lexical, comments: bool) -> Lexed {
    let mut code = String::with_capacity(line.len());
    let mut opened_block = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match *state {
            Lexical::Code => match c {
                '/' if comments && chars.peek() == Some(&'/') => break,
                '/' if comments && chars.peek() == Some(&'*') => {
                    chars.next();
                    *state = Lexical::Block;
                    opened_block = true;
                }
                '"' => {
                    code.push(c);
                    *state = Lexical::Double;
                }
                '\'' => {
                    code.push(c);
                    *state = Lexical::Single;
                }
                '`' => {
                    code.push(c);
                    *state = Lexical::Raw;
                }
                _ => code.push(c),
            },
            Lexical::Double | Lexical::Single => {
                let quote = if *state == Lexical::Double { '"' } else { '\'' };
                if c == '\\' {
                    chars.next();
                } else if c == quote {
                    code.push(c);
                    *state = Lexical::Code;
                }
            }
            Lexical::Raw => {
                if c == '`' {
                    code.push(c);
                    *state = Lexical::Code;
                }
            }
            Lexical::Block => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    *state = Lexical::Code;
                }
            }
        }
    }

    // Interpreted literals never span lines.
    if matches!(*state, Lexical::Double | Lexical::Single) {
        *state = Lexical::Code;
    }

    Lexed { code, opened_block }
}

/// Remove the contents of `'…'`, `"…"` and `` `…` `` literals, keeping the
/// quote characters. Comment markers are left untouched.
pub fn strip_string_literals(line: &str) -> String {
    let mut state = Lexical::Code;
    lex_line(line, &mut state, false).code
}

/// Classification of one source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Comment,
    /// Preprocessor-style line starting with `#`.
    Directive,
    Code,
}

#[derive(Debug, Clone)]
pub struct Line {
    pub text: String,
    /// Text with string contents and comments removed.
    pub code: String,
    pub kind: LineKind,
    /// Inside, or opening, a comment. A `Code` line can carry one too.
    pub has_comment: bool,
}

/// A source file split into classified lines.
#[derive(Debug, Clone, Default)]
pub struct SourceText {
    lines: Vec<Line>,
}

impl SourceText {
    pub fn new(source: &str) -> Self {
        let mut state = Lexical::Code;
        let lines = source
            .lines()
            .map(|text| {
                let started_in_block = state == Lexical::Block;
                let started_in_raw = state == Lexical::Raw;
                let trimmed = text.trim();
                let lexed = lex_line(text, &mut state, true);

                let has_comment = started_in_block
                    || lexed.opened_block
                    || (!started_in_raw && trimmed.starts_with("//"));

                let kind = if trimmed.is_empty() && !started_in_raw {
                    LineKind::Blank
                } else if has_comment && lexed.code.trim().is_empty() {
                    LineKind::Comment
                } else if !started_in_raw && trimmed.starts_with('#') {
                    LineKind::Directive
                } else {
                    LineKind::Code
                };

                Line {
                    text: text.to_string(),
                    code: lexed.code,
                    kind,
                    has_comment,
                }
            })
            .collect();
        Self { lines }
    }

    /// Decode lossily; invalid UTF-8 never fails analysis.
    pub fn from_bytes(source: &[u8]) -> Self {
        Self::new(&String::from_utf8_lossy(source))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line by 1-based number.
    pub fn line(&self, number: usize) -> Option<&Line> {
        number.checked_sub(1).and_then(|i| self.lines.get(i))
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Number of comment lines in the whole file.
    pub fn comment_lines(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.has_comment)
            .count()
    }
}

/// Count comment lines: lines wholly inside a block comment, starting with a
/// line comment, or opening a block comment outside a string literal.
pub fn detect_comments<S: AsRef<str>>(lines: &[S]) -> usize {
    let joined = lines
        .iter()
        .map(|l| l.as_ref())
        .collect::<Vec<_>>()
        .join("\n");
    SourceText::new(&joined).comment_lines()
}

/// Inclusive, 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, line: usize) -> bool {
        line >= self.start && line <= self.end
    }
}

/// Metrics computed over a line range of a [`SourceText`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeMetrics {
    pub nloc: usize,
    pub ccn: usize,
    pub cognitive: usize,
    pub max_nesting: usize,
    pub locals: usize,
    pub comment_lines: usize,
}

impl RangeMetrics {
    /// `comment_lines / (nloc + comment_lines)`, 0 for an empty range.
    pub fn comment_density(&self) -> f64 {
        let total = self.nloc + self.comment_lines;
        if total == 0 {
            0.0
        } else {
            self.comment_lines as f64 / total as f64
        }
    }
}

/// Compute size, complexity and nesting over `[start, end]`, skipping lines
/// that fall in any of `excluded`.
pub fn compute_range_metrics(
    text: &SourceText,
    start: usize,
    end: usize,
    excluded: &[LineRange],
) -> RangeMetrics {
    let mut m = RangeMetrics {
        nloc: 0,
        ccn: 1,
        cognitive: 0,
        max_nesting: 0,
        locals: 0,
        comment_lines: 0,
    };

    let start = start.max(1);
    let end = end.min(text.len());
    let mut depth: usize = 0;

    for number in start..=end {
        if excluded.iter().any(|r| r.contains(number)) {
            continue;
        }
        let Some(line) = text.line(number) else {
            break;
        };

        if line.has_comment {
            m.comment_lines += 1;
        }
        if line.kind != LineKind::Code {
            continue;
        }

        m.nloc += 1;
        let code = line.code.as_str();

        let decisions = DECISION.find_iter(code).count();
        let bool_ops = BOOL_OP.find_iter(code).count();
        m.ccn += decisions + bool_ops;

        if is_local_declaration(code) {
            m.locals += 1;
        }

        let opens = code.matches('{').count();
        let closes = code.matches('}').count();
        depth = (depth + opens).saturating_sub(closes);
        m.max_nesting = m.max_nesting.max(depth);

        // Every code line weighs its decisions plus the depth it leaves open.
        m.cognitive += decisions + depth;
    }

    m
}

fn is_local_declaration(code: &str) -> bool {
    let trimmed = code.trim_start();
    code.contains(":=") || trimmed.starts_with("var ") || C_DECLARATION.is_match(trimmed)
}

/// Names of called functions in `code`, without control keywords and
/// size-of style operators.
pub fn extract_call_names(code: &str) -> BTreeSet<String> {
    CALL.captures_iter(code)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|name| !is_control_keyword(name) && !SIZE_OPERATORS.contains(name))
        .map(str::to_string)
        .collect()
}
