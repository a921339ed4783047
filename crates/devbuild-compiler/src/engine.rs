/// Transformation engine
///
/// The pipeline only depends on the `TransformEngine` trait. `RewriteEngine`
/// is the built-in implementation; its plugin set is fixed at compile time.

use std::fmt;

use crate::plugins::PluginList;

/// Output of a successful transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub code: String,
}

/// Rejection reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFailure {
    pub message: String,
    pub stack: String,
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EngineFailure {}

/// A source-to-source transformer configured by a plugin list.
pub trait TransformEngine {
    fn transform(&self, source: &str, plugins: &PluginList) -> Result<Transformed, EngineFailure>;
}

/// Plugins known to [`RewriteEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinPlugin {
    StripBom,
    NormalizeLineEndings,
    TrimTrailingWhitespace,
    CheckDelimiters,
    StripDebuggerStatements,
}

const ALL_PLUGINS: &[BuiltinPlugin] = &[
    BuiltinPlugin::StripBom,
    BuiltinPlugin::NormalizeLineEndings,
    BuiltinPlugin::TrimTrailingWhitespace,
    BuiltinPlugin::CheckDelimiters,
    BuiltinPlugin::StripDebuggerStatements,
];

/// A plugin rejected its input at a source position (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rejection {
    message: String,
    line: usize,
    column: usize,
}

impl BuiltinPlugin {
    pub fn from_id(id: &str) -> Option<Self> {
        ALL_PLUGINS.iter().copied().find(|p| p.id() == id)
    }

    pub fn id(self) -> &'static str {
        match self {
            BuiltinPlugin::StripBom => "strip-bom",
            BuiltinPlugin::NormalizeLineEndings => "normalize-line-endings",
            BuiltinPlugin::TrimTrailingWhitespace => "trim-trailing-whitespace",
            BuiltinPlugin::CheckDelimiters => "check-delimiters",
            BuiltinPlugin::StripDebuggerStatements => "strip-debugger-statements",
        }
    }

    fn apply(self, source: String) -> Result<String, Rejection> {
        match self {
            BuiltinPlugin::StripBom => Ok(match source.strip_prefix('\u{feff}') {
                Some(rest) => rest.to_string(),
                None => source,
            }),
            BuiltinPlugin::NormalizeLineEndings => {
                Ok(source.replace("\r\n", "\n").replace('\r', "\n"))
            }
            BuiltinPlugin::TrimTrailingWhitespace => Ok(map_lines(&source, |line| {
                line.trim_end_matches([' ', '\t'])
            })),
            BuiltinPlugin::StripDebuggerStatements => Ok(map_lines(&source, |line| {
                match line.trim() {
                    "debugger;" | "debugger" => "",
                    _ => line,
                }
            })),
            BuiltinPlugin::CheckDelimiters => {
                check_delimiters(&source)?;
                Ok(source)
            }
        }
    }
}

/// Rewrite each line, keeping line count and terminators.
fn map_lines<'a>(source: &'a str, f: impl Fn(&'a str) -> &'a str) -> String {
    source.split('\n').map(f).collect::<Vec<_>>().join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    LineComment,
    BlockComment,
    Str(char),
    Regex { in_class: bool },
    /// Inside a JSX tag; `depth` counts the elements enclosing it.
    JsxTag { depth: usize, closing: bool },
    /// Between JSX tags, inside `depth` open elements.
    JsxText { depth: usize },
}

/// Keywords after which an expression, and so a regex literal, may start.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "typeof", "case", "in", "of", "delete", "void", "throw", "new", "yield",
    "instanceof", "await", "do", "else",
];

/// The last significant token before the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Punct(char),
    Keyword,
    /// Identifier, literal or closing bracket: an operand ends here.
    Value,
}

impl Prev {
    fn word(word: &str, before: Prev) -> Prev {
        if before != Prev::Punct('.') && EXPRESSION_KEYWORDS.contains(&word) {
            Prev::Keyword
        } else {
            Prev::Value
        }
    }

    /// Whether a `/` or `<` here starts a regex or a JSX element.
    fn expects_operand(self) -> bool {
        match self {
            Prev::Start | Prev::Keyword => true,
            Prev::Punct(c) => "(,=:[!&|?{};+-*%<>~^".contains(c),
            Prev::Value => false,
        }
    }
}

/// An open bracket, and the state to return to when it closes.
struct Open {
    ch: char,
    line: usize,
    column: usize,
    resume: Option<ScanState>,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// State after a JSX element closes.
fn leave_element(depth: usize) -> ScanState {
    if depth == 0 {
        ScanState::Code
    } else {
        ScanState::JsxText { depth }
    }
}

fn unterminated(message: &str, (line, column): (usize, usize)) -> Result<(), Rejection> {
    Err(Rejection {
        message: message.to_string(),
        line,
        column,
    })
}

/// Verify that brackets are balanced outside strings, comments, regexes and JSX text.
fn check_delimiters(source: &str) -> Result<(), Rejection> {
    let mut stack: Vec<Open> = Vec::new();
    let mut state = ScanState::Code;
    let mut state_start = (1, 1);
    let mut jsx_start = (1, 1);
    let mut string_resume = ScanState::Code;
    let mut prev = Prev::Start;
    let mut escaped = false;
    let (mut line, mut column) = (1usize, 0usize);
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }

        match state {
            ScanState::Code => match ch {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    column += 1;
                    state = ScanState::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    column += 1;
                    state = ScanState::BlockComment;
                    state_start = (line, column - 1);
                }
                '/' if prev.expects_operand() => {
                    state = ScanState::Regex { in_class: false };
                    state_start = (line, column);
                }
                '<' if prev.expects_operand()
                    && chars.peek().is_some_and(|&c| c.is_alphabetic() || c == '>') =>
                {
                    state = ScanState::JsxTag {
                        depth: 0,
                        closing: false,
                    };
                    jsx_start = (line, column);
                }
                '\'' | '"' | '`' => {
                    state = ScanState::Str(ch);
                    string_resume = ScanState::Code;
                    state_start = (line, column);
                }
                '(' | '[' | '{' => {
                    stack.push(Open {
                        ch,
                        line,
                        column,
                        resume: None,
                    });
                    prev = Prev::Punct(ch);
                }
                ')' | ']' | '}' => {
                    let expected = match ch {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some(open) if open.ch == expected => {
                            if let Some(resume) = open.resume {
                                state = resume;
                            }
                        }
                        _ => {
                            return Err(Rejection {
                                message: format!("Unexpected token `{ch}`"),
                                line,
                                column,
                            });
                        }
                    }
                    prev = if ch == '}' { Prev::Punct('}') } else { Prev::Value };
                }
                // Postfix increment or decrement: the operand still ends here.
                '+' | '-' if prev == Prev::Value && chars.peek() == Some(&ch) => {
                    chars.next();
                    column += 1;
                }
                c if c.is_whitespace() => {}
                c if c.is_ascii_digit() => {
                    while chars.peek().is_some_and(|&c| is_word_char(c) || c == '.') {
                        chars.next();
                        column += 1;
                    }
                    prev = Prev::Value;
                }
                c if is_word_char(c) => {
                    let mut word = String::from(c);
                    while let Some(&next) = chars.peek() {
                        if !is_word_char(next) {
                            break;
                        }
                        word.push(next);
                        chars.next();
                        column += 1;
                    }
                    prev = Prev::word(&word, prev);
                }
                c => prev = Prev::Punct(c),
            },
            ScanState::LineComment => {
                if ch == '\n' {
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    column += 1;
                    state = ScanState::Code;
                }
            }
            ScanState::Str(quote) => {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == quote {
                    state = string_resume;
                    if state == ScanState::Code {
                        prev = Prev::Value;
                    }
                } else if ch == '\n' && quote != '`' && string_resume == ScanState::Code {
                    return Err(Rejection {
                        message: "Unterminated string constant".to_string(),
                        line: state_start.0,
                        column: state_start.1,
                    });
                }
            }
            ScanState::Regex { in_class } => {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '[' {
                    state = ScanState::Regex { in_class: true };
                } else if ch == ']' && in_class {
                    state = ScanState::Regex { in_class: false };
                } else if ch == '/' && !in_class {
                    state = ScanState::Code;
                    prev = Prev::Value;
                } else if ch == '\n' {
                    return Err(Rejection {
                        message: "Unterminated regular expression".to_string(),
                        line: state_start.0,
                        column: state_start.1,
                    });
                }
            }
            ScanState::JsxTag { depth, closing } => match ch {
                '"' | '\'' => {
                    string_resume = state;
                    state = ScanState::Str(ch);
                    state_start = (line, column);
                }
                '{' => {
                    stack.push(Open {
                        ch,
                        line,
                        column,
                        resume: Some(state),
                    });
                    state = ScanState::Code;
                    prev = Prev::Start;
                }
                '/' if chars.peek() == Some(&'>') => {
                    chars.next();
                    column += 1;
                    state = leave_element(depth);
                    prev = Prev::Value;
                }
                '>' if closing => {
                    state = leave_element(depth);
                    prev = Prev::Value;
                }
                '>' => state = ScanState::JsxText { depth: depth + 1 },
                _ => {}
            },
            ScanState::JsxText { depth } => match ch {
                '<' if chars.peek() == Some(&'/') => {
                    chars.next();
                    column += 1;
                    state = ScanState::JsxTag {
                        depth: depth.saturating_sub(1),
                        closing: true,
                    };
                }
                '<' => {
                    state = ScanState::JsxTag {
                        depth,
                        closing: false,
                    };
                }
                '{' => {
                    stack.push(Open {
                        ch,
                        line,
                        column,
                        resume: Some(state),
                    });
                    state = ScanState::Code;
                    prev = Prev::Start;
                }
                _ => {}
            },
        }
    }

    match state {
        ScanState::Str(_) => return unterminated("Unterminated string constant", state_start),
        ScanState::BlockComment => return unterminated("Unterminated comment", state_start),
        ScanState::Regex { .. } => {
            return unterminated("Unterminated regular expression", state_start);
        }
        ScanState::JsxTag { .. } | ScanState::JsxText { .. } => {
            return unterminated("Unterminated JSX contents", jsx_start);
        }
        ScanState::Code | ScanState::LineComment => {}
    }

    match stack.pop() {
        Some(open) => Err(Rejection {
            message: format!("Unterminated `{}`", open.ch),
            line: open.line,
            column: open.column,
        }),
        None => Ok(()),
    }
}

/// The built-in engine: runs each listed plugin in order over the source.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteEngine;

impl RewriteEngine {
    pub fn new() -> Self {
        Self
    }

    fn resolve_plugins(plugins: &PluginList) -> Result<Vec<BuiltinPlugin>, EngineFailure> {
        plugins
            .iter()
            .map(|id| {
                BuiltinPlugin::from_id(id).ok_or_else(|| {
                    let message = format!("Unknown plugin \"{id}\"");
                    EngineFailure {
                        stack: format!("Error: {message}\n    at resolvePlugins ({plugins})"),
                        message,
                    }
                })
            })
            .collect()
    }
}

impl TransformEngine for RewriteEngine {
    fn transform(&self, source: &str, plugins: &PluginList) -> Result<Transformed, EngineFailure> {
        let passes = Self::resolve_plugins(plugins)?;

        let mut code = source.to_string();
        for pass in passes {
            code = pass.apply(code).map_err(|rejection| {
                let message = format!(
                    "{} ({}:{})",
                    rejection.message, rejection.line, rejection.column
                );
                EngineFailure {
                    stack: format!(
                        "SyntaxError: {message}\n    at {} (<input>:{}:{})",
                        pass.id(),
                        rejection.line,
                        rejection.column
                    ),
                    message,
                }
            })?;
        }

        Ok(Transformed { code })
    }
}
