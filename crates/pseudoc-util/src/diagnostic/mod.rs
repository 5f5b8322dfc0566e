//! Diagnostic reporting.
//!
//! `spec.md` §7 is explicit that a stage stops at its first error: the
//! lexer does not keep scanning past a bad token to collect more, the
//! analyser does not gather every type mismatch in a program before
//! giving up. So `Handler` is a single-slot recorder, not the collecting,
//! many-diagnostics-per-run handler a production compiler would want: at
//! most one `Diagnostic` is ever held at a time, and recording a second
//! one while the first is still set keeps the first.
//!
//! Warnings are the exception — `spec.md` §7 only specifies hard-stop
//! behaviour for errors, so `Handler` keeps a running log of warnings
//! (e.g. unused `DECLARE`s) alongside the single error slot.

use crate::Span;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
        }
    }
}

/// The pipeline stage a diagnostic was raised in, per `spec.md` §7's error
/// taxonomy (`LexError` / `ParseError` / `TypeError` / `RuntimeError`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Lex,
    Parse,
    Sema,
    Runtime,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Lex => write!(f, "LexError"),
            Stage::Parse => write!(f, "ParseError"),
            Stage::Sema => write!(f, "TypeError"),
            Stage::Runtime => write!(f, "RuntimeError"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostic {
    #[serde(skip)]
    pub level: Level,
    pub stage: String,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(level: Level, stage: Stage, message: impl Into<String>, span: Span) -> Self {
        Self { level, stage: stage.to_string(), message: message.into(), span }
    }

    pub fn error(stage: Stage, message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, stage, message, span)
    }

    pub fn warning(stage: Stage, message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, stage, message, span)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.line > 0 {
            write!(f, "{} at line {}: {}", self.stage, self.span.line, self.message)
        } else {
            write!(f, "{}: {}", self.stage, self.message)
        }
    }
}

/// Records at most one error per pipeline run. The first call to
/// `Handler::error` wins; a stage checks `has_error()` after each step and
/// bails out rather than continuing to scan/parse/check past a failure.
#[derive(Debug, Default)]
pub struct Handler {
    error: Option<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error. Does nothing if an error is already recorded —
    /// the first failure in a stage is the one that gets reported.
    pub fn error(&mut self, stage: Stage, message: impl Into<String>, span: Span) {
        if self.error.is_none() {
            self.error = Some(Diagnostic::error(stage, message, span));
        }
    }

    pub fn warning(&mut self, stage: Stage, message: impl Into<String>, span: Span) {
        self.warnings.push(Diagnostic::warning(stage, message, span));
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn take_error(&mut self) -> Option<Diagnostic> {
        self.error.take()
    }

    pub fn error_ref(&self) -> Option<&Diagnostic> {
        self.error.as_ref()
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }
}
