//! 诊断记录
//!
//! 每一次拒绝或降级都会产生一条 [`Diagnostic`]，同步交给调用方提供的
//! [`DiagnosticSink`]，同时保存在 [`Diagnostics`] 累加器里。累加器中的列表
//! 才是结果的依据；sink 出错只记一条 warn 日志，不影响解析结果。

mod sink;

pub use sink::{CollectingSink, DiagnosticSink, LoggerSink, NullSink, SinkError, WriterSink};

use quill_log::{warn, Logger};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// 严重程度，按声明顺序递增
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一条诊断：行号、严重程度、稳定的代码串、人读消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        line: usize,
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            line,
            severity,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn fatal(line: usize, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(line, Severity::Fatal, code, message)
    }

    pub fn error(line: usize, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(line, Severity::Error, code, message)
    }

    pub fn warning(line: usize, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(line, Severity::Warning, code, message)
    }

    /// Error 及以上
    pub fn is_blocking(&self) -> bool {
        self.severity >= Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[line {}] {} {}: {}",
            self.line, self.severity, self.code, self.message
        )
    }
}

/// 诊断累加器，贯穿一次 parse 或 resolve 调用
pub struct Diagnostics<'s> {
    records: Vec<Diagnostic>,
    sink: &'s dyn DiagnosticSink,
    logger: Arc<Logger>,
    target: &'static str,
}

impl<'s> Diagnostics<'s> {
    pub fn new(sink: &'s dyn DiagnosticSink, logger: Arc<Logger>, target: &'static str) -> Self {
        Self {
            records: Vec::new(),
            sink,
            logger,
            target,
        }
    }

    /// 记录并同步转发给 sink
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if let Err(err) = self.sink.emit(&diagnostic) {
            warn!(
                self.logger,
                target: self.target,
                "diagnostic sink failed on line {}: {}",
                diagnostic.line,
                err
            );
        }
        self.records.push(diagnostic);
    }

    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Diagnostic> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_fatal(&self) -> bool {
        self.records.iter().any(|d| d.severity == Severity::Fatal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_log::{Level, LogRingBuffer};

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Error < Severity::Fatal);
        assert!(Diagnostic::error(1, "x", "y").is_blocking());
        assert!(!Diagnostic::warning(1, "x", "y").is_blocking());
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::error(4, "parse.arity-mismatch", "`recall` takes exactly one operand");
        assert_eq!(
            d.to_string(),
            "[line 4] error parse.arity-mismatch: `recall` takes exactly one operand"
        );
    }

    #[test]
    fn test_accumulator_forwards_to_sink() {
        let sink = CollectingSink::new();
        let mut diagnostics = Diagnostics::new(&sink, Logger::noop(), "quill::parser");

        diagnostics.push(Diagnostic::error(1, "a", "first"));
        diagnostics.push(Diagnostic::fatal(2, "b", "second"));

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.has_fatal());
        assert_eq!(sink.snapshot(), diagnostics.records().to_vec());
    }

    #[test]
    fn test_sink_failure_does_not_lose_record() {
        let ring = LogRingBuffer::new(8);
        let logger = Logger::new(Level::Warn).with_sink(ring.clone());
        let failing = |_: &Diagnostic| -> Result<(), SinkError> { Err(SinkError::Closed) };
        let mut diagnostics = Diagnostics::new(&failing, logger, "quill::parser");

        diagnostics.push(Diagnostic::error(7, "parse.unknown-lead-token", "bad lead"));

        assert_eq!(diagnostics.len(), 1);
        assert!(ring.contains("diagnostic sink failed on line 7"));
    }
}
