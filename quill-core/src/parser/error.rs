//! 句子拒绝原因与致命解析错误

use super::tree::SentenceTree;
use crate::diagnostic::Diagnostic;

/// 句子被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// 句首既不是指令也不是字面句
    UnknownLeadToken,
    /// 参数个数与操作数形状不符
    ArityMismatch,
    /// 缩进加深但没有可挂靠的父句
    OrphanIndentation,
    /// 块起始指令既没有 `then` 也没有缩进块
    IncompleteBlock,
    /// 流程指令不在要求的块内，或 `else` 前没有 `if`
    InvalidContext,
    /// 括号不配对
    UnbalancedGroup,
    /// 块嵌套超过上限
    NestingTooDeep,
    /// token 流不是按行递增分组的
    CorruptStream,
}

impl RejectReason {
    pub const fn code(&self) -> &'static str {
        match self {
            RejectReason::UnknownLeadToken => "parse.unknown-lead-token",
            RejectReason::ArityMismatch => "parse.arity-mismatch",
            RejectReason::OrphanIndentation => "parse.orphan-indentation",
            RejectReason::IncompleteBlock => "parse.incomplete-block",
            RejectReason::InvalidContext => "parse.invalid-context",
            RejectReason::UnbalancedGroup => "parse.unbalanced-group",
            RejectReason::NestingTooDeep => "parse.nesting-too-deep",
            RejectReason::CorruptStream => "parse.corrupt-stream",
        }
    }
}

/// 单个句子的拒绝
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rejection {
    pub reason: RejectReason,
    pub message: String,
}

impl Rejection {
    pub fn new(reason: RejectReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    pub fn arity(message: impl Into<String>) -> Self {
        Self::new(RejectReason::ArityMismatch, message)
    }

    pub fn into_diagnostic(self, line: usize, fatal: bool) -> Diagnostic {
        if fatal {
            Diagnostic::fatal(line, self.reason.code(), self.message)
        } else {
            Diagnostic::error(line, self.reason.code(), self.message)
        }
    }
}

/// 致命解析错误：携带触发停止的诊断、已构建的部分树和全部诊断
#[derive(Debug, Clone)]
pub struct ParseError {
    pub diagnostic: Diagnostic,
    pub partial: SentenceTree,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    pub fn line(&self) -> usize {
        self.diagnostic.line
    }

    pub fn code(&self) -> &str {
        &self.diagnostic.code
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[line {}] {}: {}",
            self.diagnostic.line, self.diagnostic.code, self.diagnostic.message
        )
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;

    #[test]
    fn test_reject_codes_are_distinct() {
        let reasons = [
            RejectReason::UnknownLeadToken,
            RejectReason::ArityMismatch,
            RejectReason::OrphanIndentation,
            RejectReason::IncompleteBlock,
            RejectReason::InvalidContext,
            RejectReason::UnbalancedGroup,
            RejectReason::NestingTooDeep,
            RejectReason::CorruptStream,
        ];
        let codes: std::collections::HashSet<_> = reasons.iter().map(|r| r.code()).collect();
        assert_eq!(codes.len(), reasons.len());
        assert!(codes.iter().all(|c| c.starts_with("parse.")));
    }

    #[test]
    fn test_rejection_severity() {
        let soft = Rejection::arity("expected one").into_diagnostic(4, false);
        assert_eq!(soft.severity, Severity::Error);
        assert_eq!(soft.code, "parse.arity-mismatch");

        let hard = Rejection::new(RejectReason::IncompleteBlock, "no body").into_diagnostic(9, true);
        assert_eq!(hard.severity, Severity::Fatal);
        assert_eq!(hard.line, 9);
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            diagnostic: Diagnostic::fatal(3, "parse.incomplete-block", "`while` has no body"),
            partial: SentenceTree::new(),
            diagnostics: Vec::new(),
        };
        assert_eq!(err.to_string(), "[line 3] parse.incomplete-block: `while` has no body");
        assert_eq!(err.line(), 3);
    }
}
