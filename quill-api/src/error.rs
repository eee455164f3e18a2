//! API 错误类型
//!
//! 统一三个阶段的致命错误，并提供可序列化的结构化错误报告。

use quill_config::Phase;
use quill_core::{Diagnostic, LexError, ParseError, ResolveError};
use serde::Serialize;
use thiserror::Error;

/// Quill 错误类型
///
/// 只表示让整个单元失败的情况；非致命的拒绝留在 `CompileOutput::diagnostics` 中。
#[derive(Error, Debug, Clone)]
pub enum QuillError {
    /// 词法错误（总是致命）
    #[error("{0}")]
    Lex(#[from] LexError),

    /// 致命解析错误，附带部分句子树
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// 块起始指令的头部无法解析
    #[error("{0}")]
    Resolve(#[from] ResolveError),
}

impl QuillError {
    /// 错误行号（1-based）
    pub fn line(&self) -> usize {
        match self {
            QuillError::Lex(e) => e.line,
            QuillError::Parse(e) => e.line(),
            QuillError::Resolve(e) => e.line,
        }
    }

    /// 错误列号，只有词法错误有
    pub fn column(&self) -> Option<usize> {
        match self {
            QuillError::Lex(e) => Some(e.column),
            _ => None,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            QuillError::Lex(_) => Phase::Tokenizer,
            QuillError::Parse(_) => Phase::Parser,
            QuillError::Resolve(_) => Phase::Resolver,
        }
    }

    /// 稳定的诊断代码
    pub fn code(&self) -> &str {
        match self {
            QuillError::Lex(e) => e.code(),
            QuillError::Parse(e) => e.code(),
            QuillError::Resolve(e) => e.code(),
        }
    }

    /// 失败阶段在停止前记录的全部诊断；词法错误只有它自己
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            QuillError::Lex(e) => vec![e.to_diagnostic()],
            QuillError::Parse(e) => e.diagnostics.clone(),
            QuillError::Resolve(e) => e.diagnostics.clone(),
        }
    }

    /// 转换为结构化错误报告
    ///
    /// CLI 直接打印，编辑器集成之类的场景序列化为 JSON。
    pub fn to_report(&self) -> ErrorReport {
        let message = match self {
            QuillError::Lex(e) => e.message.clone(),
            QuillError::Parse(e) => e.diagnostic.message.clone(),
            QuillError::Resolve(e) => e.message.clone(),
        };

        ErrorReport {
            phase: self.phase(),
            line: self.line(),
            column: self.column(),
            code: self.code().to_string(),
            message,
            diagnostics: self.diagnostics(),
        }
    }
}

/// 结构化错误报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// 失败的阶段
    pub phase: Phase,
    /// 行号（1-based）
    pub line: usize,
    /// 列号（1-based，如果有）
    pub column: Option<usize>,
    /// 稳定的诊断代码，例如 `parse.incomplete-block`
    pub code: String,
    /// 人类可读的错误消息
    pub message: String,
    /// 该阶段的全部诊断
    pub diagnostics: Vec<Diagnostic>,
}

impl std::fmt::Display for ErrorReport {
    /// 默认的 CLI 友好格式
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.column {
            Some(col) => write!(
                f,
                "[{}:{}] {} error {}: {}",
                self.line,
                col,
                self.phase.as_str(),
                self.code,
                self.message
            ),
            None => write!(
                f,
                "[line {}] {} error {}: {}",
                self.line,
                self.phase.as_str(),
                self.code,
                self.message
            ),
        }
    }
}

impl ErrorReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// 简洁格式（适合终端）
    pub fn to_short(&self) -> String {
        format!("{}: {}", self.phase.as_str(), self.message)
    }
}
