//! 操作数解析错误

use crate::diagnostic::Diagnostic;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResolveErrorKind {
    /// 操作数的形状或类型不符
    TypeMismatch,
    /// 引用了尚未声明的名字
    UnknownIdentifier,
    /// 无法得出结果，例如声明没有澄清句
    Unresolved,
}

impl ResolveErrorKind {
    pub const fn code(&self) -> &'static str {
        match self {
            ResolveErrorKind::TypeMismatch => "resolve.type-mismatch",
            ResolveErrorKind::UnknownIdentifier => "resolve.unknown-identifier",
            ResolveErrorKind::Unresolved => "resolve.unresolved",
        }
    }
}

/// 单个节点的解析失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Failure {
    pub kind: ResolveErrorKind,
    pub message: String,
}

impl Failure {
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self {
            kind: ResolveErrorKind::TypeMismatch,
            message: message.into(),
        }
    }

    pub fn unknown_identifier(name: &str) -> Self {
        Self {
            kind: ResolveErrorKind::UnknownIdentifier,
            message: format!("`{name}` is used before it is declared"),
        }
    }

    pub fn unresolved(message: impl Into<String>) -> Self {
        Self {
            kind: ResolveErrorKind::Unresolved,
            message: message.into(),
        }
    }
}

/// 块起始指令的头部无法解析时返回的硬错误
#[derive(Debug, Clone)]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub line: usize,
    pub message: String,
    /// 截至失败时的全部诊断（含本错误）
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolveError {
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[line {}] {}: {}", self.line, self.code(), self.message)
    }
}

impl std::error::Error for ResolveError {}
