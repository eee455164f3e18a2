//! 词法错误
//!
//! 词法错误总是让整次 `tokenize` 失败，不返回部分 token 流。

use crate::diagnostic::Diagnostic;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// 字符串没有在行尾之前闭合
    UnterminatedLiteral,
    InvalidCharacter(char),
    /// 数字后紧跟字母或下划线，例如 `6x`
    InvalidNumber(String),
    InvalidEscape(String),
    /// 缩进单位不一致
    InconsistentIndent { expected: String, found: String },
}

impl LexErrorKind {
    /// 稳定的诊断代码
    pub const fn code(&self) -> &'static str {
        match self {
            LexErrorKind::UnterminatedLiteral => "lex.unterminated-literal",
            LexErrorKind::InvalidCharacter(_) => "lex.invalid-character",
            LexErrorKind::InvalidNumber(_) => "lex.invalid-number",
            LexErrorKind::InvalidEscape(_) => "lex.invalid-escape",
            LexErrorKind::InconsistentIndent { .. } => "lex.inconsistent-indent",
        }
    }
}

/// 词法错误，包含结构化信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl LexError {
    /// 在指定位置创建错误
    pub fn at(kind: LexErrorKind, line: usize, column: usize) -> Self {
        let message = Self::format_message(&kind);
        Self {
            kind,
            line,
            column,
            message,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// 对应的致命诊断
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::fatal(self.line, self.code(), self.message.clone())
    }

    fn format_message(kind: &LexErrorKind) -> String {
        match kind {
            LexErrorKind::UnterminatedLiteral => {
                "Unterminated string literal (strings cannot span lines)".to_string()
            }
            LexErrorKind::InvalidCharacter(ch) => format!("Invalid character '{ch}'"),
            LexErrorKind::InvalidNumber(text) => format!("Invalid number format '{text}'"),
            LexErrorKind::InvalidEscape(seq) => format!("Invalid escape sequence '{seq}'"),
            LexErrorKind::InconsistentIndent { expected, found } => {
                format!("Inconsistent indentation: expected {expected}, found {found}")
            }
        }
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for LexError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;

    #[test]
    fn test_lex_error_display() {
        let err = LexError::at(LexErrorKind::InvalidCharacter('@'), 3, 7);
        assert_eq!(err.to_string(), "[3:7] Invalid character '@'");
    }

    #[test]
    fn test_lex_error_codes() {
        assert_eq!(
            LexError::at(LexErrorKind::UnterminatedLiteral, 1, 1).code(),
            "lex.unterminated-literal"
        );
        assert_eq!(
            LexErrorKind::InconsistentIndent {
                expected: "4 spaces".into(),
                found: "tab".into()
            }
            .code(),
            "lex.inconsistent-indent"
        );
    }

    #[test]
    fn test_lex_error_to_diagnostic() {
        let err = LexError::at(LexErrorKind::InvalidEscape("\\q".to_string()), 5, 10);
        let diagnostic = err.to_diagnostic();

        assert_eq!(diagnostic.line, 5);
        assert_eq!(diagnostic.severity, Severity::Fatal);
        assert_eq!(diagnostic.code, "lex.invalid-escape");
        assert!(diagnostic.message.contains("\\q"));
    }
}
