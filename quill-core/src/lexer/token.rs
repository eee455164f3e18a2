//! Token 定义

use serde::Serialize;

/// 字面量种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LiteralKind {
    String,
    Number,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Literal(LiteralKind),
    Operator,
    Delimiter,
    Comment,
    EndOfLine,
}

/// 一个词法单元
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// 原始词素；字符串字面量包含两端引号和未展开的转义
    pub text: String,
    /// 1-based 行号
    pub line: usize,
    /// 1-based 列号（按字符计，包含缩进）
    pub column: usize,
    /// 缩进层级
    pub indent_level: usize,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        line: usize,
        column: usize,
        indent_level: usize,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
            indent_level,
        }
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }

    pub fn is_delimiter(&self, delimiter: &str) -> bool {
        self.kind == TokenKind::Delimiter && self.text == delimiter
    }

    pub fn is_end_of_line(&self) -> bool {
        self.kind == TokenKind::EndOfLine
    }

    /// 最后一个字符之后的列号
    pub fn end_column(&self) -> usize {
        self.column + self.text.chars().count()
    }
}

/// 一行的元信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineMeta {
    pub line: usize,
    pub indent_level: usize,
    pub is_blank: bool,
    pub is_comment: bool,
}

/// 分词结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub lines: Vec<LineMeta>,
}

impl TokenStream {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

/// 展开字符串字面量的词素（含引号）；词素不合法时返回 `None`
pub fn unescape(lexeme: &str) -> Option<String> {
    let inner = lexeme.strip_prefix('"')?.strip_suffix('"')?;
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next()? {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            '\\' => value.push('\\'),
            '"' => value.push('"'),
            _ => return None,
        }
    }

    Some(value)
}

/// 按列号把同一行的 token 拼回原文（不含缩进）
pub fn reconstruct(tokens: &[Token]) -> String {
    let mut text = String::new();
    let mut cursor: Option<usize> = None;

    for token in tokens.iter().filter(|t| !t.is_end_of_line()) {
        if let Some(end) = cursor {
            let gap = token.column.saturating_sub(end);
            text.extend(std::iter::repeat(' ').take(gap));
        }
        text.push_str(&token.text);
        cursor = Some(token.end_column());
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#""hello world""#).as_deref(), Some("hello world"));
        assert_eq!(unescape(r#""a\nb\t\"c\"\\""#).as_deref(), Some("a\nb\t\"c\"\\"));
        assert_eq!(unescape(r#""bad \q""#), None);
        assert_eq!(unescape("no quotes"), None);
    }

    #[test]
    fn test_reconstruct_keeps_spacing() {
        let tokens = vec![
            Token::new(TokenKind::Keyword, "speak", 1, 5, 1),
            Token::new(TokenKind::Literal(LiteralKind::String), "\"hi  there\"", 1, 11, 1),
            Token::new(TokenKind::Delimiter, ",", 1, 22, 1),
            Token::new(TokenKind::Identifier, "x", 1, 24, 1),
            Token::new(TokenKind::EndOfLine, "", 1, 25, 1),
        ];
        assert_eq!(reconstruct(&tokens), "speak \"hi  there\", x");
    }

    #[test]
    fn test_reconstruct_keeps_adjacent_tokens_together() {
        let tokens = vec![
            Token::new(TokenKind::Keyword, "let", 1, 1, 0),
            Token::new(TokenKind::Identifier, "x", 1, 5, 0),
            Token::new(TokenKind::Keyword, "be", 1, 7, 0),
            Token::new(TokenKind::Delimiter, "(", 1, 9, 0),
            Token::new(TokenKind::Literal(LiteralKind::Number), "1", 1, 10, 0),
            Token::new(TokenKind::Delimiter, ")", 1, 11, 0),
            Token::new(TokenKind::EndOfLine, "", 1, 12, 0),
        ];
        assert_eq!(reconstruct(&tokens), "let x be(1)");
    }

    #[test]
    fn test_token_helpers() {
        let token = Token::new(TokenKind::Keyword, "then", 2, 10, 0);
        assert!(token.is_keyword("then"));
        assert!(!token.is_delimiter("then"));
        assert_eq!(token.end_column(), 14);
    }
}
