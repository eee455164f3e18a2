//! 逐行分词器
//!
//! 每一行独立扫描：先测量缩进，再从左到右切分词素。
//! 空白行被跳过（只记录 [`LineMeta`]），每个非空行以 `EndOfLine` 结束。

use super::error::{LexError, LexErrorKind};
use super::indent::IndentTracker;
use super::token::{LineMeta, LiteralKind, Token, TokenKind, TokenStream};
use crate::registry::InstructionRegistry;
use quill_config::{LexerConfig, Phase};
use quill_log::{debug, trace, Logger};
use std::sync::Arc;

const TARGET: &str = Phase::Tokenizer.target();

/// 单词形式的运算符
pub const WORD_OPERATORS: &[&str] = &[
    "plus", "minus", "times", "over", "modulo", "equals", "exceeds", "below", "and", "or",
];

/// 符号运算符，按长度优先排列
pub const SYMBOL_OPERATORS: &[&str] = &[
    "==", "!=", "<=", ">=", "+", "-", "*", "/", "%", "<", ">", "=",
];

pub const DELIMITERS: &[char] = &['(', ')', ',', '.', ':', ';'];

/// 分词器，只借用指令表
pub struct Tokenizer<'r> {
    registry: &'r InstructionRegistry,
    config: LexerConfig,
    logger: Arc<Logger>,
}

impl<'r> Tokenizer<'r> {
    pub fn new(registry: &'r InstructionRegistry) -> Self {
        Self::with_logger(registry, Logger::noop())
    }

    pub fn with_logger(registry: &'r InstructionRegistry, logger: Arc<Logger>) -> Self {
        Self {
            registry,
            config: LexerConfig::default(),
            logger,
        }
    }

    pub fn with_config(mut self, config: LexerConfig) -> Self {
        self.config = config;
        self
    }

    /// 对整段源码分词
    pub fn tokenize(&self, source: &str) -> Result<TokenStream, LexError> {
        self.tokenize_lines(source.lines())
    }

    /// 对逐行输入分词；行尾的 `\r` 会被去掉
    pub fn tokenize_lines<I, S>(&self, lines: I) -> Result<TokenStream, LexError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let _span = self.logger.enter_span("tokenize");
        let mut tracker = IndentTracker::new(self.config.indent);
        let mut stream = TokenStream::default();

        for (index, raw) in lines.into_iter().enumerate() {
            let line = index + 1;
            let text = raw.as_ref();
            let text = text.strip_suffix('\r').unwrap_or(text);

            let body = text.trim_start_matches(|c: char| c == ' ' || c == '\t');
            if body.trim().is_empty() {
                stream.lines.push(LineMeta {
                    line,
                    indent_level: 0,
                    is_blank: true,
                    is_comment: false,
                });
                continue;
            }

            let prefix = &text[..text.len() - body.len()];
            let is_comment = body.starts_with('#');
            let indent_level = tracker.measure(prefix, line, is_comment).inspect_err(|err| {
                debug!(self.logger, target: TARGET, "Lexical error: {}", err);
            })?;

            let before = stream.tokens.len();
            let mut scanner = LineScanner {
                chars: body.chars().collect(),
                pos: 0,
                line,
                first_column: prefix.chars().count() + 1,
                indent_level,
                tokenizer: self,
            };
            scanner.scan(&mut stream.tokens).inspect_err(|err| {
                debug!(self.logger, target: TARGET, "Lexical error: {}", err);
            })?;

            trace!(
                self.logger,
                target: TARGET,
                "Line {}: indent {}, {} tokens",
                line,
                indent_level,
                stream.tokens.len() - before
            );
            stream.lines.push(LineMeta {
                line,
                indent_level,
                is_blank: false,
                is_comment,
            });
        }

        debug!(
            self.logger,
            target: TARGET,
            "Tokenized {} lines into {} tokens",
            stream.lines.len(),
            stream.tokens.len()
        );
        Ok(stream)
    }

    fn classify_word(&self, word: &str) -> TokenKind {
        if word == "true" || word == "false" {
            TokenKind::Literal(LiteralKind::Bool)
        } else if WORD_OPERATORS.contains(&word) {
            TokenKind::Operator
        } else if self.registry.is_reserved(word) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        }
    }
}

/// 使用默认配置分词
pub fn tokenize(source: &str, registry: &InstructionRegistry) -> Result<TokenStream, LexError> {
    Tokenizer::new(registry).tokenize(source)
}

/// 单行扫描状态
struct LineScanner<'t, 'r> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    first_column: usize,
    indent_level: usize,
    tokenizer: &'t Tokenizer<'r>,
}

impl LineScanner<'_, '_> {
    fn scan(&mut self, out: &mut Vec<Token>) -> Result<(), LexError> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                c if c.is_whitespace() => {
                    self.pos += 1;
                    continue;
                }
                '#' => {
                    self.pos = self.chars.len();
                    let text = self.text_from(start);
                    out.push(self.token(TokenKind::Comment, text.trim_end(), start));
                }
                '"' => {
                    self.scan_string()?;
                    let text = self.text_from(start);
                    out.push(self.token(TokenKind::Literal(LiteralKind::String), text, start));
                }
                c if c.is_ascii_digit() => {
                    self.scan_number()?;
                    let text = self.text_from(start);
                    out.push(self.token(TokenKind::Literal(LiteralKind::Number), text, start));
                }
                c if is_word_start(c) => {
                    self.eat_while(is_word_continue);
                    let text = self.text_from(start);
                    let kind = self.tokenizer.classify_word(&text);
                    out.push(self.token(kind, text, start));
                }
                _ => {
                    let kind = self.scan_symbol(c)?;
                    let text = self.text_from(start);
                    out.push(self.token(kind, text, start));
                }
            }
        }

        let end = self.chars.len();
        out.push(self.token(TokenKind::EndOfLine, "", end));
        Ok(())
    }

    fn scan_string(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 1;

        loop {
            match self.peek() {
                None => return Err(self.error(LexErrorKind::UnterminatedLiteral, start)),
                Some('"') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some('\\') => {
                    let escape_at = self.pos;
                    match self.chars.get(self.pos + 1).copied() {
                        None => return Err(self.error(LexErrorKind::UnterminatedLiteral, start)),
                        Some('n' | 't' | '\\' | '"') => self.pos += 2,
                        Some(other) => {
                            return Err(self.error(
                                LexErrorKind::InvalidEscape(format!("\\{other}")),
                                escape_at,
                            ));
                        }
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn scan_number(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.eat_while(|c| c.is_ascii_digit());

        let fraction_follows = self.peek() == Some('.')
            && self
                .chars
                .get(self.pos + 1)
                .is_some_and(|c| c.is_ascii_digit());
        if fraction_follows {
            self.pos += 1;
            self.eat_while(|c| c.is_ascii_digit());
        }

        if self.peek().is_some_and(is_word_start) {
            self.eat_while(is_word_continue);
            let text = self.text_from(start);
            return Err(self.error(LexErrorKind::InvalidNumber(text), start));
        }
        Ok(())
    }

    fn scan_symbol(&mut self, c: char) -> Result<TokenKind, LexError> {
        if let Some(&next) = self.chars.get(self.pos + 1) {
            let pair: String = [c, next].iter().collect();
            if SYMBOL_OPERATORS.contains(&pair.as_str()) {
                self.pos += 2;
                return Ok(TokenKind::Operator);
            }
        }

        let mut buf = [0u8; 4];
        if SYMBOL_OPERATORS.contains(&&*c.encode_utf8(&mut buf)) {
            self.pos += 1;
            Ok(TokenKind::Operator)
        } else if DELIMITERS.contains(&c) {
            self.pos += 1;
            Ok(TokenKind::Delimiter)
        } else {
            Err(self.error(LexErrorKind::InvalidCharacter(c), self.pos))
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn text_from(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    fn column(&self, index: usize) -> usize {
        self.first_column + index
    }

    fn token(&self, kind: TokenKind, text: impl Into<String>, start: usize) -> Token {
        Token::new(kind, text, self.line, self.column(start), self.indent_level)
    }

    fn error(&self, kind: LexErrorKind, index: usize) -> LexError {
        LexError::at(kind, self.line, self.column(index))
    }
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_word_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_config::IndentUnit;
    use quill_log::{Level, LogRingBuffer};

    fn kinds(stream: &TokenStream) -> Vec<TokenKind> {
        stream.tokens.iter().map(|t| t.kind).collect()
    }

    fn texts(stream: &TokenStream) -> Vec<&str> {
        stream.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_let_sentence() {
        let registry = InstructionRegistry::builtin();
        let stream = tokenize("let x be set to 6", &registry).unwrap();

        assert_eq!(texts(&stream), vec!["let", "x", "be", "set", "to", "6", ""]);
        assert_eq!(
            kinds(&stream),
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Keyword,
                TokenKind::Keyword,
                TokenKind::Keyword,
                TokenKind::Literal(LiteralKind::Number),
                TokenKind::EndOfLine,
            ]
        );
        assert_eq!(stream.tokens[1].column, 5);
        assert!(stream.tokens.iter().all(|t| t.line == 1 && t.indent_level == 0));
    }

    #[test]
    fn test_empty_input() {
        let registry = InstructionRegistry::builtin();
        let stream = tokenize("", &registry).unwrap();
        assert!(stream.is_empty());
        assert!(stream.lines.is_empty());

        let stream = tokenize("\n   \n\t\n", &registry).unwrap();
        assert!(stream.is_empty());
        assert_eq!(stream.lines.len(), 3);
        assert!(stream.lines.iter().all(|l| l.is_blank));
    }

    #[test]
    fn test_quoted_literal_is_atomic() {
        let registry = InstructionRegistry::builtin();
        let stream = tokenize(r#"speak "let x be 5 + 2, then # not a comment""#, &registry).unwrap();

        assert_eq!(stream.len(), 3);
        assert_eq!(stream.tokens[1].kind, TokenKind::Literal(LiteralKind::String));
        assert_eq!(stream.tokens[1].text, r#""let x be 5 + 2, then # not a comment""#);
    }

    #[test]
    fn test_string_escapes() {
        let registry = InstructionRegistry::builtin();
        let stream = tokenize(r#"speak "say \"hi\"\n""#, &registry).unwrap();
        assert_eq!(stream.tokens[1].text, r#""say \"hi\"\n""#);

        let err = tokenize(r#"speak "bad \q""#, &registry).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidEscape("\\q".to_string()));
        assert_eq!(err.column, 12);
    }

    #[test]
    fn test_unterminated_string() {
        let registry = InstructionRegistry::builtin();
        let err = tokenize("speak \"hello\nworld\"", &registry).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedLiteral);
        assert_eq!((err.line, err.column), (1, 7));
    }

    #[test]
    fn test_invalid_number() {
        let registry = InstructionRegistry::builtin();
        let err = tokenize("let x be 6x", &registry).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidNumber("6x".to_string()));
        assert_eq!(err.code(), "lex.invalid-number");
    }

    #[test]
    fn test_decimal_and_trailing_dot() {
        let registry = InstructionRegistry::builtin();
        let stream = tokenize("let pi be 3.14.", &registry).unwrap();
        assert_eq!(texts(&stream), vec!["let", "pi", "be", "3.14", ".", ""]);
        assert_eq!(stream.tokens[4].kind, TokenKind::Delimiter);
    }

    #[test]
    fn test_invalid_character() {
        let registry = InstructionRegistry::builtin();
        let err = tokenize("let x be 5\nspeak x @ y", &registry).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidCharacter('@'));
        assert_eq!((err.line, err.column), (2, 9));
    }

    #[test]
    fn test_operators_longest_match() {
        let registry = InstructionRegistry::builtin();
        let stream = tokenize("if a <= b != c < d then wait", &registry).unwrap();
        let ops: Vec<&str> = stream
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Operator)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(ops, vec!["<=", "!=", "<"]);
    }

    #[test]
    fn test_word_classification() {
        let registry = InstructionRegistry::builtin();
        let stream = tokenize("if x plus y exceeds true then speak Let", &registry).unwrap();
        assert_eq!(
            kinds(&stream),
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Literal(LiteralKind::Bool),
                TokenKind::Keyword,
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::EndOfLine,
            ]
        );
    }

    #[test]
    fn test_comments() {
        let registry = InstructionRegistry::builtin();
        let stream = tokenize("# header\nlet x be 1   # trailing  ", &registry).unwrap();

        assert_eq!(stream.tokens[0].kind, TokenKind::Comment);
        assert_eq!(stream.tokens[0].text, "# header");
        assert!(stream.tokens[1].is_end_of_line());
        assert!(stream.lines[0].is_comment);

        let trailing = &stream.tokens[stream.len() - 2];
        assert_eq!(trailing.kind, TokenKind::Comment);
        assert_eq!(trailing.text, "# trailing");
        assert!(!stream.lines[1].is_comment);
    }

    #[test]
    fn test_indentation_levels() {
        let registry = InstructionRegistry::builtin();
        let source = "while x\n    bless x\n        wait\n\n    curse x";
        let stream = tokenize(source, &registry).unwrap();

        let levels: Vec<usize> = stream
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Keyword)
            .map(|t| t.indent_level)
            .collect();
        assert_eq!(levels, vec![0, 1, 2, 1]);
        assert_eq!(stream.tokens[3].column, 5);
        assert!(stream.lines[3].is_blank);
    }

    #[test]
    fn test_indent_modes() {
        let registry = InstructionRegistry::builtin();

        let tabs = Tokenizer::new(&registry).with_config(LexerConfig {
            indent: IndentUnit::Tabs,
        });
        let stream = tabs.tokenize("while x\n\tbless x").unwrap();
        assert_eq!(stream.tokens[3].indent_level, 1);
        assert!(tabs.tokenize("while x\n    bless x").is_err());

        let detect = Tokenizer::new(&registry).with_config(LexerConfig {
            indent: IndentUnit::Detect,
        });
        let stream = detect.tokenize("while x\n  bless x\n    wait").unwrap();
        assert_eq!(stream.lines[2].indent_level, 2);

        let err = Tokenizer::new(&registry).tokenize("while x\n \tbless x").unwrap_err();
        assert_eq!(err.code(), "lex.inconsistent-indent");
    }

    #[test]
    fn test_crlf_lines() {
        let registry = InstructionRegistry::builtin();
        let tokenizer = Tokenizer::new(&registry);
        let stream = tokenizer
            .tokenize_lines(vec!["let x be 1\r".to_string(), "speak x\r".to_string()])
            .unwrap();
        assert_eq!(stream.tokens.iter().filter(|t| t.is_end_of_line()).count(), 2);
        assert_eq!(stream.tokens[3].text, "1");
    }

    #[test]
    fn test_unicode_identifier_columns() {
        let registry = InstructionRegistry::builtin();
        let stream = tokenize("let café be \"ü\", naïve", &registry).unwrap();
        assert_eq!(stream.tokens[1].text, "café");
        assert_eq!(stream.tokens[3].column, 13);
        assert_eq!(stream.tokens[5].column, 18);
    }

    #[test]
    fn test_tokenizer_logs_to_phase_target() {
        let registry = InstructionRegistry::builtin();
        let ring = LogRingBuffer::new(64);
        let logger = Logger::new(Level::Trace).with_sink(ring.clone());

        Tokenizer::with_logger(&registry, logger)
            .tokenize("let x be 1\nspeak x")
            .unwrap();

        let records = ring.records_for("quill::tokenizer");
        assert!(records.iter().any(|r| r.message.contains("Line 2")));
        assert!(ring.contains("Tokenized 2 lines into 8 tokens"));
    }
}
