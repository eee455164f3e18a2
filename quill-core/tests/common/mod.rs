//! 测试辅助工具
//!
//! 提供前端三个阶段的端到端辅助函数

#![allow(dead_code)]

use quill_core::{
    parse, resolve, tokenize, InstructionRegistry, LexError, ParseError, Parsed, ResolveError,
    ResolvedTree, Token, TokenStream,
};

/// 一个示例程序，覆盖所有内置指令类别
pub const SAMPLE_PROGRAM: &str = r#"# counting demo
let count be set to 0
let limit be a number
    the number is 3
make greeting be "hello, world  (twice)"
define shout
    speak greeting, "!"
    return greeting
while count below limit
    if count equals 1 then speak "one"
    otherwise
        speak count
    bless count
store count times 2 into total  # doubled
let total be sorted
walk shout
"#;

pub fn registry() -> InstructionRegistry {
    InstructionRegistry::builtin()
}

pub fn tokens(source: &str) -> TokenStream {
    tokenize(source, &registry()).expect("source should tokenize")
}

pub fn parse_source(source: &str) -> Result<Parsed, ParseError> {
    let registry = registry();
    let stream = tokenize(source, &registry).expect("source should tokenize");
    parse(&stream.tokens, &registry)
}

#[derive(Debug)]
pub enum FrontError {
    Lex(LexError),
    Parse(ParseError),
    Resolve(ResolveError),
}

/// 完整流程：分词 + 解析 + 操作数解析；返回解析阶段的诊断数与结果
pub fn run_front(source: &str) -> Result<(Parsed, ResolvedTree), FrontError> {
    let registry = registry();
    let stream = tokenize(source, &registry).map_err(FrontError::Lex)?;
    let parsed = parse(&stream.tokens, &registry).map_err(FrontError::Parse)?;
    let resolved = resolve(&parsed.tree, &registry).map_err(FrontError::Resolve)?;
    Ok((parsed, resolved))
}

/// 按行号分组，不含 `EndOfLine`
pub fn tokens_by_line(stream: &TokenStream) -> Vec<(usize, Vec<Token>)> {
    let mut grouped: Vec<(usize, Vec<Token>)> = Vec::new();
    for token in stream.tokens.iter().filter(|t| !t.is_end_of_line()) {
        match grouped.last_mut() {
            Some((line, group)) if *line == token.line => group.push(token.clone()),
            _ => grouped.push((token.line, vec![token.clone()])),
        }
    }
    grouped
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
