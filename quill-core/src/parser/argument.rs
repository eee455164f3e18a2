//! 句子参数及其收集
//!
//! 参数之间由连接词、逗号或句读分隔；两个相邻的项也会开启新参数。
//! 运算符把前后的项连成一个表达式参数，括号组必须恰好包含一个表达式。
//! 紧贴名字的冒号引出类型标注：`x: number`；与名字隔开的冒号仍是分隔符。

use super::error::{RejectReason, Rejection};
use super::tree::NodeId;
use crate::lexer::{LiteralKind, Token, TokenKind};
use crate::registry::{GrammarWord, InstructionRegistry};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Argument {
    /// 字面量，`text` 为原始词素
    Literal { kind: LiteralKind, text: String },
    Name(String),
    /// 带类型标注的名字，如 `total: number`
    Annotated { name: String, type_name: String },
    Operator(String),
    /// 按书写顺序排列的项与运算符；括号组嵌套为内层 `Expr`
    Expr(Vec<Argument>),
    /// `a number`：等待缩进的 `the number is ...` 澄清
    Declaration {
        article: String,
        name: String,
        clarification: Option<NodeId>,
    },
    /// 命令分词，如 `cleared`
    Verb(String),
}

impl Argument {
    pub fn name(name: impl Into<String>) -> Self {
        Argument::Name(name.into())
    }

    pub fn number(text: impl Into<String>) -> Self {
        Argument::Literal {
            kind: LiteralKind::Number,
            text: text.into(),
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Argument::Operator(_))
    }

    /// 尚未被澄清的声明名
    pub fn pending_declaration(&self) -> Option<&str> {
        match self {
            Argument::Declaration {
                name,
                clarification: None,
                ..
            } => Some(name),
            _ => None,
        }
    }

    /// 按书写顺序列出尚未澄清的声明名，包括表达式内部的
    pub fn pending_declarations(&self) -> Vec<&str> {
        match self {
            Argument::Expr(pieces) => pieces
                .iter()
                .flat_map(Argument::pending_declarations)
                .collect(),
            other => other.pending_declaration().into_iter().collect(),
        }
    }

    /// 把第一个名为 `target` 的未澄清声明绑定到 `child`
    pub fn bind_clarification(&mut self, target: &str, child: NodeId) -> bool {
        match self {
            Argument::Declaration {
                name,
                clarification,
                ..
            } if clarification.is_none() && name.as_str() == target => {
                *clarification = Some(child);
                true
            }
            Argument::Expr(pieces) => pieces
                .iter_mut()
                .any(|piece| piece.bind_clarification(target, child)),
            _ => false,
        }
    }
}

/// 收集一段 token（不含句首词和行尾）中的参数
///
/// 括号组最多嵌套 `max_depth` 层，超出时整句以 `NestingTooDeep` 拒绝。
pub(crate) fn collect_arguments(
    tokens: &[Token],
    registry: &InstructionRegistry,
    max_depth: usize,
) -> Result<Vec<Argument>, Rejection> {
    collect_nested(tokens, registry, max_depth, 0)
}

fn collect_nested(
    tokens: &[Token],
    registry: &InstructionRegistry,
    max_depth: usize,
    depth: usize,
) -> Result<Vec<Argument>, Rejection> {
    let mut collector = Collector::default();
    let mut index = 0;

    while index < tokens.len() {
        let token = &tokens[index];
        index += 1;

        match token.kind {
            TokenKind::Literal(kind) => collector.term(Argument::Literal {
                kind,
                text: token.text.clone(),
            }),
            TokenKind::Identifier => collector.term(Argument::Name(token.text.clone())),
            TokenKind::Operator => collector.pieces.push(Argument::Operator(token.text.clone())),
            TokenKind::Keyword => match registry.grammar_word(&token.text) {
                Some(GrammarWord::Connective) => collector.flush(),
                Some(GrammarWord::Article) if token.text == "the" => {}
                Some(GrammarWord::Article) => {
                    let name = match tokens.get(index) {
                        Some(next) if matches!(next.kind, TokenKind::Identifier | TokenKind::Keyword) => {
                            next.text.clone()
                        }
                        _ => {
                            return Err(Rejection::arity(format!(
                                "expected a name after `{}`",
                                token.text
                            )))
                        }
                    };
                    index += 1;
                    collector.term(Argument::Declaration {
                        article: token.text.clone(),
                        name,
                        clarification: None,
                    });
                }
                Some(GrammarWord::Continuation) => {
                    return Err(Rejection::new(
                        RejectReason::InvalidContext,
                        "`then` may only follow the header of a block opener",
                    ))
                }
                Some(GrammarWord::Participle(_)) => collector.term(Argument::Verb(token.text.clone())),
                None => collector.term(Argument::Name(token.text.clone())),
            },
            TokenKind::Delimiter => match token.text.as_str() {
                "(" => {
                    let close = matching_paren(tokens, index - 1).ok_or_else(|| {
                        Rejection::new(RejectReason::UnbalancedGroup, "unclosed `(`")
                    })?;
                    if depth >= max_depth {
                        return Err(Rejection::new(
                            RejectReason::NestingTooDeep,
                            format!("parenthesized groups nest deeper than the limit of {max_depth}"),
                        ));
                    }
                    let mut inner = collect_nested(&tokens[index..close], registry, max_depth, depth + 1)?;
                    if inner.len() != 1 {
                        return Err(Rejection::arity(format!(
                            "a parenthesized group must hold exactly one expression, found {}",
                            inner.len()
                        )));
                    }
                    collector.term(inner.remove(0));
                    index = close + 1;
                }
                ")" => {
                    return Err(Rejection::new(
                        RejectReason::UnbalancedGroup,
                        "`)` without a matching `(`",
                    ))
                }
                ":" if annotates(tokens, index - 1)
                    && matches!(collector.pieces.last(), Some(Argument::Name(_))) =>
                {
                    let type_name = match tokens.get(index) {
                        Some(next) if next.kind == TokenKind::Identifier => next.text.clone(),
                        _ => {
                            return Err(Rejection::arity(format!(
                                "expected a type name after `{}:`",
                                tokens[index - 2].text
                            )))
                        }
                    };
                    index += 1;
                    if let Some(Argument::Name(name)) = collector.pieces.pop() {
                        collector.pieces.push(Argument::Annotated { name, type_name });
                    }
                }
                _ => collector.flush(),
            },
            TokenKind::Comment | TokenKind::EndOfLine => collector.flush(),
        }
    }

    collector.flush();
    Ok(collector.arguments)
}

/// 位于 `colon` 的冒号是否紧贴在一个标识符之后
fn annotates(tokens: &[Token], colon: usize) -> bool {
    colon
        .checked_sub(1)
        .and_then(|at| tokens.get(at))
        .is_some_and(|name| {
            name.kind == TokenKind::Identifier && name.end_column() == tokens[colon].column
        })
}

fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, token) in tokens[open..].iter().enumerate() {
        if token.is_delimiter("(") {
            depth += 1;
        } else if token.is_delimiter(")") {
            depth -= 1;
            if depth == 0 {
                return Some(open + offset);
            }
        }
    }
    None
}

#[derive(Default)]
struct Collector {
    arguments: Vec<Argument>,
    pieces: Vec<Argument>,
}

impl Collector {
    /// 追加一个项；紧跟在另一个项后面时先结束当前参数
    fn term(&mut self, argument: Argument) {
        if self.pieces.last().is_some_and(|last| !last.is_operator()) {
            self.flush();
        }
        self.pieces.push(argument);
    }

    fn flush(&mut self) {
        match self.pieces.len() {
            0 => {}
            1 => self.arguments.extend(self.pieces.drain(..)),
            _ => {
                let pieces = std::mem::take(&mut self.pieces);
                self.arguments.push(Argument::Expr(pieces));
            }
        }
    }
}
