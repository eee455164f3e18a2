//! 表达式参数的优先级解析
//!
//! 左结合；操作数顺序与书写顺序一致，从不交换。
//! 前缀负号只能直接作用在数字字面量上。

use super::error::Failure;
use super::operand::{BinaryOp, LiteralValue, ResolvedOperand};
use crate::lexer::{unescape, LiteralKind};
use crate::parser::Argument;

/// 粗粒度的静态类型，只用于字面量层面的检查
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueType {
    Text,
    Number,
    Bool,
    Unknown,
}

impl ValueType {
    /// 类型标注中可检查的类型名；其余名字不做检查
    pub(crate) fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "number" => Some(ValueType::Number),
            "text" | "string" => Some(ValueType::Text),
            "bool" | "boolean" => Some(ValueType::Bool),
            _ => None,
        }
    }

    pub(crate) fn describe(self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Number => "number",
            ValueType::Bool => "boolean",
            ValueType::Unknown => "value",
        }
    }
}

pub(crate) fn infer(operand: &ResolvedOperand) -> ValueType {
    match operand {
        ResolvedOperand::Literal(LiteralValue::Text(_)) => ValueType::Text,
        ResolvedOperand::Literal(LiteralValue::Number(_)) => ValueType::Number,
        ResolvedOperand::Literal(LiteralValue::Bool(_)) => ValueType::Bool,
        ResolvedOperand::BinaryExpr(op, ..) if op.is_arithmetic() => ValueType::Number,
        ResolvedOperand::BinaryExpr(..) => ValueType::Bool,
        ResolvedOperand::NestedDeclaration(_, inner) => infer(inner),
        ResolvedOperand::Identifier(_) | ResolvedOperand::Command(..) => ValueType::Unknown,
    }
}

/// 词素 → 字面量值
pub(crate) fn literal_value(kind: LiteralKind, text: &str) -> Result<LiteralValue, Failure> {
    match kind {
        LiteralKind::Number => text
            .parse::<f64>()
            .map(LiteralValue::Number)
            .map_err(|_| Failure::type_mismatch(format!("`{text}` is not a number"))),
        LiteralKind::String => unescape(text)
            .map(LiteralValue::Text)
            .ok_or_else(|| Failure::type_mismatch(format!("{text} is not a valid string literal"))),
        LiteralKind::Bool => Ok(LiteralValue::Bool(text == "true")),
    }
}

fn check_operands(op: BinaryOp, left: &ResolvedOperand, right: &ResolvedOperand) -> Result<(), Failure> {
    for side in [left, right] {
        let ty = infer(side);
        let rejected = (op.is_arithmetic() && matches!(ty, ValueType::Text | ValueType::Bool))
            || (op.is_logical() && matches!(ty, ValueType::Text | ValueType::Number));
        if rejected {
            return Err(Failure::type_mismatch(format!(
                "`{}` cannot take a {} operand",
                op.symbol(),
                ty.describe()
            )));
        }
    }
    Ok(())
}

/// 解析 `pieces`；项由 `term` 解析
pub(crate) fn resolve_expr<F>(pieces: &[Argument], term: F) -> Result<ResolvedOperand, Failure>
where
    F: FnMut(&Argument) -> Result<ResolvedOperand, Failure>,
{
    let mut parser = ExprParser {
        pieces,
        pos: 0,
        term,
    };
    let operand = parser.expression(0)?;
    match parser.pieces.get(parser.pos) {
        None => Ok(operand),
        Some(extra) => Err(Failure::type_mismatch(format!(
            "unexpected {extra:?} after a complete expression"
        ))),
    }
}

struct ExprParser<'a, F> {
    pieces: &'a [Argument],
    pos: usize,
    term: F,
}

impl<F> ExprParser<'_, F>
where
    F: FnMut(&Argument) -> Result<ResolvedOperand, Failure>,
{
    fn expression(&mut self, min_precedence: u8) -> Result<ResolvedOperand, Failure> {
        let mut left = self.prefix()?;

        while let Some(Argument::Operator(symbol)) = self.pieces.get(self.pos) {
            let op = BinaryOp::from_symbol(symbol)
                .ok_or_else(|| Failure::type_mismatch(format!("`{symbol}` is not a binary operator")))?;
            if op.precedence() < min_precedence {
                break;
            }
            self.pos += 1;

            let right = self.expression(op.precedence() + 1)?;
            check_operands(op, &left, &right)?;
            left = ResolvedOperand::binary(op, left, right);
        }

        Ok(left)
    }

    fn prefix(&mut self) -> Result<ResolvedOperand, Failure> {
        let Some(piece) = self.pieces.get(self.pos) else {
            return Err(Failure::type_mismatch("expression ends with a dangling operator"));
        };
        self.pos += 1;

        match piece {
            Argument::Operator(symbol) if symbol == "-" || symbol == "minus" => {
                match self.pieces.get(self.pos) {
                    Some(Argument::Literal {
                        kind: LiteralKind::Number,
                        text,
                    }) => {
                        self.pos += 1;
                        text.parse::<f64>()
                            .map(|value| ResolvedOperand::number(-value))
                            .map_err(|_| Failure::type_mismatch(format!("`{text}` is not a number")))
                    }
                    _ => Err(Failure::type_mismatch(
                        "prefix minus applies only to a number literal",
                    )),
                }
            }
            Argument::Operator(symbol) => Err(Failure::type_mismatch(format!(
                "operator `{symbol}` is missing its left operand"
            ))),
            other => (self.term)(other),
        }
    }
}
