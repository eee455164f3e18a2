//! 已解析的操作数

use crate::registry::CommandVerb;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Text(text) => write!(f, "{text:?}"),
            LiteralValue::Number(n) => write!(f, "{n}"),
            LiteralValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// 二元运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    /// 单词或符号形式 → 运算符
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "plus" | "+" => BinaryOp::Add,
            "minus" | "-" => BinaryOp::Subtract,
            "times" | "*" => BinaryOp::Multiply,
            "over" | "/" => BinaryOp::Divide,
            "modulo" | "%" => BinaryOp::Modulo,
            "equals" | "==" | "=" => BinaryOp::Equal,
            "!=" => BinaryOp::NotEqual,
            "below" | "<" => BinaryOp::Less,
            "<=" => BinaryOp::LessEqual,
            "exceeds" | ">" => BinaryOp::Greater,
            ">=" => BinaryOp::GreaterEqual,
            "and" => BinaryOp::And,
            "or" => BinaryOp::Or,
            _ => return None,
        };
        Some(op)
    }

    /// 绑定强度，数值越大越紧
    pub const fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual => 3,
            BinaryOp::Add | BinaryOp::Subtract => 4,
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 5,
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    pub const fn is_arithmetic(&self) -> bool {
        self.precedence() >= 4
    }

    pub const fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// 操作数表达式，保持源码书写顺序
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResolvedOperand {
    Literal(LiteralValue),
    Identifier(String),
    BinaryExpr(BinaryOp, Box<ResolvedOperand>, Box<ResolvedOperand>),
    /// `a number` + `the number is 5`
    NestedDeclaration(String, Box<ResolvedOperand>),
    /// `let table be cleared`
    Command(CommandVerb, String),
}

impl ResolvedOperand {
    pub fn number(value: f64) -> Self {
        ResolvedOperand::Literal(LiteralValue::Number(value))
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        ResolvedOperand::Identifier(name.into())
    }

    pub fn binary(op: BinaryOp, left: ResolvedOperand, right: ResolvedOperand) -> Self {
        ResolvedOperand::BinaryExpr(op, Box::new(left), Box::new(right))
    }

    /// 签名里使用的种类名
    pub const fn kind_name(&self) -> &'static str {
        match self {
            ResolvedOperand::Literal(_) => "Literal",
            ResolvedOperand::Identifier(_) => "Identifier",
            ResolvedOperand::BinaryExpr(..) => "Expression",
            ResolvedOperand::NestedDeclaration(..) => "Declaration",
            ResolvedOperand::Command(..) => "Command",
        }
    }
}

impl fmt::Display for ResolvedOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedOperand::Literal(value) => write!(f, "{value}"),
            ResolvedOperand::Identifier(name) => f.write_str(name),
            ResolvedOperand::BinaryExpr(op, left, right) => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            ResolvedOperand::NestedDeclaration(name, inner) => write!(f, "{name}: {inner}"),
            ResolvedOperand::Command(verb, target) => write!(f, "{:?}({target})", verb),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_and_symbol_forms_agree() {
        assert_eq!(BinaryOp::from_symbol("plus"), BinaryOp::from_symbol("+"));
        assert_eq!(BinaryOp::from_symbol("exceeds"), Some(BinaryOp::Greater));
        assert_eq!(BinaryOp::from_symbol("below"), Some(BinaryOp::Less));
        assert_eq!(BinaryOp::from_symbol("then"), None);
    }

    #[test]
    fn test_precedence_table() {
        assert!(BinaryOp::Or.precedence() < BinaryOp::And.precedence());
        assert!(BinaryOp::And.precedence() < BinaryOp::Equal.precedence());
        assert!(BinaryOp::Equal.precedence() < BinaryOp::Add.precedence());
        assert!(BinaryOp::Add.precedence() < BinaryOp::Multiply.precedence());
        assert!(BinaryOp::Modulo.is_arithmetic());
        assert!(!BinaryOp::Less.is_arithmetic());
    }

    #[test]
    fn test_display() {
        let expr = ResolvedOperand::binary(
            BinaryOp::Add,
            ResolvedOperand::identifier("x"),
            ResolvedOperand::binary(BinaryOp::Multiply, ResolvedOperand::number(2.0), ResolvedOperand::identifier("y")),
        );
        assert_eq!(expr.to_string(), "(x + (2 * y))");
        assert_eq!(
            ResolvedOperand::Command(CommandVerb::Clear, "table".into()).to_string(),
            "Clear(table)"
        );
    }
}
