//! 句子解析
//!
//! 句子的状态机：`Start → ReadingLeadIntent → ReadingArguments → {Accepted | Rejected}`。
//! 非致命的拒绝只记诊断并继续；块在输入结束时仍未完成、
//! 嵌套过深或 token 流损坏时返回 [`ParseError`]，附带已构建的部分树。

mod argument;
mod error;
#[allow(clippy::module_inception)]
mod parser;
mod tree;

pub use argument::Argument;
pub use error::{ParseError, RejectReason};
pub use parser::{parse, Parsed, Parser};
pub use tree::{NodeId, SentenceMode, SentenceNode, SentenceTree};
