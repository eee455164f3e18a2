//! Quill Core - 句子式小语言的前端（纯逻辑，无 IO）
//!
//! 数据流：源码行 → [`lexer`] → token 流 → [`parser`] → 句子树 → [`resolver`] → 已解析指令树。
//!
//! - 指令表（[`registry`]）在构造后只读，以引用传入各阶段，可在线程间共享
//! - 配置和 logger 通过参数显式传入，没有全局状态
//! - 解析与操作数解析遵循“尽量继续”：被拒绝的句子记为诊断（[`diagnostic`]），
//!   只有致命情况才返回 `Err`

pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod resolver;

pub use diagnostic::{
    CollectingSink, Diagnostic, DiagnosticSink, Diagnostics, LoggerSink, NullSink, Severity,
    SinkError, WriterSink,
};
pub use lexer::{tokenize, LexError, LexErrorKind, LiteralKind, Token, TokenKind, TokenStream, Tokenizer};
pub use parser::{
    parse, Argument, NodeId, ParseError, Parsed, Parser, RejectReason, SentenceMode, SentenceNode,
    SentenceTree,
};
pub use registry::{
    BlockKind, Category, CommandVerb, DuplicateKeywordError, GrammarWord, InstructionDescriptor,
    InstructionRegistry, OperandKind, OperandShape, VerbClass,
};
pub use resolver::{
    resolve, Annotation, BinaryOp, Import, LiteralValue, Resolution, ResolveError,
    ResolveErrorKind, ResolvedNode, ResolvedOperand, ResolvedTree, Resolver,
};

// Re-export config types from quill-config
pub use quill_config::{FrontendConfig, IndentUnit, LexerConfig, ParserConfig, Phase, ResolverConfig};
