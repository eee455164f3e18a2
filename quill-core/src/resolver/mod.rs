//! 操作数解析
//!
//! 把句子参数解析为带类型、保持书写顺序的 [`ResolvedOperand`] 树，交给下游代码生成。

mod error;
mod expr;
mod operand;
#[allow(clippy::module_inception)]
mod resolver;

pub use error::{ResolveError, ResolveErrorKind};
pub use operand::{BinaryOp, LiteralValue, ResolvedOperand};
pub use resolver::{
    resolve, Annotation, AttachedComment, Import, Resolution, ResolvedNode, ResolvedTree, Resolver,
    DUPLICATE_IMPORT, MALFORMED_METADATA,
};
