//! API 类型定义
//!
//! 编译的输入输出类型。

use crate::error::QuillError;
use quill_core::{Diagnostic, ResolvedTree, SentenceTree, TokenStream};
use serde::Serialize;

/// 编译输出：三个阶段的产物，外加按阶段顺序合并的非致命诊断
#[derive(Debug, Clone, Serialize)]
pub struct CompileOutput {
    pub tokens: TokenStream,
    pub tree: SentenceTree,
    pub resolved: ResolvedTree,
    /// 先解析阶段，后操作数解析阶段
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    /// 是否有 Error 及以上的诊断
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_blocking)
    }
}

/// 一个编译单元（通常对应一个源文件）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub name: String,
    pub source: String,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// 单个单元的编译结果
#[derive(Debug)]
pub struct UnitOutcome {
    pub name: String,
    pub result: Result<CompileOutput, QuillError>,
    /// 该单元工作线程的 sink 收到的全部诊断，按发出顺序
    pub diagnostics: Vec<Diagnostic>,
}

impl UnitOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.as_ref().is_ok_and(|output| !output.has_errors())
    }
}
