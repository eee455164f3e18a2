//! 指令表
//!
//! 关键字 → 描述符的只读表，外加固定的语法词表（连接词、冠词、`then`、命令分词）。
//! 分词器用它区分 Keyword/Identifier，解析器用它识别句首意图，
//! 操作数解析器用它校验形状。构造完成后不再修改，可以放心跨线程共享。

mod builtin;
pub mod descriptor;

pub use descriptor::{
    BlockKind, Category, CommandVerb, InstructionDescriptor, OperandKind, OperandShape, VerbClass,
};

use std::collections::HashMap;

/// 非指令的保留词
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarWord {
    /// 参数分隔：be, set, to, is ...
    Connective,
    /// a / an 引出待澄清的声明；the 引出字面句
    Article,
    /// `then`：块起始指令的行内延续
    Continuation,
    /// 命令分词：cleared, reset ...
    Participle(CommandVerb),
}

/// 关键字已存在（包括别名、语法词）
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("keyword `{keyword}` is already registered")]
pub struct DuplicateKeywordError {
    pub keyword: String,
}

#[derive(Debug, Clone)]
pub struct InstructionRegistry {
    descriptors: Vec<InstructionDescriptor>,
    /// 关键字和别名 → descriptors 下标
    index: HashMap<String, usize>,
    grammar: HashMap<&'static str, GrammarWord>,
}

impl InstructionRegistry {
    /// 只含语法词、不含任何指令的空表
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            index: HashMap::new(),
            grammar: builtin::grammar_words().into_iter().collect(),
        }
    }

    /// 内置指令表
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        // 内置表中的关键字互不重复（见测试 test_builtin_forms_are_unique）
        for descriptor in builtin::descriptors() {
            registry.insert(descriptor);
        }
        registry
    }

    /// 注册一条指令；关键字或任一别名已被占用时整条拒绝
    pub fn register(&mut self, descriptor: InstructionDescriptor) -> Result<(), DuplicateKeywordError> {
        for form in descriptor.surface_forms() {
            if self.is_reserved(form) {
                return Err(DuplicateKeywordError {
                    keyword: form.to_string(),
                });
            }
        }

        self.insert(descriptor);
        Ok(())
    }

    fn insert(&mut self, descriptor: InstructionDescriptor) {
        let slot = self.descriptors.len();
        for form in descriptor.surface_forms() {
            self.index.insert(form.to_string(), slot);
        }
        self.descriptors.push(descriptor);
    }

    /// 按关键字或别名查找
    pub fn lookup(&self, keyword: &str) -> Option<&InstructionDescriptor> {
        self.index.get(keyword).map(|&slot| &self.descriptors[slot])
    }

    pub fn grammar_word(&self, word: &str) -> Option<GrammarWord> {
        self.grammar.get(word).copied()
    }

    /// 分词器据此把单词标为 Keyword
    pub fn is_reserved(&self, word: &str) -> bool {
        self.index.contains_key(word) || self.grammar.contains_key(word)
    }

    pub fn command_verb(&self, participle: &str) -> Option<CommandVerb> {
        match self.grammar_word(participle) {
            Some(GrammarWord::Participle(verb)) => Some(verb),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstructionDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for InstructionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
