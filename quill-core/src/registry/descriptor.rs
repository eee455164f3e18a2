//! 指令描述符及其分类枚举

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// 指令类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Memory,
    Io,
    Logic,
    Control,
    Flow,
    /// 引入其他源文件
    Module,
}

impl Category {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Memory => "Memory",
            Category::Io => "IO",
            Category::Logic => "Logic",
            Category::Control => "Control",
            Category::Flow => "Flow",
            Category::Module => "Module",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 操作数形状，约束参数个数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperandShape {
    /// 不带操作数
    None,
    /// 恰好一个
    Single,
    /// 恰好两个
    Double,
    /// 至少一个
    Variadic,
}

impl OperandShape {
    /// 参数个数是否符合形状
    pub const fn accepts(&self, count: usize) -> bool {
        match self {
            OperandShape::None => count == 0,
            OperandShape::Single => count == 1,
            OperandShape::Double => count == 2,
            OperandShape::Variadic => count >= 1,
        }
    }

    /// 用于诊断消息
    pub const fn describe(&self) -> &'static str {
        match self {
            OperandShape::None => "no operands",
            OperandShape::Single => "exactly one operand",
            OperandShape::Double => "exactly two operands",
            OperandShape::Variadic => "at least one operand",
        }
    }
}

/// 某个位置上的操作数必须是什么
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperandKind {
    /// 名字，并由该指令引入（声明）
    Target,
    /// 名字，必须已经声明过
    Reference,
    /// 任意值表达式
    Value,
    /// 跳转/调用标签，不做声明检查
    Label,
    /// 非空的字符串字面量路径
    Path,
}

/// 动词语义分类，供下游代码生成选择指令形态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VerbClass {
    Assignment,
    Recall,
    Mutation,
    Output,
    Input,
    Control,
    Transfer,
    Import,
}

/// 块的种类：块起始指令打开哪一种，流程指令要求处在哪一种之内
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BlockKind {
    Conditional,
    Alternative,
    Loop,
    Routine,
}

impl BlockKind {
    pub const fn describe(&self) -> &'static str {
        match self {
            BlockKind::Conditional => "a conditional block (`if`)",
            BlockKind::Alternative => "an alternative block (`else`)",
            BlockKind::Loop => "a loop block (`while`)",
            BlockKind::Routine => "a routine block (`define`)",
        }
    }
}

/// 被动式命令动词（`let table be cleared`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommandVerb {
    Clear,
    Reset,
    Remove,
    Sort,
    Reverse,
}

impl CommandVerb {
    /// 对应的过去分词
    pub const fn participle(&self) -> &'static str {
        match self {
            CommandVerb::Clear => "cleared",
            CommandVerb::Reset => "reset",
            CommandVerb::Remove => "removed",
            CommandVerb::Sort => "sorted",
            CommandVerb::Reverse => "reversed",
        }
    }
}

/// 指令表中的一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionDescriptor {
    pub keyword: String,
    pub category: Category,
    pub operand_shape: OperandShape,
    pub aliases: BTreeSet<String>,
    pub description: String,
    pub verb_class: VerbClass,
    /// 块起始指令打开的块
    pub opens: Option<BlockKind>,
    /// 流程指令要求的外层块
    pub requires: Option<BlockKind>,
    /// 按位置的操作数要求；不足时最后一项向后延用
    pub operand_kinds: Vec<OperandKind>,
}

impl InstructionDescriptor {
    pub fn new(keyword: impl Into<String>, category: Category, operand_shape: OperandShape) -> Self {
        Self {
            keyword: keyword.into(),
            category,
            operand_shape,
            aliases: BTreeSet::new(),
            description: String::new(),
            verb_class: VerbClass::Control,
            opens: None,
            requires: None,
            operand_kinds: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.insert(alias.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn verb(mut self, verb_class: VerbClass) -> Self {
        self.verb_class = verb_class;
        self
    }

    pub fn opens(mut self, block: BlockKind) -> Self {
        self.opens = Some(block);
        self
    }

    pub fn requires(mut self, block: BlockKind) -> Self {
        self.requires = Some(block);
        self
    }

    pub fn operands(mut self, kinds: &[OperandKind]) -> Self {
        self.operand_kinds = kinds.to_vec();
        self
    }

    /// 第 `index` 个操作数的要求，未声明时视为 `Value`
    pub fn operand_kind(&self, index: usize) -> OperandKind {
        self.operand_kinds
            .get(index)
            .or_else(|| self.operand_kinds.last())
            .copied()
            .unwrap_or(OperandKind::Value)
    }

    pub fn is_block_opener(&self) -> bool {
        self.opens.is_some()
    }

    /// 关键字本身及所有别名
    pub fn surface_forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.keyword.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_accepts() {
        assert!(OperandShape::None.accepts(0));
        assert!(!OperandShape::None.accepts(1));
        assert!(OperandShape::Single.accepts(1));
        assert!(!OperandShape::Single.accepts(2));
        assert!(OperandShape::Double.accepts(2));
        assert!(OperandShape::Variadic.accepts(5));
        assert!(!OperandShape::Variadic.accepts(0));
    }

    #[test]
    fn test_operand_kind_extends_last() {
        let speak = InstructionDescriptor::new("speak", Category::Io, OperandShape::Variadic)
            .operands(&[OperandKind::Value]);
        assert_eq!(speak.operand_kind(0), OperandKind::Value);
        assert_eq!(speak.operand_kind(3), OperandKind::Value);

        let bare = InstructionDescriptor::new("wait", Category::Control, OperandShape::None);
        assert_eq!(bare.operand_kind(0), OperandKind::Value);
    }

    #[test]
    fn test_surface_forms() {
        let speak = InstructionDescriptor::new("speak", Category::Io, OperandShape::Variadic)
            .alias("say")
            .alias("print");
        let forms: Vec<&str> = speak.surface_forms().collect();
        assert_eq!(forms, vec!["speak", "print", "say"]);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(Category::Io.to_string(), "IO");
        assert_eq!(Category::Flow.as_str(), "Flow");
    }
}
