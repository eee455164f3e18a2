//! 句子树
//!
//! 所有节点存放在一个扁平的 arena 里，父子关系用 [`NodeId`] 下标表示。
//! `nodes[0]` 是代表整个源文件的根节点（`BlockStarter`，第 0 行，层级 0）。

use super::argument::Argument;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SentenceMode {
    /// `the NAME is VALUE` 或以字面量开头的句子
    Literal,
    Instruction,
    FlowControl,
    Comment,
    BlockStarter,
}

/// 一个句子
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceNode {
    /// 源码原文（不含缩进与行尾注释）
    pub raw: String,
    pub mode: SentenceMode,
    pub line: usize,
    /// 根为 0，顶层句子为 1，子句总比父节点大
    pub nesting_level: usize,
    /// 句首指令的规范关键字（别名已归一）
    pub lead: Option<String>,
    pub arguments: Vec<Argument>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl SentenceNode {
    pub fn new(raw: impl Into<String>, mode: SentenceMode, line: usize, nesting_level: usize) -> Self {
        Self {
            raw: raw.into(),
            mode,
            line,
            nesting_level,
            lead: None,
            arguments: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn comment(text: impl Into<String>, line: usize, nesting_level: usize) -> Self {
        Self::new(text, SentenceMode::Comment, line, nesting_level)
    }

    pub fn is_comment(&self) -> bool {
        self.mode == SentenceMode::Comment
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceTree {
    nodes: Vec<SentenceNode>,
}

impl SentenceTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![SentenceNode::new("", SentenceMode::BlockStarter, 0, 0)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_node(&self) -> &SentenceNode {
        &self.nodes[0]
    }

    /// 按 ID 取节点；ID 必须来自本树
    pub fn node(&self, id: NodeId) -> &SentenceNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&SentenceNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SentenceNode {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// 追加为 `parent` 的最后一个子节点
    pub fn push_child(&mut self, parent: NodeId, mut node: SentenceNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// 挂在 `parent` 下但不进入其 `children`；用于声明的澄清句，
    /// 通过 [`Argument::Declaration`] 的 `clarification` 引用
    pub fn push_detached(&mut self, parent: NodeId, mut node: SentenceNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        id
    }

    /// 先序遍历的全部句子，不含根和注释
    pub fn sentences(&self) -> Vec<&SentenceNode> {
        let mut out = Vec::new();
        self.collect_preorder(self.root(), &mut out);
        out
    }

    fn collect_preorder<'a>(&'a self, id: NodeId, out: &mut Vec<&'a SentenceNode>) {
        for &child in self.children(id) {
            let node = self.node(child);
            if !node.is_comment() {
                out.push(node);
            }
            self.collect_preorder(child, out);
        }
    }

    /// 节点总数，不含根
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 最深的嵌套层级；空树为 0
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.nesting_level).max().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SentenceNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }
}

impl Default for SentenceTree {
    fn default() -> Self {
        Self::new()
    }
}
