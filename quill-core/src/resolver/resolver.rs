//! 句子树 → 已解析指令树
//!
//! 按源码顺序遍历，只读输入树。普通节点失败时标记为 `Unresolved` 并继续；
//! 块起始指令的头部失败会让整个解析返回 [`ResolveError`]。
//!
//! `#! key: value` 形式的注释是元数据，挂到下一个节点的 `metadata` 上；
//! `import` 句子收集到 [`ResolvedTree::imports`]，路径只记录不加载。

use super::error::{Failure, ResolveError, ResolveErrorKind};
use super::expr::{infer, literal_value, resolve_expr, ValueType};
use super::operand::{LiteralValue, ResolvedOperand};
use crate::diagnostic::{Diagnostic, DiagnosticSink, Diagnostics, NullSink};
use crate::lexer::LiteralKind;
use crate::parser::{Argument, NodeId, SentenceMode, SentenceNode, SentenceTree};
use crate::registry::{
    Category, CommandVerb, InstructionDescriptor, InstructionRegistry, OperandKind, VerbClass,
};
use quill_config::{Phase, ResolverConfig};
use quill_log::{debug, trace, Logger};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

const TARGET: &str = Phase::Resolver.target();

/// `#!` 开头但不是 `key: value` 的注释
pub const MALFORMED_METADATA: &str = "resolve.malformed-metadata";
/// 同一路径被引入多次
pub const DUPLICATE_IMPORT: &str = "resolve.duplicate-import";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Resolution {
    Resolved(Vec<ResolvedOperand>),
    Unresolved { code: String, message: String },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn operands(&self) -> Option<&[ResolvedOperand]> {
        match self {
            Resolution::Resolved(operands) => Some(operands),
            Resolution::Unresolved { .. } => None,
        }
    }
}

/// 挂到下一个已解析节点上的注释
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachedComment {
    pub line: usize,
    pub text: String,
}

/// `#! key: value` 元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub line: usize,
    pub key: String,
    pub value: String,
}

impl Annotation {
    /// 解析注释文本；不是 `#!` 开头时返回 `None`，格式不对时返回 `Some(Err(..))`
    fn parse(line: usize, text: &str) -> Option<Result<Self, String>> {
        let body = text.strip_prefix("#!")?;
        let parsed = match body.split_once(':') {
            Some((key, value)) if is_metadata_key(key.trim()) => Ok(Annotation {
                line,
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            }),
            _ => Err(format!("metadata `{text}` is not of the form `#! key: value`")),
        };
        Some(parsed)
    }
}

fn is_metadata_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// `import "path"` 句子
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    pub line: usize,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedNode {
    pub line: usize,
    pub raw: String,
    pub mode: SentenceMode,
    pub keyword: Option<String>,
    pub category: Option<Category>,
    pub verb_class: Option<VerbClass>,
    /// 该句声明或赋值的名字
    pub subject: Option<String>,
    /// 主语上的类型标注，如 `let total: number be 0`
    pub type_annotation: Option<String>,
    pub resolution: Resolution,
    /// 紧挨在该句之前的注释
    pub comments: Vec<AttachedComment>,
    /// 紧挨在该句之前的 `#!` 元数据
    pub metadata: Vec<Annotation>,
    pub children: Vec<ResolvedNode>,
}

impl ResolvedNode {
    /// 操作数签名，供日志和汇编前检查：`let [Identifier: x | Literal: 6]`
    pub fn signature(&self) -> String {
        let head = self.keyword.as_deref().unwrap_or("literal");
        let parts: Vec<String> = match &self.resolution {
            Resolution::Resolved(operands) => operands
                .iter()
                .map(|operand| format!("{}: {operand}", operand.kind_name()))
                .collect(),
            Resolution::Unresolved { code, .. } => vec![format!("Unresolved: {code}")],
        };
        format!("{head} [{}]", parts.join(" | "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTree {
    pub nodes: Vec<ResolvedNode>,
    /// 按出现顺序、去重后的引入路径
    pub imports: Vec<Import>,
    /// 之后再没有句子的注释
    pub trailing_comments: Vec<AttachedComment>,
    /// 之后再没有句子的元数据
    pub trailing_metadata: Vec<Annotation>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolvedTree {
    /// 先序遍历全部节点
    pub fn preorder(&self) -> Vec<&ResolvedNode> {
        fn walk<'a>(nodes: &'a [ResolvedNode], out: &mut Vec<&'a ResolvedNode>) {
            for node in nodes {
                out.push(node);
                walk(&node.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    pub fn unresolved_count(&self) -> usize {
        self.preorder()
            .iter()
            .filter(|n| !n.resolution.is_resolved())
            .count()
    }
}

pub struct Resolver<'r> {
    registry: &'r InstructionRegistry,
    config: ResolverConfig,
    logger: Arc<Logger>,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r InstructionRegistry) -> Self {
        Self::with_logger(registry, Logger::noop())
    }

    pub fn with_logger(registry: &'r InstructionRegistry, logger: Arc<Logger>) -> Self {
        Self {
            registry,
            config: ResolverConfig::default(),
            logger,
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn resolve(&self, tree: &SentenceTree) -> Result<ResolvedTree, ResolveError> {
        self.resolve_with_sink(tree, &NullSink)
    }

    pub fn resolve_with_sink(
        &self,
        tree: &SentenceTree,
        sink: &dyn DiagnosticSink,
    ) -> Result<ResolvedTree, ResolveError> {
        let _span = self.logger.enter_span("resolve");
        let mut session = Session {
            resolver: self,
            tree,
            diagnostics: Diagnostics::new(sink, self.logger.clone(), TARGET),
            declared: HashSet::new(),
            imports: Vec::new(),
            pending_comments: Vec::new(),
            pending_metadata: Vec::new(),
        };

        let outcome = session.children(tree.root());
        let trailing_comments = std::mem::take(&mut session.pending_comments);
        let trailing_metadata = std::mem::take(&mut session.pending_metadata);
        let imports = std::mem::take(&mut session.imports);
        let diagnostics = session.diagnostics.into_records();

        match outcome {
            Ok(nodes) => {
                let resolved = ResolvedTree {
                    nodes,
                    imports,
                    trailing_comments,
                    trailing_metadata,
                    diagnostics,
                };
                debug!(
                    self.logger,
                    target: TARGET,
                    "Resolved {} nodes ({} unresolved)",
                    resolved.preorder().len(),
                    resolved.unresolved_count()
                );
                Ok(resolved)
            }
            Err(Halt { kind, line, message }) => {
                debug!(self.logger, target: TARGET, "Resolution halted on line {}: {}", line, message);
                Err(ResolveError {
                    kind,
                    line,
                    message,
                    diagnostics,
                })
            }
        }
    }
}

/// 使用默认配置解析
pub fn resolve(tree: &SentenceTree, registry: &InstructionRegistry) -> Result<ResolvedTree, ResolveError> {
    Resolver::new(registry).resolve(tree)
}

struct Halt {
    kind: ResolveErrorKind,
    line: usize,
    message: String,
}

/// 一个节点的解析结果
struct Outcome {
    operands: Vec<ResolvedOperand>,
    subject: Option<String>,
    type_annotation: Option<String>,
}

impl Outcome {
    fn new(operands: Vec<ResolvedOperand>, subject: Option<String>) -> Self {
        Self {
            operands,
            subject,
            type_annotation: None,
        }
    }
}

struct Session<'a, 'r, 's> {
    resolver: &'a Resolver<'r>,
    tree: &'a SentenceTree,
    diagnostics: Diagnostics<'s>,
    /// 按源码顺序已声明的名字
    declared: HashSet<String>,
    imports: Vec<Import>,
    pending_comments: Vec<AttachedComment>,
    pending_metadata: Vec<Annotation>,
}

impl Session<'_, '_, '_> {
    fn children(&mut self, parent: NodeId) -> Result<Vec<ResolvedNode>, Halt> {
        let tree = self.tree;
        let mut resolved = Vec::new();

        for &id in tree.children(parent) {
            let node = tree.node(id);
            if node.mode == SentenceMode::Comment {
                self.comment(node);
                continue;
            }
            resolved.push(self.node(id)?);
        }

        Ok(resolved)
    }

    fn comment(&mut self, node: &SentenceNode) {
        match Annotation::parse(node.line, &node.raw) {
            Some(Ok(annotation)) => {
                trace!(self.resolver.logger, target: TARGET, "Line {}: metadata `{}`", node.line, annotation.key);
                self.pending_metadata.push(annotation);
            }
            Some(Err(message)) => {
                self.diagnostics
                    .push(Diagnostic::warning(node.line, MALFORMED_METADATA, message));
                self.pending_comments.push(AttachedComment {
                    line: node.line,
                    text: node.raw.clone(),
                });
            }
            None => self.pending_comments.push(AttachedComment {
                line: node.line,
                text: node.raw.clone(),
            }),
        }
    }

    fn node(&mut self, id: NodeId) -> Result<ResolvedNode, Halt> {
        let tree = self.tree;
        let registry = self.resolver.registry;
        let node = tree.node(id);
        let comments = std::mem::take(&mut self.pending_comments);
        let metadata = std::mem::take(&mut self.pending_metadata);
        let descriptor = node.lead.as_deref().and_then(|keyword| registry.lookup(keyword));

        let outcome = match node.mode {
            SentenceMode::Literal => self.literal_sentence(node),
            _ => match descriptor {
                Some(descriptor) => self.instruction(node, descriptor),
                None => Err(Failure::unresolved(format!(
                    "`{}` is not a registered instruction",
                    node.lead.as_deref().unwrap_or_default()
                ))),
            },
        };

        let (resolution, subject, type_annotation) = match outcome {
            Ok(Outcome {
                operands,
                subject,
                type_annotation,
            }) => {
                trace!(self.resolver.logger, target: TARGET, "Line {}: resolved {} operands", node.line, operands.len());
                (Resolution::Resolved(operands), subject, type_annotation)
            }
            Err(failure) if node.mode == SentenceMode::BlockStarter => {
                let diagnostic = Diagnostic::fatal(node.line, failure.kind.code(), failure.message.clone());
                self.diagnostics.push(diagnostic);
                return Err(Halt {
                    kind: failure.kind,
                    line: node.line,
                    message: failure.message,
                });
            }
            Err(failure) => {
                // 失败的句子仍然引入它的目标名，后续引用不再重复报错
                for target in bound_names(node, descriptor) {
                    self.declare(target);
                }
                let code = failure.kind.code();
                self.diagnostics
                    .push(Diagnostic::error(node.line, code, failure.message.clone()));
                let resolution = Resolution::Unresolved {
                    code: code.to_string(),
                    message: failure.message,
                };
                (resolution, None, None)
            }
        };

        let children = if node.mode == SentenceMode::BlockStarter {
            self.children(id)?
        } else {
            Vec::new()
        };

        let resolved = ResolvedNode {
            line: node.line,
            raw: node.raw.clone(),
            mode: node.mode,
            keyword: node.lead.clone(),
            category: descriptor.map(|d| d.category),
            verb_class: descriptor.map(|d| d.verb_class),
            subject,
            type_annotation,
            resolution,
            comments,
            metadata,
            children,
        };
        trace!(self.resolver.logger, target: TARGET, "Line {}: {}", resolved.line, resolved.signature());
        Ok(resolved)
    }

    /// `the NAME is VALUE` 声明 NAME；值必须是字面量
    fn literal_sentence(&mut self, node: &SentenceNode) -> Result<Outcome, Failure> {
        let (subject, value) = match node.arguments.as_slice() {
            [Argument::Name(name), value] => (Some(name.clone()), value),
            [value] => (None, value),
            other => {
                return Err(Failure::type_mismatch(format!(
                    "a literal sentence holds one value, found {}",
                    other.len()
                )))
            }
        };

        let literal = self.literal_only(value)?;
        if let Some(name) = &subject {
            self.declare(name);
        }
        Ok(Outcome::new(vec![literal], subject))
    }

    fn instruction(
        &mut self,
        node: &SentenceNode,
        descriptor: &InstructionDescriptor,
    ) -> Result<Outcome, Failure> {
        let arguments = &node.arguments;
        if !descriptor.operand_shape.accepts(arguments.len()) {
            return Err(Failure::type_mismatch(format!(
                "`{}` takes {}, found {}",
                descriptor.keyword,
                descriptor.operand_shape.describe(),
                arguments.len()
            )));
        }

        if let Some((verb, target)) = self.command(descriptor, arguments) {
            self.declare(&target);
            return Ok(Outcome::new(
                vec![ResolvedOperand::Command(verb, target.clone())],
                Some(target),
            ));
        }

        let mut operands = Vec::with_capacity(arguments.len());
        let mut targets = Vec::new();
        let mut type_annotation = None;
        let mut value_types = Vec::new();
        for (index, argument) in arguments.iter().enumerate() {
            let operand = match descriptor.operand_kind(index) {
                OperandKind::Target => {
                    let name = match argument {
                        Argument::Annotated { name, type_name } => {
                            if targets.is_empty() {
                                type_annotation = Some(type_name.clone());
                            }
                            name.as_str()
                        }
                        other => expect_name(descriptor, index, other)?,
                    };
                    targets.push(name.to_string());
                    ResolvedOperand::identifier(name)
                }
                OperandKind::Reference => {
                    let name = expect_name(descriptor, index, argument)?;
                    self.check_declared(name)?;
                    ResolvedOperand::identifier(name)
                }
                OperandKind::Label => {
                    ResolvedOperand::identifier(expect_name(descriptor, index, argument)?)
                }
                OperandKind::Value => {
                    let operand = self.value(argument)?;
                    value_types.push(infer(&operand));
                    operand
                }
                OperandKind::Path => ResolvedOperand::Literal(import_path(argument)?),
            };
            operands.push(operand);
        }

        if let (Some(type_name), Some(subject)) = (&type_annotation, targets.first()) {
            check_annotation(subject, type_name, &value_types)?;
        }
        if descriptor.verb_class == VerbClass::Import {
            self.record_imports(node.line, &operands);
        }

        // 目标在值之后才生效：`let x be x plus 1` 中右侧的 x 必须早已声明
        for target in &targets {
            self.declare(target);
        }
        Ok(Outcome {
            operands,
            subject: targets.into_iter().next(),
            type_annotation,
        })
    }

    fn record_imports(&mut self, line: usize, operands: &[ResolvedOperand]) {
        for operand in operands {
            let ResolvedOperand::Literal(LiteralValue::Text(path)) = operand else {
                continue;
            };
            if self.imports.iter().any(|import| &import.path == path) {
                self.diagnostics.push(Diagnostic::warning(
                    line,
                    DUPLICATE_IMPORT,
                    format!("`{path}` is already imported"),
                ));
                continue;
            }
            debug!(self.resolver.logger, target: TARGET, "Line {}: import `{}`", line, path);
            self.imports.push(Import {
                line,
                path: path.clone(),
            });
        }
    }

    /// `[name, participle]` 且首位是目标 → 命令
    fn command(
        &self,
        descriptor: &InstructionDescriptor,
        arguments: &[Argument],
    ) -> Option<(CommandVerb, String)> {
        if descriptor.operand_kind(0) != OperandKind::Target {
            return None;
        }
        match arguments {
            [Argument::Name(target), Argument::Verb(participle)] => self
                .resolver
                .registry
                .command_verb(participle)
                .map(|verb| (verb, target.clone())),
            _ => None,
        }
    }

    fn value(&mut self, argument: &Argument) -> Result<ResolvedOperand, Failure> {
        match argument {
            Argument::Literal { kind, text } => literal_value(*kind, text).map(ResolvedOperand::Literal),
            Argument::Name(name) => {
                self.check_declared(name)?;
                Ok(ResolvedOperand::identifier(name.clone()))
            }
            Argument::Expr(pieces) => resolve_expr(pieces, |piece| self.value(piece)),
            Argument::Declaration {
                name,
                clarification,
                ..
            } => {
                let Some(child) = clarification else {
                    return Err(Failure::unresolved(format!(
                        "`a {name}` is never clarified by an indented `the {name} is ...`"
                    )));
                };
                let inner = self.clarification(name, *child)?;
                self.declare(name);
                Ok(ResolvedOperand::NestedDeclaration(name.clone(), Box::new(inner)))
            }
            Argument::Verb(participle) => Err(Failure::type_mismatch(format!(
                "`{participle}` cannot be used as a value"
            ))),
            Argument::Annotated { name, type_name } => Err(Failure::type_mismatch(format!(
                "`{name}: {type_name}` annotates a name the sentence does not declare"
            ))),
            Argument::Operator(symbol) => Err(Failure::type_mismatch(format!(
                "operator `{symbol}` has no operands"
            ))),
        }
    }

    /// 先解析澄清句，再绑定到声明
    fn clarification(&mut self, name: &str, child: NodeId) -> Result<ResolvedOperand, Failure> {
        let tree = self.tree;
        let node = tree.node(child);
        match node.arguments.as_slice() {
            [Argument::Name(subject), value] if subject == name => self.literal_only(value),
            [Argument::Name(subject), _] => Err(Failure {
                kind: ResolveErrorKind::UnknownIdentifier,
                message: format!(
                    "line {} clarifies `{subject}`, but the declaration introduces `{name}`",
                    node.line
                ),
            }),
            _ => Err(Failure::unresolved(format!(
                "line {} does not clarify `{name}`",
                node.line
            ))),
        }
    }

    fn literal_only(&mut self, value: &Argument) -> Result<ResolvedOperand, Failure> {
        match self.value(value)? {
            literal @ ResolvedOperand::Literal(_) => Ok(literal),
            other => Err(Failure::type_mismatch(format!(
                "a literal sentence needs a literal value, found `{other}`"
            ))),
        }
    }

    fn check_declared(&self, name: &str) -> Result<(), Failure> {
        if self.resolver.config.require_declared_names && !self.declared.contains(name) {
            return Err(Failure::unknown_identifier(name));
        }
        Ok(())
    }

    fn declare(&mut self, name: &str) {
        if self.declared.insert(name.to_string()) {
            trace!(self.resolver.logger, target: TARGET, "Declared `{}`", name);
        }
    }
}

/// `import` 的路径：非空字符串字面量
fn import_path(argument: &Argument) -> Result<LiteralValue, Failure> {
    match argument {
        Argument::Literal {
            kind: LiteralKind::String,
            text,
        } => match literal_value(LiteralKind::String, text)? {
            LiteralValue::Text(path) if path.is_empty() => {
                Err(Failure::type_mismatch("an import path cannot be empty"))
            }
            value => Ok(value),
        },
        other => Err(Failure::type_mismatch(format!(
            "an import path must be a quoted string, found {other:?}"
        ))),
    }
}

/// 已知类型名的标注必须与值的静态类型一致
fn check_annotation(subject: &str, type_name: &str, values: &[ValueType]) -> Result<(), Failure> {
    let Some(expected) = ValueType::from_type_name(type_name) else {
        return Ok(());
    };
    match values.iter().find(|ty| **ty != ValueType::Unknown && **ty != expected) {
        Some(found) => Err(Failure::type_mismatch(format!(
            "`{subject}` is annotated as {type_name} but is given a {} value",
            found.describe()
        ))),
        None => Ok(()),
    }
}

/// 句子要绑定的名字：字面句的主语，或指令目标位上的名字
fn bound_names<'a>(
    node: &'a SentenceNode,
    descriptor: Option<&InstructionDescriptor>,
) -> Vec<&'a str> {
    match (node.mode, node.arguments.as_slice(), descriptor) {
        (SentenceMode::Literal, [Argument::Name(name), _], _) => vec![name.as_str()],
        (SentenceMode::Literal, _, _) | (_, _, None) => Vec::new(),
        (_, arguments, Some(descriptor)) => arguments
            .iter()
            .enumerate()
            .filter(|(index, _)| descriptor.operand_kind(*index) == OperandKind::Target)
            .filter_map(|(_, argument)| match argument {
                Argument::Name(name) | Argument::Annotated { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect(),
    }
}

fn expect_name<'a>(
    descriptor: &InstructionDescriptor,
    index: usize,
    argument: &'a Argument,
) -> Result<&'a str, Failure> {
    match argument {
        Argument::Name(name) => Ok(name),
        other => Err(Failure::type_mismatch(format!(
            "`{}` expects a name as operand {}, found {:?}",
            descriptor.keyword,
            index + 1,
            other
        ))),
    }
}
