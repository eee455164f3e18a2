//! 行驱动的句子解析器
//!
//! token 流先按 `EndOfLine` 切成物理行，再逐行决定挂载位置：
//! 块起始指令先挂起，等看到下一行才知道它有没有缩进块；
//! 比当前块更深的行只可能是声明的澄清句，否则就是孤立缩进。
//! 被拒绝的句子记一条诊断，连同它更深的行一起跳过。

use super::argument::{collect_arguments, Argument};
use super::error::{ParseError, RejectReason, Rejection};
use super::tree::{NodeId, SentenceMode, SentenceNode, SentenceTree};
use crate::diagnostic::{Diagnostic, DiagnosticSink, Diagnostics, NullSink};
use crate::lexer::{reconstruct, Token, TokenKind};
use crate::registry::{
    BlockKind, Category, GrammarWord, InstructionDescriptor, InstructionRegistry, VerbClass,
};
use quill_config::{ParserConfig, Phase};
use quill_log::{debug, trace, Logger};
use std::sync::Arc;

const TARGET: &str = Phase::Parser.target();

/// 解析成功的结果；`diagnostics` 中可能有非致命的拒绝
#[derive(Debug, Clone)]
pub struct Parsed {
    pub tree: SentenceTree,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_blocking)
    }
}

pub struct Parser<'r> {
    registry: &'r InstructionRegistry,
    config: ParserConfig,
    logger: Arc<Logger>,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r InstructionRegistry) -> Self {
        Self::with_logger(registry, Logger::noop())
    }

    pub fn with_logger(registry: &'r InstructionRegistry, logger: Arc<Logger>) -> Self {
        Self {
            registry,
            config: ParserConfig::default(),
            logger,
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn parse(&self, tokens: &[Token]) -> Result<Parsed, ParseError> {
        self.parse_with_sink(tokens, &NullSink)
    }

    /// 解析并把每条诊断同步送往 `sink`
    pub fn parse_with_sink(
        &self,
        tokens: &[Token],
        sink: &dyn DiagnosticSink,
    ) -> Result<Parsed, ParseError> {
        let _span = self.logger.enter_span("parse");
        let mut session = Session::new(self, sink);
        let outcome = session.run(tokens);
        let tree = session.tree;
        let diagnostics = session.diagnostics.into_records();

        match outcome {
            Ok(()) => {
                debug!(
                    self.logger,
                    target: TARGET,
                    "Parsed {} sentences with {} diagnostics",
                    tree.sentences().len(),
                    diagnostics.len()
                );
                Ok(Parsed { tree, diagnostics })
            }
            Err(Halt(diagnostic)) => {
                debug!(self.logger, target: TARGET, "Parse halted: {}", diagnostic);
                Err(ParseError {
                    diagnostic,
                    partial: tree,
                    diagnostics,
                })
            }
        }
    }
}

/// 使用默认配置解析
pub fn parse(tokens: &[Token], registry: &InstructionRegistry) -> Result<Parsed, ParseError> {
    Parser::new(registry).parse(tokens)
}

/// 致命停止
struct Halt(Diagnostic);

/// 一个物理行
struct SourceLine<'t> {
    number: usize,
    indent: usize,
    /// 不含行尾注释和 `EndOfLine`
    code: &'t [Token],
    comment: Option<&'t Token>,
}

fn split_lines(tokens: &[Token]) -> Result<Vec<SourceLine<'_>>, Diagnostic> {
    let corrupt = |line: usize, message: String| {
        Diagnostic::fatal(line, RejectReason::CorruptStream.code(), message)
    };

    let mut lines = Vec::new();
    let mut previous_line = 0;

    for group in tokens.split_inclusive(Token::is_end_of_line) {
        let Some(first) = group.first() else { continue };
        let body = match group.last() {
            Some(last) if last.is_end_of_line() => &group[..group.len() - 1],
            _ => group,
        };

        if let Some(stray) = group
            .iter()
            .find(|t| t.line != first.line || t.indent_level != first.indent_level)
        {
            return Err(corrupt(
                stray.line,
                format!(
                    "token `{}` on line {} is grouped with line {}",
                    stray.text, stray.line, first.line
                ),
            ));
        }
        if first.line <= previous_line {
            return Err(corrupt(
                first.line,
                format!("line {} follows line {}", first.line, previous_line),
            ));
        }
        previous_line = first.line;

        let (code, comment) = match body.split_last() {
            Some((last, rest)) if last.kind == TokenKind::Comment => (rest, Some(last)),
            _ => (body, None),
        };
        if let Some(misplaced) = code.iter().find(|t| t.kind == TokenKind::Comment) {
            return Err(corrupt(
                misplaced.line,
                "comment token in the middle of a line".to_string(),
            ));
        }
        if code.is_empty() && comment.is_none() {
            continue;
        }

        lines.push(SourceLine {
            number: first.line,
            indent: first.indent_level,
            code,
            comment,
        });
    }

    Ok(lines)
}

/// 读取一个句子后的结果，挂载时才确定层级
struct Sentence {
    node: SentenceNode,
    opens: Option<BlockKind>,
    inline: Option<Box<Sentence>>,
}

/// 句子所处的上下文
struct Context {
    blocks: Vec<BlockKind>,
    /// 同层上一个兄弟句打开的块
    previous: Option<BlockKind>,
}

enum Lead<'d> {
    Instruction(&'d InstructionDescriptor),
    Literal,
}

enum SentenceState<'d> {
    Start,
    ReadingLeadIntent(Lead<'d>),
    ReadingArguments(Lead<'d>),
    Accepted(Sentence),
    Rejected(Rejection),
}

impl SentenceState<'_> {
    fn name(&self) -> &'static str {
        match self {
            SentenceState::Start => "Start",
            SentenceState::ReadingLeadIntent(_) => "ReadingLeadIntent",
            SentenceState::ReadingArguments(_) => "ReadingArguments",
            SentenceState::Accepted(_) => "Accepted",
            SentenceState::Rejected(_) => "Rejected",
        }
    }
}

struct Frame {
    node: NodeId,
    /// 块体各行的缩进
    indent: usize,
    block: Option<BlockKind>,
    /// 最近挂入的兄弟句打开的块，用于检查 `else`
    last_opened: Option<BlockKind>,
}

struct PendingOpener {
    frame: usize,
    sentence: Sentence,
    indent: usize,
    line: usize,
    comments: Vec<PendingComment>,
}

struct PendingComment {
    text: String,
    line: usize,
    indent: usize,
}

#[derive(Clone, Copy)]
struct LastSentence {
    id: NodeId,
    indent: usize,
}

struct Session<'p, 'r, 's> {
    parser: &'p Parser<'r>,
    tree: SentenceTree,
    diagnostics: Diagnostics<'s>,
    frames: Vec<Frame>,
    pending_opener: Option<PendingOpener>,
    pending_comments: Vec<PendingComment>,
    last_sentence: Option<LastSentence>,
    /// 刚打开的块，其头部仍有待澄清的声明
    header_owner: Option<NodeId>,
    skip_deeper_than: Option<usize>,
}

impl<'p, 'r, 's> Session<'p, 'r, 's> {
    fn new(parser: &'p Parser<'r>, sink: &'s dyn DiagnosticSink) -> Self {
        let tree = SentenceTree::new();
        let root = Frame {
            node: tree.root(),
            indent: 0,
            block: None,
            last_opened: None,
        };
        Self {
            parser,
            tree,
            diagnostics: Diagnostics::new(sink, parser.logger.clone(), TARGET),
            frames: vec![root],
            pending_opener: None,
            pending_comments: Vec::new(),
            last_sentence: None,
            header_owner: None,
            skip_deeper_than: None,
        }
    }

    fn run(&mut self, tokens: &[Token]) -> Result<(), Halt> {
        let lines = match split_lines(tokens) {
            Ok(lines) => lines,
            Err(diagnostic) => return Err(self.halt(diagnostic)),
        };

        for line in &lines {
            self.line(line)?;
        }
        self.end_of_input()
    }

    fn line(&mut self, line: &SourceLine<'_>) -> Result<(), Halt> {
        if let Some(limit) = self.skip_deeper_than {
            if line.indent > limit {
                trace!(self.parser.logger, target: TARGET, "Skipping line {} under a rejected sentence", line.number);
                return Ok(());
            }
            self.skip_deeper_than = None;
        }

        if line.code.is_empty() {
            if let Some(comment) = line.comment {
                self.buffer_comment(comment, line.indent);
            }
            return Ok(());
        }

        if let Some(pending) = self.pending_opener.take() {
            self.settle_opener(pending, Some(line))?;
        }

        while self.frames.len() > 1 && line.indent < self.top().indent {
            self.frames.pop();
        }
        if line.indent > self.top().indent {
            return self.deeper_line(line);
        }
        if self.header_line(line) {
            return Ok(());
        }

        self.sentence_line(line)
    }

    fn sentence_line(&mut self, line: &SourceLine<'_>) -> Result<(), Halt> {
        let frame = self.frames.len() - 1;
        let context = Context {
            blocks: self.frames.iter().filter_map(|f| f.block).collect(),
            previous: self.top().last_opened,
        };

        let sentence = match self.read_sentence(line.code, line.number, &context) {
            Ok(sentence) => sentence,
            Err(rejection) => {
                if let Some(comment) = line.comment {
                    self.buffer_comment(comment, line.indent);
                }
                // 被拒绝的 `if` 仍然占住位置，后面的 `else` 不再重复报错
                self.frames[frame].last_opened = self.lead_opens(line.code);
                return self.reject(line.number, line.indent, rejection);
            }
        };

        let mut comments = std::mem::take(&mut self.pending_comments);
        if let Some(comment) = line.comment {
            comments.push(PendingComment {
                text: comment.text.clone(),
                line: comment.line,
                indent: line.indent,
            });
        }

        if sentence.opens.is_some() {
            self.last_sentence = None;
            self.pending_opener = Some(PendingOpener {
                frame,
                sentence,
                indent: line.indent,
                line: line.number,
                comments,
            });
        } else {
            let id = self.attach(frame, sentence, comments);
            self.last_sentence = Some(LastSentence {
                id,
                indent: line.indent,
            });
        }
        Ok(())
    }

    /// 决定挂起的块起始指令：有缩进块则入栈，有行内子句则直接挂载，否则拒绝
    fn settle_opener(
        &mut self,
        pending: PendingOpener,
        next: Option<&SourceLine<'_>>,
    ) -> Result<(), Halt> {
        let body_indent = next.map(|l| l.indent).filter(|&indent| indent > pending.indent);

        if let Some(indent) = body_indent {
            if self.frames.len() > self.parser.config.max_nesting_depth {
                let diagnostic = Rejection::new(
                    RejectReason::NestingTooDeep,
                    format!(
                        "blocks nest deeper than the limit of {}",
                        self.parser.config.max_nesting_depth
                    ),
                )
                .into_diagnostic(pending.line, true);
                return Err(self.halt(diagnostic));
            }

            let block = pending.sentence.opens;
            let inline_opened = pending.sentence.inline.as_ref().and_then(|s| s.opens);
            let awaits_clarification = pending
                .sentence
                .node
                .arguments
                .iter()
                .any(|arg| !arg.pending_declarations().is_empty());
            let id = self.attach(pending.frame, pending.sentence, pending.comments);
            self.header_owner = awaits_clarification.then_some(id);
            self.frames.push(Frame {
                node: id,
                indent,
                block,
                last_opened: inline_opened,
            });
            trace!(self.parser.logger, target: TARGET, "Opened block at line {} (depth {})", pending.line, self.frames.len() - 1);
            return Ok(());
        }

        if pending.sentence.inline.is_some() {
            self.attach(pending.frame, pending.sentence, pending.comments);
            return Ok(());
        }

        let keyword = pending.sentence.node.lead.clone().unwrap_or_default();
        let rejection = Rejection::new(
            RejectReason::IncompleteBlock,
            format!("`{keyword}` needs an indented block or an inline `then`"),
        );
        let mut comments = pending.comments;
        comments.append(&mut self.pending_comments);
        self.pending_comments = comments;
        self.frames[pending.frame].last_opened = pending.sentence.opens;

        if next.is_none() {
            let diagnostic = rejection.into_diagnostic(pending.line, true);
            return Err(self.halt(diagnostic));
        }
        self.reject(pending.line, pending.indent, rejection)?;
        // 下一行不比它深，没有需要跳过的块体
        self.skip_deeper_than = None;
        Ok(())
    }

    /// 块体开头的 `the NAME is VALUE` 行澄清块头部的声明，而不是成为块体句子
    fn header_line(&mut self, line: &SourceLine<'_>) -> bool {
        let Some(owner) = self.header_owner.take() else {
            return false;
        };
        if self.top().node != owner {
            return false;
        }
        let last = LastSentence {
            id: owner,
            indent: line.indent,
        };
        if !self.clarify(last, line) {
            return false;
        }
        if let Some(comment) = line.comment {
            self.buffer_comment(comment, line.indent);
        }
        self.header_owner = Some(owner);
        true
    }

    /// 比当前块更深的行：澄清句，或者孤立缩进
    fn deeper_line(&mut self, line: &SourceLine<'_>) -> Result<(), Halt> {
        let candidate = self
            .last_sentence
            .filter(|last| line.indent == last.indent + 1);

        if let Some(last) = candidate {
            if self.clarify(last, line) {
                if let Some(comment) = line.comment {
                    self.buffer_comment(comment, line.indent);
                }
                return Ok(());
            }
        }

        if let Some(comment) = line.comment {
            self.buffer_comment(comment, line.indent);
        }
        self.reject(
            line.number,
            line.indent,
            Rejection::new(
                RejectReason::OrphanIndentation,
                "line is indented deeper than its enclosing block without a sentence to belong to",
            ),
        )
    }

    /// 用 `the NAME is VALUE` 填充上一句中尚未澄清的声明
    fn clarify(&mut self, last: LastSentence, line: &SourceLine<'_>) -> bool {
        let starts_with_the = line.code.first().is_some_and(|t| t.is_keyword("the"));
        if !starts_with_the {
            return false;
        }
        let Ok(arguments) = self.read_literal(line.code) else {
            return false;
        };
        let subject = match arguments.first() {
            Some(Argument::Name(name)) => name.clone(),
            _ => return false,
        };

        let owner = self.tree.node(last.id);
        let pending: Vec<&str> = owner
            .arguments
            .iter()
            .flat_map(Argument::pending_declarations)
            .collect();
        let Some(target) = pending
            .iter()
            .find(|name| **name == subject)
            .or_else(|| pending.first())
            .map(|name| name.to_string())
        else {
            return false;
        };

        let level = owner.nesting_level + 1;
        let mut node = SentenceNode::new(reconstruct(line.code), SentenceMode::Literal, line.number, level);
        node.arguments = arguments;
        let child = self.tree.push_detached(last.id, node);

        for argument in &mut self.tree.node_mut(last.id).arguments {
            if argument.bind_clarification(&target, child) {
                break;
            }
        }
        trace!(self.parser.logger, target: TARGET, "Line {} clarifies `{}` on line {}", line.number, subject, self.tree.node(last.id).line);
        true
    }

    fn end_of_input(&mut self) -> Result<(), Halt> {
        if let Some(pending) = self.pending_opener.take() {
            self.settle_opener(pending, None)?;
        }

        for comment in std::mem::take(&mut self.pending_comments) {
            let frame = self
                .frames
                .iter()
                .rposition(|f| f.indent <= comment.indent)
                .unwrap_or(0);
            self.push_comment(self.frames[frame].node, comment);
        }
        Ok(())
    }

    fn read_sentence(
        &self,
        tokens: &[Token],
        line: usize,
        context: &Context,
    ) -> Result<Sentence, Rejection> {
        let mut state = SentenceState::Start;

        loop {
            let next = match state {
                SentenceState::Start => match self.classify_lead(tokens) {
                    Ok(lead) => SentenceState::ReadingLeadIntent(lead),
                    Err(rejection) => SentenceState::Rejected(rejection),
                },
                SentenceState::ReadingLeadIntent(lead) => match check_context(&lead, context) {
                    Ok(()) => SentenceState::ReadingArguments(lead),
                    Err(rejection) => SentenceState::Rejected(rejection),
                },
                SentenceState::ReadingArguments(lead) => {
                    match self.read_arguments(lead, tokens, line, context) {
                        Ok(sentence) => SentenceState::Accepted(sentence),
                        Err(rejection) => SentenceState::Rejected(rejection),
                    }
                }
                SentenceState::Accepted(sentence) => return Ok(sentence),
                SentenceState::Rejected(rejection) => return Err(rejection),
            };
            trace!(self.parser.logger, target: TARGET, "Line {}: -> {}", line, next.name());
            state = next;
        }
    }

    fn lead_opens(&self, tokens: &[Token]) -> Option<BlockKind> {
        match self.classify_lead(tokens) {
            Ok(Lead::Instruction(descriptor)) => descriptor.opens,
            _ => None,
        }
    }

    fn classify_lead(&self, tokens: &[Token]) -> Result<Lead<'r>, Rejection> {
        let Some(first) = tokens.first() else {
            return Err(Rejection::new(RejectReason::UnknownLeadToken, "empty sentence"));
        };

        match first.kind {
            TokenKind::Keyword | TokenKind::Identifier => {
                if let Some(descriptor) = self.parser.registry.lookup(&first.text) {
                    return Ok(Lead::Instruction(descriptor));
                }
                if first.is_keyword("the") {
                    return Ok(Lead::Literal);
                }
            }
            TokenKind::Literal(_) => return Ok(Lead::Literal),
            _ => {}
        }

        Err(Rejection::new(
            RejectReason::UnknownLeadToken,
            format!("`{}` does not start an instruction or a literal sentence", first.text),
        ))
    }

    fn read_arguments(
        &self,
        lead: Lead<'r>,
        tokens: &[Token],
        line: usize,
        context: &Context,
    ) -> Result<Sentence, Rejection> {
        let descriptor = match lead {
            Lead::Literal => {
                let mut node = SentenceNode::new(reconstruct(tokens), SentenceMode::Literal, line, 0);
                node.arguments = self.read_literal(tokens)?;
                return Ok(Sentence {
                    node,
                    opens: None,
                    inline: None,
                });
            }
            Lead::Instruction(descriptor) => descriptor,
        };

        let rest = &tokens[1..];
        let (header, inline_tokens) = match descriptor.opens {
            Some(_) => match rest.iter().position(|t| {
                self.parser.registry.grammar_word(&t.text) == Some(GrammarWord::Continuation)
                    && t.kind == TokenKind::Keyword
            }) {
                Some(at) => (&rest[..at], Some(&rest[at + 1..])),
                None => (rest, None),
            },
            None => (rest, None),
        };

        let arguments = collect_arguments(header, self.parser.registry, self.max_depth())?;
        if !descriptor.operand_shape.accepts(arguments.len()) {
            return Err(Rejection::arity(format!(
                "`{}` takes {}, found {}",
                descriptor.keyword,
                descriptor.operand_shape.describe(),
                arguments.len()
            )));
        }

        let inline = match inline_tokens {
            Some(tokens) if !tokens.is_empty() => {
                if context.blocks.len() >= self.max_depth() {
                    return Err(Rejection::new(
                        RejectReason::NestingTooDeep,
                        format!("inline blocks nest deeper than the limit of {}", self.max_depth()),
                    ));
                }
                let mut blocks = context.blocks.clone();
                blocks.extend(descriptor.opens);
                let inner = Context {
                    blocks,
                    previous: None,
                };
                let sentence = self.read_sentence(tokens, line, &inner)?;
                if sentence.opens.is_some() && sentence.inline.is_none() {
                    return Err(Rejection::new(
                        RejectReason::IncompleteBlock,
                        "an inline block opener needs its own `then`",
                    ));
                }
                Some(Box::new(sentence))
            }
            _ => None,
        };

        let mode = if descriptor.opens.is_some() {
            SentenceMode::BlockStarter
        } else if descriptor.category == Category::Flow {
            SentenceMode::FlowControl
        } else {
            SentenceMode::Instruction
        };

        let mut node = SentenceNode::new(reconstruct(tokens), mode, line, 0);
        node.lead = Some(descriptor.keyword.clone());
        node.arguments = arguments;
        Ok(Sentence {
            node,
            opens: descriptor.opens,
            inline,
        })
    }

    /// `the NAME is VALUE` → [Name, VALUE]；以字面量开头 → [VALUE]
    fn read_literal(&self, tokens: &[Token]) -> Result<Vec<Argument>, Rejection> {
        let registry = self.parser.registry;

        if tokens.first().is_some_and(|t| t.is_keyword("the")) {
            let name = match tokens.get(1) {
                Some(t) if matches!(t.kind, TokenKind::Identifier | TokenKind::Keyword) => {
                    t.text.clone()
                }
                _ => return Err(Rejection::arity("expected a name after `the`")),
            };
            let linked = tokens
                .get(2)
                .is_some_and(|t| registry.grammar_word(&t.text) == Some(GrammarWord::Connective));
            if !linked {
                return Err(Rejection::arity(format!("expected `is` after `the {name}`")));
            }

            let mut values = collect_arguments(&tokens[3..], registry, self.max_depth())?;
            if values.len() != 1 {
                return Err(Rejection::arity(format!(
                    "`the {name} is ...` takes exactly one value, found {}",
                    values.len()
                )));
            }
            return Ok(vec![Argument::Name(name), values.remove(0)]);
        }

        let values = collect_arguments(tokens, registry, self.max_depth())?;
        if values.len() != 1 {
            return Err(Rejection::arity(format!(
                "a literal sentence holds exactly one value, found {}",
                values.len()
            )));
        }
        Ok(values)
    }

    fn attach(&mut self, frame: usize, sentence: Sentence, comments: Vec<PendingComment>) -> NodeId {
        let parent = self.frames[frame].node;
        for comment in comments {
            self.push_comment(parent, comment);
        }
        self.frames[frame].last_opened = sentence.opens;
        self.attach_under(parent, sentence)
    }

    fn attach_under(&mut self, parent: NodeId, sentence: Sentence) -> NodeId {
        let Sentence { mut node, inline, .. } = sentence;
        node.nesting_level = self.tree.node(parent).nesting_level + 1;
        let id = self.tree.push_child(parent, node);
        if let Some(inline) = inline {
            self.attach_under(id, *inline);
        }
        id
    }

    fn push_comment(&mut self, parent: NodeId, comment: PendingComment) {
        let level = self.tree.node(parent).nesting_level + 1;
        self.tree
            .push_child(parent, SentenceNode::comment(comment.text, comment.line, level));
    }

    fn buffer_comment(&mut self, token: &Token, indent: usize) {
        self.pending_comments.push(PendingComment {
            text: token.text.clone(),
            line: token.line,
            indent,
        });
    }

    fn reject(&mut self, line: usize, indent: usize, rejection: Rejection) -> Result<(), Halt> {
        debug!(self.parser.logger, target: TARGET, "Rejected line {}: {}", line, rejection.message);
        self.skip_deeper_than = Some(indent);
        self.last_sentence = None;

        let fatal = self.parser.config.escalate_rejections;
        let diagnostic = rejection.into_diagnostic(line, fatal);
        if fatal {
            return Err(self.halt(diagnostic));
        }
        self.diagnostics.push(diagnostic);
        Ok(())
    }

    fn halt(&mut self, diagnostic: Diagnostic) -> Halt {
        self.diagnostics.push(diagnostic.clone());
        Halt(diagnostic)
    }

    fn max_depth(&self) -> usize {
        self.parser.config.max_nesting_depth
    }

    fn top(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }
}

fn check_context(lead: &Lead<'_>, context: &Context) -> Result<(), Rejection> {
    let Lead::Instruction(descriptor) = lead else {
        return Ok(());
    };

    if let Some(required) = descriptor.requires {
        if !context.blocks.contains(&required) {
            return Err(Rejection::new(
                RejectReason::InvalidContext,
                format!("`{}` is only valid inside {}", descriptor.keyword, required.describe()),
            ));
        }
    }

    if descriptor.verb_class == VerbClass::Import && !context.blocks.is_empty() {
        return Err(Rejection::new(
            RejectReason::InvalidContext,
            format!("`{}` is only valid at the top level", descriptor.keyword),
        ));
    }

    if descriptor.opens == Some(BlockKind::Alternative)
        && context.previous != Some(BlockKind::Conditional)
    {
        return Err(Rejection::new(
            RejectReason::InvalidContext,
            format!(
                "`{}` must directly follow {}",
                descriptor.keyword,
                BlockKind::Conditional.describe()
            ),
        ));
    }

    Ok(())
}
