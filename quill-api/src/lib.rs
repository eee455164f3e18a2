//! Quill API - 前端流程编排层
//!
//! 提供统一的编译接口：
//! - 流程编排：分词 → 解析 → 操作数解析
//! - 配置抽象（CompileConfig）
//! - 统一错误处理（QuillError）与结构化错误报告
//! - 多个编译单元的并发编译
//!
//! 唯一的共享状态是惰性构建的内置指令表，构建后只读。

use once_cell::sync::Lazy;
use quill_core::{
    CollectingSink, DiagnosticSink, Diagnostics, InstructionRegistry, NullSink, Parser, Resolver,
    Tokenizer,
};
use quill_log::{debug, info};

pub mod config;
pub mod error;
pub mod types;

pub use config::CompileConfig;
pub use error::{ErrorReport, QuillError};
pub use types::{CompileOutput, SourceUnit, UnitOutcome};

// Re-export config types from quill_config
pub use quill_config::{
    FrontendConfig, IndentUnit, LexerConfig, ParserConfig, Phase, ResolverConfig,
};

// Re-export core types
pub use quill_config;
pub use quill_core;
pub use quill_core::{Diagnostic, Severity};

static BUILTIN_REGISTRY: Lazy<InstructionRegistry> = Lazy::new(InstructionRegistry::builtin);

/// 共享的内置指令表
pub fn default_registry() -> &'static InstructionRegistry {
    &BUILTIN_REGISTRY
}

/// 使用内置指令表编译
pub fn compile(source: &str, config: &CompileConfig) -> Result<CompileOutput, QuillError> {
    compile_with_sink(source, config, &NullSink)
}

/// 编译，并把每条诊断同步送往 `sink`
pub fn compile_with_sink(
    source: &str,
    config: &CompileConfig,
    sink: &dyn DiagnosticSink,
) -> Result<CompileOutput, QuillError> {
    compile_with_registry(source, default_registry(), config, sink)
}

/// 使用指定指令表编译
pub fn compile_with_registry(
    source: &str,
    registry: &InstructionRegistry,
    config: &CompileConfig,
    sink: &dyn DiagnosticSink,
) -> Result<CompileOutput, QuillError> {
    let logger = &config.logger;
    info!(logger, "Starting compilation");

    let tokens = Tokenizer::with_logger(registry, logger.clone())
        .with_config(config.frontend.lexer.clone())
        .tokenize(source)
        .inspect_err(|err| {
            // 词法错误不经过解析器的累加器，这里补发给 sink
            let mut diagnostics =
                Diagnostics::new(sink, logger.clone(), Phase::Tokenizer.target());
            diagnostics.push(err.to_diagnostic());
        })?;

    let parsed = Parser::with_logger(registry, logger.clone())
        .with_config(config.frontend.parser.clone())
        .parse_with_sink(&tokens.tokens, sink)?;

    let resolved = Resolver::with_logger(registry, logger.clone())
        .with_config(config.frontend.resolver.clone())
        .resolve_with_sink(&parsed.tree, sink)?;

    let mut diagnostics = parsed.diagnostics;
    diagnostics.extend(resolved.diagnostics.iter().cloned());

    debug!(
        logger,
        "compilation completed: tokens={}, sentences={}, diagnostics={}",
        tokens.len(),
        parsed.tree.sentences().len(),
        diagnostics.len(),
    );
    info!(logger, "Compilation completed");

    Ok(CompileOutput {
        tokens,
        tree: parsed.tree,
        resolved,
        diagnostics,
    })
}

/// 并发编译多个单元
///
/// 每个单元在独立的作用域线程上跑完整流程，各自持有一个 [`CollectingSink`]；
/// 结果按输入顺序返回。工作线程 panic 会在调用方重新抛出。
pub fn compile_units(units: &[SourceUnit], config: &CompileConfig) -> Vec<UnitOutcome> {
    let registry = default_registry();
    info!(config.logger, "Compiling {} units", units.len());

    std::thread::scope(|scope| {
        let workers: Vec<_> = units
            .iter()
            .map(|unit| {
                scope.spawn(move || {
                    let sink = CollectingSink::new();
                    let result = compile_with_registry(&unit.source, registry, config, &sink);
                    UnitOutcome {
                        name: unit.name.clone(),
                        result,
                        diagnostics: sink.take(),
                    }
                })
            })
            .collect();

        workers
            .into_iter()
            .map(|worker| {
                worker
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_log::{Level, LogRingBuffer, Logger};

    #[test]
    fn test_compile_with_default_config() {
        let output = compile("let x be set to 6\nspeak x", &CompileConfig::default()).unwrap();
        assert_eq!(output.tree.sentences().len(), 2);
        assert_eq!(output.resolved.nodes.len(), 2);
        assert!(!output.has_errors());
    }

    #[test]
    fn test_default_registry_is_shared() {
        assert!(std::ptr::eq(default_registry(), default_registry()));
        assert!(default_registry().lookup("let").is_some());
    }

    #[test]
    fn test_diagnostics_merge_in_phase_order() {
        let output = compile("flarp\nspeak ghost", &CompileConfig::default()).unwrap();
        let codes: Vec<&str> = output.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["parse.unknown-lead-token", "resolve.unknown-identifier"]);
        assert!(output.has_errors());
    }

    #[test]
    fn test_lex_error_reaches_sink() {
        let sink = CollectingSink::new();
        let err = compile_with_sink("speak \"open", &CompileConfig::default(), &sink).unwrap_err();

        assert_eq!(err.phase(), Phase::Tokenizer);
        assert_eq!(sink.snapshot(), err.diagnostics());
    }

    #[test]
    fn test_compile_logs_phases() {
        let ring = LogRingBuffer::new(256);
        let logger = Logger::new(Level::Debug).with_sink(ring.clone());
        let config = CompileConfig::default().with_logger(logger);

        compile("let a be 1", &config).unwrap();
        assert!(ring.contains("Starting compilation"));
        assert!(ring.contains("Compilation completed"));
        assert!(!ring.records_for(Phase::Parser.target()).is_empty());
    }

    #[test]
    fn test_compile_units_preserves_order() {
        let units = vec![
            SourceUnit::new("a.ql", "let a be 1"),
            SourceUnit::new("b.ql", "speak \"open"),
            SourceUnit::new("c.ql", "speak ghost"),
        ];
        let outcomes = compile_units(&units, &CompileConfig::default());

        let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a.ql", "b.ql", "c.ql"]);
        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].result.is_err());
        assert_eq!(outcomes[1].diagnostics.len(), 1);
        assert!(!outcomes[2].is_ok());
        assert_eq!(outcomes[2].diagnostics[0].code, "resolve.unknown-identifier");
    }
}
