//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。前端各阶段通过 quill-log 记录，
//! [`TracingSink`] 把这些记录转成 `tracing` 事件。

use crate::config::LogConfig;
use quill_config::Phase;
use quill_log::{Level as QuillLevel, LogSink, Record};
use std::io;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// CLI 自身事件的 target
pub const CLI_TARGET: &str = "quill::cli";

/// 日志输出格式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    #[default]
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

fn filter(level: Option<tracing::Level>) -> LevelFilter {
    level.map(LevelFilter::from_level).unwrap_or(LevelFilter::OFF)
}

/// 使用指定格式和日志配置初始化日志系统，输出到 stderr
pub fn init(log_config: &LogConfig, format: LogFormat) {
    let mut targets = Targets::new()
        .with_default(filter(log_config.global))
        .with_target(CLI_TARGET, filter(log_config.global));
    for phase in Phase::ALL {
        targets = targets.with_target(phase.target(), filter(log_config.level_for(phase.target())));
    }

    let layer = create_format_layer(format, io::stderr).with_filter(targets);
    tracing_subscriber::registry().with(layer).init();
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(
    format: LogFormat,
    make_writer: F,
) -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>
where
    W: io::Write + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
    }
}

/// quill-log 级别
pub fn quill_level(level: Option<tracing::Level>) -> QuillLevel {
    match level {
        Some(tracing::Level::TRACE) => QuillLevel::Trace,
        Some(tracing::Level::DEBUG) => QuillLevel::Debug,
        Some(tracing::Level::INFO) => QuillLevel::Info,
        Some(tracing::Level::WARN) => QuillLevel::Warn,
        _ => QuillLevel::Error,
    }
}

/// 把 quill-log 记录转发为 `tracing` 事件
///
/// tracing 的 target 必须是常量，所以按阶段逐一展开。
pub struct TracingSink;

macro_rules! forward {
    ($target:expr, $record:expr) => {{
        let record = $record;
        match record.level {
            QuillLevel::Trace => tracing::trace!(target: $target, line = record.source_line, span = record.span_id, "{}", record.message),
            QuillLevel::Debug => tracing::debug!(target: $target, line = record.source_line, span = record.span_id, "{}", record.message),
            QuillLevel::Info => tracing::info!(target: $target, line = record.source_line, span = record.span_id, "{}", record.message),
            QuillLevel::Warn => tracing::warn!(target: $target, line = record.source_line, span = record.span_id, "{}", record.message),
            QuillLevel::Error => tracing::error!(target: $target, line = record.source_line, span = record.span_id, "{}", record.message),
        }
    }};
}

impl LogSink for TracingSink {
    fn write(&self, record: &Record) {
        match Phase::ALL.into_iter().find(|p| p.target() == record.target) {
            Some(Phase::Tokenizer) => forward!("quill::tokenizer", record),
            Some(Phase::Parser) => forward!("quill::parser", record),
            Some(Phase::Resolver) => forward!("quill::resolver", record),
            None => forward!(CLI_TARGET, record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quill_level_mapping() {
        assert_eq!(quill_level(Some(tracing::Level::TRACE)), QuillLevel::Trace);
        assert_eq!(quill_level(Some(tracing::Level::WARN)), QuillLevel::Warn);
        assert_eq!(quill_level(None), QuillLevel::Error);
    }

    #[test]
    fn test_filter_off_when_silent() {
        assert_eq!(filter(None), LevelFilter::OFF);
        assert_eq!(filter(Some(tracing::Level::INFO)), LevelFilter::INFO);
    }

    #[test]
    fn test_phase_targets_are_forwarded() {
        // 没有安装 subscriber 时转发是空操作，只检查不会 panic
        let sink = TracingSink;
        for phase in Phase::ALL {
            sink.write(&Record::new(QuillLevel::Debug, phase.target(), "message").at_line(3));
        }
        sink.write(&Record::new(QuillLevel::Info, "quill_api", "other"));
    }
}
