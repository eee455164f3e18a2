//! 日志记录定义

use std::fmt;

/// 日志级别
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// 最详细的跟踪信息（状态机迁移、逐 token 输出）
    Trace = 0,
    /// 调试信息
    Debug = 1,
    /// 阶段开始/结束
    Info = 2,
    /// 被拒绝的句子、吞掉的 sink 错误
    Warn = 3,
    /// 致命诊断
    Error = 4,
}

impl Level {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Level::Trace),
            1 => Some(Level::Debug),
            2 => Some(Level::Info),
            3 => Some(Level::Warn),
            4 => Some(Level::Error),
            _ => None,
        }
    }

    /// 按名称解析（大小写不敏感），`silent` 视为 Error
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" | "silent" => Some(Level::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单条日志记录
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Unix 时间戳（毫秒）
    pub timestamp_ms: u64,
    pub level: Level,
    /// 阶段 target，例如 `quill::parser`
    pub target: &'static str,
    pub message: String,
    /// 当前线程最内层 span 的 ID
    pub span_id: Option<u64>,
    /// 记录关联的源码行（1-based）
    pub source_line: Option<usize>,
}

impl Record {
    pub fn new(level: Level, target: &'static str, message: impl Into<String>) -> Self {
        Self {
            timestamp_ms: current_timestamp_ms(),
            level,
            target,
            message: message.into(),
            span_id: None,
            source_line: None,
        }
    }

    pub fn with_span(mut self, span_id: u64) -> Self {
        self.span_id = Some(span_id);
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.source_line = Some(line);
        self
    }

    /// 渲染为单行文本
    pub fn format(&self) -> String {
        let span = match self.span_id {
            Some(id) => format!(" [span={id}]"),
            None => String::new(),
        };
        let line = match self.source_line {
            Some(line) => format!(" (line {line})"),
            None => String::new(),
        };

        format!(
            "[{}] {} {}{}{}: {}",
            format_timestamp(self.timestamp_ms),
            self.level,
            self.target,
            span,
            line,
            self.message
        )
    }
}

fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn format_timestamp(timestamp_ms: u64) -> String {
    let secs = timestamp_ms / 1000;
    let millis = timestamp_ms % 1000;

    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;

    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_u8() {
        assert_eq!(Level::from_u8(0), Some(Level::Trace));
        assert_eq!(Level::from_u8(4), Some(Level::Error));
        assert_eq!(Level::from_u8(5), None);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("DEBUG"), Some(Level::Debug));
        assert_eq!(Level::parse("warning"), Some(Level::Warn));
        assert_eq!(Level::parse("silent"), Some(Level::Error));
        assert_eq!(Level::parse("loud"), None);
    }

    #[test]
    fn test_record_builders() {
        let record = Record::new(Level::Warn, "quill::parser", "rejected sentence")
            .with_span(7)
            .at_line(12);
        assert_eq!(record.span_id, Some(7));
        assert_eq!(record.source_line, Some(12));
    }

    #[test]
    fn test_record_format() {
        let mut record = Record::new(Level::Info, "quill::tokenizer", "done").at_line(3);
        record.timestamp_ms = 3_723_004;

        assert_eq!(
            record.format(),
            "[01:02:03.004] INFO quill::tokenizer (line 3): done"
        );
    }

    #[test]
    fn test_record_format_with_span() {
        let mut record = Record::new(Level::Debug, "quill::resolver", "node").with_span(2);
        record.timestamp_ms = 0;

        assert_eq!(
            record.format(),
            "[00:00:00.000] DEBUG quill::resolver [span=2]: node"
        );
    }
}
