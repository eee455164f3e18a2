//! 日志配置：一次性构造 logger 及其输出目标

use crate::logger::{FileSink, StderrSink, StdoutSink};
use crate::{Level, LogRingBuffer, Logger};
use std::sync::Arc;

/// 输出目标
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputConfig {
    Stdout,
    Stderr,
    /// 追加写入的文件路径
    File(String),
    /// 环形缓冲区容量
    RingBuffer(usize),
}

/// 日志配置
///
/// ```
/// use quill_log::{LogConfig, Level};
///
/// let (logger, ring) = LogConfig::new(Level::Debug).with_ring_buffer(128).init();
/// assert_eq!(logger.level(), Level::Debug);
/// assert_eq!(ring.map(|r| r.capacity()), Some(128));
/// ```
#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: Level,
    pub outputs: Vec<OutputConfig>,
}

impl LogConfig {
    pub fn new(level: Level) -> Self {
        LogConfig {
            level,
            outputs: Vec::new(),
        }
    }

    /// Debug 级别，stdout + 10000 条环形缓冲
    pub fn dev() -> Self {
        LogConfig {
            level: Level::Debug,
            outputs: vec![OutputConfig::Stdout, OutputConfig::RingBuffer(10_000)],
        }
    }

    /// Warn 级别，stderr + 1000 条环形缓冲
    pub fn production() -> Self {
        LogConfig {
            level: Level::Warn,
            outputs: vec![OutputConfig::Stderr, OutputConfig::RingBuffer(1_000)],
        }
    }

    /// 静默
    pub fn test() -> Self {
        LogConfig::new(Level::Error)
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_stdout(mut self) -> Self {
        if !self.outputs.contains(&OutputConfig::Stdout) {
            self.outputs.push(OutputConfig::Stdout);
        }
        self
    }

    pub fn with_stderr(mut self) -> Self {
        if !self.outputs.contains(&OutputConfig::Stderr) {
            self.outputs.push(OutputConfig::Stderr);
        }
        self
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.outputs.push(OutputConfig::File(path.into()));
        self
    }

    pub fn with_ring_buffer(mut self, capacity: usize) -> Self {
        self.outputs.push(OutputConfig::RingBuffer(capacity));
        self
    }

    /// 构造 logger
    ///
    /// 配置了多个环形缓冲区时返回最后一个。打不开的日志文件会被跳过，
    /// 并通过其余输出目标报告一条 warn。
    pub fn init(self) -> (Arc<Logger>, Option<Arc<LogRingBuffer>>) {
        let logger = Logger::new(self.level);
        let mut ring_buffer = None;
        let mut failed_files = Vec::new();

        for output in self.outputs {
            match output {
                OutputConfig::Stdout => logger.add_sink(StdoutSink),
                OutputConfig::Stderr => logger.add_sink(StderrSink),
                OutputConfig::File(path) => match FileSink::new(&path) {
                    Ok(sink) => logger.add_sink(sink),
                    Err(err) => failed_files.push(format!("{path}: {err}")),
                },
                OutputConfig::RingBuffer(capacity) => {
                    let ring = LogRingBuffer::new(capacity);
                    ring_buffer = Some(Arc::clone(&ring));
                    logger.add_sink(ring);
                }
            }
        }

        for failure in failed_files {
            logger.log(
                Level::Warn,
                "quill::log",
                format!("could not open log file {failure}"),
            );
        }

        (logger, ring_buffer)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig::new(Level::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(LogConfig::dev().level, Level::Debug);
        assert_eq!(LogConfig::production().level, Level::Warn);
        assert!(LogConfig::test().outputs.is_empty());
        assert_eq!(LogConfig::default().level, Level::Info);
    }

    #[test]
    fn test_stdout_not_duplicated() {
        let config = LogConfig::new(Level::Info).with_stdout().with_stdout().with_stderr();
        assert_eq!(config.outputs, vec![OutputConfig::Stdout, OutputConfig::Stderr]);
    }

    #[test]
    fn test_init_returns_ring_buffer() {
        let (logger, ring) = LogConfig::new(Level::Trace).with_ring_buffer(16).init();
        let ring = ring.unwrap();

        logger.log(Level::Trace, "quill::tokenizer", "line 1 scanned");
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_init_without_ring_buffer() {
        let (logger, ring) = LogConfig::test().init();
        assert!(ring.is_none());
        assert_eq!(logger.level(), Level::Error);
    }

    #[test]
    fn test_unopenable_file_is_reported() {
        let missing = std::env::temp_dir()
            .join("quill-log-missing-dir")
            .join("nested")
            .join("out.log");
        let (logger, ring) = LogConfig::new(Level::Info)
            .with_ring_buffer(8)
            .with_file(missing.to_string_lossy())
            .init();

        assert_eq!(logger.level(), Level::Info);
        assert!(ring.unwrap().contains("could not open log file"));
    }
}
