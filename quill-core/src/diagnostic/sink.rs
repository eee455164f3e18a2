//! 诊断 sink 实现

use super::{Diagnostic, Severity};
use quill_log::{Level, Logger};
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// sink 自身的失败；核心只记录，不传播
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to write diagnostic: {0}")]
    Io(#[from] std::io::Error),
    #[error("diagnostic sink is closed")]
    Closed,
}

/// 诊断接收方，每条诊断同步调用一次
pub trait DiagnosticSink {
    fn emit(&self, diagnostic: &Diagnostic) -> Result<(), SinkError>;
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic) -> Result<(), SinkError>,
{
    fn emit(&self, diagnostic: &Diagnostic) -> Result<(), SinkError> {
        self(diagnostic)
    }
}

/// 丢弃所有诊断（结果中的列表依然完整）
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _diagnostic: &Diagnostic) -> Result<(), SinkError> {
        Ok(())
    }
}

/// 收集到内存，线程安全；并发编译时每个工作线程一个，结束后合并
#[derive(Default)]
pub struct CollectingSink {
    records: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.records.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: &Diagnostic) -> Result<(), SinkError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic.clone());
        Ok(())
    }
}

/// 每条诊断写一行
pub struct WriterSink<W: Write> {
    writer: Mutex<W>,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn emit(&self, diagnostic: &Diagnostic) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{diagnostic}")?;
        Ok(())
    }
}

/// 把诊断转成日志记录
pub struct LoggerSink {
    logger: Arc<Logger>,
    target: &'static str,
}

impl LoggerSink {
    pub fn new(logger: Arc<Logger>, target: &'static str) -> Self {
        Self { logger, target }
    }

    fn level_for(severity: Severity) -> Level {
        match severity {
            Severity::Fatal | Severity::Error => Level::Error,
            Severity::Warning => Level::Warn,
            Severity::Info => Level::Info,
        }
    }
}

impl DiagnosticSink for LoggerSink {
    fn emit(&self, diagnostic: &Diagnostic) -> Result<(), SinkError> {
        self.logger.log_at_line(
            Self::level_for(diagnostic.severity),
            self.target,
            diagnostic.line,
            format!("{}: {}", diagnostic.code, diagnostic.message),
        );
        Ok(())
    }
}
