//! 日志器实现

use crate::lock;
use crate::record::{Level, Record};
use crate::span::{Span, SpanId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

/// 日志输出目标
pub trait LogSink: Send + Sync {
    fn write(&self, record: &Record);
}

/// 日志器
///
/// 通过 `Arc<Logger>` 显式传给各阶段。span 栈按线程隔离，
/// 多个编译单元并发运行时各自的 span 不会串在一起。
pub struct Logger {
    level: AtomicU8,
    sinks: Mutex<Vec<Box<dyn LogSink>>>,
    spans: Mutex<HashMap<ThreadId, Vec<Span>>>,
    next_span_id: AtomicU64,
}

impl Logger {
    pub fn new(level: Level) -> Arc<Self> {
        Arc::new(Logger {
            level: AtomicU8::new(level as u8),
            sinks: Mutex::new(Vec::new()),
            spans: Mutex::new(HashMap::new()),
            next_span_id: AtomicU64::new(1),
        })
    }

    /// 添加输出目标（链式）
    pub fn with_sink<S: LogSink + 'static>(self: Arc<Self>, sink: S) -> Arc<Self> {
        self.add_sink(sink);
        self
    }

    pub fn add_sink<S: LogSink + 'static>(&self, sink: S) {
        lock(&self.sinks).push(Box::new(sink));
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed)).unwrap_or(Level::Info)
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// 记录日志
    #[inline(never)]
    pub fn log(&self, level: Level, target: &'static str, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        self.dispatch(Record::new(level, target, message));
    }

    /// 记录与某一源码行相关的日志
    pub fn log_at_line(
        &self,
        level: Level,
        target: &'static str,
        line: usize,
        message: impl Into<String>,
    ) {
        if !self.is_enabled(level) {
            return;
        }
        self.dispatch(Record::new(level, target, message).at_line(line));
    }

    fn dispatch(&self, mut record: Record) {
        if let Some(span) = self.current_span() {
            record = record.with_span(span.id.0);
        }

        let sinks = lock(&self.sinks);
        for sink in sinks.iter() {
            sink.write(&record);
        }
    }

    /// 当前线程最内层的 span
    pub fn current_span(&self) -> Option<Span> {
        let spans = lock(&self.spans);
        spans
            .get(&thread::current().id())
            .and_then(|stack| stack.last().cloned())
    }

    /// 进入 span，守卫析构时退出
    pub fn enter_span(self: &Arc<Self>, name: &'static str) -> SpanGuard {
        let id = SpanId(self.next_span_id.fetch_add(1, Ordering::Relaxed));
        let thread = thread::current().id();
        lock(&self.spans)
            .entry(thread)
            .or_default()
            .push(Span::new(id, name));

        SpanGuard {
            logger: Arc::clone(self),
            thread,
        }
    }

    /// 当前线程的 span 深度
    pub fn span_depth(&self) -> usize {
        lock(&self.spans)
            .get(&thread::current().id())
            .map_or(0, Vec::len)
    }

    /// 没有任何 sink 的静默 logger
    pub fn noop() -> Arc<Self> {
        Self::new(Level::Error)
    }
}

/// Span 守卫
pub struct SpanGuard {
    logger: Arc<Logger>,
    thread: ThreadId,
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        let mut spans = lock(&self.logger.spans);
        if let Some(stack) = spans.get_mut(&self.thread) {
            stack.pop();
            if stack.is_empty() {
                spans.remove(&self.thread);
            }
        }
    }
}

/// 子 logger 作为父 logger 的 sink
impl LogSink for Arc<Logger> {
    fn write(&self, record: &Record) {
        if !self.is_enabled(record.level) {
            return;
        }
        self.dispatch(record.clone());
    }
}

pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write(&self, record: &Record) {
        println!("{}", record.format());
    }
}

pub struct StderrSink;

impl LogSink for StderrSink {
    fn write(&self, record: &Record) {
        eprintln!("{}", record.format());
    }
}

/// 文件 sink（追加模式）
pub struct FileSink {
    file: Mutex<std::fs::File>,
}

impl FileSink {
    pub fn new(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(FileSink {
            file: Mutex::new(file),
        })
    }
}

impl LogSink for FileSink {
    #[inline(never)]
    fn write(&self, record: &Record) {
        use std::io::Write;
        let mut file = lock(&self.file);
        // 写日志失败不影响编译流程
        let _ = writeln!(file, "{}", record.format());
    }
}
