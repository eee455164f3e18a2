//! 环形缓冲区
//!
//! 保留最近 N 条记录，满了覆盖最旧的一条。测试中用它断言某个阶段打了什么日志，
//! CLI 在致命错误时用它转储上下文。

use crate::lock;
use crate::logger::LogSink;
use crate::record::{Level, Record};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RingBufferStats {
    pub record_count: usize,
    pub dropped_count: usize,
    pub capacity: usize,
}

pub struct LogRingBuffer {
    inner: Mutex<VecDeque<Record>>,
    capacity: usize,
    dropped: AtomicUsize,
}

impl LogRingBuffer {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(LogRingBuffer {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicUsize::new(0),
        })
    }

    /// 写入一条记录；容量为 0 时返回 `BufferFull`
    pub fn push(&self, record: Record) -> crate::Result<()> {
        if self.capacity == 0 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(crate::Error::BufferFull);
        }

        let mut inner = lock(&self.inner);
        if inner.len() >= self.capacity {
            inner.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        inner.push_back(record);
        Ok(())
    }

    pub fn dump_records(&self) -> Vec<Record> {
        lock(&self.inner).iter().cloned().collect()
    }

    /// 只取某个 target 的记录
    pub fn records_for(&self, target: &str) -> Vec<Record> {
        lock(&self.inner)
            .iter()
            .filter(|record| record.target == target)
            .cloned()
            .collect()
    }

    /// 是否有任意记录的消息包含 `needle`
    pub fn contains(&self, needle: &str) -> bool {
        lock(&self.inner)
            .iter()
            .any(|record| record.message.contains(needle))
    }

    pub fn count_at(&self, level: Level) -> usize {
        lock(&self.inner)
            .iter()
            .filter(|record| record.level == level)
            .count()
    }

    pub fn dump(&self) -> String {
        self.dump_records()
            .iter()
            .map(Record::format)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&self) {
        lock(&self.inner).clear();
        self.dropped.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> RingBufferStats {
        RingBufferStats {
            record_count: self.len(),
            dropped_count: self.dropped_count(),
            capacity: self.capacity,
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl LogSink for Arc<LogRingBuffer> {
    fn write(&self, record: &Record) {
        // 容量为 0 的缓冲区只计数，不报错
        let _ = self.push(record.clone());
    }
}
