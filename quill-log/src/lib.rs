//! quill-log - 结构化日志
//!
//! 为 quill 前端（分词、解析、操作数解析）设计的日志系统：
//! - **显式传递**：没有全局 logger，每个阶段通过 `with_logger` 接收 `Arc<Logger>`
//! - **源码行关联**：记录可以携带源码行号，便于和诊断信息对照
//! - **按线程的 span**：并发编译多个单元时 span 栈互不干扰
//! - **环形缓冲区**：保留最后 N 条日志，测试里直接断言日志内容
//!
//! # 快速开始
//!
//! ```
//! use quill_log::{LogConfig, debug};
//!
//! let (logger, ring) = LogConfig::test().with_ring_buffer(64).init();
//! debug!(logger, "tokenizer ready");
//! assert!(ring.is_some());
//! ```

mod config;
mod logger;
mod macros;
mod record;
mod ring_buffer;
mod span;

pub use config::{LogConfig, OutputConfig};
pub use logger::{FileSink, LogSink, Logger, SpanGuard, StderrSink, StdoutSink};
pub use record::{Level, Record};
pub use ring_buffer::{LogRingBuffer, RingBufferStats};
pub use span::{Span, SpanId};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// 日志结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// 日志系统错误类型
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 环形缓冲区容量为 0，无法保存任何记录
    #[error("Ring buffer full")]
    BufferFull,
    /// 打开或写入日志文件失败
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 不支持的输出配置
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),
}

/// 获取锁；持锁线程 panic 后依然返回内部数据，日志不应因此中断
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
