//! 日志宏
//!
//! 形式：`debug!(logger, "fmt", args..)` 使用调用处的 `module_path!()` 作为 target；
//! `debug!(logger, target: "quill::parser", "fmt", args..)` 显式指定阶段 target。
//! 只有级别启用时才会格式化消息。

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// 通用日志宏
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, target: $target:expr, $($arg:tt)+) => {{
        if $logger.is_enabled($level) {
            $logger.log($level, $target, ::std::format!($($arg)+));
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        if $logger.is_enabled($level) {
            $logger.log($level, ::std::module_path!(), ::std::format!($($arg)+));
        }
    }};
}

/// 关联源码行的日志：`log_line!(logger, Level::Warn, target, line, "fmt", ..)`
#[macro_export]
macro_rules! log_line {
    ($logger:expr, $level:expr, $target:expr, $line:expr, $($arg:tt)+) => {{
        if $logger.is_enabled($level) {
            $logger.log_at_line($level, $target, $line, ::std::format!($($arg)+));
        }
    }};
}
