//! 平台相关的输出

mod cli;

pub use cli::{print_diagnostic_with_source, print_error_with_source, render_source_context};
