//! CLI 格式化输出
//!
//! 提供命令行友好的诊断显示和源码上下文打印。

use quill_api::{Diagnostic, QuillError, Severity};

/// 错误行前后显示的上下文行数
const CONTEXT_LINES: usize = 2;

/// 打印致命错误并显示源代码上下文
pub fn print_error_with_source(e: &QuillError, source: &str) {
    eprintln!("❌ {} error: {}", e.phase().as_str(), e);

    let column = e.column().or_else(|| first_code_column(source, e.line()));
    if let Some(col) = column {
        eprint!("{}", render_source_context(source, e.line(), col));
    }
}

/// 打印一条诊断及其所在行
pub fn print_diagnostic_with_source(diagnostic: &Diagnostic, source: &str) {
    let marker = match diagnostic.severity {
        Severity::Fatal | Severity::Error => "❌",
        Severity::Warning => "⚠️",
        Severity::Info => "ℹ️",
    };
    eprintln!(
        "{} {}[{}]: {}",
        marker, diagnostic.severity, diagnostic.code, diagnostic.message
    );

    if let Some(col) = first_code_column(source, diagnostic.line) {
        eprint!("{}", render_source_context(source, diagnostic.line, col));
    }
}

/// 诊断只有行号时，标记指向该行第一个非空白字符
fn first_code_column(source: &str, line: usize) -> Option<usize> {
    let text = source.lines().nth(line.checked_sub(1)?)?;
    let indent = text.chars().take_while(|c| c.is_whitespace()).count();
    Some(indent + 1)
}

/// 渲染源代码上下文（错误行前后几行），错误行下方用 `^` 标出列
pub fn render_source_context(source: &str, error_line: usize, error_col: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let total_lines = lines.len();

    if error_line == 0 || error_line > total_lines {
        return String::new();
    }

    let start_line = error_line.saturating_sub(CONTEXT_LINES).max(1);
    let end_line = (error_line + CONTEXT_LINES).min(total_lines);

    // 行号的最大宽度用于对齐
    let width = end_line.to_string().len();
    let separator = "-".repeat(width + 1);

    let mut out = format!("{separator}|--\n");
    for line_idx in start_line..=end_line {
        out.push_str(&format!("{line_idx:>width$} | {}\n", lines[line_idx - 1]));
        if line_idx == error_line {
            let marker = " ".repeat(error_col.saturating_sub(1));
            out.push_str(&format!("{} | {marker}^\n", " ".repeat(width)));
        }
    }
    out.push_str(&format!("{separator}|--\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marks_column() {
        let source = "let a be 1\nspeak a @ 2\nbless a";
        let rendered = render_source_context(source, 2, 9);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "--|--");
        assert_eq!(lines[1], "1 | let a be 1");
        assert_eq!(lines[2], "2 | speak a @ 2");
        assert_eq!(lines[3], "  |         ^");
        assert_eq!(lines[4], "3 | bless a");
        assert_eq!(lines[5], "--|--");
    }

    #[test]
    fn test_render_window_and_width() {
        let source: String = (1..=12).map(|i| format!("speak {i}\n")).collect();
        let rendered = render_source_context(&source, 10, 1);

        assert!(rendered.contains(" 8 | speak 8"));
        assert!(rendered.contains("12 | speak 12"));
        assert!(!rendered.contains("speak 7\n"));
    }

    #[test]
    fn test_render_out_of_range() {
        assert_eq!(render_source_context("speak 1", 0, 1), "");
        assert_eq!(render_source_context("speak 1", 5, 1), "");
    }

    #[test]
    fn test_first_code_column() {
        let source = "while true\n    speak 1";
        assert_eq!(first_code_column(source, 2), Some(5));
        assert_eq!(first_code_column(source, 1), Some(1));
        assert_eq!(first_code_column(source, 0), None);
        assert_eq!(first_code_column(source, 3), None);
    }
}
