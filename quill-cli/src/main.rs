//! Quill CLI - Command line interface
//!
//! Project-based checking - all configuration from quill.json

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;

mod config;
mod logging;
mod platform;

use crate::config::{parse_log_format, Emit, LogConfig, QuillJson};
use crate::logging::{quill_level, TracingSink, CLI_TARGET};
use crate::platform::{print_diagnostic_with_source, print_error_with_source};
use quill_api::{compile, CompileConfig, CompileOutput};
use quill_log::Logger;

#[derive(Parser)]
#[command(
    name = "quill",
    about = "Quill sentence language - checks a project's entry file",
    version
)]
struct Cli {
    /// Configuration file path (default: ./quill.json)
    #[arg(value_name = "CONFIG", default_value = "quill.json")]
    config: PathBuf,

    /// Override the `emit` field of the configuration
    #[arg(long, value_enum)]
    emit: Option<Emit>,
}

fn main() {
    let cli = Cli::parse();

    // Read quill.json
    let project = match read_quill_json(&cli.config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    // Resolve entry file path (relative to quill.json directory)
    let entry_path = resolve_entry_path(&cli.config, &project.entry);

    let source = match std::fs::read_to_string(&entry_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!(
                "Error: Cannot read entry file '{}': {}",
                entry_path.display(),
                e
            );
            process::exit(1);
        }
    };

    let log_config = LogConfig::from_project(&project);
    let format = project
        .log_format
        .as_deref()
        .and_then(parse_log_format)
        .unwrap_or_default();
    logging::init(&log_config, format);

    let logger = Logger::new(quill_level(log_config.most_verbose())).with_sink(TracingSink);
    let config = CompileConfig::new(project.frontend.clone()).with_logger(logger);
    let emit = cli.emit.or(project.emit).unwrap_or_default();

    tracing::info!(target: CLI_TARGET, entry = %entry_path.display(), "Checking entry file");

    match compile(&source, &config) {
        Ok(output) => {
            if let Err(e) = emit_output(&output, emit) {
                eprintln!("Error: Cannot serialize output: {}", e);
                process::exit(1);
            }
            for diagnostic in &output.diagnostics {
                print_diagnostic_with_source(diagnostic, &source);
            }
            if output.has_errors() {
                process::exit(1);
            }
            if emit == Emit::Diagnostics {
                println!(
                    "✅ {}: {} sentences, no errors",
                    entry_path.display(),
                    output.tree.sentences().len()
                );
            }
        }
        Err(e) => {
            print_error_with_source(&e, &source);
            for diagnostic in e.diagnostics().iter().filter(|d| d.line != e.line()) {
                print_diagnostic_with_source(diagnostic, &source);
            }
            process::exit(1);
        }
    }
}

/// Read and parse quill.json
fn read_quill_json(path: &Path) -> Result<QuillJson, String> {
    if !path.exists() {
        return Err(format!(
            "未找到 '{}'\n\n当前目录不是一个 Quill 项目。\n提示: 创建 '{}' 文件并指定 'entry' 字段",
            path.display(),
            path.display()
        ));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("无法读取 '{}': {}", path.display(), e))?;

    let project: QuillJson = serde_json::from_str(&content)
        .map_err(|e| format!("解析 '{}' 失败: {}", path.display(), e))?;

    if project.entry.is_empty() {
        return Err(format!("'{}' 中的 'entry' 字段不能为空", path.display()));
    }

    Ok(project)
}

/// Resolve entry file path relative to quill.json directory
fn resolve_entry_path(config_path: &Path, entry: &str) -> PathBuf {
    let base_dir = config_path.parent().unwrap_or(Path::new("."));
    base_dir.join(entry)
}

/// 按 `emit` 把编译产物以 JSON 输出到 stdout
fn emit_output(output: &CompileOutput, emit: Emit) -> serde_json::Result<()> {
    let json = match emit {
        Emit::Diagnostics => return Ok(()),
        Emit::Tokens => serde_json::to_string_pretty(&output.tokens)?,
        Emit::Tree => serde_json::to_string_pretty(&output.tree)?,
        Emit::Resolved => serde_json::to_string_pretty(&output.resolved)?,
    };
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_entry_path() {
        let path = resolve_entry_path(Path::new("project/quill.json"), "src/main.ql");
        assert_eq!(path, PathBuf::from("project/src/main.ql"));

        let path = resolve_entry_path(Path::new("quill.json"), "main.ql");
        assert_eq!(path, PathBuf::from("main.ql"));
    }

    #[test]
    fn test_missing_config() {
        let err = read_quill_json(Path::new("definitely/not/here/quill.json")).unwrap_err();
        assert!(err.contains("quill.json"));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["quill"]);
        assert_eq!(cli.config, PathBuf::from("quill.json"));
        assert_eq!(cli.emit, None);

        let cli = Cli::parse_from(["quill", "demo/quill.json", "--emit", "tree"]);
        assert_eq!(cli.config, PathBuf::from("demo/quill.json"));
        assert_eq!(cli.emit, Some(Emit::Tree));
    }
}
