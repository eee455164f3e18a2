//! CLI 配置
//!
//! `quill.json` 的结构，以及由它推导出的分阶段日志配置。

use clap::ValueEnum;
use quill_config::{FrontendConfig, Phase};
use serde::Deserialize;
use tracing::Level;

use crate::logging::LogFormat;

/// quill.json 结构
#[derive(Debug, Deserialize)]
pub struct QuillJson {
    /// 入口文件路径（相对 quill.json 所在目录）
    pub entry: String,
    /// 前端配置，缺省字段取默认值
    #[serde(default)]
    pub frontend: FrontendConfig,
    /// 检查通过后输出什么
    pub emit: Option<Emit>,
    /// 日志级别: "silent", "error", "warn", "info", "debug", "trace"
    pub log_level: Option<String>,
    /// 日志格式: "pretty", "compact", "json"
    pub log_format: Option<String>,
    /// 按阶段覆盖日志级别
    #[serde(default)]
    pub log_targets: PhaseLevels,
}

/// 输出内容
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Emit {
    /// 只打印诊断
    #[default]
    Diagnostics,
    /// token 流（JSON）
    Tokens,
    /// 句子树（JSON）
    Tree,
    /// 已解析指令树（JSON）
    Resolved,
}

#[derive(Debug, Default, Deserialize)]
pub struct PhaseLevels {
    pub tokenizer: Option<String>,
    pub parser: Option<String>,
    pub resolver: Option<String>,
}

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `None` 表示静默
    pub global: Option<Level>,
    pub tokenizer: Option<Level>,
    pub parser: Option<Level>,
    pub resolver: Option<Level>,
}

impl LogConfig {
    pub fn from_project(project: &QuillJson) -> Self {
        let global = match project.log_level.as_deref() {
            Some(name) => parse_log_level(name).unwrap_or(Some(Level::WARN)),
            None => Some(Level::WARN),
        };
        let phase = |name: &Option<String>| name.as_deref().and_then(parse_log_level).flatten();

        Self {
            global,
            tokenizer: phase(&project.log_targets.tokenizer),
            parser: phase(&project.log_targets.parser),
            resolver: phase(&project.log_targets.resolver),
        }
    }

    /// Get log level for a specific target
    pub fn level_for(&self, target: &str) -> Option<Level> {
        let phase = Phase::ALL.into_iter().find(|p| p.target() == target);
        let specific = match phase {
            Some(Phase::Tokenizer) => self.tokenizer,
            Some(Phase::Parser) => self.parser,
            Some(Phase::Resolver) => self.resolver,
            None => None,
        };
        specific.or(self.global)
    }

    /// 所有 target 中最详细的级别，用来设置 quill-log 的门槛
    pub fn most_verbose(&self) -> Option<Level> {
        [self.global, self.tokenizer, self.parser, self.resolver]
            .into_iter()
            .flatten()
            .max()
    }
}

/// 解析日志级别；`Some(None)` 表示 silent
pub fn parse_log_level(name: &str) -> Option<Option<Level>> {
    match name.to_lowercase().as_str() {
        "silent" | "off" => Some(None),
        "error" => Some(Some(Level::ERROR)),
        "warn" => Some(Some(Level::WARN)),
        "info" => Some(Some(Level::INFO)),
        "debug" => Some(Some(Level::DEBUG)),
        "trace" => Some(Some(Level::TRACE)),
        _ => None,
    }
}

pub fn parse_log_format(name: &str) -> Option<LogFormat> {
    match name.to_lowercase().as_str() {
        "pretty" => Some(LogFormat::Pretty),
        "compact" => Some(LogFormat::Compact),
        "json" => Some(LogFormat::Json),
        _ => None,
    }
}
