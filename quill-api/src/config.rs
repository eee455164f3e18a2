//! API 层配置
//!
//! 编译配置 `CompileConfig`：前端各阶段的配置加上显式传入的 logger。

use quill_config::FrontendConfig;
use quill_log::Logger;
use std::sync::Arc;

/// 编译配置
#[derive(Clone)]
pub struct CompileConfig {
    /// 分词、解析、操作数解析的配置
    pub frontend: FrontendConfig,
    /// Logger（默认 noop）
    pub logger: Arc<Logger>,
}

impl CompileConfig {
    pub fn new(frontend: FrontendConfig) -> Self {
        Self {
            frontend,
            logger: Logger::noop(),
        }
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = logger;
        self
    }
}

impl std::fmt::Debug for CompileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileConfig")
            .field("frontend", &self.frontend)
            .field("log_level", &self.logger.level())
            .finish()
    }
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self::new(FrontendConfig::default())
    }
}
