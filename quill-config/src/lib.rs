//! Quill Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! The tokenizer, parser and resolver all read the same `FrontendConfig`,
//! so the indentation unit is decided in exactly one place.

use serde::{Deserialize, Serialize};

/// How one level of indentation is written in a source unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndentUnit {
    /// A fixed number of spaces per level
    Spaces(usize),
    /// One tab per level
    Tabs,
    /// Adopt whatever the first indented line uses, then enforce it
    Detect,
}

/// Configuration for the tokenizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexerConfig {
    pub indent: IndentUnit,
}

/// Configuration for the sentence parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Treat the first rejected sentence as fatal instead of recording and continuing
    pub escalate_rejections: bool,
    /// Deepest block nesting accepted before parsing is abandoned
    pub max_nesting_depth: usize,
}

/// Configuration for operand resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Identifiers used as values must be declared earlier in the unit
    pub require_declared_names: bool,
}

/// Everything the front-end stages read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub lexer: LexerConfig,
    pub parser: ParserConfig,
    pub resolver: ResolverConfig,
}

impl FrontendConfig {
    /// Parse a configuration object; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Front-end phase, used to route logs and label errors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Tokenizer,
    Parser,
    Resolver,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Tokenizer, Phase::Parser, Phase::Resolver];

    /// Get the string name of the phase
    pub const fn as_str(&self) -> &'static str {
        match self {
            Phase::Tokenizer => "tokenizer",
            Phase::Parser => "parser",
            Phase::Resolver => "resolver",
        }
    }

    /// Get the log target name for this phase
    pub const fn target(&self) -> &'static str {
        match self {
            Phase::Tokenizer => "quill::tokenizer",
            Phase::Parser => "quill::parser",
            Phase::Resolver => "quill::resolver",
        }
    }
}

impl Default for IndentUnit {
    fn default() -> Self {
        IndentUnit::Spaces(4)
    }
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            indent: IndentUnit::default(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            escalate_rejections: false,
            max_nesting_depth: 64,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            require_declared_names: true,
        }
    }
}
