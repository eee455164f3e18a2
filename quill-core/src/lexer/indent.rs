//! 缩进测量
//!
//! 每次 `tokenize` 调用持有一个 [`IndentTracker`]。`Detect` 模式下
//! 第一个有缩进的代码行决定单位，之后的行都按该单位检查。

use super::error::{LexError, LexErrorKind};
use quill_config::IndentUnit;

/// 未确定单位时注释行按此宽度估算层级
const FALLBACK_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolved {
    Spaces(usize),
    Tabs,
}

impl Resolved {
    fn describe(self) -> String {
        match self {
            Resolved::Spaces(1) => "1 space per level".to_string(),
            Resolved::Spaces(width) => format!("{width} spaces per level"),
            Resolved::Tabs => "tabs".to_string(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct IndentTracker {
    unit: Option<Resolved>,
}

impl IndentTracker {
    pub(crate) fn new(unit: IndentUnit) -> Self {
        let unit = match unit {
            IndentUnit::Spaces(width) => Some(Resolved::Spaces(width.max(1))),
            IndentUnit::Tabs => Some(Resolved::Tabs),
            IndentUnit::Detect => None,
        };
        Self { unit }
    }

    /// 计算一行的缩进层级；`prefix` 为行首的空白
    pub(crate) fn measure(
        &mut self,
        prefix: &str,
        line: usize,
        is_comment: bool,
    ) -> Result<usize, LexError> {
        let tabs = prefix.chars().filter(|c| *c == '\t').count();
        let spaces = prefix.chars().filter(|c| *c == ' ').count();

        if is_comment {
            return Ok(self.lenient_level(tabs, spaces));
        }
        if tabs == 0 && spaces == 0 {
            return Ok(0);
        }
        if tabs > 0 && spaces > 0 {
            return Err(self.inconsistent(line, "a mix of tabs and spaces".to_string()));
        }

        let unit = match self.unit {
            Some(unit) => unit,
            None => {
                let detected = if tabs > 0 {
                    Resolved::Tabs
                } else {
                    Resolved::Spaces(spaces)
                };
                self.unit = Some(detected);
                detected
            }
        };

        match unit {
            Resolved::Tabs if spaces > 0 => {
                Err(self.inconsistent(line, format!("{spaces} spaces")))
            }
            Resolved::Tabs => Ok(tabs),
            Resolved::Spaces(_) if tabs > 0 => Err(self.inconsistent(line, "a tab".to_string())),
            Resolved::Spaces(width) if spaces % width != 0 => {
                Err(self.inconsistent(line, format!("{spaces} spaces")))
            }
            Resolved::Spaces(width) => Ok(spaces / width),
        }
    }

    fn lenient_level(&self, tabs: usize, spaces: usize) -> usize {
        let width = match self.unit {
            Some(Resolved::Spaces(width)) => width,
            _ => FALLBACK_WIDTH,
        };
        tabs + spaces / width
    }

    fn inconsistent(&self, line: usize, found: String) -> LexError {
        let expected = self
            .unit
            .map(Resolved::describe)
            .unwrap_or_else(|| "a single indentation character".to_string());
        LexError::at(LexErrorKind::InconsistentIndent { expected, found }, line, 1)
    }
}
