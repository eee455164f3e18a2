//! 测试辅助工具

#![allow(dead_code)]

use quill_api::{CompileConfig, FrontendConfig, SourceUnit};

pub const PROGRAM: &str = "\
# tally
let total be set to 0
let step be a number
    the number is 2
while total below 10
    let total be total plus step
    if total equals 6 then speak \"halfway\"
speak total
";

/// 每个单元在 PROGRAM 后追加一行
pub fn units(count: usize) -> Vec<SourceUnit> {
    (0..count)
        .map(|i| {
            let extra = if i % 3 == 2 {
                format!("speak missing{i}\n")
            } else {
                format!("speak total plus {i}\n")
            };
            SourceUnit::new(format!("unit{i}.ql"), format!("{PROGRAM}{extra}"))
        })
        .collect()
}

pub fn config_from_json(json: &str) -> CompileConfig {
    CompileConfig::new(FrontendConfig::from_json_str(json).expect("valid frontend config"))
}
