//! Fruit Inspect Common Library
//!
//! CLIとUI側で共有される型・判定ポリシー・AI応答パーサー。
//! 画像処理とネットワークには依存しない。

pub mod advice;
pub mod comparison;
pub mod error;
pub mod fusion;
pub mod parser;
pub mod prompts;
pub mod types;

pub use comparison::{compare, Comparison, ComparisonRow, Trend};
pub use error::{Error, Result};
pub use fusion::{Agreement, FusionConfig, FusionEngine, LocalLadder};
pub use parser::{classify_by_keywords, extract_json_object, parse_remote_response, parse_verdict_json};
pub use prompts::build_inspection_prompt;
pub use types::{
    AnalysisResult, Condition, ConditionCategory, LocalMetrics, RemoteVerdict, ResultSource,
    Ripeness, VerdictOrigin,
};
