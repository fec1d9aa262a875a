//! 果物写真の品質判定
//!
//! ローカル画像解析とAI判定を並行実行し、1つの判定結果に統合する。

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod image_loader;
pub mod overlay;
pub mod pipeline;
pub mod remote;
pub mod scanner;
pub mod vision;

pub use error::{InspectError, Result};
pub use pipeline::{AnalysisSession, Inspector};
