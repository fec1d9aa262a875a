//! 2回の判定結果の比較（保管前後など）

use crate::types::AnalysisResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 鮮度差がこれを超えたら改善/劣化とみなす
pub const TREND_THRESHOLD: f64 = 10.0;

/// 鮮度差がこれを超えたら大きな変化として所見に含める
pub const SIGNIFICANT_CHANGE: f64 = 20.0;

/// 比較後の鮮度がこれ未満なら即時対応
pub const URGENT_FRESHNESS: f64 = 50.0;

/// 全体の傾向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Improved,
    Degraded,
    Similar,
}

impl Trend {
    pub fn from_delta(freshness_delta: f64) -> Self {
        if freshness_delta > TREND_THRESHOLD {
            Trend::Improved
        } else if freshness_delta < -TREND_THRESHOLD {
            Trend::Degraded
        } else {
            Trend::Similar
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Improved => "IMPROVED",
            Trend::Degraded => "DEGRADED",
            Trend::Similar => "SIMILAR",
        };
        f.write_str(s)
    }
}

/// 比較表の1行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub metric: String,
    pub before: String,
    pub after: String,
    pub changed: bool,
}

impl ComparisonRow {
    fn new(metric: &str, before: String, after: String) -> Self {
        let changed = before != after;
        Self {
            metric: metric.to_string(),
            before,
            after,
            changed,
        }
    }
}

/// 比較結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub trend: Trend,
    pub freshness_delta: f64,
    pub confidence_delta: f64,
    /// 欠陥数の増減（正なら増加）
    pub defect_delta: i64,
    pub rows: Vec<ComparisonRow>,
    pub insights: Vec<String>,
}

/// 2つの判定結果を比較
pub fn compare(before: &AnalysisResult, after: &AnalysisResult) -> Comparison {
    let freshness_delta = after.freshness_score - before.freshness_score;
    let confidence_delta = after.confidence - before.confidence;
    let defect_delta = after.defects.len() as i64 - before.defects.len() as i64;

    let rows = vec![
        ComparisonRow::new("Fruit Type", before.fruit_type.clone(), after.fruit_type.clone()),
        ComparisonRow::new(
            "Condition",
            before.condition.label().to_string(),
            after.condition.label().to_string(),
        ),
        ComparisonRow::new(
            "Freshness",
            format!("{:.0}%", before.freshness_score),
            format!("{:.0}%", after.freshness_score),
        ),
        ComparisonRow::new(
            "Confidence",
            format!("{:.0}%", before.confidence),
            format!("{:.0}%", after.confidence),
        ),
        ComparisonRow::new("Safety", before.safety.clone(), after.safety.clone()),
        ComparisonRow::new(
            "Ripeness",
            before.ripeness.as_str().to_string(),
            after.ripeness.as_str().to_string(),
        ),
        ComparisonRow::new(
            "Defects",
            before.defects.len().to_string(),
            after.defects.len().to_string(),
        ),
    ];

    Comparison {
        trend: Trend::from_delta(freshness_delta),
        freshness_delta,
        confidence_delta,
        defect_delta,
        rows,
        insights: insights(before, after, freshness_delta, defect_delta),
    }
}

fn insights(
    before: &AnalysisResult,
    after: &AnalysisResult,
    freshness_delta: f64,
    defect_delta: i64,
) -> Vec<String> {
    let mut insights = Vec::new();

    if freshness_delta < -SIGNIFICANT_CHANGE {
        insights.push(format!(
            "Significant quality deterioration detected ({:.0}% decrease)",
            freshness_delta.abs()
        ));
    } else if freshness_delta > SIGNIFICANT_CHANGE {
        insights.push(format!(
            "Quality has improved significantly ({:.0}% increase)",
            freshness_delta
        ));
    }

    if defect_delta > 0 {
        insights.push(format!("{} new defects have appeared", defect_delta));
    } else if defect_delta < 0 {
        insights.push(format!("{} defects have been resolved", defect_delta.abs()));
    }

    if before.safety != after.safety {
        insights.push(format!(
            "Safety status changed from {} to {}",
            before.safety, after.safety
        ));
    }

    if after.freshness_score < URGENT_FRESHNESS {
        insights.push("Immediate action required - fruit quality is poor".into());
    } else if freshness_delta < -TREND_THRESHOLD {
        insights.push("Consider using the fruit soon as quality is declining".into());
    }

    if insights.is_empty() {
        insights.push("No significant changes detected between samples".into());
    }
    insights
}
