//! 判定結果の型定義
//!
//! CLIとUI側で共有される型:
//! - LocalMetrics: ローカル画像解析の計測値
//! - RemoteVerdict: AI判定（パース済み）
//! - AnalysisResult: 最終出力（ローカル + AI を統合）

use serde::{Deserialize, Serialize};
use std::fmt;

/// AIが返す品質区分（6種）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionCategory {
    Excellent,
    Good,
    Fair,
    Poor,
    Bad,
    InsectDamaged,
}

impl ConditionCategory {
    pub const ALL: [ConditionCategory; 6] = [
        ConditionCategory::Excellent,
        ConditionCategory::Good,
        ConditionCategory::Fair,
        ConditionCategory::Poor,
        ConditionCategory::Bad,
        ConditionCategory::InsectDamaged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionCategory::Excellent => "EXCELLENT",
            ConditionCategory::Good => "GOOD",
            ConditionCategory::Fair => "FAIR",
            ConditionCategory::Poor => "POOR",
            ConditionCategory::Bad => "BAD",
            ConditionCategory::InsectDamaged => "INSECT_DAMAGED",
        }
    }

    /// AI応答の区分文字列を解釈する
    ///
    /// 大文字小文字・空白・ハイフンの揺れを吸収する（"insect damaged" → InsectDamaged）
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value
            .trim()
            .to_uppercase()
            .replace([' ', '-'], "_");

        match normalized.as_str() {
            "EXCELLENT" => Some(ConditionCategory::Excellent),
            "GOOD" => Some(ConditionCategory::Good),
            "FAIR" => Some(ConditionCategory::Fair),
            "POOR" => Some(ConditionCategory::Poor),
            "BAD" => Some(ConditionCategory::Bad),
            "INSECT_DAMAGED" | "INSECT_DAMAGE" | "INSECT" => Some(ConditionCategory::InsectDamaged),
            _ => None,
        }
    }

    /// 良好判定（EXCELLENT / GOOD）
    pub fn is_favorable(&self) -> bool {
        matches!(self, ConditionCategory::Excellent | ConditionCategory::Good)
    }

    /// 不良判定（POOR / BAD）
    pub fn is_unfavorable(&self) -> bool {
        matches!(self, ConditionCategory::Poor | ConditionCategory::Bad)
    }
}

impl fmt::Display for ConditionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 最終判定の状態
///
/// 6区分に加え、AIとローカル解析が食い違った場合の `ConflictingResults` を持つ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    Excellent,
    Good,
    Fair,
    Poor,
    Bad,
    InsectDamaged,
    ConflictingResults,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Condition::ConflictingResults => "CONFLICTING_RESULTS",
            other => other
                .category()
                .map(|c| c.as_str())
                .unwrap_or("UNKNOWN"),
        }
    }

    /// 対応する6区分（競合状態は None）
    pub fn category(&self) -> Option<ConditionCategory> {
        match self {
            Condition::Excellent => Some(ConditionCategory::Excellent),
            Condition::Good => Some(ConditionCategory::Good),
            Condition::Fair => Some(ConditionCategory::Fair),
            Condition::Poor => Some(ConditionCategory::Poor),
            Condition::Bad => Some(ConditionCategory::Bad),
            Condition::InsectDamaged => Some(ConditionCategory::InsectDamaged),
            Condition::ConflictingResults => None,
        }
    }
}

impl From<ConditionCategory> for Condition {
    fn from(category: ConditionCategory) -> Self {
        match category {
            ConditionCategory::Excellent => Condition::Excellent,
            ConditionCategory::Good => Condition::Good,
            ConditionCategory::Fair => Condition::Fair,
            ConditionCategory::Poor => Condition::Poor,
            ConditionCategory::Bad => Condition::Bad,
            ConditionCategory::InsectDamaged => Condition::InsectDamaged,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 熟度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ripeness {
    UnderRipe,
    PerfectlyRipe,
    Ripe,
    Overripe,
    Rotten,
    #[default]
    Unknown,
}

impl Ripeness {
    /// AI応答の熟度文字列を解釈する（不明な値は Unknown）
    pub fn parse(value: &str) -> Self {
        let normalized = value.trim().to_lowercase().replace([' ', '_'], "-");

        match normalized.as_str() {
            "under-ripe" | "underripe" | "unripe" => Ripeness::UnderRipe,
            "perfectly-ripe" => Ripeness::PerfectlyRipe,
            "ripe" => Ripeness::Ripe,
            "overripe" | "over-ripe" => Ripeness::Overripe,
            "rotten" => Ripeness::Rotten,
            _ => Ripeness::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Ripeness::UnderRipe => "under-ripe",
            Ripeness::PerfectlyRipe => "perfectly-ripe",
            Ripeness::Ripe => "ripe",
            Ripeness::Overripe => "overripe",
            Ripeness::Rotten => "rotten",
            Ripeness::Unknown => "unknown",
        }
    }
}

/// ローカル画像解析の計測値
///
/// 割合は全画素数に対する百分率なので解像度に依存しない。
/// `color_variance` のみ百分率ではなく生の標準偏差スコア。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalMetrics {
    pub brown_rot_percentage: f64,
    pub black_spots_percentage: f64,
    pub color_variance: f64,
    pub texture_score: f64,
    pub shape_integrity: f64,
    pub freshness_score: f64,
}

impl LocalMetrics {
    /// 値域を保証したコピーを返す（百分率は [0,100]、分散は 0 以上）
    pub fn clamped(self) -> Self {
        Self {
            brown_rot_percentage: clamp_percentage(self.brown_rot_percentage),
            black_spots_percentage: clamp_percentage(self.black_spots_percentage),
            color_variance: if self.color_variance.is_finite() {
                self.color_variance.max(0.0)
            } else {
                0.0
            },
            texture_score: clamp_percentage(self.texture_score),
            shape_integrity: clamp_percentage(self.shape_integrity),
            freshness_score: clamp_percentage(self.freshness_score),
        }
    }

    /// 劣化スコア: 褐変率と黒斑率の重み付き和
    pub fn badness(&self, brown_weight: f64, black_weight: f64) -> f64 {
        self.brown_rot_percentage * brown_weight + self.black_spots_percentage * black_weight
    }
}

/// 百分率を [0,100] に収める（NaN は 0）
pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// 小数第2位で丸める
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// AI判定の出どころ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictOrigin {
    /// JSONとして解釈できた応答
    #[default]
    Structured,
    /// JSONが壊れていたためキーワード判定で合成した応答
    KeywordFallback,
}

/// AI判定（パース境界で既定値を埋めた厳密な型）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteVerdict {
    pub fruit_type: String,
    pub condition_category: ConditionCategory,
    pub confidence_score: f64,
    #[serde(default)]
    pub defects_found: Vec<String>,
    #[serde(default)]
    pub ripeness: Ripeness,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_score: Option<f64>,
    pub safety_assessment: String,
    #[serde(default)]
    pub prevention_tips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_advice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_required: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease_identification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf_life: Option<String>,
    #[serde(default)]
    pub origin: VerdictOrigin,
}

/// 最終判定の主な根拠
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultSource {
    /// AI判定を主としたもの
    Remote,
    /// ローカル解析のみ（AI判定なし）
    Local,
}

/// 最終判定結果
///
/// 1回の解析につき1つ生成され、以後変更されない
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub condition: Condition,
    pub confidence: f64,
    pub fruit_type: String,
    #[serde(default)]
    pub description: String,
    pub freshness_score: f64,
    #[serde(default)]
    pub safety: String,
    #[serde(default)]
    pub ripeness: Ripeness,
    #[serde(default)]
    pub defects: Vec<String>,
    pub source: ResultSource,
    #[serde(default)]
    pub needs_manual_review: bool,
    pub local: LocalMetrics,
    #[serde(default)]
    pub remote: Option<RemoteVerdict>,
    #[serde(default)]
    pub prevention_tips: Vec<String>,
    #[serde(default)]
    pub action_required: String,
    #[serde(default)]
    pub storage_advice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf_life: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease_identification: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_category_parse() {
        assert_eq!(ConditionCategory::parse("EXCELLENT"), Some(ConditionCategory::Excellent));
        assert_eq!(ConditionCategory::parse(" good "), Some(ConditionCategory::Good));
        assert_eq!(
            ConditionCategory::parse("insect damaged"),
            Some(ConditionCategory::InsectDamaged)
        );
        assert_eq!(
            ConditionCategory::parse("Insect-Damaged"),
            Some(ConditionCategory::InsectDamaged)
        );
        assert_eq!(ConditionCategory::parse("UNCLEAR"), None);
        assert_eq!(ConditionCategory::parse(""), None);
    }

    #[test]
    fn test_condition_label() {
        assert_eq!(Condition::ConflictingResults.label(), "CONFLICTING_RESULTS");
        assert_eq!(Condition::InsectDamaged.label(), "INSECT_DAMAGED");
        assert_eq!(Condition::from(ConditionCategory::Bad), Condition::Bad);
        assert_eq!(Condition::ConflictingResults.category(), None);
    }

    #[test]
    fn test_condition_serialize() {
        let json = serde_json::to_string(&Condition::ConflictingResults).unwrap();
        assert_eq!(json, "\"CONFLICTING_RESULTS\"");
        let json = serde_json::to_string(&ConditionCategory::InsectDamaged).unwrap();
        assert_eq!(json, "\"INSECT_DAMAGED\"");
    }

    #[test]
    fn test_ripeness_parse() {
        assert_eq!(Ripeness::parse("under-ripe"), Ripeness::UnderRipe);
        assert_eq!(Ripeness::parse("Perfectly Ripe"), Ripeness::PerfectlyRipe);
        assert_eq!(Ripeness::parse("over_ripe"), Ripeness::Overripe);
        assert_eq!(Ripeness::parse("rotten"), Ripeness::Rotten);
        assert_eq!(Ripeness::parse("ripe/overripe"), Ripeness::Unknown);
    }

    #[test]
    fn test_local_metrics_clamped() {
        let metrics = LocalMetrics {
            brown_rot_percentage: 120.0,
            black_spots_percentage: -3.0,
            color_variance: f64::NAN,
            texture_score: f64::NAN,
            shape_integrity: 55.5,
            freshness_score: 100.0,
        }
        .clamped();

        assert_eq!(metrics.brown_rot_percentage, 100.0);
        assert_eq!(metrics.black_spots_percentage, 0.0);
        assert_eq!(metrics.color_variance, 0.0);
        assert_eq!(metrics.texture_score, 0.0);
        assert_eq!(metrics.shape_integrity, 55.5);
    }

    #[test]
    fn test_local_metrics_badness() {
        let metrics = LocalMetrics {
            brown_rot_percentage: 4.0,
            black_spots_percentage: 2.0,
            ..Default::default()
        };
        assert_eq!(metrics.badness(2.5, 3.5), 17.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.3456), 12.35);
        assert_eq!(round2(0.004), 0.0);
    }

    #[test]
    fn test_remote_verdict_deserialize_missing_optionals() {
        let json = r#"{
            "fruitType": "apple",
            "conditionCategory": "GOOD",
            "confidenceScore": 88,
            "freshnessScore": 80,
            "safetyAssessment": "safe"
        }"#;

        let verdict: RemoteVerdict = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(verdict.condition_category, ConditionCategory::Good);
        assert!(verdict.defects_found.is_empty());
        assert_eq!(verdict.ripeness, Ripeness::Unknown);
        assert_eq!(verdict.origin, VerdictOrigin::Structured);
        assert_eq!(verdict.freshness_score, Some(80.0));
        assert!(verdict.storage_advice.is_none());
    }
}
