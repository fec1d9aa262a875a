//! ローカル解析とAI判定の統合
//!
//! AI判定がある場合はそれを主とし、ローカルの劣化スコアと大きく食い違う場合だけ
//! 信頼度を下げる。AI判定が無い場合はローカル計測値のしきい値表で判定する。

use crate::advice;
use crate::types::{
    clamp_percentage, Condition, ConditionCategory, LocalMetrics, RemoteVerdict, ResultSource,
};
use serde::{Deserialize, Serialize};

/// 統合ポリシーの重み・しきい値
///
/// 既定値は実測から決めた参照値で、設定ファイルから上書きできる
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FusionConfig {
    /// AI判定あり: 褐変率の重み
    pub remote_brown_weight: f64,
    /// AI判定あり: 黒斑率の重み
    pub remote_black_weight: f64,
    /// これを超える劣化スコアで AI が良好判定なら競合
    pub conflict_threshold: f64,
    pub conflict_penalty: f64,
    pub conflict_floor: f64,
    /// これ未満の劣化スコアで AI が不良判定なら軽い減点
    pub disagreement_threshold: f64,
    pub disagreement_penalty: f64,
    pub disagreement_floor: f64,
    pub agreement_bonus: f64,
    pub confidence_cap: f64,

    /// AI判定なし: 褐変率の重み
    pub local_brown_weight: f64,
    /// AI判定なし: 黒斑率の重み
    pub local_black_weight: f64,
    pub ladder: LocalLadder,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            remote_brown_weight: 2.5,
            remote_black_weight: 3.5,
            conflict_threshold: 20.0,
            conflict_penalty: 15.0,
            conflict_floor: 50.0,
            disagreement_threshold: 5.0,
            disagreement_penalty: 10.0,
            disagreement_floor: 60.0,
            agreement_bonus: 5.0,
            confidence_cap: 95.0,
            local_brown_weight: 3.0,
            local_black_weight: 4.0,
            ladder: LocalLadder::default(),
        }
    }
}

/// AI判定なしの判定表（上から順に評価）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalLadder {
    pub bad_badness: f64,
    pub bad_freshness: f64,
    pub bad_confidence: f64,
    pub poor_badness: f64,
    pub poor_freshness: f64,
    pub poor_confidence: f64,
    pub fair_badness: f64,
    pub fair_freshness: f64,
    pub fair_confidence: f64,
    pub excellent_freshness: f64,
    pub excellent_badness: f64,
    pub excellent_confidence: f64,
    pub good_confidence: f64,
}

impl Default for LocalLadder {
    fn default() -> Self {
        Self {
            bad_badness: 25.0,
            bad_freshness: 30.0,
            bad_confidence: 75.0,
            poor_badness: 15.0,
            poor_freshness: 50.0,
            poor_confidence: 70.0,
            fair_badness: 8.0,
            fair_freshness: 70.0,
            fair_confidence: 65.0,
            excellent_freshness: 85.0,
            excellent_badness: 3.0,
            excellent_confidence: 80.0,
            good_confidence: 75.0,
        }
    }
}

/// AI判定とローカル解析の関係
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agreement {
    /// ローカルで明確な劣化があるのに AI が良好判定
    Conflict,
    /// ローカルはきれいなのに AI が不良判定（AI判定は維持）
    Disagreement,
    Agreement,
}

/// 統合エンジン
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// 最終判定を生成（失敗しない）
    pub fn fuse(&self, local: &LocalMetrics, remote: Option<&RemoteVerdict>) -> crate::AnalysisResult {
        let local = local.clamped();
        match remote {
            Some(verdict) => self.fuse_with_remote(&local, verdict),
            None => self.fuse_local_only(&local),
        }
    }

    /// AI判定とローカル劣化スコアの関係を分類
    pub fn classify_agreement(&self, local: &LocalMetrics, category: ConditionCategory) -> Agreement {
        let cfg = &self.config;
        let badness = local.badness(cfg.remote_brown_weight, cfg.remote_black_weight);

        if badness > cfg.conflict_threshold && category.is_favorable() {
            Agreement::Conflict
        } else if badness < cfg.disagreement_threshold && category.is_unfavorable() {
            Agreement::Disagreement
        } else {
            Agreement::Agreement
        }
    }

    fn fuse_with_remote(&self, local: &LocalMetrics, verdict: &RemoteVerdict) -> crate::AnalysisResult {
        let cfg = &self.config;
        let raw = clamp_percentage(verdict.confidence_score);
        let agreement = self.classify_agreement(local, verdict.condition_category);

        let (condition, confidence) = match agreement {
            Agreement::Conflict => (
                Condition::ConflictingResults,
                penalize(raw, cfg.conflict_penalty, cfg.conflict_floor),
            ),
            Agreement::Disagreement => (
                Condition::from(verdict.condition_category),
                penalize(raw, cfg.disagreement_penalty, cfg.disagreement_floor),
            ),
            Agreement::Agreement => (
                Condition::from(verdict.condition_category),
                (raw + cfg.agreement_bonus).min(cfg.confidence_cap),
            ),
        };

        tracing::debug!(
            "統合判定: AI={} 信頼度 {:.1} → {} {:.1} ({:?})",
            verdict.condition_category,
            raw,
            condition,
            confidence,
            agreement
        );

        let label = condition.label();
        let needs_manual_review = agreement == Agreement::Conflict;

        // 競合時の対応はAIの推奨ではなく手動確認を促す
        let action_required = if needs_manual_review {
            advice::default_action(label)
        } else {
            verdict
                .action_required
                .clone()
                .unwrap_or_else(|| advice::default_action(label))
        };

        let prevention_tips = if verdict.prevention_tips.is_empty() {
            advice::default_tips(label)
        } else {
            verdict.prevention_tips.clone()
        };

        crate::AnalysisResult {
            condition,
            confidence: round1(confidence),
            fruit_type: verdict.fruit_type.clone(),
            description: verdict
                .detailed_analysis
                .clone()
                .unwrap_or_else(|| "AI analysis completed".into()),
            freshness_score: verdict
                .freshness_score
                .map(clamp_percentage)
                .unwrap_or(local.freshness_score),
            safety: verdict.safety_assessment.clone(),
            ripeness: verdict.ripeness,
            defects: verdict.defects_found.clone(),
            source: ResultSource::Remote,
            needs_manual_review,
            local: *local,
            remote: Some(verdict.clone()),
            prevention_tips,
            action_required,
            storage_advice: verdict
                .storage_advice
                .clone()
                .unwrap_or_else(|| advice::default_storage(label)),
            shelf_life: verdict.shelf_life.clone(),
            disease_identification: verdict.disease_identification.clone(),
        }
    }

    fn fuse_local_only(&self, local: &LocalMetrics) -> crate::AnalysisResult {
        let cfg = &self.config;
        let ladder = &cfg.ladder;
        let badness = local.badness(cfg.local_brown_weight, cfg.local_black_weight);
        let freshness = local.freshness_score;

        let (category, confidence, description) =
            if badness > ladder.bad_badness || freshness < ladder.bad_freshness {
                (
                    ConditionCategory::Bad,
                    ladder.bad_confidence,
                    "Significant decay and quality issues detected.",
                )
            } else if badness > ladder.poor_badness || freshness < ladder.poor_freshness {
                (
                    ConditionCategory::Poor,
                    ladder.poor_confidence,
                    "Quality declining rapidly. Use within 24 hours.",
                )
            } else if badness > ladder.fair_badness || freshness < ladder.fair_freshness {
                (
                    ConditionCategory::Fair,
                    ladder.fair_confidence,
                    "Some quality concerns. Monitor daily.",
                )
            } else if freshness > ladder.excellent_freshness && badness < ladder.excellent_badness {
                (
                    ConditionCategory::Excellent,
                    ladder.excellent_confidence,
                    "Outstanding quality fruit.",
                )
            } else {
                (
                    ConditionCategory::Good,
                    ladder.good_confidence,
                    "Good quality fruit suitable for consumption.",
                )
            };

        tracing::debug!(
            "ローカル判定: 劣化スコア {:.2}, 鮮度 {:.2} → {}",
            badness,
            freshness,
            category
        );

        let label = category.as_str();
        let mut defects = Vec::new();
        if local.brown_rot_percentage > 0.0 {
            defects.push(format!("brown/rot areas ({:.2}%)", local.brown_rot_percentage));
        }
        if local.black_spots_percentage > 0.0 {
            defects.push(format!("black spots ({:.2}%)", local.black_spots_percentage));
        }

        crate::AnalysisResult {
            condition: Condition::from(category),
            confidence: clamp_percentage(confidence),
            fruit_type: "Unknown".into(),
            description: description.into(),
            freshness_score: freshness,
            safety: if category.is_unfavorable() {
                "questionable".into()
            } else {
                "likely safe".into()
            },
            ripeness: Default::default(),
            defects,
            source: ResultSource::Local,
            needs_manual_review: false,
            local: *local,
            remote: None,
            prevention_tips: advice::default_tips(label),
            action_required: advice::default_action(label),
            storage_advice: advice::default_storage(label),
            shelf_life: None,
            disease_identification: None,
        }
    }
}

/// 減点（下限付き）
///
/// 元の値が下限以下のときは下限で持ち上げない。結果は常に元の値未満になる。
fn penalize(raw: f64, penalty: f64, floor: f64) -> f64 {
    if raw > floor {
        (raw - penalty).max(floor)
    } else {
        (raw - penalty).max(0.0)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
