//! コンソール表示用の整形

use fruit_inspect_common::{AnalysisResult, Comparison, Condition, ResultSource, VerdictOrigin};

/// 判定の見出し（絵文字付き）
pub fn headline(condition: Condition) -> &'static str {
    match condition {
        Condition::Excellent => "🌟 EXCELLENT - 最高品質",
        Condition::Good => "✅ GOOD - 新鮮",
        Condition::Fair => "⚠️ FAIR - 要観察",
        Condition::Poor => "⚠️ POOR - すぐに消費",
        Condition::Bad => "🚫 BAD - 食べないでください",
        Condition::InsectDamaged => "🐛 INSECT DAMAGED - 取り除いてください",
        Condition::ConflictingResults => "❓ CONFLICTING RESULTS - 手動で確認してください",
    }
}

pub fn format_result(result: &AnalysisResult) -> String {
    let mut lines = Vec::new();

    lines.push(headline(result.condition).to_string());
    lines.push(format!("  果物: {}", result.fruit_type));
    lines.push(format!("  信頼度: {:.1}%", result.confidence));
    lines.push(format!("  鮮度: {:.1}", result.freshness_score));

    let source = match (&result.source, result.remote.as_ref().map(|r| r.origin)) {
        (ResultSource::Remote, Some(VerdictOrigin::KeywordFallback)) => "AI判定（キーワード推定）",
        (ResultSource::Remote, _) => "AI判定",
        (ResultSource::Local, _) => "ローカル解析のみ",
    };
    lines.push(format!("  判定根拠: {}", source));

    if result.needs_manual_review {
        lines.push("  ⚠ AI判定と画像解析が食い違っています".to_string());
    }

    if !result.description.is_empty() {
        lines.push(format!("  所見: {}", result.description));
    }
    if !result.defects.is_empty() {
        lines.push(format!("  欠陥: {}", result.defects.join(", ")));
    }

    let local = &result.local;
    lines.push("  ローカル解析:".to_string());
    lines.push(format!("    褐変 {:.2}% / 黒斑 {:.2}%", local.brown_rot_percentage, local.black_spots_percentage));
    lines.push(format!(
        "    色むら {:.2} / テクスチャ {:.2} / 形状 {:.2}",
        local.color_variance, local.texture_score, local.shape_integrity
    ));

    lines.push(format!("  対応: {}", result.action_required));
    lines.push(format!("  保存: {}", result.storage_advice));
    if let Some(shelf_life) = &result.shelf_life {
        lines.push(format!("  日持ち: {}", shelf_life));
    }
    if !result.prevention_tips.is_empty() {
        lines.push("  予防策:".to_string());
        for tip in &result.prevention_tips {
            lines.push(format!("    - {}", tip));
        }
    }

    lines.join("\n")
}

pub fn format_comparison(comparison: &Comparison) -> String {
    let mut lines = vec![format!("全体傾向: {}", comparison.trend)];

    for row in &comparison.rows {
        let marker = if row.changed { "*" } else { " " };
        lines.push(format!("{} {:<12} {:>24} → {}", marker, row.metric, row.before, row.after));
    }

    lines.push("所見:".to_string());
    for insight in &comparison.insights {
        lines.push(format!("  • {}", insight));
    }

    lines.join("\n")
}
