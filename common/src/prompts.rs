//! プロンプト生成モジュール
//!
//! AI判定APIに送る検査指示:
//! - CONDITION_DESCRIPTIONS: 品質区分と判定基準
//! - build_inspection_prompt: 検査用プロンプト

use crate::types::ConditionCategory;

/// 品質区分ごとの判定基準（プロンプトに埋め込む）
pub const CONDITION_DESCRIPTIONS: &[(ConditionCategory, &str)] = &[
    (ConditionCategory::Excellent, "Perfect specimen, no flaws, ideal ripeness"),
    (ConditionCategory::Good, "Minor cosmetic imperfections only, fresh and edible"),
    (ConditionCategory::Fair, "Some defects present, edible but declining quality"),
    (ConditionCategory::Poor, "Significant problems, questionable, use immediately"),
    (ConditionCategory::Bad, "Severely damaged, rotten, or unsafe to eat - must discard"),
    (ConditionCategory::InsectDamaged, "Clear pest damage such as holes, tunnels or bite marks"),
];

/// 検査用プロンプト生成
///
/// 果物の特定・欠陥列挙・6区分への分類・熟度と安全性・予防策と保存方法を
/// 単一のJSONオブジェクトで返すよう指示する
pub fn build_inspection_prompt() -> String {
    let categories = CONDITION_DESCRIPTIONS
        .iter()
        .map(|(category, description)| format!("- {}: {}", category.as_str(), description))
        .collect::<Vec<_>>()
        .join("\n");

    let category_choices = ConditionCategory::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join("/");

    format!(
        r#"You are a professional fruit quality inspector. Examine this fruit image with extreme attention to detail.

## Inspection checklist
1. Fruit identification: what exact type (and variety, if identifiable) of fruit is this?
2. Surface condition: examine the entire visible surface for ANY imperfections.
3. Color assessment: is the color natural and healthy for this fruit type?
4. Texture: is the skin smooth, wrinkled, or damaged?

## Defects to look for
- Brown spots or discoloration (rot/decay)
- Black spots or dark patches (mold, severe damage)
- Holes or punctures (insect or physical damage)
- Soft spots or indentations (bruising, overripeness)
- Wrinkled or shriveled skin (aging, dehydration)
- Fuzzy patches or unusual growths (mold)
- Bite marks or chewed areas (pest damage)

## Condition categories (choose exactly one)
{categories}

Be strict: if you see ANY sign of decay, rot, mold or damage, classify accordingly.

## Also provide
- Ripeness and whether the fruit is safe to eat
- Prevention tips for the issues found
- Storage recommendations and the action required

## Output format (a single JSON object, nothing else)
{{
    "fruit_type": "exact fruit name",
    "condition_category": "{category_choices}",
    "confidence_score": 90,
    "detailed_analysis": "description of what you observe",
    "defects_found": ["every defect you see"],
    "disease_identification": "specific disease if any",
    "ripeness": "under-ripe/perfectly-ripe/ripe/overripe/rotten",
    "freshness_score": 85,
    "safety_assessment": "safe/questionable/unsafe to eat",
    "prevention_tips": ["how to prevent this condition"],
    "storage_advice": "best storage method for this fruit",
    "shelf_life": "estimated days remaining",
    "action_required": "consume normally/use within days/remove from batch/discard"
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_all_categories() {
        let prompt = build_inspection_prompt();
        for category in ConditionCategory::ALL {
            assert!(prompt.contains(category.as_str()), "{} が含まれていない", category);
        }
        assert!(prompt.contains("EXCELLENT/GOOD/FAIR/POOR/BAD/INSECT_DAMAGED"));
    }

    #[test]
    fn test_prompt_requests_json_schema() {
        let prompt = build_inspection_prompt();
        assert!(prompt.contains("\"condition_category\""));
        assert!(prompt.contains("\"prevention_tips\""));
        assert!(prompt.contains("\"storage_advice\""));
        assert!(prompt.contains("single JSON object"));
    }
}
