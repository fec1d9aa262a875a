//! AI応答パーサー
//!
//! AI判定APIの応答テキストからJSONオブジェクトを抽出して RemoteVerdict に変換する。
//! JSONとして解釈できない応答はキーワード判定にフォールバックする。

use crate::error::{Error, Result};
use crate::types::{clamp_percentage, ConditionCategory, RemoteVerdict, Ripeness, VerdictOrigin};
use regex::Regex;
use serde_json::{Map, Value};

/// 信頼度が返らなかった場合の既定値
pub const DEFAULT_CONFIDENCE: f64 = 50.0;
/// 品質区分が無い・読めない場合の既定値
pub const DEFAULT_CATEGORY: ConditionCategory = ConditionCategory::Fair;

/// 説明文の抜粋長（キーワード判定時）
const EXCERPT_CHARS: usize = 200;

/// 応答テキストから最初の釣り合った `{...}` を抽出
///
/// コードフェンス（```json / ```）は先に除去する。
/// 文字列リテラル内の括弧は数えない。
///
/// # Examples
/// ```
/// use fruit_inspect_common::extract_json_object;
///
/// let response = "Result:\n```json\n{\"fruit_type\": \"apple\"}\n```";
/// let json = extract_json_object(response).unwrap();
/// assert_eq!(json, "{\"fruit_type\": \"apple\"}");
/// ```
pub fn extract_json_object(response: &str) -> Result<String> {
    let cleaned = response
        .replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "");

    let start = cleaned
        .find('{')
        .ok_or_else(|| Error::Parse("JSONオブジェクトが見つかりません".into()))?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in cleaned[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset;
                    return Ok(cleaned[start..=end].to_string());
                }
            }
            _ => {}
        }
    }

    Err(Error::Parse("JSONオブジェクトが閉じていません".into()))
}

/// 応答テキストを構造化JSONとしてパース
///
/// JSONとして読めない場合のみエラー。区分が無い・読めない場合は FAIR
pub fn parse_verdict_json(response: &str) -> Result<RemoteVerdict> {
    let json_str = extract_json_object(response)?;
    let value: Value = serde_json::from_str(&json_str)
        .map_err(|e| Error::Parse(format!("判定JSONパースエラー: {}", e)))?;
    let obj = value
        .as_object()
        .ok_or_else(|| Error::Parse("判定JSONがオブジェクトではありません".into()))?;

    let condition_category = text_field(obj, "condition_category")
        .and_then(|text| resolve_category(&text))
        .unwrap_or(DEFAULT_CATEGORY);

    Ok(RemoteVerdict {
        fruit_type: text_field(obj, "fruit_type").unwrap_or_else(|| "Unknown".into()),
        condition_category,
        confidence_score: number_field(obj, "confidence_score")
            .map(clamp_percentage)
            .unwrap_or(DEFAULT_CONFIDENCE),
        defects_found: list_field(obj, "defects_found"),
        ripeness: text_field(obj, "ripeness")
            .map(|r| Ripeness::parse(&r))
            .unwrap_or_default(),
        freshness_score: number_field(obj, "freshness_score").map(clamp_percentage),
        safety_assessment: text_field(obj, "safety_assessment")
            .unwrap_or_else(|| "questionable".into()),
        prevention_tips: list_field(obj, "prevention_tips"),
        storage_advice: text_field(obj, "storage_advice")
            .or_else(|| text_field(obj, "storage_method")),
        action_required: text_field(obj, "action_required"),
        detailed_analysis: text_field(obj, "detailed_analysis"),
        disease_identification: text_field(obj, "disease_identification"),
        shelf_life: text_field(obj, "shelf_life"),
        origin: VerdictOrigin::Structured,
    })
}

/// 区分文字列を6区分に対応付ける（"GOOD (minor blemishes)" → Good）
fn resolve_category(text: &str) -> Option<ConditionCategory> {
    if let Some(category) = ConditionCategory::parse(text) {
        return Some(category);
    }

    let normalized = text.to_uppercase().replace([' ', '-'], "_");
    if normalized.contains("INSECT") {
        return Some(ConditionCategory::InsectDamaged);
    }
    let found = ConditionCategory::ALL
        .into_iter()
        .find(|c| normalized.contains(c.as_str()));
    if found.is_none() {
        tracing::debug!("品質区分を解釈できないため FAIR とします: {}", text);
    }
    found
}

/// AI応答をパース（JSONが壊れていればキーワード判定）
///
/// 通信に成功した応答は必ず何らかの RemoteVerdict になる
pub fn parse_remote_response(response: &str) -> RemoteVerdict {
    match parse_verdict_json(response) {
        Ok(verdict) => verdict,
        Err(e) => {
            tracing::warn!("AI応答をJSONとして解釈できないためキーワード判定に切替: {}", e);
            classify_by_keywords(response)
        }
    }
}

/// キーワード判定の1規則
struct KeywordRule {
    category: ConditionCategory,
    keywords: &'static [&'static str],
    confidence: f64,
    action: &'static str,
    tips: &'static [&'static str],
}

/// 優先順に並んだキーワード規則（最初に一致した規則を採用）
const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        category: ConditionCategory::Bad,
        keywords: &[
            "rotten", "spoiled", "moldy", "mouldy", "severely damaged", "bad condition",
            "unsafe", "decay", "inedible", "toxic",
        ],
        confidence: 85.0,
        action: "discard",
        tips: &[
            "Store in cool, dry place",
            "Check fruits regularly",
            "Remove damaged fruits immediately",
        ],
    },
    KeywordRule {
        category: ConditionCategory::InsectDamaged,
        keywords: &[
            "insect", "holes", "bite marks", "pest damage", "chewed", "puncture", "larvae",
            "worm",
        ],
        confidence: 80.0,
        action: "remove from batch",
        tips: &["Use mesh covers", "Regular inspection", "Natural pest repellents"],
    },
    KeywordRule {
        category: ConditionCategory::Poor,
        keywords: &["poor condition", "deteriorating", "significant defects", "use immediately"],
        confidence: 70.0,
        action: "consume immediately",
        tips: &["Better selection at purchase", "Improved storage"],
    },
    KeywordRule {
        category: ConditionCategory::Fair,
        keywords: &["fair", "moderate", "declining", "some defects"],
        confidence: 70.0,
        action: "use within days",
        tips: &["Improve storage conditions", "Use sooner"],
    },
    KeywordRule {
        category: ConditionCategory::Excellent,
        keywords: &["excellent", "perfect", "pristine", "optimal"],
        confidence: 90.0,
        action: "consume at leisure",
        tips: &["Continue current storage", "Maintain temperature"],
    },
    KeywordRule {
        category: ConditionCategory::Good,
        keywords: &["good condition", "fresh", "healthy"],
        confidence: 85.0,
        action: "consume normally",
        tips: &["Monitor regularly", "Proper ventilation"],
    },
];

/// どの規則にも一致しない場合
const KEYWORD_DEFAULT: KeywordRule = KeywordRule {
    category: ConditionCategory::Fair,
    keywords: &[],
    confidence: 60.0,
    action: "check manually",
    tips: &["Store at proper temperature", "Handle with care", "Check regularly"],
};

/// 応答テキストのキーワードから最低限の判定を合成
pub fn classify_by_keywords(response: &str) -> RemoteVerdict {
    let text = response.to_lowercase();
    let rule = KEYWORD_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| text.contains(k)))
        .unwrap_or(&KEYWORD_DEFAULT);

    let safety = if rule.category.is_unfavorable() {
        "questionable"
    } else {
        "likely safe"
    };

    RemoteVerdict {
        fruit_type: "unknown fruit".into(),
        condition_category: rule.category,
        confidence_score: rule.confidence,
        defects_found: Vec::new(),
        ripeness: Ripeness::Unknown,
        freshness_score: None,
        safety_assessment: safety.into(),
        prevention_tips: rule.tips.iter().map(|t| t.to_string()).collect(),
        storage_advice: Some("Store properly based on fruit type".into()),
        action_required: Some(rule.action.into()),
        detailed_analysis: Some(excerpt(response)),
        disease_identification: None,
        shelf_life: None,
        origin: VerdictOrigin::KeywordFallback,
    }
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() > EXCERPT_CHARS {
        let head: String = trimmed.chars().take(EXCERPT_CHARS).collect();
        format!("{}...", head)
    } else {
        trimmed.to_string()
    }
}

// =============================================
// フィールド取得（snake_case / camelCase の両方を受け付ける）
// =============================================

fn to_camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper_next = false;
    for ch in snake.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key)
        .or_else(|| obj.get(&to_camel_case(key)))
        .filter(|v| !v.is_null())
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match field(obj, key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// 数値または数値を含む文字列（"85", "85%"）を受け付ける
fn number_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    lazy_static::lazy_static! {
        static ref NUMBER_RE: Regex = Regex::new(r"-?\d+(?:\.\d+)?").unwrap();
    }

    match field(obj, key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => NUMBER_RE
            .find(s)
            .and_then(|m| m.as_str().parse::<f64>().ok()),
        _ => None,
    }
}

/// 配列または単一文字列を受け付ける
fn list_field(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    match field(obj, key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}
