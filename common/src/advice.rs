//! 品質区分ごとの既定アドバイス
//!
//! AI判定が予防策・対応・保存方法を返さなかった場合に使う固定テーブル。
//! 区分ラベルに対する部分一致（大文字小文字無視）で引き、最初に一致した行を採用する。

/// アドバイス表の1行
#[derive(Debug, Clone, Copy)]
pub struct AdviceEntry {
    /// ラベルに含まれていれば一致とみなすキー
    pub key: &'static str,
    pub tips: &'static [&'static str],
    pub action: &'static str,
    pub storage: &'static str,
}

/// 照合順の既定アドバイス表
pub const ADVICE_TABLE: &[AdviceEntry] = &[
    AdviceEntry {
        key: "EXCELLENT",
        tips: &[
            "Continue current storage practices",
            "Maintain stable temperature",
            "Handle gently to preserve quality",
            "Keep away from ethylene producers",
            "Use within optimal timeframe",
        ],
        action: "Enjoy at your convenience - peak quality",
        storage: "Store in a cool, dry place away from direct sunlight",
    },
    AdviceEntry {
        key: "GOOD",
        tips: &[
            "Store in proper conditions",
            "Check daily for changes",
            "Maintain good air circulation",
            "Keep dry to prevent mold",
            "Separate from overripe fruits",
        ],
        action: "Consume normally - good for several days",
        storage: "Store in a cool, dry place with good ventilation",
    },
    AdviceEntry {
        key: "FAIR",
        tips: &[
            "Improve storage conditions immediately",
            "Increase monitoring frequency",
            "Consider refrigeration if applicable",
            "Remove any damaged portions",
            "Use within 2-3 days maximum",
        ],
        action: "Use within 2-3 days - quality declining",
        storage: "Refrigerate and keep separate from fresh produce",
    },
    AdviceEntry {
        key: "POOR",
        tips: &[
            "Use immediately or process",
            "Separate from healthy fruits",
            "Consider cooking or juicing",
            "Check for spread to other fruits",
            "Improve storage for future",
        ],
        action: "Use immediately - process if needed",
        storage: "Refrigerate and use within 24 hours",
    },
    AdviceEntry {
        key: "BAD",
        tips: &[
            "Dispose of properly in compost",
            "Sanitize storage area",
            "Check all nearby fruits",
            "Review storage practices",
            "Purchase fresher produce",
        ],
        action: "Discard immediately - health risk",
        storage: "Do not store - discard",
    },
    AdviceEntry {
        key: "INSECT",
        tips: &[
            "Inspect all fruits carefully",
            "Use protective coverings",
            "Apply organic deterrents",
            "Clean storage thoroughly",
            "Consider professional pest control",
        ],
        action: "Remove from batch - check others",
        storage: "Isolate from other produce until inspected",
    },
    AdviceEntry {
        key: "CONFLICT",
        tips: &[
            "Inspect the fruit manually under good light",
            "Check firmness and smell before consuming",
            "Separate from other fruits until checked",
            "Re-photograph from another angle and analyze again",
        ],
        action: "Manual check needed - AI and image analysis disagree",
        storage: "Keep separate until manually inspected",
    },
];

/// どの行にも一致しない場合の汎用アドバイス
pub const GENERIC_ADVICE: AdviceEntry = AdviceEntry {
    key: "",
    tips: &[
        "Store at proper temperature",
        "Handle with care",
        "Check regularly",
        "Maintain cleanliness",
        "Use first-in-first-out rotation",
    ],
    action: "Monitor condition closely",
    storage: "Store appropriately for the fruit type",
};

/// ラベルに対応するアドバイス行を引く
pub fn lookup(label: &str) -> &'static AdviceEntry {
    let upper = label.to_uppercase();
    ADVICE_TABLE
        .iter()
        .find(|entry| upper.contains(entry.key))
        .unwrap_or(&GENERIC_ADVICE)
}

/// 既定の予防策
pub fn default_tips(label: &str) -> Vec<String> {
    lookup(label).tips.iter().map(|t| t.to_string()).collect()
}

/// 既定の対応
pub fn default_action(label: &str) -> String {
    lookup(label).action.to_string()
}

/// 既定の保存方法
pub fn default_storage(label: &str) -> String {
    lookup(label).storage.to_string()
}
