//! Keyword-based provisional field extraction
//!
//! Runs at session end, before AI extraction has had a chance to complete,
//! so a freshly finalized record is never left with the placeholder
//! description. Category resolution is first-match-wins over an ordered
//! keyword list; the ordering is policy, not an accident of iteration.

use sauti_core::{Category, Turn, Urgency};

/// Keyword groups in resolution order. A transcript matching several groups
/// still gets exactly one category, the earliest listed.
const CATEGORY_KEYWORDS: [(Category, &[&str]); 9] = [
    (Category::Wages, &["wage", "salary", "pay"]),
    (Category::Hours, &["hour", "overtime"]),
    (Category::Safety, &["safe", "danger", "injury"]),
    (Category::Discrimination, &["discriminat", "harass"]),
    (Category::Contracts, &["contract"]),
    (Category::Discipline, &["disciplin"]),
    (Category::Union, &["union"]),
    (Category::Conditions, &["condition"]),
    (Category::Training, &["training"]),
];

const HIGH_URGENCY_KEYWORDS: [&str; 3] = ["urgent", "immediate", "danger"];
const CRITICAL_URGENCY_KEYWORDS: [&str; 2] = ["critical", "emergency"];

const DESCRIPTION_MIN_CHARS: usize = 20;
const DESCRIPTION_FALLBACK: &str = "See transcript for details";

/// Provisional fields derived without an LLM
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicFields {
    pub category: Option<Category>,
    pub urgency: Urgency,
    pub description: String,
}

/// Derive provisional category/urgency/description from a finished session
pub fn extract(turns: &[Turn], transcript: &str) -> HeuristicFields {
    let text = transcript.to_lowercase();

    let category = CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category);

    let mut urgency = Urgency::Medium;
    if HIGH_URGENCY_KEYWORDS.iter().any(|k| text.contains(k)) {
        urgency = Urgency::High;
    }
    if CRITICAL_URGENCY_KEYWORDS.iter().any(|k| text.contains(k)) {
        urgency = Urgency::Critical;
    }

    HeuristicFields {
        category,
        urgency,
        description: pick_description(turns),
    }
}

/// The longest substantial user turn; first wins on equal length
fn pick_description(turns: &[Turn]) -> String {
    let mut best: Option<&Turn> = None;
    for turn in turns {
        if !turn.is_user() || turn.content.chars().count() <= DESCRIPTION_MIN_CHARS {
            continue;
        }
        match best {
            Some(current) if turn.content.chars().count() <= current.content.chars().count() => {}
            _ => best = Some(turn),
        }
    }

    best.map(|turn| turn.content.clone())
        .unwrap_or_else(|| DESCRIPTION_FALLBACK.to_string())
}
