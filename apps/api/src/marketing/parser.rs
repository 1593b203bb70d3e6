//! Best-effort decoding of a marketing plan out of free-form model output.
//!
//! A strict JSON decode is tried first. When the reply is not a JSON object
//! carrying any plan key, an ordered list of fallback strategies runs and their
//! results are merged field by field: the first strategy to produce a
//! non-empty value for a field wins it. Nothing in here ever fails; a reply
//! nobody can make sense of yields empty fields.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::llm_client::strip_json_fences;

const BEST_PRODUCTS: &str = "bestProducts";
const MARKETING_TECHNIQUE: &str = "marketingTechnique";
const CONVERSATION_STARTER: &str = "conversationStarter";
const CONVERSATION_SEQUENCE: &str = "conversationSequence";

const PLAN_KEYS: [&str; 4] = [
    BEST_PRODUCTS,
    MARKETING_TECHNIQUE,
    CONVERSATION_STARTER,
    CONVERSATION_SEQUENCE,
];

/// `Best Products:` style headings, optionally wrapped in markdown emphasis.
static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(best products|marketing technique|conversation starter|conversation sequence)[\s*_]*:",
    )
    .unwrap()
});

static LEADING_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d{1,2}[.)]\s").unwrap());

static INLINE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)\d{1,2}[.)]\s+").unwrap());

static LINE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*\d{1,2}[.)]\s+").unwrap());

/// A bullet marker standing on its own, so `Self-employed` is left alone.
static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)[-•*](?:\s|$)").unwrap());

/// The four plan fields, already normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanFields {
    pub best_products: Vec<String>,
    pub marketing_technique: String,
    pub conversation_starter: String,
    pub conversation_sequence: Vec<String>,
}

impl PlanFields {
    pub fn is_empty(&self) -> bool {
        self.best_products.is_empty()
            && self.marketing_technique.is_empty()
            && self.conversation_starter.is_empty()
            && self.conversation_sequence.is_empty()
    }

    /// Takes each field of `other` that is still empty here.
    fn fill_missing(&mut self, other: PlanFields) {
        if self.best_products.is_empty() {
            self.best_products = other.best_products;
        }
        if self.marketing_technique.is_empty() {
            self.marketing_technique = other.marketing_technique;
        }
        if self.conversation_starter.is_empty() {
            self.conversation_starter = other.conversation_starter;
        }
        if self.conversation_sequence.is_empty() {
            self.conversation_sequence = other.conversation_sequence;
        }
    }
}

/// Outcome of the strict decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Plan(PlanFields),
    NeedsFallback,
}

type Strategy = fn(&str) -> Option<PlanFields>;

/// Tried in order after a failed strict decode.
const FALLBACK_STRATEGIES: [(&str, Strategy); 2] =
    [("embedded-json", embedded_json), ("headings", headings)];

/// Decodes a model reply into plan fields.
pub fn parse_plan(text: &str) -> PlanFields {
    match decode_strict(text) {
        Decoded::Plan(fields) => fields,
        Decoded::NeedsFallback => {
            let mut merged = PlanFields::default();
            for (name, strategy) in FALLBACK_STRATEGIES {
                if let Some(found) = strategy(text) {
                    tracing::debug!("Marketing plan fallback '{name}' matched");
                    merged.fill_missing(found);
                }
            }
            merged
        }
    }
}

/// Whole reply (code fences allowed) as a JSON object with at least one plan key.
pub fn decode_strict(text: &str) -> Decoded {
    match serde_json::from_str::<Value>(strip_json_fences(text)) {
        Ok(Value::Object(map)) => match fields_from_object(&map) {
            Some(fields) => Decoded::Plan(fields),
            None => Decoded::NeedsFallback,
        },
        _ => Decoded::NeedsFallback,
    }
}

/// The outermost `{...}` span inside surrounding prose.
fn embedded_json(text: &str) -> Option<PlanFields> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => fields_from_object(&map),
        _ => None,
    }
}

/// Sections introduced by known headings, each running to the next heading.
fn headings(text: &str) -> Option<PlanFields> {
    let found: Vec<(String, usize, usize)> = HEADING_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            Some((name, whole.start(), whole.end()))
        })
        .collect();
    if found.is_empty() {
        return None;
    }

    let mut fields = PlanFields::default();
    for (i, (name, _, body_start)) in found.iter().enumerate() {
        let body_end = found.get(i + 1).map_or(text.len(), |next| next.1);
        let body = trim_section(&text[*body_start..body_end]);
        if body.is_empty() {
            continue;
        }
        match name.as_str() {
            "best products" if fields.best_products.is_empty() => {
                fields.best_products = split_list(body);
            }
            "marketing technique" if fields.marketing_technique.is_empty() => {
                fields.marketing_technique = body.trim_matches('"').to_string();
            }
            "conversation starter" if fields.conversation_starter.is_empty() => {
                fields.conversation_starter = body.trim_matches('"').to_string();
            }
            "conversation sequence" if fields.conversation_sequence.is_empty() => {
                fields.conversation_sequence = split_list(body);
            }
            _ => {}
        }
    }
    Some(fields)
}

fn fields_from_object(map: &Map<String, Value>) -> Option<PlanFields> {
    if !PLAN_KEYS.iter().any(|key| map.contains_key(*key)) {
        return None;
    }
    Some(PlanFields {
        best_products: map.get(BEST_PRODUCTS).map(list_value).unwrap_or_default(),
        marketing_technique: map.get(MARKETING_TECHNIQUE).map(text_value).unwrap_or_default(),
        conversation_starter: map
            .get(CONVERSATION_STARTER)
            .map(text_value)
            .unwrap_or_default(),
        conversation_sequence: map
            .get(CONVERSATION_SEQUENCE)
            .map(list_value)
            .unwrap_or_default(),
    })
}

fn text_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Arrays keep their order, objects give their values in document order,
/// strings are split by `split_list`.
fn list_value(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => split_list(s),
        Value::Array(items) => clean_items(items.iter().map(text_value)),
        Value::Object(map) => clean_items(map.values().map(text_value)),
        other => vec![other.to_string()],
    }
}

/// Splits a list that arrived as one string: numbered items, else standalone
/// bullets, else lines, else commas, else a single item.
pub fn split_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    if LEADING_NUMBER_RE.is_match(raw) {
        return clean_items(INLINE_NUMBER_RE.split(raw));
    }
    if LINE_NUMBER_RE.find_iter(raw).count() >= 2 {
        return clean_items(LINE_NUMBER_RE.split(raw));
    }
    if BULLET_RE.is_match(raw) {
        return clean_items(BULLET_RE.split(raw));
    }
    if raw.contains('\n') {
        return clean_items(raw.lines());
    }
    if raw.contains(',') {
        return clean_items(raw.split(','));
    }
    vec![raw.to_string()]
}

fn clean_items<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().trim().trim_matches('*').trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn trim_section(body: &str) -> &str {
    body.trim_matches(|c: char| c.is_whitespace() || c == '*' || c == '#' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_json_lists_are_kept() {
        let raw = r#"{"bestProducts":["A","B"],"marketingTechnique":"T","conversationStarter":"S","conversationSequence":["1","2"]}"#;
        let fields = parse_plan(raw);
        assert_eq!(fields.best_products, vec!["A", "B"]);
        assert_eq!(fields.marketing_technique, "T");
        assert_eq!(fields.conversation_starter, "S");
        assert_eq!(fields.conversation_sequence, vec!["1", "2"]);
    }

    #[test]
    fn test_fenced_json_is_strict() {
        let raw = "```json\n{\"marketingTechnique\": \"Scarcity\"}\n```";
        match decode_strict(raw) {
            Decoded::Plan(fields) => assert_eq!(fields.marketing_technique, "Scarcity"),
            Decoded::NeedsFallback => panic!("fenced JSON should decode strictly"),
        }
    }

    #[test]
    fn test_object_without_plan_keys_needs_fallback() {
        assert_eq!(decode_strict(r#"{"answer": 42}"#), Decoded::NeedsFallback);
        assert_eq!(decode_strict("not json at all"), Decoded::NeedsFallback);
    }

    #[test]
    fn test_dash_separated_string_becomes_list() {
        let fields = parse_plan(r#"{"bestProducts": "A - B - C"}"#);
        assert_eq!(fields.best_products, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_hyphenated_words_are_not_bullets() {
        let fields = parse_plan(r#"{"bestProducts": "Self-employed plan, Low-risk fund"}"#);
        assert_eq!(fields.best_products, vec!["Self-employed plan", "Low-risk fund"]);
    }

    #[test]
    fn test_sequence_object_becomes_ordered_values() {
        let raw = r#"{"conversationSequence": {"step1": "Greet", "step2": "Ask", "step3": "Close"}}"#;
        assert_eq!(parse_plan(raw).conversation_sequence, vec!["Greet", "Ask", "Close"]);
    }

    #[test]
    fn test_non_string_array_items_are_stringified() {
        let raw = r#"{"conversationSequence": [1, "two", null, " "]}"#;
        assert_eq!(parse_plan(raw).conversation_sequence, vec!["1", "two"]);
    }

    #[test]
    fn test_headings_fallback() {
        let fields = parse_plan("Marketing Technique: Use authority.\nConversation Starter: Hi!");
        assert_eq!(fields.marketing_technique, "Use authority.");
        assert_eq!(fields.conversation_starter, "Hi!");
        assert!(fields.best_products.is_empty());
    }

    #[test]
    fn test_markdown_headings_with_numbered_sequence() {
        let raw = "**Best Products:** DANA+, eMAS\n\n\
                   **Conversation Sequence:**\n1. Greet the user\n2. Ask about goals\n3. Offer DANA+";
        let fields = parse_plan(raw);
        assert_eq!(fields.best_products, vec!["DANA+", "eMAS"]);
        assert_eq!(
            fields.conversation_sequence,
            vec!["Greet the user", "Ask about goals", "Offer DANA+"]
        );
    }

    #[test]
    fn test_json_inside_prose() {
        let raw = "Here is your plan:\n```json\n{\"bestProducts\": [\"eMAS\"], \"marketingTechnique\": \"Scarcity\"}\n```\nGood luck!";
        let fields = parse_plan(raw);
        assert_eq!(fields.best_products, vec!["eMAS"]);
        assert_eq!(fields.marketing_technique, "Scarcity");
    }

    #[test]
    fn test_strategies_merge_per_field() {
        let raw = "{\"bestProducts\": [\"DANA+\"]} as requested.\nMarketing Technique: Reciprocity";
        let fields = parse_plan(raw);
        assert_eq!(fields.best_products, vec!["DANA+"]);
        assert_eq!(fields.marketing_technique, "Reciprocity");
    }

    #[test]
    fn test_unrecognized_reply_is_empty() {
        assert!(parse_plan("I cannot help with that.").is_empty());
        assert!(parse_plan("").is_empty());
    }

    #[test]
    fn test_split_list_fallbacks() {
        assert_eq!(split_list("- one\n- two"), vec!["one", "two"]);
        assert_eq!(split_list("one\ntwo\n\nthree"), vec!["one", "two", "three"]);
        assert_eq!(split_list("Intro:\n1) one\n2) two"), vec!["Intro:", "one", "two"]);
        assert_eq!(split_list("just one"), vec!["just one"]);
    }
}
