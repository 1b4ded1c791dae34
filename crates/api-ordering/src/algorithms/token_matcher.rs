//! Token Matcher
//!
//! Scores similarity between short identifier tokens (resource names,
//! schema base names). Rules are tried in priority order and the first one
//! that qualifies wins:
//!
//! | Rule | Score |
//! |------|-------|
//! | Exact (case-insensitive) | 1.00 |
//! | Equal after singularization | 0.95 |
//! | Known abbreviation pair | 0.85 |
//! | Equal stems | 0.80 |
//! | Substring (>= 3 chars) | 0.70 |

use crate::domain::entities::TokenMatchResult;
use crate::domain::value_objects::{
    MatchType, ABBREVIATION_SCORE, EXACT_MATCH_SCORE, PLURAL_SINGULAR_SCORE, STEM_SCORE,
    SUBSTRING_SCORE,
};
use crate::ports::outbound::TokenMatcher;

/// Irregular plural -> singular. Checked before the suffix rules.
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("data", "datum"),
    ("media", "medium"),
    ("criteria", "criterion"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("analyses", "analysis"),
    ("mice", "mouse"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("series", "series"),
    ("species", "species"),
];

/// Plural endings where the `e` belongs to the plural, not the stem.
const ES_PLURAL_ENDINGS: &[&str] = &["ches", "shes", "ses", "zes", "xes"];

/// Words ending like this are not plurals of a trailing `-s`.
const NON_PLURAL_S_ENDINGS: &[&str] = &["ss", "us", "is"];

/// Bidirectional abbreviation pairs (short, long).
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("cat", "category"),
    ("org", "organization"),
    ("auth", "authentication"),
    ("authz", "authorization"),
    ("config", "configuration"),
    ("cfg", "configuration"),
    ("id", "identifier"),
    ("info", "information"),
    ("msg", "message"),
    ("addr", "address"),
    ("acct", "account"),
    ("env", "environment"),
    ("repo", "repository"),
    ("req", "request"),
    ("resp", "response"),
    ("param", "parameter"),
    ("attr", "attribute"),
    ("desc", "description"),
    ("doc", "document"),
    ("img", "image"),
    ("inv", "invoice"),
    ("prod", "product"),
    ("qty", "quantity"),
    ("txn", "transaction"),
    ("tx", "transaction"),
    ("usr", "user"),
    ("pwd", "password"),
    ("perm", "permission"),
    ("sub", "subscription"),
    ("spec", "specification"),
    ("dept", "department"),
    ("emp", "employee"),
];

/// English suffixes for stemming. The longest match is stripped.
const STEM_SUFFIXES: &[&str] = &[
    "ization", "ations", "ation", "ments", "ment", "ness", "ings", "ing", "ions", "ion", "able",
    "ible", "ful", "ies", "ed", "es", "s",
];

const MIN_STEM_LEN: usize = 3;
const MIN_SUBSTRING_LEN: usize = 3;

/// Trim and lower-case a token.
pub fn normalize(token: &str) -> String {
    token.trim().to_lowercase()
}

/// Singular form of a (normalized) word.
pub fn singularize(word: &str) -> String {
    let word = normalize(word);

    if let Some((_, singular)) = IRREGULAR_PLURALS.iter().find(|(plural, _)| *plural == word) {
        return (*singular).to_string();
    }

    if word.len() > 3 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }

    if let Some(ending) = ES_PLURAL_ENDINGS.iter().find(|e| word.ends_with(*e)) {
        if word.len() > ending.len() {
            return word[..word.len() - 2].to_string();
        }
    }

    if word.len() > 1
        && word.ends_with('s')
        && !NON_PLURAL_S_ENDINGS.iter().any(|e| word.ends_with(e))
    {
        return word[..word.len() - 1].to_string();
    }

    word
}

/// Strip the longest matching suffix of [`STEM_SUFFIXES`].
pub fn stem(word: &str) -> String {
    let word = normalize(word);
    let longest = STEM_SUFFIXES
        .iter()
        .filter(|suffix| word.len() > suffix.len() && word.ends_with(*suffix))
        .max_by_key(|suffix| suffix.len());

    match longest {
        Some(suffix) => word[..word.len() - suffix.len()].to_string(),
        None => word,
    }
}

fn is_abbreviation_pair(a: &str, b: &str) -> bool {
    ABBREVIATIONS
        .iter()
        .any(|(short, long)| (a == *short && b == *long) || (a == *long && b == *short))
}

/// Rule-based English token matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishTokenMatcher;

impl EnglishTokenMatcher {
    pub fn new() -> Self {
        Self
    }

    fn result(source: &str, target: &str, score: f64, match_type: MatchType) -> TokenMatchResult {
        TokenMatchResult {
            source_token: source.to_string(),
            matched_token: target.to_string(),
            score,
            match_type,
        }
    }
}

impl TokenMatcher for EnglishTokenMatcher {
    fn match_tokens(&self, source: &str, target: &str) -> Option<TokenMatchResult> {
        let a = normalize(source);
        let b = normalize(target);
        if a.is_empty() || b.is_empty() {
            return None;
        }

        if a == b {
            return Some(Self::result(&a, &b, EXACT_MATCH_SCORE, MatchType::Exact));
        }

        let singular_a = singularize(&a);
        let singular_b = singularize(&b);
        if singular_a == singular_b {
            return Some(Self::result(
                &a,
                &b,
                PLURAL_SINGULAR_SCORE,
                MatchType::PluralSingular,
            ));
        }

        if is_abbreviation_pair(&a, &b) {
            return Some(Self::result(
                &a,
                &b,
                ABBREVIATION_SCORE,
                MatchType::Abbreviation,
            ));
        }

        let stem_a = stem(&a);
        let stem_b = stem(&b);
        if stem_a.len() >= MIN_STEM_LEN && stem_b.len() >= MIN_STEM_LEN && stem_a == stem_b {
            return Some(Self::result(&a, &b, STEM_SCORE, MatchType::Stem));
        }

        let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
        if shorter.chars().count() >= MIN_SUBSTRING_LEN && longer.contains(shorter.as_str()) {
            return Some(Self::result(&a, &b, SUBSTRING_SCORE, MatchType::Substring));
        }

        None
    }
}
