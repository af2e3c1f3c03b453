//! Boolean name-match strategies, tried in order until one yields hits.
//!
//! Cheaper and stricter strategies come first; each is a plain
//! `fn(customer_name, query) -> bool` so callers can compose their own order.

use crate::matcher::FallbackHit;
use crate::records::CustomerRecord;
use crate::text::normalize;

pub type StrategyFn = fn(&str, &str) -> bool;

#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub matches: StrategyFn,
}

/// Default order: exact substring, normalized substring, word overlap, legal-form abbreviations.
pub const DEFAULT_STRATEGIES: [Strategy; 4] = [
    Strategy { name: "exact substring", matches: exact_substring },
    Strategy { name: "normalized", matches: normalized_substring },
    Strategy { name: "word based", matches: word_based },
    Strategy { name: "abbreviation", matches: abbreviation },
];

/// Legal-form abbreviations and their spelled-out (normalized) forms.
const LEGAL_FORMS: &[(&str, &[&str])] = &[
    ("gmbh", &["gemeinnuetzige gmbh", "gesellschaft mit beschraenkter haftung"]),
    ("ggmbh", &["gemeinnuetzige gmbh"]),
    ("ag", &["aktiengesellschaft"]),
    ("kg", &["kommanditgesellschaft"]),
    ("ohg", &["offene handelsgesellschaft"]),
    ("ev", &["eingetragener verein"]),
    ("eg", &["eingetragene genossenschaft"]),
];

/// Share of query words that must find a partner in the customer name.
const WORD_MATCH_RATIO: f64 = 0.7;

pub fn exact_substring(customer_name: &str, query: &str) -> bool {
    customer_name.to_lowercase().contains(&query.to_lowercase())
}

pub fn normalized_substring(customer_name: &str, query: &str) -> bool {
    let q = normalize(query);
    !q.is_empty() && normalize(customer_name).contains(&q)
}

pub fn word_based(customer_name: &str, query: &str) -> bool {
    let name = normalize(customer_name);
    let q = normalize(query);
    let customer_words: Vec<&str> = name.split_whitespace().collect();
    let query_words: Vec<&str> = q.split_whitespace().collect();
    if query_words.is_empty() {
        return false;
    }

    let hits = query_words
        .iter()
        .filter(|qw| {
            customer_words
                .iter()
                .any(|cw| cw.contains(*qw) || qw.contains(*cw))
        })
        .count();

    hits as f64 / query_words.len() as f64 >= WORD_MATCH_RATIO
}

pub fn abbreviation(customer_name: &str, query: &str) -> bool {
    let name = normalize(customer_name);
    let q = normalize(query);
    if q.is_empty() {
        return false;
    }

    for (abbr, expansions) in LEGAL_FORMS {
        for expansion in *expansions {
            let name_expanded = expand_word(&name, abbr, expansion);
            let q_expanded = expand_word(&q, abbr, expansion);
            if name_expanded.contains(&q) || name.contains(&q_expanded) || name_expanded.contains(&q_expanded) {
                return true;
            }
        }
    }
    false
}

/// Replace whole-word occurrences of `abbr` with `expansion`.
fn expand_word(normalized: &str, abbr: &str, expansion: &str) -> String {
    normalized
        .split(' ')
        .map(|w| if w == abbr { expansion } else { w })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hits of the first strategy that matches anything, with that strategy's name.
pub fn flexible_search(
    query: &str,
    customers: &[CustomerRecord],
    strategies: &[Strategy],
) -> Option<(&'static str, Vec<FallbackHit>)> {
    if query.trim().is_empty() {
        return None;
    }
    strategies.iter().find_map(|s| {
        let hits: Vec<FallbackHit> = customers
            .iter()
            .filter(|c| !c.name.is_empty() && (s.matches)(&c.name, query))
            .map(FallbackHit::from)
            .collect();
        if hits.is_empty() {
            None
        } else {
            tracing::debug!(strategy = s.name, hits = hits.len(), "flexible search hit");
            Some((s.name, hits))
        }
    })
}
