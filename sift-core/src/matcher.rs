//! Fuzzy customer matching for counterparty names.
//!
//! Counterparty names arrive abbreviated, with or without umlauts, with
//! legal-form suffixes and typos. Each query token is scored against every
//! customer token and the best score per query token is summed.
//!
//! Token-pair scoring (first rule that applies):
//! - identical → 10
//! - one contains the other → round(6 × short/long) + 2
//! - Levenshtein similarity ≥ 0.8 / 0.6 / 0.4 → 8 / 6 / 4
//!   (similarity is zeroed when lengths differ by more than 40% or it falls
//!   below 0.7 for short tokens, 0.6 otherwise)
//! - common prefix of ≥ 3 chars → round(4 × prefix / shorter)
//!
//! Bonuses: round(5 × matched / query tokens) for completeness and +20 for
//! active customers.

use crate::records::{CustomerRecord, Transaction};
use crate::text::{char_len, levenshtein, tokenize};
use serde::{Deserialize, Serialize};

pub const EXACT_SCORE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Candidates below this total are dropped
    pub min_score: u32,
    /// Status value that earns the active bonus (compared case-insensitively)
    pub active_status: String,
    pub active_bonus: u32,
    /// Maximum completeness bonus when every query token matched
    pub completeness_weight: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_score: 1,
            active_status: "active".to_string(),
            active_bonus: 20,
            completeness_weight: 5,
        }
    }
}

/// A ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub customer_id: String,
    pub name: String,
    pub short_name: String,
    pub status: String,
    pub score: u32,
    /// `"<query> <symbol> <customer> (<score>)"` per matched query token
    pub matched_tokens: Vec<String>,
}

/// A substring-mode hit. Carries no score: membership only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackHit {
    pub customer_id: String,
    pub name: String,
    pub short_name: String,
    pub status: String,
}

impl From<&CustomerRecord> for FallbackHit {
    fn from(c: &CustomerRecord) -> Self {
        Self {
            customer_id: c.id.clone(),
            name: c.name.clone(),
            short_name: c.short_name.clone(),
            status: c.status.clone(),
        }
    }
}

/// Outcome of a lookup; fuzzy and substring results never mix.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Ranked(Vec<MatchResult>),
    Fallback(Vec<FallbackHit>),
    NoMatch,
}

impl Lookup {
    pub fn is_empty(&self) -> bool {
        matches!(self, Lookup::NoMatch)
    }
}

/// Score for a pair of normalized tokens (0 = unrelated).
pub fn match_score(a: &str, b: &str) -> u32 {
    let (la, lb) = (char_len(a), char_len(b));
    if la < 2 || lb < 2 {
        return 0;
    }
    if a == b {
        return EXACT_SCORE;
    }

    let (shorter, longer) = (la.min(lb), la.max(lb));

    if a.contains(b) || b.contains(a) {
        let ratio = shorter as f64 / longer as f64;
        return (6.0 * ratio).round() as u32 + 2;
    }

    let sim = similarity(a, b, shorter, longer);
    if sim >= 0.8 {
        return 8;
    } else if sim >= 0.6 {
        return 6;
    } else if sim >= 0.4 {
        return 4;
    }

    if shorter >= 3 {
        let common = a
            .chars()
            .zip(b.chars())
            .take_while(|(x, y)| x == y)
            .count();
        if common >= 3 {
            return (4.0 * common as f64 / shorter as f64).round() as u32;
        }
    }

    0
}

fn similarity(a: &str, b: &str, shorter: usize, longer: usize) -> f64 {
    if (longer - shorter) as f64 > longer as f64 * 0.4 {
        return 0.0;
    }
    let sim = 1.0 - levenshtein(a, b) as f64 / longer as f64;
    let floor = if shorter <= 4 { 0.7 } else { 0.6 };
    if sim >= floor { sim } else { 0.0 }
}

/// Diagnostic symbol for a token score.
pub fn relation_symbol(score: u32) -> &'static str {
    match score {
        10 => "=",
        8..=9 => "≈≈",
        6..=7 => "≈",
        4..=5 => "~",
        _ => "?",
    }
}

/// Per-customer scoring detail.
#[derive(Debug, Clone, PartialEq)]
struct Breakdown {
    total: u32,
    matched_tokens: Vec<String>,
}

/// Customer record with its name tokenized once.
struct Prepared<'a> {
    customer: &'a CustomerRecord,
    tokens: Vec<String>,
}

fn prepare(customers: &[CustomerRecord]) -> Vec<Prepared<'_>> {
    customers
        .iter()
        .map(|customer| Prepared {
            customer,
            tokens: tokenize(&customer.name),
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct CustomerMatcher {
    config: MatcherConfig,
}

impl CustomerMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Total score of `query` against one customer (0 if either side has no tokens).
    pub fn score(&self, query: &str, customer: &CustomerRecord) -> u32 {
        let query_tokens = tokenize(query);
        let customer_tokens = tokenize(&customer.name);
        self.breakdown(&query_tokens, customer, &customer_tokens)
            .map_or(0, |b| b.total)
    }

    /// Ranked candidates, best first; equal scores keep directory order.
    pub fn search(&self, query: &str, customers: &[CustomerRecord]) -> Vec<MatchResult> {
        self.rank(&tokenize(query), &prepare(customers))
    }

    /// Layered lookup: fuzzy ranking first, plain substring only if that finds nothing.
    pub fn lookup(&self, query: &str, customers: &[CustomerRecord]) -> Lookup {
        let ranked = self.search(query, customers);
        if !ranked.is_empty() {
            return Lookup::Ranked(ranked);
        }
        let hits = fallback_search(query, customers);
        if hits.is_empty() {
            Lookup::NoMatch
        } else {
            tracing::debug!(query, hits = hits.len(), "fuzzy search empty, substring fallback hit");
            Lookup::Fallback(hits)
        }
    }

    /// Copy of `transactions` with missing customer ids filled from the best match.
    ///
    /// Only candidates with at least one matched name token are assigned; an
    /// active status alone never claims a booking.
    pub fn assign_customer_ids(
        &self,
        transactions: &[Transaction],
        customers: &[CustomerRecord],
    ) -> Vec<Transaction> {
        let prepared = prepare(customers);
        let mut assigned = 0usize;
        let out: Vec<Transaction> = transactions
            .iter()
            .map(|t| {
                let mut t = t.clone();
                if t.customer_id.is_none() {
                    let best = self
                        .rank(&tokenize(&t.counterparty_name), &prepared)
                        .into_iter()
                        .find(|r| !r.matched_tokens.is_empty());
                    if let Some(best) = best {
                        t.customer_id = Some(best.customer_id);
                        assigned += 1;
                    }
                }
                t
            })
            .collect();
        tracing::info!(assigned, total = out.len(), "customer ids assigned");
        out
    }

    fn rank(&self, query_tokens: &[String], prepared: &[Prepared<'_>]) -> Vec<MatchResult> {
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<MatchResult> = prepared
            .iter()
            .filter_map(|p| {
                let b = self.breakdown(query_tokens, p.customer, &p.tokens)?;
                if b.total < self.config.min_score {
                    return None;
                }
                Some(MatchResult {
                    customer_id: p.customer.id.clone(),
                    name: p.customer.name.clone(),
                    short_name: p.customer.short_name.clone(),
                    status: p.customer.status.clone(),
                    score: b.total,
                    matched_tokens: b.matched_tokens,
                })
            })
            .collect();

        // stable: ties keep directory order
        results.sort_by(|a, b| b.score.cmp(&a.score));
        results
    }

    fn breakdown(
        &self,
        query_tokens: &[String],
        customer: &CustomerRecord,
        customer_tokens: &[String],
    ) -> Option<Breakdown> {
        if query_tokens.is_empty() || customer_tokens.is_empty() {
            return None;
        }

        let mut sum = 0u32;
        let mut matched = 0usize;
        let mut matched_tokens = Vec::new();

        for q in query_tokens {
            let mut best: Option<(&str, u32)> = None;
            for c in customer_tokens {
                let s = match_score(q, c);
                if s > best.map_or(0, |(_, bs)| bs) {
                    best = Some((c.as_str(), s));
                }
            }
            if let Some((c, s)) = best {
                sum += s;
                matched += 1;
                matched_tokens.push(format!("{} {} {} ({})", q, relation_symbol(s), c, s));
            }
        }

        let completeness = (self.config.completeness_weight as f64 * matched as f64
            / query_tokens.len() as f64)
            .round() as u32;
        let status_bonus = if customer
            .status
            .trim()
            .eq_ignore_ascii_case(&self.config.active_status)
        {
            self.config.active_bonus
        } else {
            0
        };

        Some(Breakdown {
            total: sum + completeness + status_bonus,
            matched_tokens,
        })
    }
}

/// Score with the default configuration.
pub fn score(query: &str, customer: &CustomerRecord) -> u32 {
    CustomerMatcher::default().score(query, customer)
}

/// Ranked search with the default configuration and an explicit threshold.
pub fn search(query: &str, customers: &[CustomerRecord], min_score: u32) -> Vec<MatchResult> {
    CustomerMatcher::new(MatcherConfig {
        min_score,
        ..MatcherConfig::default()
    })
    .search(query, customers)
}

/// Degraded mode: case-insensitive substring of the whole query in the whole name.
pub fn fallback_search(query: &str, customers: &[CustomerRecord]) -> Vec<FallbackHit> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    customers
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&needle))
        .map(FallbackHit::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn cust(id: &str, name: &str, status: &str) -> CustomerRecord {
        CustomerRecord::new(id, name, "", status)
    }

    #[test]
    fn test_exact_match_scores_maximum() {
        let c = cust("1", "Acme GmbH", "active");
        assert_eq!(score("Acme GmbH", &c), 45);
    }

    #[test]
    fn test_umlaut_spelling_variants() {
        assert_eq!(match_score("munchen", "muenchen"), 8);
        assert_eq!(match_score("muenchen", "munchen"), 8);
    }

    #[test]
    fn test_short_unrelated_tokens_score_zero() {
        assert_eq!(match_score("ab", "xyz"), 0);
        assert_eq!(match_score("a", "a"), 0);
    }

    #[test]
    fn test_containment_scales_with_length() {
        // "acme" in "acmesoft": round(6 * 4/8) + 2
        assert_eq!(match_score("acme", "acmesoft"), 5);
        assert_eq!(match_score("acmesoft", "acme"), 5);
    }

    #[test]
    fn test_similarity_bands() {
        // schmidt / schmitz: distance 2 over 7 chars
        assert_eq!(match_score("schmidt", "schmitz"), 6);
        // huber / hubert is containment, not similarity
        assert_eq!(match_score("huber", "hubert"), 7);
    }

    #[test]
    fn test_length_guard_falls_back_to_prefix() {
        // 7 vs 12 chars is beyond the 40% guard; shared prefix "ver" over 7 → round(12/7)
        assert_eq!(match_score("verband", "verwaltungen"), 2);
        assert_eq!(match_score("bauhof", "bauunternehmung"), 2);
        // a two-char prefix earns nothing
        assert_eq!(match_score("bau", "baeckerei"), 0);
    }

    #[test]
    fn test_relation_symbols() {
        assert_eq!(relation_symbol(10), "=");
        assert_eq!(relation_symbol(9), "≈≈");
        assert_eq!(relation_symbol(8), "≈≈");
        assert_eq!(relation_symbol(7), "≈");
        assert_eq!(relation_symbol(4), "~");
        assert_eq!(relation_symbol(2), "?");
    }

    #[test]
    fn test_search_ranks_and_reports_tokens() {
        let customers = vec![
            cust("10", "Bäckerei Müller", "inactive"),
            cust("11", "Müller Bau GmbH", "active"),
            cust("12", "Schulz KG", "active"),
        ];
        let r = search("Mueller Bau", &customers, 1);
        assert_eq!(r.len(), 3);
        assert_eq!(r[0].customer_id, "11");
        // 10 + 10 + 5 + 20
        assert_eq!(r[0].score, 45);
        assert_eq!(r[0].matched_tokens, vec!["mueller = mueller (10)", "bau = bau (10)"]);
        // nothing matched, status bonus only
        assert_eq!(r[1].customer_id, "12");
        assert_eq!(r[1].score, 20);
        // only "mueller" matched: 10 + round(2.5) = 13
        assert_eq!(r[2].customer_id, "10");
        assert_eq!(r[2].score, 13);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let customers = vec![
            cust("a", "Acme Nord", "active"),
            cust("b", "Acme Sued", "active"),
            cust("c", "Acme West", "active"),
        ];
        let r = search("acme", &customers, 1);
        let ids: Vec<_> = r.iter().map(|m| m.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_active_status_bonus_alone_passes_threshold() {
        let customers = vec![cust("1", "Zeta Holding", "active"), cust("2", "Omega AG", "inactive")];
        let r = search("Acme", &customers, 1);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].customer_id, "1");
        assert_eq!(r[0].score, score("Acme", &customers[0]));
        assert_eq!(r[0].score, 20);
        assert!(r[0].matched_tokens.is_empty());
        assert!(search("Acme", &customers, 21).is_empty());
    }

    #[test]
    fn test_short_tokens_need_higher_similarity() {
        // shorter token of 4 chars: 0.75 clears the 0.7 floor
        assert_eq!(match_score("abcd", "abxd"), 6);
        // 3 chars: 0.67 falls below it and a two-char prefix earns nothing
        assert_eq!(match_score("abc", "abd"), 0);
        // 5 chars use the 0.6 floor: 1 - 2/5
        assert_eq!(match_score("abcde", "abxye"), 6);
    }

    #[test]
    fn test_empty_inputs() {
        let customers = vec![cust("1", "Acme", "active"), cust("2", "", "active")];
        assert!(search("", &customers, 1).is_empty());
        assert!(search("---", &customers, 1).is_empty());
        assert!(search("acme", &[], 1).is_empty());
        assert_eq!(score("acme", &customers[1]), 0);
    }

    #[test]
    fn test_min_score_threshold() {
        let customers = vec![cust("1", "Acme GmbH", "inactive")];
        assert_eq!(search("Acme", &customers, 1)[0].score, 15);
        assert!(search("Acme", &customers, 16).is_empty());
    }

    #[test]
    fn test_custom_active_status() {
        let m = CustomerMatcher::new(MatcherConfig {
            active_status: "aktiv".to_string(),
            ..MatcherConfig::default()
        });
        let c = cust("1", "Acme GmbH", "Aktiv");
        assert_eq!(m.score("Acme GmbH", &c), 45);
        assert_eq!(m.score("Acme GmbH", &cust("1", "Acme GmbH", "active")), 25);
    }

    #[test]
    fn test_lookup_distinguishes_fallback() {
        let customers = vec![cust("1", "X-Y", "inactive"), cust("2", "Acme", "inactive")];
        // tokens of "x-y" are single chars and never score; substring still hits
        match CustomerMatcher::default().lookup("x-y", &customers) {
            Lookup::Fallback(hits) => {
                assert_eq!(hits.len(), 1);
                assert_eq!(hits[0].customer_id, "1");
            }
            other => panic!("expected fallback, got {:?}", other),
        }
        assert!(matches!(
            CustomerMatcher::default().lookup("acme", &customers),
            Lookup::Ranked(_)
        ));
        assert!(CustomerMatcher::default().lookup("nothing", &customers).is_empty());
    }

    #[test]
    fn test_assign_customer_ids_fills_only_missing() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 7).unwrap();
        let customers = vec![cust("11", "Müller Bau GmbH", "active")];
        let txns = vec![
            Transaction::new(date, "10.00", "EUR", "", "MUELLER BAU GMBH 80331 MUENCHEN"),
            Transaction::new(date, "11.00", "EUR", "", "Unknown Payer").with_customer_id("99"),
            Transaction::new(date, "12.00", "EUR", "", "Zzz"),
        ];
        let out = CustomerMatcher::default().assign_customer_ids(&txns, &customers);
        assert_eq!(out[0].customer_id.as_deref(), Some("11"));
        assert_eq!(out[1].customer_id.as_deref(), Some("99"));
        // "Zzz" ranks the active customer on its bonus but matches no token
        assert_eq!(out[2].customer_id, None);
        // input untouched
        assert_eq!(txns[0].customer_id, None);
    }
}
