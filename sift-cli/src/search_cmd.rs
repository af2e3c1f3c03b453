use sift_core::{CustomerMatcher, CustomerRecord, DEFAULT_STRATEGIES, FallbackHit, Lookup, flexible_search};

/// Fuzzy ranking, then plain substring, then the looser name strategies.
pub fn run_search(query: &str, customers: &[CustomerRecord], matcher: &CustomerMatcher, limit: usize) {
    match matcher.lookup(query, customers) {
        Lookup::Ranked(results) => {
            println!("{} candidate(s) for {:?}:", results.len(), query);
            for r in results.iter().take(limit) {
                println!("{:>4}  {:<8} {} [{}]", r.score, r.customer_id, r.name, r.status);
                for t in &r.matched_tokens {
                    println!("        {t}");
                }
            }
        }
        Lookup::Fallback(hits) => {
            println!("No fuzzy match for {query:?}; substring hits:");
            print_hits(&hits, limit);
        }
        Lookup::NoMatch => match flexible_search(query, customers, &DEFAULT_STRATEGIES) {
            Some((strategy, hits)) => {
                println!("No fuzzy match for {query:?}; {strategy} hits:");
                print_hits(&hits, limit);
            }
            None => println!("No match for {query:?}"),
        },
    }
}

fn print_hits(hits: &[FallbackHit], limit: usize) {
    for h in hits.iter().take(limit) {
        println!("   -  {:<8} {} [{}]", h.customer_id, h.name, h.status);
    }
    if hits.len() > limit {
        println!("   ({} more)", hits.len() - limit);
    }
}
