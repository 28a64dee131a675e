//! Conflict resolver - picks one classification per span of text

use crate::types::PatternMatch;

/// True when the half-open spans of `a` and `b` share at least one byte.
pub fn overlaps(a: &PatternMatch, b: &PatternMatch) -> bool {
    !(a.end <= b.start || b.end <= a.start)
}

/// Keep the most confident non-overlapping candidates.
///
/// Candidates are visited in descending confidence; a candidate is accepted
/// unless it overlaps one already accepted. The sort is stable, so equal
/// confidences keep detector declaration order. Output is in acceptance order.
pub fn resolve(mut candidates: Vec<PatternMatch>) -> Vec<PatternMatch> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut accepted: Vec<PatternMatch> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if candidate.is_empty() {
            continue;
        }
        if accepted.iter().all(|kept| !overlaps(kept, &candidate)) {
            accepted.push(candidate);
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, PatternType};

    fn candidate(pattern_type: PatternType, confidence: f64, start: usize, end: usize) -> PatternMatch {
        PatternMatch::new(pattern_type, "x".repeat(end - start), confidence, start, end, Metadata::new())
    }

    #[test]
    fn test_higher_confidence_wins_overlap() {
        let resolved = resolve(vec![
            candidate(PatternType::Phone, 0.75, 0, 12),
            candidate(PatternType::TrackingNumber, 0.9, 0, 12),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].pattern_type, PatternType::TrackingNumber);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let resolved = resolve(vec![
            candidate(PatternType::DateTime, 0.85, 0, 11),
            candidate(PatternType::Unit, 0.85, 3, 11),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].pattern_type, PatternType::DateTime);
    }

    #[test]
    fn test_disjoint_spans_all_survive() {
        let resolved = resolve(vec![
            candidate(PatternType::Email, 0.9, 10, 26),
            candidate(PatternType::Phone, 0.85, 0, 8),
        ]);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].pattern_type, PatternType::Email);
    }

    #[test]
    fn test_adjacent_spans_do_not_overlap() {
        let a = candidate(PatternType::Currency, 0.9, 0, 4);
        let b = candidate(PatternType::Unit, 0.8, 4, 8);
        assert!(!overlaps(&a, &b));
        assert!(overlaps(&a, &candidate(PatternType::Unit, 0.8, 3, 8)));
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve(Vec::new()).is_empty());
    }
}
