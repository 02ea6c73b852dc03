use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use log::debug;

use crate::ballot::{candidate_count_of, BallotParse, CandidateComparer};
use crate::config::TallyError;
use crate::matrix::BeatMatrix;

/// The widest election a `u64` coalition bitmask can express.
pub const MAX_CANDIDATES: usize = 63;

/// A multiset for values likely to have many duplicates: equal values are
/// stored once with their counts summed.
#[derive(Debug, Clone)]
pub struct CountedList<T> {
    counts: HashMap<T, u32>,
}

impl<T: Eq + Hash> CountedList<T> {
    pub fn new() -> CountedList<T> {
        CountedList { counts: HashMap::new() }
    }

    pub fn add(&mut self, item: T, count: u32) {
        if count == 0 {
            return;
        }
        *self.counts.entry(item).or_insert(0) += count;
    }

    /// Distinct values with their counts, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, u32)> {
        self.counts.iter().map(|(item, &count)| (item, count))
    }

    /// Total count over all values.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Number of distinct values.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count_of(&self, item: &T) -> u32 {
        self.counts.get(item).copied().unwrap_or(0)
    }
}

impl<T: Eq + Hash> Default for CountedList<T> {
    fn default() -> CountedList<T> {
        CountedList::new()
    }
}

impl<T: Eq + Hash> PartialEq for CountedList<T> {
    fn eq(&self, other: &CountedList<T>) -> bool {
        self.counts == other.counts
    }
}

impl<T: Eq + Hash> Eq for CountedList<T> {}

impl<T: Eq + Hash> FromIterator<(T, u32)> for CountedList<T> {
    fn from_iter<I: IntoIterator<Item = (T, u32)>>(iter: I) -> CountedList<T> {
        let mut list = CountedList::new();
        for (item, count) in iter {
            list.add(item, count);
        }
        list
    }
}

/// A multiset of ballots sharing one candidate count: the unit every tally
/// operates on.
#[derive(Debug, Clone)]
pub struct BallotCollection<B> {
    candidate_count: usize,
    ballots: CountedList<B>,
}

impl<B: Eq + Hash> PartialEq for BallotCollection<B> {
    fn eq(&self, other: &BallotCollection<B>) -> bool {
        self.candidate_count == other.candidate_count && self.ballots == other.ballots
    }
}

impl<B: Eq + Hash> Eq for BallotCollection<B> {}

impl<B: CandidateComparer> BallotCollection<B> {
    pub fn new(candidate_count: usize, ballots: CountedList<B>) -> Result<BallotCollection<B>, TallyError> {
        if candidate_count < 2 {
            return Err(TallyError::TooFewCandidates { count: candidate_count });
        }
        if candidate_count > MAX_CANDIDATES {
            return Err(TallyError::TooManyCandidates { count: candidate_count });
        }
        for (ballot, _) in ballots.iter() {
            if ballot.candidate_count() != candidate_count {
                return Err(TallyError::MismatchedCandidateCount {
                    ballot: ballot.candidate_count(),
                    collection: candidate_count,
                });
            }
        }
        Ok(BallotCollection { candidate_count, ballots })
    }

    pub fn candidate_count(&self) -> usize {
        self.candidate_count
    }

    pub fn ballots(&self) -> &CountedList<B> {
        &self.ballots
    }

    pub fn total_votes(&self) -> u32 {
        self.ballots.total()
    }

    pub fn beat_matrix(&self) -> BeatMatrix {
        BeatMatrix::new(self)
    }
}

impl<B: CandidateComparer + BallotParse> BallotCollection<B> {
    /// Parses a whole election from ballot text.
    ///
    /// Lines are separated by newlines or semicolons; a line may carry a
    /// `* nn` suffix to duplicate it. The candidate count is one past the
    /// highest letter mentioned anywhere in the text.
    ///
    /// `"a b c * 2; b a c * 2; c b a"` is five ballots over three candidates.
    pub fn parse(source: &str) -> Result<BallotCollection<B>, TallyError> {
        let candidate_count =
            candidate_count_of(source).ok_or(TallyError::TooFewCandidates { count: 0 })?;

        let mut ballots: CountedList<B> = CountedList::new();
        for line in source.split(['\n', ';']) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (text, count) = match line.split_once('*') {
                None => (line, 1),
                Some((text, count)) => {
                    let count: u32 = count.trim().parse().map_err(|_| TallyError::BallotSyntax {
                        line: line.to_string(),
                    })?;
                    if count == 0 {
                        return Err(TallyError::BallotSyntax { line: line.to_string() });
                    }
                    (text.trim(), count)
                }
            };
            ballots.add(B::parse_ballot(candidate_count, text)?, count);
        }

        debug!(
            "parsed {} distinct ballots over {} candidates",
            ballots.distinct(),
            candidate_count
        );
        BallotCollection::new(candidate_count, ballots)
    }
}

impl<B: CandidateComparer + Display> Display for BallotCollection<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut lines: Vec<(String, u32)> = self
            .ballots
            .iter()
            .map(|(ballot, count)| (ballot.to_string(), count))
            .collect();
        // Largest blocs first, ties in text order, for a stable rendering.
        lines.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut first = true;
        for (text, count) in lines {
            if !first {
                write!(f, "; ")?;
            }
            if count > 1 {
                write!(f, "{} * {}", text, count)?;
            } else {
                write!(f, "{}", text)?;
            }
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::RankedBallot;

    fn parse(source: &str) -> BallotCollection<RankedBallot> {
        BallotCollection::parse(source).unwrap()
    }

    #[test]
    fn counted_list_deduplicates() {
        let mut list = CountedList::new();
        list.add("x", 2);
        list.add("y", 1);
        list.add("x", 3);
        assert_eq!(list.distinct(), 2);
        assert_eq!(list.total(), 6);
        assert_eq!(list.count_of(&"x"), 5);
    }

    #[test]
    fn parse_merges_equal_ballots() {
        let ballots = parse("a b c * 2; a b c; b a c");
        assert_eq!(ballots.candidate_count(), 3);
        assert_eq!(ballots.total_votes(), 4);
        assert_eq!(ballots.ballots().distinct(), 2);
    }

    #[test]
    fn parse_infers_candidate_count() {
        assert_eq!(parse("a b; b a").candidate_count(), 2);
        assert_eq!(parse("a d").candidate_count(), 4);
    }

    #[test]
    fn parse_rejects_bad_counts() {
        assert!(BallotCollection::<RankedBallot>::parse("a b * x").is_err());
        assert!(BallotCollection::<RankedBallot>::parse("a b * 0").is_err());
        assert!(BallotCollection::<RankedBallot>::parse("a b * 2 * 3").is_err());
        assert!(matches!(
            BallotCollection::<RankedBallot>::parse("a; a"),
            Err(TallyError::TooFewCandidates { count: 1 })
        ));
    }

    #[test]
    fn new_rejects_mismatched_ballots() {
        let mut list = CountedList::new();
        list.add(RankedBallot::new(3, &[vec![0], vec![1]]), 1);
        assert!(matches!(
            BallotCollection::new(4, list),
            Err(TallyError::MismatchedCandidateCount { ballot: 3, collection: 4 })
        ));
    }

    #[test]
    fn equal_collections_from_different_orders() {
        let first = parse("a b c * 2; b a c; c a b * 4");
        let second = parse("c a b * 4; a b c; b a c; a b c");
        assert_eq!(first, second);
    }

    #[test]
    fn display_round_trip() {
        let ballots = parse("a b c * 31; b a c * 32; c ab * 37");
        assert_eq!(parse(&ballots.to_string()), ballots);
    }
}
