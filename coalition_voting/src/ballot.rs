use std::cmp::Ordering;
use std::fmt::Display;
use std::hash::Hash;

use crate::config::TallyError;

/// A source of pairwise preferences between candidates.
///
/// Every ballot type is a pure value: equality and hashing must agree with the
/// pointwise candidate values, and nothing here has side effects.
pub trait CandidateComparer: Eq + Hash + Clone {
    fn candidate_count(&self) -> usize;

    /// The ballot's score for one candidate. Higher is better; candidates the
    /// ballot expresses no opinion on share the lowest value.
    fn candidate_value(&self, candidate: usize) -> i32;

    fn compare(&self, first: usize, second: usize) -> Ordering {
        self.candidate_value(first).cmp(&self.candidate_value(second))
    }

    fn prefers(&self, first: usize, second: usize) -> bool {
        self.compare(first, second) == Ordering::Greater
    }

    /// Tiers of exactly-tied candidates, best to worst, covering every
    /// candidate. Unranked candidates form the strictly-last tier.
    fn ranking(&self) -> &[Vec<usize>];
}

/// Ballot types that understand the letter-encoded text format.
pub trait BallotParse: Sized {
    fn parse_ballot(candidate_count: usize, source: &str) -> Result<Self, TallyError>;
}

// ********* Letter codec ***********
//
// Candidates are lowercase letters starting at 'a'; a tier is a run of
// letters, tiers are separated by spaces.

pub fn decode_candidate(letter: char) -> Option<usize> {
    if letter.is_ascii_lowercase() {
        Some(letter as usize - 'a' as usize)
    } else {
        None
    }
}

pub fn encode_candidate(candidate: usize) -> char {
    (b'a' + candidate as u8) as char
}

/// Encodes a set of candidates as sorted letters, e.g. `[2, 0]` -> `"ac"`.
pub fn encode_candidates(candidates: impl IntoIterator<Item = usize>) -> String {
    let mut members: Vec<usize> = candidates.into_iter().collect();
    members.sort_unstable();
    members.iter().map(|&c| encode_candidate(c)).collect()
}

/// The number of candidates mentioned in a piece of ballot text: one past the
/// highest letter used. `None` when no candidate letter appears at all.
pub fn candidate_count_of(source: &str) -> Option<usize> {
    source
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .map(|c| c as usize - 'a' as usize + 1)
        .max()
}

/// Builds the tier ranking for arbitrary candidate values by bucket insertion,
/// grouping exact ties.
fn bucket_ranking(candidate_count: usize, value: impl Fn(usize) -> i32) -> Vec<Vec<usize>> {
    let mut ranking: Vec<Vec<usize>> = vec![vec![0]];

    for index in 1..candidate_count {
        let v = value(index);
        match ranking.iter().position(|tier| value(tier[0]) <= v) {
            None => ranking.push(vec![index]),
            Some(at) if value(ranking[at][0]) == v => ranking[at].push(index),
            Some(at) => ranking.insert(at, vec![index]),
        }
    }

    ranking
}

// ********* Ranked ballots ***********

/// A ranked ballot: tiers of tied candidates from best to worst.
///
/// Ranks are stored per candidate and descend from 0, so that larger values
/// are better; candidates left off the ballot share a sentinel strictly below
/// every expressed rank.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct RankedBallot {
    ranks: Vec<i32>,
    ranking: Vec<Vec<usize>>,
}

impl RankedBallot {
    pub fn new(candidate_count: usize, tiers: &[Vec<usize>]) -> RankedBallot {
        let sentinel = -(candidate_count as i32);
        let mut ranks = vec![sentinel; candidate_count];

        for (depth, tier) in tiers.iter().enumerate() {
            for &candidate in tier {
                ranks[candidate] = -(depth as i32);
            }
        }

        let ranking = bucket_ranking(candidate_count, |c| ranks[c]);
        RankedBallot { ranks, ranking }
    }

    fn sentinel(&self) -> i32 {
        -(self.ranks.len() as i32)
    }
}

impl CandidateComparer for RankedBallot {
    fn candidate_count(&self) -> usize {
        self.ranks.len()
    }

    fn candidate_value(&self, candidate: usize) -> i32 {
        self.ranks[candidate]
    }

    fn ranking(&self) -> &[Vec<usize>] {
        &self.ranking
    }
}

impl BallotParse for RankedBallot {
    /// Parses e.g. `"a cb d"`: `a` first, then `b` and `c` tied, then `d`.
    fn parse_ballot(candidate_count: usize, source: &str) -> Result<RankedBallot, TallyError> {
        let mut tiers: Vec<Vec<usize>> = Vec::new();
        for token in source.split_whitespace() {
            let mut tier: Vec<usize> = Vec::new();
            for letter in token.chars() {
                let candidate = decode_candidate(letter).ok_or_else(|| TallyError::BallotSyntax {
                    line: source.to_string(),
                })?;
                if candidate >= candidate_count {
                    return Err(TallyError::UnknownCandidate { candidate });
                }
                tier.push(candidate);
            }
            tiers.push(tier);
        }
        Ok(RankedBallot::new(candidate_count, &tiers))
    }
}

impl Display for RankedBallot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for tier in &self.ranking {
            // The unranked tier is implicit in the text form.
            if self.ranks[tier[0]] == self.sentinel() {
                continue;
            }
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", encode_candidates(tier.iter().copied()))?;
            first = false;
        }
        Ok(())
    }
}

// ********* Approval ballots ***********

/// An approval-style ballot: a single tier of approved candidates over
/// everyone else. Mostly useful to exercise the comparer-generic machinery.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ApprovalBallot {
    approvals: Vec<bool>,
    ranking: Vec<Vec<usize>>,
}

impl ApprovalBallot {
    pub fn new(approvals: Vec<bool>) -> ApprovalBallot {
        let ranking = bucket_ranking(approvals.len(), |c| approvals[c] as i32);
        ApprovalBallot { approvals, ranking }
    }
}

impl CandidateComparer for ApprovalBallot {
    fn candidate_count(&self) -> usize {
        self.approvals.len()
    }

    fn candidate_value(&self, candidate: usize) -> i32 {
        self.approvals[candidate] as i32
    }

    fn ranking(&self) -> &[Vec<usize>] {
        &self.ranking
    }
}

impl BallotParse for ApprovalBallot {
    fn parse_ballot(candidate_count: usize, source: &str) -> Result<ApprovalBallot, TallyError> {
        let mut approvals = vec![false; candidate_count];
        for letter in source.chars().filter(|c| !c.is_whitespace()) {
            let candidate = decode_candidate(letter).ok_or_else(|| TallyError::BallotSyntax {
                line: source.to_string(),
            })?;
            if candidate >= candidate_count {
                return Err(TallyError::UnknownCandidate { candidate });
            }
            approvals[candidate] = true;
        }
        Ok(ApprovalBallot::new(approvals))
    }
}

impl Display for ApprovalBallot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let approved = (0..self.approvals.len()).filter(|&c| self.approvals[c]);
        write!(f, "{}", encode_candidates(approved))
    }
}
