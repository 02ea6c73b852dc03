// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use crate::coalition::Coalition;
use crate::collection::CountedList;

/// Errors that prevent a tally from completing.
///
/// All of them are contract violations on the input data or on a coalition
/// query; a well-formed ballot collection always tallies.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyError {
    /// Fewer than two candidates (or no candidate letters at all in a parse).
    TooFewCandidates { count: usize },
    /// More candidates than fit in the coalition bitmask.
    TooManyCandidates { count: usize },
    /// A ballot was built for a different number of candidates than its collection.
    MismatchedCandidateCount { ballot: usize, collection: usize },
    /// A coalition query with no members.
    EmptyCoalition,
    /// A coalition query against one of its own members.
    SelfReferentialCoalition { candidate: usize },
    /// A candidate index outside the election.
    UnknownCandidate { candidate: usize },
    /// A line of ballot text that could not be understood.
    BallotSyntax { line: String },
}

impl Error for TallyError {}

impl Display for TallyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyError::TooFewCandidates { count } => {
                write!(f, "too few candidates for an election: {}", count)
            }
            TallyError::TooManyCandidates { count } => {
                write!(f, "too many candidates for a coalition bitmask: {}", count)
            }
            TallyError::MismatchedCandidateCount { ballot, collection } => {
                write!(
                    f,
                    "ballot has {} candidates but the collection has {}",
                    ballot, collection
                )
            }
            TallyError::EmptyCoalition => write!(f, "empty coalition cannot beat anyone"),
            TallyError::SelfReferentialCoalition { candidate } => {
                write!(f, "coalition contains the candidate it is queried against: {}", candidate)
            }
            TallyError::UnknownCandidate { candidate } => {
                write!(f, "candidate {} is not part of the election", candidate)
            }
            TallyError::BallotSyntax { line } => write!(f, "cannot parse ballot line '{}'", line),
        }
    }
}

// ******** Output data structures *********

/// Why a ballot approved a candidate below its top choice: the candidates the
/// ballot already preferred were not enough to defeat the remaining bogeymen.
///
/// Purely observational; nothing in the tally consumes these records.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Compromise {
    /// The approved below-top-choice candidate.
    pub compromise: usize,
    /// The coalition the ballot preferred before this approval.
    pub preferred: Coalition,
    /// The bogeymen still unbeaten at the moment of the approval.
    pub bogeymen: Coalition,
}

/// The full outcome of one election.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyOutcome {
    /// Candidates grouped by descending approval count; ties share a group.
    /// The winner(s) are `ranking[0]`.
    pub ranking: Vec<Vec<usize>>,
    /// Approvals per candidate (first choices plus compromises).
    pub approval_counts: Vec<u32>,
    /// Top-tier votes per candidate; sums to the total ballot count.
    pub first_choice_counts: Vec<u32>,
    /// One record per (ballot, compromise approval), with the ballot's count.
    pub compromises: CountedList<Compromise>,
}
