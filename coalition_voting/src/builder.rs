pub use crate::config::*;

use crate::ballot::{BallotParse, RankedBallot};
use crate::collection::{BallotCollection, CountedList, MAX_CANDIDATES};

/// A builder for assembling a ballot collection vote by vote.
///
/// Prefer [`BallotCollection::parse`] for ballot text; the builder is for
/// callers that already hold structured rankings.
///
/// ```
/// use coalition_voting::builder::Builder;
/// # use coalition_voting::TallyError;
///
/// let mut builder = Builder::new(3)?;
/// builder.add_text("a b c", 2)?;
/// builder.add_ranking(&[vec![1], vec![0, 2]], 1)?;
///
/// let ballots = builder.build()?;
/// assert_eq!(ballots.total_votes(), 3);
/// # Ok::<(), TallyError>(())
/// ```
pub struct Builder {
    candidate_count: usize,
    ballots: CountedList<RankedBallot>,
}

impl Builder {
    pub fn new(candidate_count: usize) -> Result<Builder, TallyError> {
        if candidate_count < 2 {
            return Err(TallyError::TooFewCandidates { count: candidate_count });
        }
        if candidate_count > MAX_CANDIDATES {
            return Err(TallyError::TooManyCandidates { count: candidate_count });
        }
        Ok(Builder {
            candidate_count,
            ballots: CountedList::new(),
        })
    }

    /// Adds `count` identical ballots ranking `tiers` best to worst.
    ///
    /// Candidates omitted from every tier are tied strictly last.
    pub fn add_ranking(&mut self, tiers: &[Vec<usize>], count: u32) -> Result<(), TallyError> {
        for &candidate in tiers.iter().flatten() {
            if candidate >= self.candidate_count {
                return Err(TallyError::UnknownCandidate { candidate });
            }
        }
        self.ballots.add(RankedBallot::new(self.candidate_count, tiers), count);
        Ok(())
    }

    /// Adds `count` identical ballots from one line of letter-encoded text,
    /// e.g. `"a cb d"`.
    pub fn add_text(&mut self, line: &str, count: u32) -> Result<(), TallyError> {
        let ballot = RankedBallot::parse_ballot(self.candidate_count, line)?;
        self.ballots.add(ballot, count);
        Ok(())
    }

    pub fn build(self) -> Result<BallotCollection<RankedBallot>, TallyError> {
        BallotCollection::new(self.candidate_count, self.ballots)
    }
}
