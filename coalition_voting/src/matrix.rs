use log::debug;

use crate::ballot::CandidateComparer;
use crate::collection::BallotCollection;

/// The pairwise margins of an election.
///
/// Cell `(i, j)` holds the number of ballots preferring `i` over `j` minus the
/// number preferring `j` over `i`; the matrix is anti-symmetric with a zero
/// diagonal.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BeatMatrix {
    candidate_count: usize,
    cells: Vec<i64>,
}

impl BeatMatrix {
    pub fn new<B: CandidateComparer>(ballots: &BallotCollection<B>) -> BeatMatrix {
        let n = ballots.candidate_count();
        let mut cells = vec![0i64; n * n];

        for (ballot, count) in ballots.ballots().iter() {
            let count = count as i64;
            for first in 0..n {
                for second in (first + 1)..n {
                    use std::cmp::Ordering::*;
                    match ballot.compare(first, second) {
                        Greater => cells[first * n + second] += count,
                        Less => cells[first * n + second] -= count,
                        Equal => {}
                    }
                }
            }
        }
        // Mirror the upper triangle.
        for first in 0..n {
            for second in (first + 1)..n {
                cells[second * n + first] = -cells[first * n + second];
            }
        }

        BeatMatrix { candidate_count: n, cells }
    }

    pub fn candidate_count(&self) -> usize {
        self.candidate_count
    }

    /// The signed margin of `first` over `second`.
    pub fn margin(&self, first: usize, second: usize) -> i64 {
        self.cells[first * self.candidate_count + second]
    }

    /// Whether a strict majority of opinionated ballots prefers `first`.
    pub fn beats(&self, first: usize, second: usize) -> bool {
        self.margin(first, second) > 0
    }

    /// Copeland score: beats minus losses against all other candidates.
    pub fn copeland_score(&self, candidate: usize) -> i64 {
        (0..self.candidate_count)
            .map(|other| self.margin(candidate, other).signum())
            .sum()
    }

    /// The Schulze set: the smallest non-empty set of candidates such that
    /// every member beats every non-member.
    ///
    /// Seeded with the top Copeland scorers, then grown: any candidate not
    /// beaten by every current member joins, until the set is closed. The
    /// result is sorted and always non-empty; in a fully cyclic election it is
    /// the whole field.
    pub fn schulze_set(&self) -> Vec<usize> {
        let n = self.candidate_count;
        let best = (0..n).map(|c| self.copeland_score(c)).max().unwrap_or(0);
        let mut members: Vec<bool> = (0..n).map(|c| self.copeland_score(c) == best).collect();

        loop {
            let mut grew = false;
            for outsider in 0..n {
                if members[outsider] {
                    continue;
                }
                let dominated = (0..n)
                    .filter(|&m| members[m])
                    .all(|m| self.beats(m, outsider));
                if !dominated {
                    members[outsider] = true;
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }

        let set: Vec<usize> = (0..n).filter(|&c| members[c]).collect();
        debug!("schulze set: {:?}", set);
        set
    }
}
