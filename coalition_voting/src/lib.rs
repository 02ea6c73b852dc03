mod ballot;
pub mod builder;
mod coalition;
mod collection;
mod config;
pub mod manual;
mod matrix;
pub mod quick_start;

use log::{debug, info};

pub use crate::ballot::{
    candidate_count_of, decode_candidate, encode_candidate, encode_candidates, ApprovalBallot,
    BallotParse, CandidateComparer, RankedBallot,
};
pub use crate::coalition::{Coalition, CoalitionBeatMatrix};
pub use crate::collection::{BallotCollection, CountedList, MAX_CANDIDATES};
pub use crate::config::*;
pub use crate::matrix::BeatMatrix;

/// Runs the coalition consensus method over a ballot collection.
///
/// Every ballot approves its first choices. It then keeps approving further
/// tiers as long as some candidate it ranked third or lower (a "bogeyman") is
/// not yet beaten by the coalition of everyone ranked higher, enlisting each
/// tier in turn against the bogeymen that remain. The last tier is never
/// approved: no one is approved by default from the bottom.
pub fn tally(ballots: &BallotCollection<RankedBallot>) -> Result<TallyOutcome, TallyError> {
    info!(
        "tallying {} votes over {} candidates with the coalition method",
        ballots.total_votes(),
        ballots.candidate_count()
    );
    let mut beat_matrix = CoalitionBeatMatrix::new(ballots);

    let mut approval_counts = vec![0u32; ballots.candidate_count()];
    let mut first_choice_counts = vec![0u32; ballots.candidate_count()];
    let mut compromises = CountedList::new();

    for (ballot, count) in ballots.ballots().iter() {
        let ranking = ballot.ranking();

        for &c in &ranking[0] {
            first_choice_counts[c] += count;
            approval_counts[c] += count;
        }

        if ranking.len() < 3 {
            continue;
        }

        // The bogeymen: candidates ranked third or lower that the ballot's
        // favorites do not already beat on their own.
        let mut coalition = Coalition::from_members(ranking[0].iter().copied());
        let mut bogeymen: Vec<usize> = Vec::new();
        for &b in ranking[2..].iter().flatten() {
            if !beat_matrix.beats(coalition, b)? {
                bogeymen.push(b);
            }
        }
        if bogeymen.is_empty() {
            continue;
        }

        for tier in &ranking[1..ranking.len() - 1] {
            let greater: Vec<usize> = bogeymen
                .iter()
                .copied()
                .filter(|b| !tier.contains(b))
                .collect();

            // Every remaining bogeyman sits in this very tier: the previous
            // tier is where the approvals stop.
            if greater.is_empty() {
                break;
            }

            // Enlist this tier (lesser bogeymen included) against the
            // greater bogeymen.
            let remaining_bogeymen = Coalition::from_members(greater.iter().copied());
            for &c in tier {
                approval_counts[c] += count;
                compromises.add(
                    Compromise {
                        compromise: c,
                        preferred: coalition,
                        bogeymen: remaining_bogeymen,
                    },
                    count,
                );
            }

            coalition |= Coalition::from_members(tier.iter().copied());
            let mut remaining: Vec<usize> = Vec::new();
            for &b in &greater {
                if !beat_matrix.beats(coalition, b)? {
                    remaining.push(b);
                }
            }
            if remaining.is_empty() {
                break;
            }
            bogeymen = remaining;
        }
    }

    debug!("approval counts: {:?}", approval_counts);
    Ok(TallyOutcome {
        ranking: index_ranking(&approval_counts),
        approval_counts,
        first_choice_counts,
        compromises,
    })
}

/// Runs the single-round variant that consults only the pairwise beat matrix.
///
/// A ballot approves a tier when every candidate it already preferred is
/// pairwise-beaten by some remaining lower-ranked candidate. Kept as a
/// baseline: blocs that truncate their ballots can spoil it.
pub fn tally_single_round(ballots: &BallotCollection<RankedBallot>) -> TallyOutcome {
    info!(
        "tallying {} votes over {} candidates with the single-round method",
        ballots.total_votes(),
        ballots.candidate_count()
    );
    let beat_matrix = ballots.beat_matrix();
    let candidate_count = ballots.candidate_count();

    let mut approval_counts = vec![0u32; candidate_count];
    let mut first_choice_counts = vec![0u32; candidate_count];
    let mut compromises = CountedList::new();

    for (ballot, count) in ballots.ballots().iter() {
        let ranking = ballot.ranking();

        for &c in &ranking[0] {
            first_choice_counts[c] += count;
            approval_counts[c] += count;
        }

        if ranking.len() < 3 {
            continue;
        }

        let mut preferred: Vec<usize> = ranking[0].clone();
        let mut potential: Vec<usize> = (0..candidate_count)
            .filter(|c| !ranking[0].contains(c))
            .collect();

        for tier in &ranking[1..ranking.len() - 1] {
            potential.retain(|b| !tier.contains(b));

            if preferred
                .iter()
                .all(|&a| potential.iter().any(|&b| beat_matrix.beats(b, a)))
            {
                let preferred_coalition = Coalition::from_members(preferred.iter().copied());
                let bogeymen = Coalition::from_members(
                    potential
                        .iter()
                        .copied()
                        .filter(|&b| preferred.iter().any(|&a| beat_matrix.beats(b, a))),
                );
                for &c in tier {
                    approval_counts[c] += count;
                    compromises.add(
                        Compromise {
                            compromise: c,
                            preferred: preferred_coalition,
                            bogeymen,
                        },
                        count,
                    );
                }
            }

            preferred.extend_from_slice(tier);
        }
    }

    TallyOutcome {
        ranking: index_ranking(&approval_counts),
        approval_counts,
        first_choice_counts,
        compromises,
    }
}

/// Groups candidate indices by descending count; tied candidates share a
/// group.
pub fn index_ranking(counts: &[u32]) -> Vec<Vec<usize>> {
    let mut sorted: Vec<usize> = (0..counts.len()).collect();
    sorted.sort_by(|&a, &b| counts[b].cmp(&counts[a]).then(a.cmp(&b)));

    let mut ranking: Vec<Vec<usize>> = Vec::new();
    for c in sorted {
        match ranking.last_mut() {
            Some(tier) if counts[tier[0]] == counts[c] => tier.push(c),
            _ => ranking.push(vec![c]),
        }
    }
    ranking
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(source: &str) -> BallotCollection<RankedBallot> {
        BallotCollection::parse(source).unwrap()
    }

    fn winners(source: &str) -> String {
        let outcome = tally(&collection(source)).unwrap();
        encode_candidates(outcome.ranking[0].iter().copied())
    }

    fn single_round_winners(source: &str) -> String {
        let outcome = tally_single_round(&collection(source));
        encode_candidates(outcome.ranking[0].iter().copied())
    }

    #[test]
    fn first_choice_majority_wins_outright() {
        assert_eq!(winners("ab c * 51; a b c * 49"), "a");
        assert_eq!(winners("a b; b a * 2"), "b");
    }

    #[test]
    fn two_candidate_election() {
        let outcome = tally(&collection("a b")).unwrap();
        assert_eq!(outcome.ranking, vec![vec![0], vec![1]]);
        assert_eq!(outcome.approval_counts, vec![1, 0]);
        assert_eq!(outcome.first_choice_counts, vec![1, 0]);
        assert!(outcome.compromises.is_empty());
    }

    #[test]
    fn all_tied_ballots_tally_to_a_full_tie() {
        let outcome = tally(&collection("abc * 5")).unwrap();
        assert_eq!(outcome.ranking, vec![vec![0, 1, 2]]);
        assert_eq!(outcome.first_choice_counts, vec![5, 5, 5]);
        assert!(outcome.compromises.is_empty());
    }

    #[test]
    fn minority_blocs_rally_behind_a_compromise() {
        assert_eq!(winners("a b c * 2; b a c * 2; c b a"), "b");
    }

    #[test]
    fn coalition_building() {
        assert_eq!(winners("a b c * 49; b c a * 48; c b a * 3"), "b");
        assert_eq!(winners("a bc * 48; a b c; b c a * 48; c b a * 3"), "b");
        assert_eq!(winners("a bc * 48; a c b; b c a * 48; c b a * 3"), "c");
        assert_eq!(winners("a bc * 49; b c a * 48; c b a * 3"), "bc");
    }

    #[test]
    fn no_favorite_betrayal_incentive() {
        // a's bloc lists its honest second choice and still wins; had the c
        // bloc instead backed b outright, b would have won directly.
        assert_eq!(winners("a c b * 49; b a c * 48; c b a * 3"), "a");
        assert_eq!(winners("a c b * 49; b a c * 48; b a c * 3"), "b");
    }

    #[test]
    fn burying_does_not_pay() {
        // Neither leading bloc needs the c voters, so c's attempt to play
        // kingmaker only picks between a and b.
        assert_eq!(winners("a b c * 49; b a c * 48; c b a * 3"), "b");
        assert_eq!(winners("a b c * 49; b a c * 48; c a b * 3"), "a");
    }

    #[test]
    fn compromise_records_name_the_motivating_bogeymen() {
        let outcome = tally(&collection("a b c * 49; b c a * 48; c b a * 3")).unwrap();
        let c = |letters: &str| {
            Coalition::from_members(letters.chars().map(|l| l as usize - 'a' as usize))
        };
        assert_eq!(
            outcome.compromises.count_of(&Compromise {
                compromise: 1,
                preferred: c("a"),
                bogeymen: c("c"),
            }),
            49
        );
        assert_eq!(
            outcome.compromises.count_of(&Compromise {
                compromise: 2,
                preferred: c("b"),
                bogeymen: c("a"),
            }),
            48
        );
        assert_eq!(
            outcome.compromises.count_of(&Compromise {
                compromise: 1,
                preferred: c("c"),
                bogeymen: c("a"),
            }),
            3
        );
        assert_eq!(outcome.compromises.total(), 100);
    }

    #[test]
    fn single_round_suffers_the_truncation_spoiler() {
        // The a and b blocs each expect to win with the other's support, so
        // neither compromises, and the truncating c bloc slips through. Under
        // the coalition method the two blocs back each other and tie ahead
        // of c.
        let spoiled = "a b c * 31; b a c * 32; c ba * 37";
        assert_eq!(single_round_winners(spoiled), "c");
        assert_eq!(winners(spoiled), "ab");
        // With a full c-bloc ranking the compromise on b goes through even
        // in a single round.
        assert_eq!(single_round_winners("a b c * 31; b a c * 32; c b a * 37"), "b");
    }

    #[test]
    fn conservation_of_votes() {
        for source in [
            "a b c * 49; b c a * 48; c b a * 3",
            "a bc * 48; a c b; b c a * 48; c b a * 3",
            "a b",
            "a b c * 31; b a c * 32; c ba * 37",
        ] {
            let ballots = collection(source);
            let outcome = tally(&ballots).unwrap();
            let first: u32 = outcome.first_choice_counts.iter().sum();
            let approvals: u32 = outcome.approval_counts.iter().sum();
            assert_eq!(first, ballots.total_votes(), "{}", source);
            assert!(approvals >= first, "{}", source);
        }
    }

    #[test]
    fn tally_is_deterministic_across_input_orders() {
        let first = collection("a b c * 49; b c a * 48; c b a * 3");
        let second = collection("c b a * 3; b c a * 40; a b c * 49; b c a * 8");
        assert_eq!(first, second);
        assert_eq!(tally(&first).unwrap(), tally(&second).unwrap());
    }

    #[test]
    fn index_ranking_groups_ties() {
        assert_eq!(
            index_ranking(&[5, 9, 5, 0]),
            vec![vec![1], vec![0, 2], vec![3]]
        );
        assert_eq!(index_ranking(&[3, 3]), vec![vec![0, 1]]);
    }
}
