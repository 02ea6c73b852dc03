use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use log::debug;

use crate::ballot::{encode_candidates, CandidateComparer};
use crate::collection::BallotCollection;
use crate::config::TallyError;

/// An immutable set of candidates packed into a bitmask.
#[derive(Eq, PartialEq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Coalition(u64);

impl Coalition {
    pub const EMPTY: Coalition = Coalition(0);

    pub fn single(candidate: usize) -> Coalition {
        Coalition(1 << candidate)
    }

    pub fn from_members(members: impl IntoIterator<Item = usize>) -> Coalition {
        members
            .into_iter()
            .fold(Coalition::EMPTY, |c, m| c | Coalition::single(m))
    }

    pub fn contains(self, candidate: usize) -> bool {
        self.0 & (1 << candidate) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn intersects(self, other: Coalition) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_subset(self, other: Coalition) -> bool {
        self.0 & !other.0 == 0
    }

    /// The members of `self` that are not in `other`.
    pub fn difference(self, other: Coalition) -> Coalition {
        Coalition(self.0 & !other.0)
    }

    pub fn members(self) -> impl Iterator<Item = usize> {
        (0..u64::BITS as usize).filter(move |&c| self.0 & (1 << c) != 0)
    }

    /// Every coalition obtained by removing exactly one member.
    pub fn immediate_sub_coalitions(self) -> impl Iterator<Item = Coalition> {
        self.members().map(move |m| Coalition(self.0 & !(1 << m)))
    }
}

impl BitOr for Coalition {
    type Output = Coalition;
    fn bitor(self, other: Coalition) -> Coalition {
        Coalition(self.0 | other.0)
    }
}

impl BitOrAssign for Coalition {
    fn bitor_assign(&mut self, other: Coalition) {
        self.0 |= other.0;
    }
}

impl fmt::Display for Coalition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", encode_candidates(self.members()))
    }
}

// Debug piggybacks on Display so assertion failures print letters rather
// than the raw bitmask.
impl fmt::Debug for Coalition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// The three-valued answer of one coalition claim.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Resolution {
    True,
    False,
    /// Not decidable from the ballots alone: the conditional supporters
    /// straddle the margin. Never cached.
    Unresolved,
}

/// How one ballot relates to the claim "coalition C beats candidate b".
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Stance {
    /// At some tier boundary strictly above b, the ballot's preferred
    /// candidates are exactly C.
    Supporter,
    /// Some member of C is ranked strictly below b.
    Detractor,
    /// Some member of C is tied with b (and none below).
    Neutral,
    /// All of C is above b, but the ballot also prefers outsiders: its
    /// largest preferred-so-far strict subset of C decides the stance.
    Conditional(Coalition),
}

/// Classifies one ballot's ranking (tiers as masks, best to worst, covering
/// every candidate) against the claim that `coalition` beats `bogeyman`.
///
/// A single forward scan: nothing below the bogeyman's tier is read.
fn classify(tiers: &[Coalition], coalition: Coalition, bogeyman: usize) -> Stance {
    let mut preferred = Coalition::EMPTY;
    let mut prefix = Coalition::EMPTY;
    let mut exact = false;

    for &tier in tiers {
        if tier.contains(bogeyman) {
            if !coalition.difference(preferred | tier).is_empty() {
                return Stance::Detractor;
            }
            if coalition.intersects(tier) {
                return Stance::Neutral;
            }
            return if exact {
                Stance::Supporter
            } else {
                Stance::Conditional(prefix)
            };
        }
        preferred |= tier;
        if preferred == coalition {
            exact = true;
        } else if preferred.is_subset(coalition) {
            prefix = preferred;
        }
    }

    // Rankings cover every candidate, so the bogeyman's tier is always found.
    unreachable!("candidate {} missing from a ballot ranking", bogeyman)
}

/// Lazily answers whether a coalition of candidates collectively defeats a
/// given candidate (the "bogeyman").
///
/// A coalition beats a candidate when the ballots that would rather see every
/// coalition member win than the bogeyman (and back the coalition as a bloc,
/// preferring no outsider to any member) outnumber the ballots preferring the
/// bogeyman to at least one member. Monotonicity holds by construction: any
/// coalition containing a winning sub-coalition also wins.
///
/// Claims can depend on smaller claims ("this ballot only supports the wide
/// coalition if its own narrower favorite bloc falls short"), so evaluation is
/// a depth-first fixed point over the coalition lattice, memoized per
/// bogeyman. Claims the ballots cannot settle stay unresolved and are reported
/// as not beaten.
pub struct CoalitionBeatMatrix {
    candidate_count: usize,
    rankings: Vec<(Vec<Coalition>, u32)>,
    cache: Vec<HashMap<Coalition, bool>>,
    in_progress: Vec<HashSet<Coalition>>,
}

impl CoalitionBeatMatrix {
    pub fn new<B: CandidateComparer>(ballots: &BallotCollection<B>) -> CoalitionBeatMatrix {
        let candidate_count = ballots.candidate_count();
        let rankings = ballots
            .ballots()
            .iter()
            .map(|(ballot, count)| {
                let tiers = ballot
                    .ranking()
                    .iter()
                    .map(|tier| Coalition::from_members(tier.iter().copied()))
                    .collect();
                (tiers, count)
            })
            .collect();

        CoalitionBeatMatrix {
            candidate_count,
            rankings,
            cache: vec![HashMap::new(); candidate_count],
            in_progress: vec![HashSet::new(); candidate_count],
        }
    }

    /// Whether `coalition` as a bloc defeats `candidate`.
    ///
    /// The coalition must be non-empty, within the election, and must not
    /// contain the candidate itself; those queries have no well-formed answer.
    pub fn beats(&mut self, coalition: Coalition, candidate: usize) -> Result<bool, TallyError> {
        if candidate >= self.candidate_count {
            return Err(TallyError::UnknownCandidate { candidate });
        }
        if coalition.is_empty() {
            return Err(TallyError::EmptyCoalition);
        }
        if let Some(outsider) = coalition.members().find(|&m| m >= self.candidate_count) {
            return Err(TallyError::UnknownCandidate { candidate: outsider });
        }
        if coalition.contains(candidate) {
            return Err(TallyError::SelfReferentialCoalition { candidate });
        }
        Ok(self.resolve(coalition, candidate) == Resolution::True)
    }

    fn resolve(&mut self, coalition: Coalition, candidate: usize) -> Resolution {
        if let Some(&known) = self.cache[candidate].get(&coalition) {
            return if known { Resolution::True } else { Resolution::False };
        }
        // A claim already on the call stack for this bogeyman cannot be
        // decided here; the provisional answer must not be cached.
        if !self.in_progress[candidate].insert(coalition) {
            return Resolution::Unresolved;
        }
        let resolution = self.resolve_uncached(coalition, candidate);
        self.in_progress[candidate].remove(&coalition);

        match resolution {
            Resolution::True => {
                debug!("coalition {} beats {}", coalition, candidate);
                self.cache[candidate].insert(coalition, true);
            }
            Resolution::False => {
                self.cache[candidate].insert(coalition, false);
            }
            Resolution::Unresolved => {}
        }
        resolution
    }

    fn resolve_uncached(&mut self, coalition: Coalition, candidate: usize) -> Resolution {
        // Monotonicity: a coalition containing a winning sub-coalition wins.
        if coalition.len() > 1 {
            for sub in coalition.immediate_sub_coalitions() {
                if self.resolve(sub, candidate) == Resolution::True {
                    return Resolution::True;
                }
            }
        }

        let mut supporters: i64 = 0;
        let mut detractors: i64 = 0;
        let mut conditionals: i64 = 0;
        let mut pending: Vec<(Coalition, u32)> = Vec::new();

        for (tiers, count) in &self.rankings {
            let count = *count;
            match classify(tiers, coalition, candidate) {
                Stance::Supporter => supporters += count as i64,
                Stance::Detractor => detractors += count as i64,
                Stance::Neutral => {}
                Stance::Conditional(prefix) => {
                    conditionals += count as i64;
                    if !prefix.is_empty() {
                        pending.push((prefix, count));
                    }
                }
            }
        }

        // Short-circuit bounds before recursing: conditional ballots can only
        // withhold support, never add opposition.
        if supporters > detractors {
            return Resolution::True;
        }
        if detractors > supporters + conditionals {
            return Resolution::False;
        }
        if conditionals == 0 {
            return Resolution::False;
        }

        // A conditional ballot whose own preferred bloc already beats the
        // bogeyman does not need this coalition at all; drop it.
        for (prefix, count) in pending {
            if self.resolve(prefix, candidate) == Resolution::True {
                conditionals -= count as i64;
            }
        }

        if detractors > supporters + conditionals {
            Resolution::False
        } else {
            Resolution::Unresolved
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::RankedBallot;

    fn matrix(source: &str) -> CoalitionBeatMatrix {
        CoalitionBeatMatrix::new(&BallotCollection::<RankedBallot>::parse(source).unwrap())
    }

    fn coalition(letters: &str) -> Coalition {
        Coalition::from_members(letters.chars().map(|c| c as usize - 'a' as usize))
    }

    #[test]
    fn coalition_set_operations() {
        let abc = coalition("abc");
        let ab = coalition("ab");
        assert!(ab.is_subset(abc));
        assert!(!abc.is_subset(ab));
        assert!(ab.intersects(coalition("bc")));
        assert!(!ab.intersects(coalition("cd")));
        assert_eq!(abc.difference(ab), coalition("c"));
        assert_eq!(ab | coalition("c"), abc);
        assert_eq!(abc.len(), 3);
        assert_eq!(abc.to_string(), "abc");
        assert!(Coalition::EMPTY.is_empty());
    }

    #[test]
    fn immediate_sub_coalitions_drop_one_member_each() {
        let subs: Vec<Coalition> = coalition("abc").immediate_sub_coalitions().collect();
        assert_eq!(subs, vec![coalition("bc"), coalition("ac"), coalition("ab")]);
        assert_eq!(coalition("a").immediate_sub_coalitions().next(), Some(Coalition::EMPTY));
    }

    #[test]
    fn malformed_queries_fail_fast() {
        let mut m = matrix("a b c; b c a");
        assert_eq!(m.beats(Coalition::EMPTY, 0), Err(TallyError::EmptyCoalition));
        assert_eq!(
            m.beats(coalition("ab"), 1),
            Err(TallyError::SelfReferentialCoalition { candidate: 1 })
        );
        assert_eq!(
            m.beats(coalition("a"), 7),
            Err(TallyError::UnknownCandidate { candidate: 7 })
        );
        assert_eq!(
            m.beats(coalition("ad"), 1),
            Err(TallyError::UnknownCandidate { candidate: 3 })
        );
    }

    #[test]
    fn bloc_with_a_clear_majority_wins() {
        // b's bloc plus c's bloc outnumbers a's; neither alone does.
        let mut m = matrix("a b c * 49; b c a * 48; c b a * 3");
        assert_eq!(m.beats(coalition("b"), 0), Ok(false));
        assert_eq!(m.beats(coalition("c"), 0), Ok(false));
        assert_eq!(m.beats(coalition("bc"), 0), Ok(true));
        // Against c the b bloc needs no help.
        assert_eq!(m.beats(coalition("b"), 2), Ok(true));
        assert_eq!(m.beats(coalition("a"), 2), Ok(false));
    }

    #[test]
    fn winning_coalitions_stay_winning_when_grown() {
        let mut m = matrix("a b c * 49; b c a * 48; c b a * 3");
        assert_eq!(m.beats(coalition("b"), 2), Ok(true));
        assert_eq!(m.beats(coalition("ab"), 2), Ok(true));
    }

    #[test]
    fn divided_support_does_not_carry_a_coalition() {
        // a's supporters rank b and c strictly, so neither two-bloc coalition
        // gets their unconditional backing against the third candidate.
        let mut m = matrix("a c b * 49; b a c * 48; c b a * 3");
        assert_eq!(m.beats(coalition("ac"), 1), Ok(false));
        assert_eq!(m.beats(coalition("ab"), 2), Ok(true));
    }

    #[test]
    fn preference_cycle_terminates_with_no_winner() {
        let mut m = matrix("a b c; b c a; c a b");
        for bogeyman in 0..3 {
            for other in 0..3 {
                if other == bogeyman {
                    continue;
                }
                assert_eq!(m.beats(Coalition::single(other), bogeyman), Ok(false));
            }
        }
        assert_eq!(m.beats(coalition("ab"), 2), Ok(false));
        assert_eq!(m.beats(coalition("bc"), 0), Ok(false));
        assert_eq!(m.beats(coalition("ac"), 1), Ok(false));
    }

    #[test]
    fn tied_members_are_neutral() {
        // The c bloc ranks b and a together: it neither supports nor opposes
        // the claim that b beats a.
        let mut m = matrix("a b c * 31; b a c * 32; c ba * 37");
        assert_eq!(m.beats(coalition("b"), 0), Ok(true));
        assert_eq!(m.beats(coalition("a"), 1), Ok(false));
    }

    #[test]
    fn repeated_queries_are_cached() {
        let mut m = matrix("a b c * 49; b c a * 48; c b a * 3");
        assert_eq!(m.beats(coalition("bc"), 0), Ok(true));
        assert_eq!(m.beats(coalition("bc"), 0), Ok(true));
        assert_eq!(m.cache[0].get(&coalition("bc")), Some(&true));
        assert!(m.in_progress[0].is_empty());
    }
}
