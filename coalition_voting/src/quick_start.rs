/*!

# Quick start

Collect ranked ballots in the letter-encoded text format (see the
[manual](crate::manual) for the full syntax) and run the coalition consensus
tally:

```
use coalition_voting::{tally, BallotCollection, RankedBallot};

let ballots = BallotCollection::<RankedBallot>::parse(
    "a b c * 49; b c a * 48; c b a * 3",
)?;

let outcome = tally(&ballots)?;
assert_eq!(outcome.ranking[0], vec![1]); // b wins
# Ok::<(), coalition_voting::TallyError>(())
```

The outcome carries the full picture: `ranking` groups candidates by
descending approval count, `approval_counts` and `first_choice_counts` give
the per-candidate totals, and `compromises` records which ballots approved a
below-top-choice candidate and why.

For structured input, build the collection programmatically with
[`Builder`](crate::builder::Builder) instead of ballot text.

*/
