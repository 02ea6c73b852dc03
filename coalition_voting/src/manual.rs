/*!

This is the long-form manual for `coalition_voting` and `convote`.

## Ballot text format

Candidates are lowercase letters starting at `a`; the election size is one
past the highest letter mentioned anywhere in the input.

A ballot is a sequence of tiers separated by spaces, best to worst. A tier is
a run of letters ranked exactly equal. Candidates left off a ballot are tied
strictly last.

Ballots are separated by semicolons or newlines, and a ballot may carry a
`* nn` suffix standing for that many identical ballots:

```text
a b c * 31
b a c * 32
c ba * 37
```

is an election over three candidates with one hundred voters; the last bloc
puts `c` first and is indifferent between `a` and `b`.

## Methods

### `coalition`

The default method. Every ballot approves its first choices. A ballot then
keeps approving further tiers as long as some candidate it ranks third or
lower is not yet beaten by the coalition of everyone it ranked higher (the
"bogeymen"). Whether a coalition beats a candidate is decided by the coalition
beat matrix: the ballots backing the whole coalition as a bloc against the
candidate, net of the ballots preferring the candidate to any member. The
candidate(s) with the most approvals win.

Each approval below the first tier is recorded as a *compromise*, together
with the coalition the ballot preferred outright and the bogeymen that
motivated it. These records are purely diagnostic.

### `naive`

A single-round variant that only consults the pairwise beat matrix: a ballot
approves a tier when every candidate it already preferred is pairwise-beaten
by some remaining lower-ranked candidate. Kept as a baseline; it is known to
suffer a spoiler effect when a bloc truncates its ballot.

## Output

`convote` prints a human-readable report: the winners, the full ranking, a
per-candidate table of total approvals, first choices and compromises, the
compromise records, and the Schulze set of the pairwise matrix.

With `--out`, a JSON summary of the same data is written instead (to a file,
or to stdout with `--out stdout`). The JSON is deterministic for equal ballot
collections, so it can be compared against a reference file with
`--reference`.

 */
