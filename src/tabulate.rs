use log::{info, warn};

use coalition_voting::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde::Serialize;
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;

#[derive(Debug, Snafu)]
pub enum ConvoteError {
    #[snafu(display("No ballots given: use --ballots or --input"))]
    MissingBallots {},
    #[snafu(display("Error reading ballot file {path}"))]
    OpeningBallots {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing summary file {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading reference file {path}"))]
    OpeningReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Cannot tally the election: {source}"))]
    Tallying { source: TallyError },
    #[snafu(display("Unknown method '{method}': expected 'coalition' or 'naive'"))]
    UnknownMethod { method: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type ConvoteResult<T> = Result<T, ConvoteError>;

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
struct OutputHeader {
    method: String,
    #[serde(rename = "candidateCount")]
    candidate_count: usize,
    #[serde(rename = "totalVotes")]
    total_votes: u32,
}

/// Renders an outcome as JSON. Compromise records are sorted so that equal
/// ballot collections always produce byte-identical summaries.
fn outcome_to_json(outcome: &TallyOutcome, schulze_set: &[usize]) -> JSValue {
    let ranking: Vec<String> = outcome
        .ranking
        .iter()
        .map(|tier| encode_candidates(tier.iter().copied()))
        .collect();

    let mut compromises: Vec<(usize, Coalition, Coalition, u32)> = outcome
        .compromises
        .iter()
        .map(|(c, count)| (c.compromise, c.preferred, c.bogeymen, count))
        .collect();
    compromises.sort();

    let compromises_js: Vec<JSValue> = compromises
        .iter()
        .map(|(compromise, preferred, bogeymen, count)| {
            json!({
                "compromise": encode_candidate(*compromise).to_string(),
                "preferred": preferred.to_string(),
                "bogeymen": bogeymen.to_string(),
                "count": count,
            })
        })
        .collect();

    json!({
        "winners": ranking[0],
        "ranking": ranking,
        "approvals": outcome.approval_counts,
        "firstChoices": outcome.first_choice_counts,
        "compromises": compromises_js,
        "schulzeSet": encode_candidates(schulze_set.iter().copied()),
    })
}

fn print_report(outcome: &TallyOutcome, schulze_set: &[usize]) {
    let ranking = outcome
        .ranking
        .iter()
        .map(|tier| encode_candidates(tier.iter().copied()))
        .collect::<Vec<String>>()
        .join(" > ");
    println!(
        "Winners: {}",
        encode_candidates(outcome.ranking[0].iter().copied())
    );
    println!("Ranking: {}", ranking);

    println!();
    println!("Votes");
    println!("{:>6} {:>7} {:>7} {:>7}", "Cand.", "Total", "First", "Comp.");
    for &c in outcome.ranking.iter().flatten() {
        println!(
            "{:>6} {:>7} {:>7} {:>7}",
            encode_candidate(c),
            outcome.approval_counts[c],
            outcome.first_choice_counts[c],
            outcome.approval_counts[c] - outcome.first_choice_counts[c],
        );
    }

    if !outcome.compromises.is_empty() {
        let mut compromises: Vec<(usize, Coalition, Coalition, u32)> = outcome
            .compromises
            .iter()
            .map(|(c, count)| (c.compromise, c.preferred, c.bogeymen, count))
            .collect();
        compromises.sort();

        println!();
        println!("Compromises");
        println!("{:>6} {:>7} {:>7} {:>7}", "Comp.", "Pref.", "Bogey.", "Count");
        for (compromise, preferred, bogeymen, count) in compromises {
            println!(
                "{:>6} {:>7} {:>7} {:>7}",
                encode_candidate(compromise),
                preferred,
                bogeymen,
                count,
            );
        }
    }

    println!();
    println!(
        "Schulze set: {}",
        encode_candidates(schulze_set.iter().copied())
    );
}

fn read_summary(path: &str) -> ConvoteResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningReferenceSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub fn run(args: &Args) -> ConvoteResult<()> {
    let source = match (&args.ballots, &args.input) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => {
            fs::read_to_string(path).context(OpeningBallotsSnafu { path: path.as_str() })?
        }
        (None, None) => return MissingBallotsSnafu {}.fail(),
    };

    let ballots = BallotCollection::<RankedBallot>::parse(&source).context(TallyingSnafu {})?;
    info!(
        "tabulating {} votes over {} candidates",
        ballots.total_votes(),
        ballots.candidate_count()
    );

    let method = args.method.as_deref().unwrap_or("coalition");
    let outcome = match method {
        "coalition" => tally(&ballots).context(TallyingSnafu {})?,
        "naive" => tally_single_round(&ballots),
        _ => return UnknownMethodSnafu { method }.fail(),
    };
    let schulze_set = ballots.beat_matrix().schulze_set();

    print_report(&outcome, &schulze_set);

    // Assemble the final json
    let header = OutputHeader {
        method: method.to_string(),
        candidate_count: ballots.candidate_count(),
        total_votes: ballots.total_votes(),
    };
    let summary_js = json!({
        "config": header,
        "results": outcome_to_json(&outcome, &schulze_set),
    });
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        None => {}
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(path) => fs::write(path, &pretty_js_stats).context(WritingSummarySnafu { path })?,
    }

    // The reference summary, if provided for comparison
    if let Some(reference) = &args.reference {
        let summary_ref = read_summary(reference)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(ballots: &str, method: Option<&str>) -> Args {
        Args {
            ballots: Some(ballots.to_string()),
            input: None,
            method: method.map(|m| m.to_string()),
            out: None,
            reference: None,
            verbose: false,
        }
    }

    fn summary(ballots: &str, method: &str) -> JSValue {
        let collection = BallotCollection::<RankedBallot>::parse(ballots).unwrap();
        let outcome = match method {
            "coalition" => tally(&collection).unwrap(),
            _ => tally_single_round(&collection),
        };
        outcome_to_json(&outcome, &collection.beat_matrix().schulze_set())
    }

    #[test]
    fn runs_both_methods_end_to_end() {
        run(&args("a b c * 49; b c a * 48; c b a * 3", None)).unwrap();
        run(&args("a b c * 49; b c a * 48; c b a * 3", Some("naive"))).unwrap();
    }

    #[test]
    fn rejects_unknown_method() {
        assert!(matches!(
            run(&args("a b", Some("borda"))),
            Err(ConvoteError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn rejects_missing_ballots() {
        let mut empty = args("", None);
        empty.ballots = None;
        assert!(matches!(run(&empty), Err(ConvoteError::MissingBallots {})));
    }

    #[test]
    fn summary_is_deterministic_across_input_orders() {
        let first = summary("a b c * 49; b c a * 48; c b a * 3", "coalition");
        let second = summary("c b a * 3; b c a * 40; a b c * 49; b c a * 8", "coalition");
        assert_eq!(
            serde_json::to_string_pretty(&first).unwrap(),
            serde_json::to_string_pretty(&second).unwrap()
        );
    }

    #[test]
    fn summary_names_the_winner() {
        let js = summary("a b c * 49; b c a * 48; c b a * 3", "coalition");
        assert_eq!(js["winners"], "b");
        assert_eq!(js["schulzeSet"], "b");
        assert_eq!(js["approvals"][1], 100);

        let spoiled = summary("a b c * 31; b a c * 32; c ba * 37", "naive");
        assert_eq!(spoiled["winners"], "c");
    }
}
