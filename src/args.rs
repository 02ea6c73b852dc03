use clap::Parser;

/// This is a coalition-consensus voting tabulation program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (text) The election data as inline ballot text, e.g. "a b c * 2; b a c".
    /// For more information about the format, read the documentation.
    #[clap(short, long, value_parser)]
    pub ballots: Option<String>,

    /// (file path) A file containing the election data in ballot text format.
    /// Ignored when --ballots is given.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default coalition) The tallying method: 'coalition' or 'naive'.
    #[clap(short, long, value_parser)]
    pub method: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be
    /// written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the outcome of an election in JSON format.
    /// If provided, convote will check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
