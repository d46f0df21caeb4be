use clap::Parser;
use std::path::PathBuf;

/// Line Sifter - Select matching lines and collect unique ones into a file
#[derive(Parser, Debug)]
#[command(
    version,
    after_help = r#"EXAMPLES:
    linesift "error" app.log
    linesift -i -n "WARN" app.log service.log
    cat urls.txt | linesift -E '^https?://'
    cat scan.txt | linesift -m known-hosts.txt "host"
    linesift -m results.txt -d "TODO" notes.txt

In merge mode (-m) matched lines are trimmed, deduplicated against the
target file and appended only when new, so repeated runs never grow the
file with duplicates."#
)]
pub struct LinesiftArgs {
    /// Pattern to match, a literal substring unless -E is given
    pub pattern: String,

    /// Files to search; reads standard input when none are given
    pub files: Vec<PathBuf>,

    /// Case-insensitive matching
    #[arg(short = 'i', long)]
    pub ignore_case: bool,

    /// Prefix each match with its 1-indexed line number
    #[arg(short = 'n', long)]
    pub line_number: bool,

    /// Select lines that do NOT match the pattern
    #[arg(short = 'v', long)]
    pub invert_match: bool,

    /// Treat the pattern as a regular expression
    #[arg(short = 'E', long)]
    pub regex: bool,

    /// Merge mode: append unique matching lines to FILE
    #[arg(short = 'm', long, value_name = "FILE")]
    pub merge: Option<PathBuf>,

    /// Suppress stdout in merge mode
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Report what would be appended without writing to the merge target
    #[arg(short = 'd', long)]
    pub dry_run: bool,
}
