mod cli;
mod matcher;
mod merge;
mod processor;

use anyhow::Result;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
use clap::Parser;
use clap::error::ErrorKind;
use cli::LinesiftArgs;
use log::error;
use matcher::LineMatcher;
use merge::Merger;
use processor::{DisplayOptions, LineProcessor};
use std::fs::File;
use std::io;
use std::process;

fn main() -> Result<()> {
    env_logger::init();

    // Usage errors exit with 1 rather than clap's default of 2; help and
    // version are normal completion.
    let args = match LinesiftArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            return Ok(());
        }
        Err(e) => {
            e.print()?;
            process::exit(1);
        }
    };

    // Create matcher from CLI arguments
    let matcher = LineMatcher::from_args(
        args.pattern,
        args.regex,
        args.ignore_case,
        args.invert_match,
    )
    .map_err(|e| anyhow::anyhow!("Pattern error: {}", e))?;

    // Merge mode: seed the seen set and open the append handle up front so
    // a broken target fails the run before any input is consumed
    let merger = match &args.merge {
        Some(path) => Some(Merger::open(path, args.quiet, args.dry_run)?),
        None => None,
    };

    let display = DisplayOptions {
        show_filename: args.files.len() > 1,
        show_line_number: args.line_number,
    };

    let mut processor = LineProcessor::new(io::stdout(), matcher, display, merger);

    if args.files.is_empty() {
        processor.process_source(io::stdin(), None)?;
    } else {
        for path in &args.files {
            let file = match File::open(path) {
                Ok(file) => file,
                Err(e) => {
                    error!("Error opening {}: {}", path.display(), e);
                    continue;
                }
            };
            processor.process_source(file, Some(&path.to_string_lossy()))?;
        }
    }

    Ok(())
}
