use crate::matcher::{LineMatcher, Matcher};
use crate::merge::Merger;
use anyhow::Result;
use log::error;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::io::{BufRead, BufReader, Read, Write};

/// Per-run display configuration for matched lines
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOptions {
    /// Prefix matches with the source filename. The caller sets this based
    /// on the source count: only when more than one file is named.
    pub show_filename: bool,
    /// Prefix matches with the 1-indexed line number
    pub show_line_number: bool,
}

impl DisplayOptions {
    /// Returns true if any prefix will be added to matched lines
    pub fn is_active(&self) -> bool {
        self.show_filename || self.show_line_number
    }

    fn format(&self, source: Option<&str>, line_number: u64, line: &str) -> String {
        let mut output = String::new();

        if self.show_filename {
            if let Some(name) = source {
                output.push_str(name);
                output.push(':');
            }
        }

        if self.show_line_number {
            let _ = write!(output, "{}:", line_number);
        }

        output.push_str(line);
        output
    }
}

/// Sequential line pipeline: match, format, dispatch
///
/// Holds the matcher, the display configuration and the optional merger for
/// a whole run; `process_source` is called once per input source so the
/// merger's seen set spans all of them. Generic over the output and merge
/// target writers for testability.
pub struct LineProcessor<W: Write, T: Write> {
    writer: W,
    matcher: LineMatcher,
    display: DisplayOptions,
    merger: Option<Merger<T>>,
}

impl<W: Write, T: Write> LineProcessor<W, T> {
    pub fn new(
        writer: W,
        matcher: LineMatcher,
        display: DisplayOptions,
        merger: Option<Merger<T>>,
    ) -> Self {
        Self {
            writer,
            matcher,
            display,
            merger,
        }
    }

    /// Processes one input source line by line until EOF
    ///
    /// Line numbers are 1-indexed and reset per source. A mid-stream read
    /// failure (including invalid UTF-8) is reported and ends this source
    /// only; the caller moves on to the next one. Failures on the output
    /// stream are propagated.
    pub fn process_source<R: Read>(&mut self, reader: R, source: Option<&str>) -> Result<()> {
        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        let mut line_number: u64 = 0;

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    error!("Error reading {}: {}", source.unwrap_or("<stdin>"), e);
                    break;
                }
            }
            line_number += 1;

            // Remove trailing newline if present
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }

            if !self.matcher.matches(&line) {
                continue;
            }

            let printable = if self.display.is_active() {
                Cow::Owned(self.display.format(source, line_number, &line))
            } else {
                Cow::Borrowed(line.as_str())
            };

            match &mut self.merger {
                Some(merger) => {
                    merger.offer(&line, &printable, &mut self.writer)?;
                }
                None => writeln!(self.writer, "{}", printable)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Cursor;

    fn literal(pattern: &str) -> LineMatcher {
        LineMatcher::from_args(pattern.to_string(), false, false, false).unwrap()
    }

    fn no_merger() -> Option<Merger<Vec<u8>>> {
        None
    }

    fn merger_with_seen(seen: &[&str]) -> Option<Merger<Vec<u8>>> {
        let seen = seen.iter().map(|s| s.to_string()).collect::<HashSet<_>>();
        Some(Merger::new(seen, Some(Vec::new()), false, false))
    }

    #[test]
    fn test_plain_mode_prints_every_match() {
        let input = "foo\nbar\nfoo\nbaz\n";
        let mut output = Vec::new();

        let mut processor = LineProcessor::new(
            &mut output,
            literal("foo"),
            DisplayOptions::default(),
            no_merger(),
        );
        processor.process_source(Cursor::new(input), None).unwrap();

        // No dedup in plain mode: both occurrences printed
        assert_eq!(String::from_utf8(output).unwrap(), "foo\nfoo\n");
    }

    #[test]
    fn test_plain_mode_prints_whitespace_only_matches() {
        // Trimming applies only inside merge logic; plain mode passes the
        // line through untouched.
        let input = "   \nfoo\n";
        let mut output = Vec::new();

        let mut processor = LineProcessor::new(
            &mut output,
            literal(" "),
            DisplayOptions::default(),
            no_merger(),
        );
        processor.process_source(Cursor::new(input), None).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "   \n");
    }

    #[test]
    fn test_merge_mode_dedups_within_run() {
        let input = "foo\nbar\nfoo\nbaz\n";
        let mut output = Vec::new();

        let mut processor = LineProcessor::new(
            &mut output,
            literal("a"),
            DisplayOptions::default(),
            merger_with_seen(&[]),
        );
        processor.process_source(Cursor::new(input), None).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "bar\nbaz\n");
    }

    #[test]
    fn test_merge_mode_suppresses_preloaded_lines() {
        let input = "foo\nbar\nfoo\nbaz\n";
        let mut output = Vec::new();

        let mut processor = LineProcessor::new(
            &mut output,
            literal("a"),
            DisplayOptions::default(),
            merger_with_seen(&["bar"]),
        );
        processor.process_source(Cursor::new(input), None).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "baz\n");
    }

    #[test]
    fn test_merge_mode_seen_set_spans_sources() {
        let mut output = Vec::new();

        let mut processor = LineProcessor::new(
            &mut output,
            literal("a"),
            DisplayOptions::default(),
            merger_with_seen(&[]),
        );
        processor
            .process_source(Cursor::new("bar\nbaz\n"), Some("one.txt"))
            .unwrap();
        processor
            .process_source(Cursor::new("baz\nquark\n"), Some("two.txt"))
            .unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "bar\nbaz\nquark\n");
    }

    #[test]
    fn test_merge_mode_suppresses_blank_matches() {
        // An inverted pattern can match whitespace-only lines; merge mode
        // drops them after trimming.
        let matcher = LineMatcher::from_args("x".to_string(), false, false, true).unwrap();
        let input = "   \nbar\n";
        let mut output = Vec::new();

        let mut processor = LineProcessor::new(
            &mut output,
            matcher,
            DisplayOptions::default(),
            merger_with_seen(&[]),
        );
        processor.process_source(Cursor::new(input), None).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "bar\n");
    }

    #[test]
    fn test_line_number_prefix() {
        let input = "foo\nbar\nfoo\n";
        let mut output = Vec::new();

        let display = DisplayOptions {
            show_filename: false,
            show_line_number: true,
        };
        let mut processor = LineProcessor::new(&mut output, literal("foo"), display, no_merger());
        processor.process_source(Cursor::new(input), None).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "1:foo\n3:foo\n");
    }

    #[test]
    fn test_filename_and_line_number_prefix() {
        let input = "foo\nbar\nfoo\n";
        let mut output = Vec::new();

        let display = DisplayOptions {
            show_filename: true,
            show_line_number: true,
        };
        let mut processor = LineProcessor::new(&mut output, literal("foo"), display, no_merger());
        processor
            .process_source(Cursor::new(input), Some("app.log"))
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "app.log:1:foo\napp.log:3:foo\n"
        );
    }

    #[test]
    fn test_line_numbers_reset_per_source() {
        let display = DisplayOptions {
            show_filename: true,
            show_line_number: true,
        };
        let mut output = Vec::new();

        let mut processor = LineProcessor::new(&mut output, literal("foo"), display, no_merger());
        processor
            .process_source(Cursor::new("skip\nfoo\n"), Some("one.log"))
            .unwrap();
        processor
            .process_source(Cursor::new("foo\n"), Some("two.log"))
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "one.log:2:foo\ntwo.log:1:foo\n"
        );
    }

    #[test]
    fn test_merge_mode_prints_prefixed_form_when_display_active() {
        let input = "foo\nbar\n";
        let mut output = Vec::new();

        let display = DisplayOptions {
            show_filename: false,
            show_line_number: true,
        };
        let mut processor =
            LineProcessor::new(&mut output, literal("foo"), display, merger_with_seen(&[]));
        processor.process_source(Cursor::new(input), None).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "1:foo\n");
    }

    #[test]
    fn test_strips_crlf_line_endings() {
        let input = "foo\r\nfoo\n";
        let mut output = Vec::new();

        let mut processor = LineProcessor::new(
            &mut output,
            literal("foo"),
            DisplayOptions::default(),
            no_merger(),
        );
        processor.process_source(Cursor::new(input), None).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "foo\nfoo\n");
    }

    #[test]
    fn test_last_line_without_newline() {
        let input = "foo\nfoo";
        let mut output = Vec::new();

        let mut processor = LineProcessor::new(
            &mut output,
            literal("foo"),
            DisplayOptions::default(),
            no_merger(),
        );
        processor.process_source(Cursor::new(input), None).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "foo\nfoo\n");
    }

    #[test]
    fn test_empty_input() {
        let mut output = Vec::new();

        let mut processor = LineProcessor::new(
            &mut output,
            literal("foo"),
            DisplayOptions::default(),
            no_merger(),
        );
        processor.process_source(Cursor::new(""), None).unwrap();

        assert!(output.is_empty());
    }

    #[test]
    fn test_read_error_ends_source_without_failing() {
        // Invalid UTF-8 surfaces as a read error; the source stops but the
        // call still succeeds so later sources get their turn.
        let input: &[u8] = b"foo\n\xff\xfe\nfoo\n";
        let mut output = Vec::new();

        let mut processor = LineProcessor::new(
            &mut output,
            literal("foo"),
            DisplayOptions::default(),
            no_merger(),
        );
        processor
            .process_source(Cursor::new(input), Some("bad.bin"))
            .unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "foo\n");
    }
}
