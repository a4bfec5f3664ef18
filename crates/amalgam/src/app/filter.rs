//! Line filter dropping column-zero include and pragma directives.

use std::fs::File;
use std::io::{self, BufRead, BufReader, ErrorKind, Write};
use std::path::Path;

use thiserror::Error;

use crate::domain::directive::{DirectiveMarker, classify_line};
use crate::domain::errors::{PipelineError, Stage};
use crate::domain::model::FilterStats;
use crate::infra::fs::{self, AtomicFile};

/// Which side of a streaming filter failed.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to read filter input")]
    Read(#[source] io::Error),
    #[error("failed to write filter output")]
    Write(#[source] io::Error),
}

/// Single-pass filter over raw lines.
///
/// Lines keep their original terminator (`\n`, `\r\n`, or none on a final unterminated line) and
/// contents are treated as bytes, so nothing is re-encoded. A dropped line disappears together
/// with its terminator.
#[derive(Debug, Default)]
pub struct DirectiveFilter;

impl DirectiveFilter {
    pub fn new() -> Self {
        Self
    }

    /// Copy every line of `reader` to `writer` except directive lines.
    pub fn filter_reader<R, W>(&self, mut reader: R, mut writer: W) -> Result<FilterStats, StreamError>
    where
        R: BufRead,
        W: Write,
    {
        let mut stats = FilterStats::default();
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(StreamError::Read)?;
            if read == 0 {
                break;
            }
            if keep_line(&line, &mut stats) {
                writer.write_all(&line).map_err(StreamError::Write)?;
            }
        }
        writer.flush().map_err(StreamError::Write)?;
        Ok(stats)
    }

    /// In-memory variant used when the intermediate artifact is not written to disk.
    pub fn filter_bytes(&self, input: &[u8]) -> (Vec<u8>, FilterStats) {
        let mut stats = FilterStats::default();
        let mut output = Vec::with_capacity(input.len());
        for line in input.split_inclusive(|byte| *byte == b'\n') {
            if keep_line(line, &mut stats) {
                output.extend_from_slice(line);
            }
        }
        (output, stats)
    }

    /// Filter the artifact at `input` into `output`, replacing `output` atomically.
    ///
    /// `input` is only read; it stays on disk afterwards.
    pub fn filter_file(&self, input: &Path, output: &Path) -> Result<FilterStats, PipelineError> {
        let file = File::open(input).map_err(|source| match source.kind() {
            ErrorKind::NotFound => PipelineError::MissingIntermediate {
                path: input.to_path_buf(),
            },
            _ => PipelineError::ReadFailure {
                stage: Stage::Filter,
                path: input.to_path_buf(),
                source,
            },
        })?;

        let mut target = AtomicFile::create(Stage::Filter, output)?;
        let stats = self
            .filter_reader(BufReader::new(file), target.writer())
            .map_err(|err| match err {
                StreamError::Read(source) => PipelineError::ReadFailure {
                    stage: Stage::Filter,
                    path: input.to_path_buf(),
                    source,
                },
                StreamError::Write(source) => PipelineError::WriteFailure {
                    stage: Stage::Filter,
                    path: output.to_path_buf(),
                    source,
                },
            })?;
        target.commit()?;

        log_stats(output, &stats);
        Ok(stats)
    }

    /// Filter an in-memory intermediate and atomically write the result to `output`.
    pub fn filter_into(&self, input: &[u8], output: &Path) -> Result<FilterStats, PipelineError> {
        let (filtered, stats) = self.filter_bytes(input);
        fs::write_atomic(Stage::Filter, output, &filtered)?;
        log_stats(output, &stats);
        Ok(stats)
    }
}

fn keep_line(line: &[u8], stats: &mut FilterStats) -> bool {
    stats.lines_read += 1;
    match classify_line(line) {
        Some(DirectiveMarker::Include) => {
            stats.dropped_include += 1;
            false
        }
        Some(DirectiveMarker::Pragma) => {
            stats.dropped_pragma += 1;
            false
        }
        None => {
            stats.lines_kept += 1;
            true
        }
    }
}

fn log_stats(output: &Path, stats: &FilterStats) {
    tracing::info!(
        path = %output.display(),
        kept = stats.lines_kept,
        dropped_include = stats.dropped_include,
        dropped_pragma = stats.dropped_pragma,
        "wrote processed artifact"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs as stdfs;

    fn filter(input: &str) -> (String, FilterStats) {
        let (output, stats) = DirectiveFilter::new().filter_bytes(input.as_bytes());
        (String::from_utf8(output).expect("utf8 output"), stats)
    }

    #[test]
    fn drops_column_zero_directives_with_their_terminators() {
        let (output, stats) = filter("#include <a.h>\nint X;\n#pragma once\nstruct Y {};\n");
        assert_eq!(output, "int X;\nstruct Y {};\n");
        assert_eq!(
            stats,
            FilterStats {
                lines_read: 4,
                lines_kept: 2,
                dropped_include: 1,
                dropped_pragma: 1,
            }
        );
        assert_eq!(stats.lines_dropped(), 2);
    }

    #[test]
    fn keeps_indented_and_embedded_markers() {
        let input = " #include <a.h>\n\t#pragma once\nx = \"#include\";\n// #pragma\n";
        let (output, stats) = filter(input);
        assert_eq!(output, input);
        assert_eq!(stats.lines_dropped(), 0);
    }

    #[test]
    fn keeps_empty_lines() {
        let (output, _) = filter("\n\n#include <x>\n\n");
        assert_eq!(output, "\n\n\n");
    }

    #[test]
    fn final_line_without_terminator_is_preserved() {
        let (output, _) = filter("int a;\nint b;");
        assert_eq!(output, "int a;\nint b;");

        let (output, _) = filter("int a;\n#pragma once");
        assert_eq!(output, "int a;\n");
    }

    #[test]
    fn crlf_terminators_pass_through() {
        let (output, _) = filter("#pragma once\r\nint a;\r\n#include <b>\r\nint c;");
        assert_eq!(output, "int a;\r\nint c;");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let (output, stats) = filter("");
        assert!(output.is_empty());
        assert_eq!(stats, FilterStats::default());
    }

    #[test]
    fn reader_and_bytes_variants_agree() -> Result<()> {
        let input = "#include <a>\nkeep\r\n  #pragma x\n#pragma y\nlast";
        let (expected, expected_stats) = filter(input);

        let mut output = Vec::new();
        let stats = DirectiveFilter::new().filter_reader(input.as_bytes(), &mut output)?;
        assert_eq!(String::from_utf8(output)?, expected);
        assert_eq!(stats, expected_stats);
        Ok(())
    }

    #[test]
    fn non_utf8_lines_are_copied_verbatim() {
        let input = b"\xff\xfe bytes\n#include <a>\n\xc3\x28\n";
        let (output, _) = DirectiveFilter::new().filter_bytes(input);
        assert_eq!(output, b"\xff\xfe bytes\n\xc3\x28\n");
    }

    #[test]
    fn filter_file_leaves_input_in_place() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let input = temp.path().join("mono.tmp");
        let output = temp.path().join("mono");
        stdfs::write(&input, "#pragma once\nint a;\n")?;
        stdfs::write(&output, "stale\nstale\nstale\n")?;

        let stats = DirectiveFilter::new().filter_file(&input, &output)?;

        assert_eq!(stats.lines_kept, 1);
        assert_eq!(stdfs::read_to_string(&output)?, "int a;\n");
        assert_eq!(stdfs::read_to_string(&input)?, "#pragma once\nint a;\n");
        Ok(())
    }

    #[test]
    fn missing_intermediate_is_reported() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let output = temp.path().join("mono");

        let err = DirectiveFilter::new()
            .filter_file(&temp.path().join("absent.tmp"), &output)
            .unwrap_err();

        assert!(matches!(err, PipelineError::MissingIntermediate { .. }));
        assert_eq!(err.stage(), Some(Stage::Filter));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn filter_into_writes_output() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let output = temp.path().join("mono");

        let stats = DirectiveFilter::new().filter_into(b"#include <a>\nvoid f();\n", &output)?;

        assert_eq!(stats.dropped_include, 1);
        assert_eq!(stdfs::read(&output)?, b"void f();\n");
        Ok(())
    }
}
