//! Filesystem helpers that classify IO failures into pipeline errors.

use std::fs;
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::domain::errors::{PipelineError, Stage};
use crate::domain::model::InputFile;

const TEMP_PREFIX: &str = ".amalgam-";

/// Read an input file in full.
pub fn read_input(input: &InputFile) -> Result<Vec<u8>, PipelineError> {
    fs::read(&input.path).map_err(|source| match source.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied | ErrorKind::IsADirectory => {
            PipelineError::MissingInput {
                name: input.name.clone(),
                path: input.path.clone(),
                source,
            }
        }
        _ => PipelineError::ReadFailure {
            stage: Stage::Concatenate,
            path: input.path.clone(),
            source,
        },
    })
}

/// Write `contents` to `path` through [`AtomicFile`].
pub fn write_atomic(stage: Stage, path: &Path, contents: &[u8]) -> Result<(), PipelineError> {
    let mut file = AtomicFile::create(stage, path)?;
    file.writer()
        .write_all(contents)
        .map_err(|source| write_failure(stage, path, source))?;
    file.commit()
}

/// Output artifact staged in a sibling temp file and renamed over the target on commit.
///
/// The rename replaces whatever sits at the target path: a symlink there is replaced by a regular
/// file rather than written through, and the new file gets a fresh mode. Dropping it without calling [`AtomicFile::commit`] removes the temp file and leaves any
/// previous artifact at the target untouched.
#[derive(Debug)]
pub struct AtomicFile {
    stage: Stage,
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl AtomicFile {
    pub fn create(stage: Stage, target: &Path) -> Result<Self, PipelineError> {
        let dir = target
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let temp = temp_builder()
            .tempfile_in(dir)
            .map_err(|source| write_failure(stage, target, source))?;

        Ok(Self {
            stage,
            target: target.to_path_buf(),
            writer: BufWriter::new(temp),
        })
    }

    pub fn writer(&mut self) -> &mut BufWriter<NamedTempFile> {
        &mut self.writer
    }

    /// Flush buffered bytes, close the temp file, and move it over the target.
    pub fn commit(self) -> Result<(), PipelineError> {
        let Self {
            stage,
            target,
            writer,
        } = self;

        let temp = writer
            .into_inner()
            .map_err(|err| write_failure(stage, &target, err.into_error()))?;
        temp.as_file()
            .sync_all()
            .map_err(|source| write_failure(stage, &target, source))?;
        temp.persist(&target)
            .map_err(|err| write_failure(stage, &target, err.error))?;

        tracing::trace!(stage = %stage, path = %target.display(), "artifact committed");
        Ok(())
    }
}

fn temp_builder() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_PREFIX);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Regular file mode; the process umask still applies.
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
}

fn write_failure(stage: Stage, path: &Path, source: io::Error) -> PipelineError {
    PipelineError::WriteFailure {
        stage,
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn missing_input_is_classified() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let input = InputFile::new("gone.h", temp.path().join("gone.h"));

        let err = read_input(&input).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { ref name, .. } if name == "gone.h"));
        assert_eq!(err.stage(), Some(Stage::Concatenate));
        Ok(())
    }

    #[test]
    fn directory_input_is_classified_as_missing() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let input = InputFile::new("dir", temp.path());

        let err = read_input(&input).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { .. }));
        Ok(())
    }

    #[test]
    fn write_atomic_overwrites_existing_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let target = temp.path().join("out.txt");
        fs::write(&target, "stale contents that are longer\n")?;

        write_atomic(Stage::Filter, &target, b"fresh\n")?;

        assert_eq!(fs::read(&target)?, b"fresh\n");
        let leftovers: Vec<_> = fs::read_dir(temp.path())?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[test]
    fn uncommitted_file_leaves_target_untouched() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let target = temp.path().join("out.txt");
        fs::write(&target, "previous\n")?;

        {
            let mut file = AtomicFile::create(Stage::Concatenate, &target)?;
            file.writer().write_all(b"partial")?;
        }

        assert_eq!(fs::read_to_string(&target)?, "previous\n");
        Ok(())
    }

    #[test]
    fn unwritable_directory_reports_write_failure() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let target = temp.path().join("missing-dir").join("out.txt");

        let err = write_atomic(Stage::Filter, &target, b"x").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::WriteFailure {
                stage: Stage::Filter,
                ..
            }
        ));
        assert!(!target.exists());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn commit_replaces_symlinked_target() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let pointee = temp.path().join("pointee.txt");
        let link = temp.path().join("link.txt");
        fs::write(&pointee, "original\n")?;
        std::os::unix::fs::symlink(&pointee, &link)?;

        write_atomic(Stage::Filter, &link, b"replaced\n")?;

        assert!(!fs::symlink_metadata(&link)?.file_type().is_symlink());
        assert_eq!(fs::read_to_string(&link)?, "replaced\n");
        assert_eq!(fs::read_to_string(&pointee)?, "original\n");
        Ok(())
    }
}
