//! Staged output writing with scrub-on-failure.
//!
//! Redacted bytes are written to a sibling temporary file and renamed into
//! place only once the write is complete. If anything goes wrong before the
//! rename, the temporary file is overwritten with zeros and unlinked, so a
//! half-written redaction never lingers on disk in recoverable form.

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{RedactError, Result};

fn io_error(path: &Path, source: std::io::Error) -> RedactError {
    RedactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A temporary output file that scrubs itself unless persisted.
struct StagedOutput {
    path: PathBuf,
    persisted: bool,
}

impl StagedOutput {
    fn stage(destination: &Path) -> Self {
        let mut name = destination
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".partial");
        Self {
            path: destination.with_file_name(name),
            persisted: false,
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut file = File::create(&self.path).map_err(|e| io_error(&self.path, e))?;
        file.write_all(bytes).map_err(|e| io_error(&self.path, e))?;
        file.sync_all().map_err(|e| io_error(&self.path, e))?;
        Ok(())
    }

    fn persist(mut self, destination: &Path) -> Result<()> {
        fs::rename(&self.path, destination).map_err(|e| io_error(&self.path, e))?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for StagedOutput {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        if let Err(e) = scrub_file(&self.path) {
            warn!("could not scrub staging file {}: {e}", self.path.display());
        }
    }
}

/// Overwrites a file with zeros, then unlinks it.
///
/// A single zero pass is what journaling filesystems can honor anyway;
/// multi-pass patterns add nothing there.
fn scrub_file(path: &Path) -> std::io::Result<()> {
    match OpenOptions::new().write(true).open(path) {
        Ok(mut file) => {
            let len = file.metadata()?.len();
            file.seek(SeekFrom::Start(0))?;
            let zeros = vec![0u8; 64 * 1024];
            let mut remaining = len;
            while remaining > 0 {
                let chunk = (remaining as usize).min(zeros.len());
                file.write_all(&zeros[..chunk])?;
                remaining -= chunk as u64;
            }
            file.sync_all()?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    }
    fs::remove_file(path)
}

/// Writes verified redacted bytes to the destination atomically.
pub(crate) fn write_final(destination: &Path, bytes: &[u8]) -> Result<()> {
    let staged = StagedOutput::stage(destination);
    staged.write(bytes)?;
    staged.persist(destination)
}
