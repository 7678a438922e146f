//! Archive expansion capability

use cairn_core::{CairnError, Result};
use std::path::Path;
use std::process::Command;

/// Expands an archive file into a directory
pub trait Extractor: Send + Sync {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// Shells out to `tar zxf <archive> -C <dest>`
#[derive(Debug, Clone)]
pub struct TarExtractor {
    program: String,
}

impl TarExtractor {
    /// Use a specific `tar` executable
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for TarExtractor {
    fn default() -> Self {
        Self::new("tar")
    }
}

impl Extractor for TarExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        tracing::info!(
            "Running extract command [{} zxf {} -C {}]",
            self.program,
            archive.display(),
            dest.display()
        );

        let output = Command::new(&self.program)
            .arg("zxf")
            .arg(archive)
            .arg("-C")
            .arg(dest)
            .output()
            .map_err(|e| CairnError::Extraction {
                path: archive.to_path_buf(),
                reason: format!("failed to run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(CairnError::Extraction {
                path: archive.to_path_buf(),
                reason: format!("{}: {}", output.status, combined),
            });
        }

        Ok(())
    }
}
