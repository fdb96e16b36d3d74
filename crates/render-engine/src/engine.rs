//! Encoding engines: a private file space plus an encoder invocation.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use lapse_common::error::{LapseError, LapseResult};

/// A file space the encoder reads from and writes to, and the encoder itself.
///
/// File names are flat: no directories, no path separators.
pub trait EncodingEngine: Send {
    fn write_file(&mut self, name: &str, bytes: &[u8]) -> LapseResult<()>;

    fn read_file(&self, name: &str) -> LapseResult<Vec<u8>>;

    /// Delete a file. Deleting a file that does not exist succeeds.
    fn delete_file(&mut self, name: &str) -> LapseResult<()>;

    /// Names of all files currently in the space, sorted.
    fn list_files(&self) -> LapseResult<Vec<String>>;

    /// Run the encoder once with `args`, relative to the file space.
    fn exec(&mut self, args: &[String]) -> LapseResult<()>;

    fn name(&self) -> &str;
}

/// Engine backed by the system `ffmpeg` binary and a private temp directory.
///
/// The directory is removed when the engine is dropped.
pub struct FfmpegEngine {
    binary: PathBuf,
    workdir: tempfile::TempDir,
}

impl FfmpegEngine {
    pub fn new(binary: impl Into<PathBuf>) -> LapseResult<Self> {
        let workdir = tempfile::Builder::new().prefix("lapse-encode-").tempdir()?;
        let binary = binary.into();
        tracing::debug!(
            binary = %binary.display(),
            workdir = %workdir.path().display(),
            "Created ffmpeg engine"
        );
        Ok(Self { binary, workdir })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    /// Whether the binary can be started.
    pub fn is_available(&self) -> bool {
        binary_runs(&self.binary)
    }

    fn path_for(&self, name: &str) -> LapseResult<PathBuf> {
        validate_name(name)?;
        Ok(self.workdir.path().join(name))
    }
}

/// Whether `binary -version` runs successfully.
pub fn binary_runs(binary: &Path) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Reject names that could escape the flat file space.
pub fn validate_name(name: &str) -> LapseResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(LapseError::encode(format!("Invalid engine file name '{name}'")));
    }
    Ok(())
}

impl EncodingEngine for FfmpegEngine {
    fn write_file(&mut self, name: &str, bytes: &[u8]) -> LapseResult<()> {
        let path = self.path_for(name)?;
        std::fs::write(&path, bytes)
            .map_err(|e| LapseError::encode(format!("Failed to write {}: {e}", path.display())))
    }

    fn read_file(&self, name: &str) -> LapseResult<Vec<u8>> {
        let path = self.path_for(name)?;
        std::fs::read(&path)
            .map_err(|e| LapseError::encode(format!("Failed to read {}: {e}", path.display())))
    }

    fn delete_file(&mut self, name: &str) -> LapseResult<()> {
        let path = self.path_for(name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LapseError::encode(format!(
                "Failed to delete {}: {e}",
                path.display()
            ))),
        }
    }

    fn list_files(&self) -> LapseResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.workdir.path())? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn exec(&mut self, args: &[String]) -> LapseResult<()> {
        tracing::debug!(binary = %self.binary.display(), args = ?args, "Running ffmpeg");
        let start = std::time::Instant::now();

        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(self.workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                LapseError::encode(format!(
                    "Failed to start {}: {e}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LapseError::encode(format!(
                "ffmpeg failed (status {}): {}",
                output.status,
                stderr.trim()
            )));
        }

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ffmpeg finished"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}
