//! Source loading: turns a `.rep` path into an in-memory buffer.
//!
//! The loader validates the path shape before touching the filesystem, so a
//! misspelled extension is reported as such rather than as a spurious
//! not-found. Each failure mode carries its own error variant; callers can
//! react to them individually.

use std::fs;
use std::io::ErrorKind;

use tracing::{debug, info};

use crate::error::{CompileError, CompileResult};

/// Extension required on every input file.
pub const SOURCE_EXTENSION: &str = ".rep";

/// Shortest acceptable path, e.g. `a.rep`.
const MIN_FILE_NAME_LEN: usize = SOURCE_EXTENSION.len() + 1;

/// One input file held fully in memory.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
  file_name: String,
  contents: String,
}

impl SourceBuffer {
  /// Load a `.rep` file from disk.
  pub fn load(path: &str) -> CompileResult<Self> {
    if path.is_empty() {
      return Err(CompileError::EmptyPath);
    }

    if path.len() < MIN_FILE_NAME_LEN {
      return Err(CompileError::NameTooShort {
        path: path.to_string(),
      });
    }

    if !path.ends_with(SOURCE_EXTENSION) {
      return Err(CompileError::WrongExtension {
        path: path.to_string(),
      });
    }

    debug!(path, "loading source file");

    let bytes = fs::read(path).map_err(|err| {
      if err.kind() == ErrorKind::NotFound {
        CompileError::FileNotFound {
          path: path.to_string(),
        }
      } else {
        CompileError::Io {
          path: path.to_string(),
          source: err,
        }
      }
    })?;

    if bytes.is_empty() {
      return Err(CompileError::EmptyFile {
        path: path.to_string(),
      });
    }

    info!(path, size = bytes.len(), "loaded source file");

    Ok(Self {
      file_name: path.to_string(),
      contents: String::from_utf8_lossy(&bytes).into_owned(),
    })
  }

  pub fn file_name(&self) -> &str {
    &self.file_name
  }

  pub fn contents(&self) -> &str {
    &self.contents
  }

  /// Exact byte length of the buffered contents.
  pub fn len(&self) -> usize {
    self.contents.len()
  }

  pub fn is_empty(&self) -> bool {
    self.contents.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  fn scratch_path(stem: &str, ext: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("repc-{}-{}{}", std::process::id(), stem, ext));
    path
  }

  #[test]
  fn empty_path_is_rejected() {
    assert!(matches!(SourceBuffer::load(""), Err(CompileError::EmptyPath)));
  }

  #[test]
  fn short_name_is_rejected() {
    assert!(matches!(
      SourceBuffer::load(".rep"),
      Err(CompileError::NameTooShort { .. })
    ));
  }

  #[test]
  fn wrong_extension_is_rejected() {
    assert!(matches!(
      SourceBuffer::load("program.txt"),
      Err(CompileError::WrongExtension { .. })
    ));
  }

  #[test]
  fn missing_file_is_distinct_from_wrong_extension() {
    let path = scratch_path("does-not-exist", ".rep");
    let result = SourceBuffer::load(path.to_str().unwrap());
    assert!(matches!(result, Err(CompileError::FileNotFound { .. })));
  }

  #[test]
  fn empty_file_is_rejected() {
    let path = scratch_path("empty", ".rep");
    std::fs::write(&path, b"").unwrap();
    let result = SourceBuffer::load(path.to_str().unwrap());
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(result, Err(CompileError::EmptyFile { .. })));
  }

  #[test]
  fn valid_file_round_trips() {
    let path = scratch_path("valid", ".rep");
    std::fs::write(&path, b"a = 1;\n").unwrap();
    let buffer = SourceBuffer::load(path.to_str().unwrap()).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(buffer.contents(), "a = 1;\n");
    assert_eq!(buffer.len(), 7);
    assert!(buffer.file_name().ends_with(".rep"));
  }
}
