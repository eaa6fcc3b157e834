//! FBAD (floating-base AD) artifact format and cache.
//!
//! # File Format
//!
//! 1. **Magic bytes**: `FBAD` (4 bytes)
//! 2. **Version**: `u32` little-endian (4 bytes), currently 1
//! 3. **Flags**: `u32` little-endian (4 bytes), reserved
//! 4. **Payload**: bincode-encoded name, topology signature, input count,
//!    operations and output nodes
//!
//! Files are written to a temporary sibling and renamed into place, so a
//! reader never observes a partially written artifact.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use bincode::Options;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::compiled::CompiledFunction;
use crate::error::{AdError, Result};
use crate::tape::Op;

/// Magic bytes identifying an artifact file.
pub const ARTIFACT_MAGIC: [u8; 4] = *b"FBAD";

/// Current artifact format version.
pub const ARTIFACT_VERSION: u32 = 1;

/// Header size in bytes (magic + version + flags).
pub const ARTIFACT_HEADER_SIZE: usize = 12;

/// File extension of artifacts.
pub const ARTIFACT_EXTENSION: &str = "fbad";

/// Artifact file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactHeader {
    /// Magic bytes (must be `FBAD`).
    pub magic: [u8; 4],
    /// Format version.
    pub version: u32,
    /// Flags (reserved).
    pub flags: u32,
}

impl ArtifactHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: ARTIFACT_MAGIC,
            version: ARTIFACT_VERSION,
            flags: 0,
        }
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut bytes = [0u8; ARTIFACT_HEADER_SIZE];
        reader.read_exact(&mut bytes)?;
        let [m0, m1, m2, m3, v0, v1, v2, v3, f0, f1, f2, f3] = bytes;
        Ok(Self {
            magic: [m0, m1, m2, m3],
            version: u32::from_le_bytes([v0, v1, v2, v3]),
            flags: u32::from_le_bytes([f0, f1, f2, f3]),
        })
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.magic != ARTIFACT_MAGIC {
            return Err(format!("invalid magic bytes {:?}", self.magic));
        }
        if self.version != ARTIFACT_VERSION {
            return Err(format!(
                "unsupported version {} (expected {ARTIFACT_VERSION})",
                self.version
            ));
        }
        Ok(())
    }
}

impl Default for ArtifactHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a compiled function: its name plus a signature of everything
/// the recording depended on.
///
/// An artifact is only reused when both parts match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    /// Artifact name; also the file stem.
    pub name: String,
    /// Opaque bytes describing the recorded topology.
    pub signature: Vec<u8>,
}

impl ArtifactKey {
    /// Create a key.
    #[must_use]
    pub fn new(name: impl Into<String>, signature: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            signature,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ArtifactPayload {
    name: String,
    signature: Vec<u8>,
    n_inputs: u64,
    ops: Vec<Op>,
    outputs: Vec<u32>,
}

/// Payload encoding, with a byte limit when reading.
fn payload_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
}

fn write_artifact<W: Write>(writer: &mut W, key: &ArtifactKey, function: &CompiledFunction) -> io::Result<()> {
    ArtifactHeader::new().write_to(writer)?;
    let payload = ArtifactPayload {
        name: key.name.clone(),
        signature: key.signature.clone(),
        n_inputs: function.n_inputs() as u64,
        ops: function.ops().to_vec(),
        outputs: function.outputs().to_vec(),
    };
    payload_options()
        .serialize_into(writer, &payload)
        .map_err(io::Error::other)
}

/// Write a compiled function to `path`, replacing any existing file atomically.
///
/// Missing parent folders are created.
///
/// # Errors
///
/// Returns [`AdError::ArtifactStore`] if any filesystem step or serialization fails.
pub fn save_artifact(path: &Path, key: &ArtifactKey, function: &CompiledFunction) -> Result<()> {
    let store_err = |source: io::Error| AdError::ArtifactStore {
        path: path.to_path_buf(),
        source,
    };
    let folder = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(folder).map_err(store_err)?;
    let mut tmp = NamedTempFile::new_in(folder).map_err(store_err)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write_artifact(&mut writer, key, function).map_err(store_err)?;
        writer.flush().map_err(store_err)?;
    }
    tmp.as_file().sync_all().map_err(store_err)?;
    tmp.persist(path).map_err(|e| store_err(e.error))?;
    Ok(())
}

/// Load the compiled function stored at `path`, checking it against `key`.
///
/// # Errors
///
/// - [`AdError::ArtifactRead`] if the file cannot be opened.
/// - [`AdError::ArtifactFormat`] if the header, payload or operation list is invalid.
/// - [`AdError::ArtifactMismatch`] if the name or signature differ from `key`.
pub fn load_artifact(path: &Path, key: &ArtifactKey) -> Result<CompiledFunction> {
    let format_err = |reason: String| AdError::ArtifactFormat {
        path: path.to_path_buf(),
        reason,
    };
    let mismatch = |reason: String| AdError::ArtifactMismatch {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|source| AdError::ArtifactRead {
        path: path.to_path_buf(),
        source,
    })?;
    // Length prefixes are bounded by the file size before anything is allocated.
    let limit = file
        .metadata()
        .map_err(|source| AdError::ArtifactRead {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    let mut reader = BufReader::new(file);

    let header = ArtifactHeader::read_from(&mut reader)
        .map_err(|e| format_err(format!("failed to read header: {e}")))?;
    header.validate().map_err(format_err)?;

    let payload: ArtifactPayload = payload_options()
        .with_limit(limit)
        .deserialize_from(&mut reader)
        .map_err(|e| format_err(e.to_string()))?;

    if payload.name != key.name {
        return Err(mismatch(format!(
            "built as '{}', requested '{}'",
            payload.name, key.name
        )));
    }
    if payload.signature != key.signature {
        return Err(mismatch("topology signature differs".to_string()));
    }

    let n_inputs =
        usize::try_from(payload.n_inputs).map_err(|_| format_err("input count overflows usize".to_string()))?;
    CompiledFunction::from_parts(n_inputs, payload.ops, payload.outputs).map_err(|e| format_err(e.to_string()))
}

/// Where a cached function came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Reused from an existing artifact.
    Loaded(PathBuf),
    /// Freshly built and stored.
    Compiled(PathBuf),
}

impl ArtifactSource {
    /// Artifact path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Loaded(path) | Self::Compiled(path) => path,
        }
    }

    /// Whether the function was loaded rather than built.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Folder of compiled artifacts, addressed by [`ArtifactKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCache {
    folder: PathBuf,
}

impl ArtifactCache {
    /// Cache rooted at `folder`. Nothing is created until the first store.
    #[must_use]
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// Root folder.
    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Path of the artifact called `name`.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.folder.join(format!("{name}.{ARTIFACT_EXTENSION}"))
    }

    /// Load the artifact for `key`.
    ///
    /// # Errors
    ///
    /// See [`load_artifact`].
    pub fn load(&self, key: &ArtifactKey) -> Result<CompiledFunction> {
        load_artifact(&self.path_for(&key.name), key)
    }

    /// Store `function` under `key` and return its path.
    ///
    /// # Errors
    ///
    /// See [`save_artifact`].
    pub fn store(&self, key: &ArtifactKey, function: &CompiledFunction) -> Result<PathBuf> {
        let path = self.path_for(&key.name);
        save_artifact(&path, key, function)?;
        Ok(path)
    }

    /// Load the artifact for `key`, or build and store it.
    ///
    /// With `recompile` set the artifact is always rebuilt. Otherwise a missing
    /// file triggers a build, while a file that exists but cannot be used is an
    /// error: silently replacing it would hide a stale or foreign artifact.
    ///
    /// # Errors
    ///
    /// Load errors (see [`load_artifact`]) when an unusable artifact is present
    /// and `recompile` is false; otherwise whatever `build` or the store returns.
    pub fn load_or_build<F>(
        &self,
        key: &ArtifactKey,
        recompile: bool,
        build: F,
    ) -> Result<(CompiledFunction, ArtifactSource)>
    where
        F: FnOnce() -> Result<CompiledFunction>,
    {
        let path = self.path_for(&key.name);
        if !recompile {
            match load_artifact(&path, key) {
                Ok(function) => {
                    tracing::debug!(path = %path.display(), "reusing artifact");
                    return Ok((function, ArtifactSource::Loaded(path)));
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(path = %path.display(), "no artifact yet, building");
                }
                Err(e) => return Err(e),
            }
        }

        let function = build()?;
        save_artifact(&path, key, &function)?;
        tracing::debug!(path = %path.display(), nodes = function.n_nodes(), "stored artifact");
        Ok((function, ArtifactSource::Compiled(path)))
    }
}
