use crate::Generation;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub generation: u64,
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn generation(&self, number: u64) -> PathBuf { self.root.join(format!("generation-{number:08}.bin")) }
    fn tmp(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

/// Write to a sibling temp file, flush it to disk, then rename over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = IndexPaths::tmp(path);
    let mut f = File::create(&tmp)?;
    f.write_all(bytes)?;
    f.sync_all()?;
    drop(f);
    fs::rename(&tmp, path)
}

pub fn save_generation(paths: &IndexPaths, generation: &Generation) -> io::Result<()> {
    let bytes = bincode::serialize(generation).map_err(|e| io::Error::other(e.to_string()))?;
    write_atomic(&paths.generation(generation.number), &bytes)
}

pub fn load_generation(paths: &IndexPaths, number: u64) -> io::Result<Generation> {
    let mut f = File::open(paths.generation(number))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let generation: Generation =
        bincode::deserialize(&buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    if generation.number != number {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("snapshot holds generation {} but {number} was expected", generation.number),
        ));
    }
    Ok(generation)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> io::Result<()> {
    let json = serde_json::to_string_pretty(meta).map_err(io::Error::other)?;
    write_atomic(&paths.meta(), json.as_bytes())
}

/// Ok(None) when no index has been committed at this location yet.
pub fn load_meta(paths: &IndexPaths) -> io::Result<Option<MetaFile>> {
    let mut f = match File::open(paths.meta()) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if meta.version != FORMAT_VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unsupported index format version {}", meta.version),
        ));
    }
    Ok(Some(meta))
}

/// Load the generation meta.json points at, if any.
///
/// A concurrent commit may switch meta.json and clean up the snapshot we were
/// about to open; in that case meta.json is read again and the load retried.
pub fn load_current(paths: &IndexPaths) -> io::Result<Option<Generation>> {
    let mut seen = None;
    loop {
        let Some(meta) = load_meta(paths)? else { return Ok(None) };
        match load_generation(paths, meta.generation) {
            Err(e) if e.kind() == io::ErrorKind::NotFound && seen != Some(meta.generation) => {
                tracing::debug!(generation = meta.generation, "snapshot replaced while loading, retrying");
                seen = Some(meta.generation);
            }
            result => return result.map(Some),
        }
    }
}

/// Generation number encoded in a snapshot file name.
fn snapshot_number(name: &str) -> Option<u64> {
    name.strip_prefix("generation-")?.strip_suffix(".bin")?.parse().ok()
}

/// Remove snapshot files older than the one preceding `current`. The
/// predecessor stays so readers that already read the old meta.json can still
/// open it. Failures are reported, not fatal.
pub fn remove_stale_generations(paths: &IndexPaths, current: u64) {
    let entries = match fs::read_dir(&paths.root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "could not list index directory for cleanup");
            return;
        }
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let p = entry.path();
        let stale = p
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(snapshot_number)
            .map(|n| n + 1 < current)
            .unwrap_or(false);
        if stale {
            if let Err(e) = fs::remove_file(&p) {
                tracing::warn!(path = %p.display(), error = %e, "could not remove stale generation");
            }
        }
    }
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
