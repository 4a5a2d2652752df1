use crate::builder::{BuildStats, IndexBuilder};
use crate::error::{Error, Result};
use crate::html::{self, Extracted};
use crate::store::{IndexStore, OpenMode};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

/// Raw file as handed over by the directory walk.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Milliseconds since the Unix epoch.
    pub modified: i64,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// A file that cannot be read is a per-document extraction failure.
    pub fn read(path: &Path) -> Result<Self> {
        let unreadable = |e: std::io::Error| Error::Extraction { path: path.to_path_buf(), reason: e.to_string() };
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(unreadable)?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let bytes = fs::read(path).map_err(unreadable)?;
        Ok(Self { path: path.to_path_buf(), modified, bytes })
    }

    pub fn key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Decode and strip markup. Bytes that are not UTF-8 become U+FFFD.
    pub fn extract(&self) -> Extracted {
        html::extract(&String::from_utf8_lossy(&self.bytes))
    }
}

/// Every regular file under `root`, in file-name order. Unlistable directory
/// entries are skipped; files that fail to read are yielded as errors.
pub fn walk_documents(root: &Path) -> impl Iterator<Item = Result<SourceFile>> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| SourceFile::read(e.path()))
}

/// Full rebuild of the index at `index_location` from the files under `docs_root`.
pub fn build_index<P: AsRef<Path>, Q: AsRef<Path>>(docs_root: P, index_location: Q) -> Result<BuildStats> {
    build_index_with_mode(docs_root, index_location, OpenMode::Create)
}

pub fn build_index_with_mode<P: AsRef<Path>, Q: AsRef<Path>>(
    docs_root: P,
    index_location: Q,
    mode: OpenMode,
) -> Result<BuildStats> {
    let docs_root = docs_root.as_ref();
    if fs::metadata(docs_root).is_err() || (docs_root.is_dir() && fs::read_dir(docs_root).is_err()) {
        return Err(Error::DocsUnavailable(docs_root.to_path_buf()));
    }

    let store = IndexStore::open(index_location, mode)?;
    tracing::info!(docs = %docs_root.display(), index = %store.location().display(), ?mode, "indexing");

    let mut builder = IndexBuilder::new(&store);
    for file in walk_documents(docs_root) {
        match file {
            Ok(file) => {
                let Extracted { title, body } = file.extract();
                builder.add_document(&file.key(), file.modified, &title, &body);
            }
            Err(Error::Extraction { path, reason }) => builder.skip(&path.to_string_lossy(), &reason),
            Err(e) => return Err(e),
        }
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn walk_finds_nested_files_in_order() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.html"), "b").unwrap();
        fs::write(dir.path().join("a.html"), "a").unwrap();
        fs::write(dir.path().join("sub/c.html"), "c").unwrap();
        let names: Vec<String> = walk_documents(dir.path())
            .map(|f| f.unwrap().path.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.html", "b.html", "sub/c.html"]);
    }

    #[test]
    fn latin1_bytes_are_decoded_lossily() {
        let mut bytes = b"<title>Caf".to_vec();
        bytes.extend_from_slice(b"\xe9 Football</title><body>match report</body>");
        let file = SourceFile { path: "cafe.html".into(), modified: 0, bytes };
        let Extracted { title, body } = file.extract();
        assert_eq!(title, "Caf\u{fffd} Football");
        assert_eq!(body, "match report");
    }

    #[test]
    fn missing_file_is_a_recoverable_failure() {
        let dir = tempdir().unwrap();
        let err = SourceFile::read(&dir.path().join("gone.html")).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn latin1_page_is_searchable() {
        let dir = tempdir().unwrap();
        let docs = dir.path().join("docs");
        let index = dir.path().join("index");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("cafe.html"), b"<title>Caf\xe9 Football</title><body>derby</body>").unwrap();

        let stats = build_index(&docs, &index).unwrap();
        assert_eq!((stats.added, stats.skipped), (1, 0));
        assert_eq!(crate::run_query(&index, "football", "OK").unwrap().total_hits, 1);
    }

    #[test]
    fn single_file_root_is_indexed() {
        let dir = tempdir().unwrap();
        let page = dir.path().join("page.html");
        fs::write(&page, "<title>Solo</title><body>lonely page</body>").unwrap();
        let stats = build_index(&page, dir.path().join("index")).unwrap();
        assert_eq!(stats.added, 1);
    }

    #[test]
    fn missing_docs_root_aborts() {
        let dir = tempdir().unwrap();
        let err = build_index(dir.path().join("nope"), dir.path().join("index")).unwrap_err();
        assert!(matches!(err, Error::DocsUnavailable(_)));
        assert!(!dir.path().join("index").exists());
    }
}
