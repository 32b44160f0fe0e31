use fiberplace::api::MatrixStore;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Collision matrices as `<dir>/<key>.json`.
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl MatrixStore for DirStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        fs::read(self.path(key)).ok()
    }

    /// Written through `<key>.json.tmp` and renamed into place.
    fn put(&mut self, key: &str, blob: Vec<u8>) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, blob)?;
        fs::rename(tmp, self.path(key))
    }
}
