use std::fs;
use std::path::Path;

use datapool_core::DataCatalog;
use tempfile::TempDir;

/// A temporary data root with files written relative to it.
pub struct Fixture {
    pub root: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("temp dir"),
        }
    }

    pub fn write(&self, relative: &str, contents: &str) -> &Self {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write fixture");
        self
    }

    pub fn dir(&self, relative: &str) -> &Self {
        fs::create_dir_all(self.root.path().join(relative)).expect("create dir");
        self
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn catalog(&self, yaml: &str) -> DataCatalog {
        DataCatalog::from_yaml_str(yaml, Some(self.path())).expect("catalog")
    }
}
