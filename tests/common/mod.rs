#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

static NEXT: AtomicUsize = AtomicUsize::new(0);

/// A file path under the system temp directory, removed when dropped.
pub struct Scratch {
    pub path: PathBuf,
}

impl Scratch {
    pub fn new(extension: &str) -> Self {
        let id = NEXT.fetch_add(1, Ordering::Relaxed);
        let name = format!("doltool-{}-{}.{}", std::process::id(), id, extension);
        Self {
            path: std::env::temp_dir().join(name),
        }
    }

    pub fn read(&self) -> Vec<u8> {
        fs::read(&self.path).unwrap()
    }

    pub fn len(&self) -> u64 {
        fs::metadata(&self.path).unwrap().len()
    }
}

impl AsRef<Path> for Scratch {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
