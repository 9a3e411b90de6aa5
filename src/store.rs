use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::task::Task;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed task file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode tasks: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Ordered task collection persisted as a single JSON array.
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            tasks: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Replaces the in-memory collection with the file contents and returns
    /// the task count. A missing file loads as an empty list.
    pub fn load(&mut self) -> Result<usize, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no task file yet");
                self.tasks.clear();
                return Ok(0);
            }
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };

        let tasks: Vec<Task> =
            serde_json::from_str(&content).map_err(|source| StoreError::Decode {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), count = tasks.len(), "loaded tasks");
        self.tasks = tasks;
        Ok(self.tasks.len())
    }

    /// Writes the whole collection to a sibling temp file, then renames it
    /// over the task file.
    pub fn save(&self) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(&self.tasks).map_err(StoreError::Encode)?;

        let tmp_path = self.sibling("tmp");
        let mut file = fs::File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        debug!(path = %self.path.display(), count = self.tasks.len(), "saved tasks");
        Ok(())
    }

    /// Moves an unreadable task file aside so a later save cannot clobber it.
    /// Earlier quarantined files are kept; the new one gets the first free
    /// `.corrupt`, `.corrupt.1`, `.corrupt.2`, ... name.
    pub fn quarantine(&self) -> Result<PathBuf, StoreError> {
        let mut target = self.sibling("corrupt");
        let mut attempt = 0;
        while target.exists() {
            attempt += 1;
            target = self.sibling(&format!("corrupt.{}", attempt));
        }
        fs::rename(&self.path, &target).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(target)
    }

    pub fn append(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Removes every task matching `predicate`, returning the removed ones in
    /// their original order.
    pub fn remove<F>(&mut self, mut predicate: F) -> Vec<Task>
    where
        F: FnMut(&Task) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.tasks.len());
        for task in self.tasks.drain(..) {
            if predicate(&task) {
                removed.push(task);
            } else {
                kept.push(task);
            }
        }
        self.tasks = kept;
        removed
    }

    fn sibling(&self, extension: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "tasks.json".into());
        name.push(".");
        name.push(extension);
        self.path.with_file_name(name)
    }
}
