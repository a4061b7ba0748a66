use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender};
use notify_debouncer_mini::{DebouncedEventKind, Debouncer, new_debouncer};
use rustc_hash::FxHashSet;

/// Watches a fixed set of shader files and reports which of them changed.
pub struct ShaderWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    receiver: Receiver<PathBuf>,
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

impl ShaderWatcher {
    pub fn new<'a>(files: impl IntoIterator<Item = &'a Path>) -> Result<Self> {
        let (tx, rx): (Sender<PathBuf>, Receiver<PathBuf>) = crossbeam_channel::unbounded();

        let files: FxHashSet<PathBuf> = files.into_iter().map(normalize).collect();
        let dirs: FxHashSet<PathBuf> = files
            .iter()
            .filter_map(|f| f.parent().map(Path::to_path_buf))
            .collect();

        let watched = files.clone();
        let mut debouncer = new_debouncer(
            Duration::from_millis(100),
            move |res: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                if let Ok(events) = res {
                    for event in events {
                        if event.kind == DebouncedEventKind::Any {
                            let path = normalize(&event.path);
                            if watched.contains(&path) {
                                let _ = tx.send(path);
                            }
                        }
                    }
                }
            },
        )?;

        for dir in &dirs {
            if dir.exists() {
                debouncer
                    .watcher()
                    .watch(dir, notify::RecursiveMode::NonRecursive)?;
                log::info!("Watching {} for shader changes", dir.display());
            }
        }

        Ok(Self {
            _debouncer: debouncer,
            receiver: rx,
        })
    }

    /// Drain all pending change events and return the unique paths.
    pub fn drain_changes(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        while let Ok(path) = self.receiver.try_recv() {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }

    /// Block until at least one change arrives or `timeout` elapses.
    pub fn wait_changes(&self, timeout: Duration) -> Vec<PathBuf> {
        match self.receiver.recv_timeout(timeout) {
            Ok(first) => {
                let mut paths = vec![first];
                for path in self.drain_changes() {
                    if !paths.contains(&path) {
                        paths.push(path);
                    }
                }
                paths
            }
            Err(_) => Vec::new(),
        }
    }

    /// Whether `changed` refers to the same file as `stage_path`.
    pub fn is_same_file(changed: &Path, stage_path: &Path) -> bool {
        normalize(changed) == normalize(stage_path)
    }
}
