use anyhow::{Context, Result, bail};
use log::{error, info, warn};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use crate::Notepad;

// Whether a watcher event means the document at `path` may have new contents
fn touches(event: notify::Result<Event>, path: &Path) -> bool {
    match event {
        Ok(event) => {
            matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                && event.paths.iter().any(|p| p.file_name() == path.file_name())
        }
        Err(e) => {
            warn!("watch error: {:?}", e);
            false
        }
    }
}

// Folds `first` and every notification already queued behind it into one answer, so a burst
// of changes costs one run over the latest contents.
fn pending_change(first: notify::Result<Event>, rx: &Receiver<notify::Result<Event>>, path: &Path) -> bool {
    let mut changed = touches(first, path);
    for event in rx.try_iter() {
        changed |= touches(event, path);
    }
    changed
}

// Re-run the document every time the file changes, handing each result to `on_run`.
// Notifications that pile up while a run is in progress collapse into a single run over the
// latest contents. Only returns on error.
pub fn watch<F>(path: &Path, notepad: &mut Notepad, mut on_run: F) -> Result<()>
where
    F: FnMut(&[crate::AnnotatedLine]) -> Result<()>,
{
    let (tx, rx) = mpsc::channel();
    let config = Config::default().with_poll_interval(Duration::from_millis(100));
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            if let Err(e) = tx.send(res) {
                error!("Error sending watch event: {}", e);
            }
        },
        config,
    )?;
    // Watch the directory: editors that save by renaming would otherwise detach the watch.
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    info!("watching {}", path.display());

    let mut run = |notepad: &mut Notepad| -> Result<()> {
        let document = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        on_run(&notepad.run(&document))
    };
    run(notepad)?;
    loop {
        let first = match rx.recv() {
            Ok(event) => event,
            Err(_) => bail!("watcher disconnected"),
        };
        if pending_change(first, &rx, path) {
            info!("{} changed, re-running", path.display());
            if let Err(e) = run(notepad) {
                // the file may be mid-write or briefly missing; wait for the next event
                warn!("{:#}", e);
            }
        }
    }
}
