use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::types::{AppConfig, ConfigError};
use crate::config::load_config_from_path;

// Editors often write a config file several times in quick succession
const DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches the active configuration file and reloads it when modified.
/// Used by daemon mode so poll cadence and stats output can change without
/// a restart.
pub struct ConfigWatcher {
    rx: Receiver<Result<Event, notify::Error>>,
    _watcher: RecommendedWatcher, // keep watcher alive while watching
    config_path: String,
    last_event_time: Instant,
}

impl ConfigWatcher {
    pub fn new(config_path: &str) -> Result<Self, notify::Error> {
        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(tx, Config::default())?;
        watcher.watch(Path::new(config_path), RecursiveMode::NonRecursive)?;

        Ok(Self {
            rx,
            _watcher: watcher,
            config_path: config_path.to_string(),
            last_event_time: Instant::now(),
        })
    }

    /// Drain pending filesystem events; returns a reload result when the
    /// file was modified since the last check, `None` otherwise.
    pub fn check_for_changes(&mut self) -> Option<Result<AppConfig, ConfigError>> {
        let mut modified = false;

        loop {
            match self.rx.try_recv() {
                Ok(Ok(event)) => {
                    if matches!(event.kind, EventKind::Modify(_)) {
                        modified = true;
                        self.last_event_time = Instant::now();
                    }
                }
                Ok(Err(e)) => {
                    log::warn!("config watcher error: {e}");
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("config watcher channel disconnected");
                    return None;
                }
            }
        }

        if !modified {
            return None;
        }

        // Let the writer finish before re-reading
        let since_last = self.last_event_time.elapsed();
        if since_last < DEBOUNCE {
            thread::sleep(DEBOUNCE - since_last);
        }

        Some(load_config_from_path(&self.config_path))
    }
}
