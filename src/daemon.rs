use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{LevelFilter, debug, error, info, warn};

use crate::config::watcher::ConfigWatcher;
use crate::config::{AppConfig, LogLevel, config_search_paths};
use crate::core::FullSnapshot;
use crate::reader::SnapshotReader;
use crate::session::MonitorSession;
use crate::view;

/// Headless polling loop: refresh on the configured cadence and mirror the
/// latest snapshot into a key=value stats file until a shutdown signal.
pub fn run_daemon<R: SnapshotReader>(
    mut session: MonitorSession<R>,
    mut config: AppConfig,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let effective_log_level = if verbose {
        LogLevel::Debug
    } else {
        config.daemon.log_level
    };
    log::set_max_level(level_filter(effective_log_level));

    info!("starting ryzenmon daemon");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    info!(
        "daemon initialized with poll interval: {}ms",
        config.poll.interval_ms
    );
    if let Some(stats_path) = &config.daemon.stats_file_path {
        info!("stats will be written to: {stats_path}");
    }

    // Watch whichever config file is actually in effect
    let mut config_watcher = config_search_paths()
        .into_iter()
        .find(|p| p.exists())
        .and_then(|path| {
            let path = path.display().to_string();
            match ConfigWatcher::new(&path) {
                Ok(watcher) => {
                    info!("watching config file: {path}");
                    Some(watcher)
                }
                Err(e) => {
                    warn!("failed to initialize config file watcher: {e}");
                    None
                }
            }
        });

    while running.load(Ordering::SeqCst) {
        let start_time = Instant::now();

        if let Some(watcher) = &mut config_watcher {
            if let Some(config_result) = watcher.check_for_changes() {
                match config_result {
                    Ok(new_config) => {
                        info!("config file changed, updating configuration");
                        config = new_config;
                        log::set_max_level(level_filter(if verbose {
                            LogLevel::Debug
                        } else {
                            config.daemon.log_level
                        }));
                    }
                    Err(e) => {
                        error!("error loading new configuration: {e}");
                        // Continue with existing config
                    }
                }
            }
        }

        if session.refresh() {
            debug!("snapshot refreshed");
        }

        if let (Some(stats_path), Some(snapshot)) =
            (&config.daemon.stats_file_path, session.snapshot())
        {
            if let Err(e) = write_stats_file(stats_path, snapshot) {
                error!("failed to write stats file: {e}");
            }
        }

        // Sleep out the remainder of the interval, in short slices so a
        // shutdown signal is honored promptly
        let poll_duration = Duration::from_millis(config.poll.interval_ms);
        while running.load(Ordering::SeqCst) && start_time.elapsed() < poll_duration {
            let remaining = poll_duration - start_time.elapsed();
            std::thread::sleep(remaining.min(Duration::from_millis(200)));
        }
    }

    info!("daemon stopped");
    session.close();
    Ok(())
}

const fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warning => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
    }
}

/// Mirror the snapshot into a flat key=value file other tools can scrape.
fn write_stats_file(path: &str, snapshot: &FullSnapshot) -> Result<(), std::io::Error> {
    let mut file = File::create(path)?;

    writeln!(file, "timestamp={}", chrono::Local::now().to_rfc3339())?;
    writeln!(
        file,
        "peak_core_freq_mhz={}",
        view::fmt_value(snapshot.stats.peak_core_frequency_mhz, 0)
    )?;
    writeln!(
        file,
        "peak_core_temp_c={}",
        view::fmt_value(snapshot.stats.peak_core_temp, 1)
    )?;
    writeln!(
        file,
        "socket_power_w={}",
        view::fmt_value(snapshot.power.socket_power, 3)
    )?;
    writeln!(
        file,
        "total_core_power_w={}",
        view::fmt_value(snapshot.stats.total_core_power, 3)
    )?;
    writeln!(
        file,
        "ppt={}",
        view::limit_label(
            snapshot.constraints.ppt_value,
            snapshot.constraints.ppt_limit,
            "W"
        )
    )?;
    writeln!(
        file,
        "fclk_mhz={}",
        view::fmt_value(snapshot.memory.fclk_mhz, 0)
    )?;

    for core in &snapshot.cores {
        writeln!(
            file,
            "core{}_freq_mhz={}",
            core.index,
            view::freq_cell(core)
        )?;
    }

    Ok(())
}
