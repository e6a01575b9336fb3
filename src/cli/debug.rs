use std::error::Error;

use crate::config::AppConfig;
use crate::reader::SnapshotReader;
use crate::session::MonitorSession;
use crate::util::preflight;
use crate::view;

/// Prints everything needed for a bug report: environment, configuration,
/// identity, and one raw snapshot.
pub fn run_debug<R: SnapshotReader>(
    session: &mut MonitorSession<R>,
    config: &AppConfig,
) -> Result<(), Box<dyn Error>> {
    println!("=== RYZENMON DEBUG INFORMATION ===");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Timestamp: {}", chrono::Local::now().to_rfc3339());

    println!("\n--- ENVIRONMENT ---");
    println!("Running as root: {}", preflight::running_as_root());
    println!("ryzen_smu driver present: {}", preflight::smu_driver_present());
    println!(
        "ryzen_smu driver version: {}",
        preflight::smu_driver_version().as_deref().unwrap_or("N/A")
    );

    println!("\n--- CONFIGURATION ---");
    println!("{config:#?}");

    let system = session.system();
    println!("\n--- SYSTEM INFORMATION ---");
    println!("CPU: {}", system.cpu_name);
    println!("Codename: {}", system.codename);
    println!("SMU Firmware: {}", system.smu_fw_version);
    println!("SMU Interface Version: {}", system.smu_if_version);
    println!(
        "Cores: {} ({} enabled), CCDs: {}, CCXs: {}, cores/CCX: {}",
        system.cores, system.enabled_cores, system.ccds, system.ccxs, system.cores_per_ccx
    );

    println!("\n--- SNAPSHOT ---");
    if session.refresh() {
        // refresh just succeeded, snapshot is present
        if let Some(snapshot) = session.snapshot() {
            println!("Populated cores: {}", snapshot.cores.len());
            for core in &snapshot.cores {
                println!(
                    "  Core {}: freq={} power={} voltage={} temp={} disabled={} sleeping={}",
                    core.index,
                    view::fmt_value(core.frequency_mhz, 0),
                    view::fmt_value(core.power_watts, 3),
                    view::fmt_value(core.voltage, 3),
                    view::fmt_value(core.temp_celsius, 1),
                    core.disabled,
                    core.sleeping,
                );
            }
            println!("\nConstraints: {:#?}", snapshot.constraints);
            println!("\nMemory: {:#?}", snapshot.memory);
            println!("\nPower: {:#?}", snapshot.power);
            println!("\nGraphics: {:#?}", snapshot.graphics);
            println!("\nDerived: {:#?}", snapshot.stats);
        }
    } else {
        println!("Snapshot read failed; see warnings above.");
    }

    Ok(())
}
