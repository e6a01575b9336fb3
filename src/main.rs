mod cli;
mod config;
mod core;
mod daemon;
mod ffi;
mod reader;
mod session;
mod tui;
mod util;
mod view;

use std::error::Error;
use std::time::Duration;

use clap::Parser;

use crate::config::AppConfig;
use crate::reader::SmuReader;
use crate::session::MonitorSession;
use crate::util::error::InitError;
use crate::util::preflight;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Override path to the sensing library (libryzen_monitor.so)
    #[clap(long, global = true)]
    library: Option<String>,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Live dashboard (default)
    Watch {
        /// Poll interval in milliseconds
        #[clap(long)]
        interval_ms: Option<u64>,
    },
    /// Print system identity and one snapshot, then exit
    Info,
    /// Run headless, mirroring snapshots into the configured stats file
    Daemon {
        #[clap(long)]
        verbose: bool,
    },
    /// Dump configuration, environment checks, and one raw snapshot
    Debug,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    // Load configuration first; every mode needs the poll settings
    let mut config = match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {e}. Using default values.");
            AppConfig::default()
        }
    };
    if let Some(path) = cli.library {
        config.library.path = Some(path);
    }

    // Missing root or driver is a warning here; initialize() reports the
    // real failure if there is one
    preflight::warn_on_missing_requirements();

    let command_result = match cli.command {
        Some(Commands::Info) => run_info(&config),
        Some(Commands::Daemon { verbose }) => match open_session(&config) {
            Ok(session) => daemon::run_daemon(session, config, verbose),
            Err(e) => Err(e),
        },
        Some(Commands::Debug) => match open_session(&config) {
            Ok(mut session) => cli::debug::run_debug(&mut session, &config),
            Err(e) => Err(e),
        },
        Some(Commands::Watch { interval_ms }) => run_watch(&config, interval_ms),
        None => run_watch(&config, None),
    };

    if let Err(e) = command_result {
        eprintln!("Error: {e}");
        if let Some(source) = e.source() {
            eprintln!("Caused by: {source}");
        }
        if let Some(init_error) = e.downcast_ref::<InitError>() {
            if init_error.is_likely_permission() {
                eprintln!(
                    "Hint: reading SMU telemetry requires the ryzen_smu kernel driver \
                     and elevated privileges (e.g., run with sudo)."
                );
            }
        }
        std::process::exit(1);
    }
}

/// Live dashboard, the default mode.
fn run_watch(
    config: &AppConfig,
    interval_override_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let interval =
        Duration::from_millis(interval_override_ms.unwrap_or(config.poll.interval_ms));
    let session = open_session(config)?;
    tui::run_dashboard(session, interval)?;
    Ok(())
}

/// Initialize the sensing library and wrap it in a polling session.
fn open_session(
    config: &AppConfig,
) -> Result<MonitorSession<SmuReader>, Box<dyn std::error::Error>> {
    let reader = SmuReader::initialize(config.library.path.as_deref())?;
    let session = MonitorSession::new(reader, config.poll.max_cores)?;
    Ok(session)
}

/// One-shot report, the `info` subcommand.
fn run_info(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(config)?;

    let system = session.system().clone();
    println!("--- System Information ---");
    println!("CPU: {}", system.cpu_name);
    println!("Codename: {}", system.codename);
    println!("SMU Firmware: v{}", system.smu_fw_version);
    println!(
        "Cores: {} enabled / CCDs: {} / CCXs: {}",
        system.enabled_cores, system.ccds, system.ccxs
    );

    if !session.refresh() {
        eprintln!("Warning: snapshot read failed, no live data to show.");
        return Ok(());
    }
    let Some(snapshot) = session.snapshot() else {
        return Ok(());
    };

    println!("\n--- Core Readings ---");
    for core in &snapshot.cores {
        let row = view::core_row(core);
        println!(
            "  {}: {} MHz, {} W, {} V, {} °C, C0 {}%, C1 {}%, C6 {}%",
            row[0], row[1], row[2], row[3], row[4], row[5], row[6], row[7]
        );
    }

    let c = &snapshot.constraints;
    println!("\n--- Constraints ---");
    println!(
        "Peak Temp: {}   SoC Temp: {}   GFX Temp: {}",
        view::fmt_unit(c.peak_temp, 1, "°C"),
        view::fmt_unit(c.soc_temp, 1, "°C"),
        view::fmt_unit(c.gfx_temp, 1, "°C")
    );
    println!("PPT: {}", view::limit_label(c.ppt_value, c.ppt_limit, "W"));
    println!(
        "PPT (APU): {}",
        view::limit_label(c.ppt_apu_value, c.ppt_apu_limit, "W")
    );
    println!(
        "TDC: {} (actual {})",
        view::limit_label(c.tdc_value, c.tdc_limit, "A"),
        view::fmt_unit(c.tdc_actual, 1, "A")
    );
    println!(
        "TDC (SoC): {}",
        view::limit_label(c.tdc_soc_value, c.tdc_soc_limit, "A")
    );
    println!("EDC: {}", view::limit_label(c.edc_value, c.edc_limit, "A"));
    println!(
        "EDC (SoC): {}",
        view::limit_label(c.edc_soc_value, c.edc_soc_limit, "A")
    );
    println!("THM: {}", view::limit_label(c.thm_value, c.thm_limit, "°C"));
    println!(
        "THM (SoC): {}   THM (GFX): {}",
        view::limit_label(c.thm_soc_value, c.thm_soc_limit, "°C"),
        view::limit_label(c.thm_gfx_value, c.thm_gfx_limit, "°C")
    );
    println!("VID: {}", view::limit_label(c.vid_value, c.vid_limit, "V"));
    println!("FIT: {}", view::limit_label(c.fit_value, c.fit_limit, ""));

    let m = &snapshot.memory;
    println!("\n--- Memory Interface ---");
    println!(
        "FCLK: {} (eff {})",
        view::fmt_unit(m.fclk_mhz, 0, "MHz"),
        view::fmt_unit(m.fclk_eff_mhz, 0, "MHz")
    );
    println!("UCLK: {}", view::fmt_unit(m.uclk_mhz, 0, "MHz"));
    println!("MEMCLK: {}", view::fmt_unit(m.memclk_mhz, 0, "MHz"));
    println!("Coupled: {}", view::coupled_cell(m.coupled_mode));
    println!(
        "cLDO VDDM: {}   cLDO VDDP: {}",
        view::fmt_unit(m.v_vddm, 4, "V"),
        view::fmt_unit(m.v_vddp, 4, "V")
    );
    println!(
        "cLDO VDDG: {} (IOD {}, CCD {})",
        view::fmt_unit(m.v_vddg, 4, "V"),
        view::fmt_unit(m.v_vddg_iod, 4, "V"),
        view::fmt_unit(m.v_vddg_ccd, 4, "V")
    );

    let p = &snapshot.power;
    println!("\n--- Power ---");
    println!("Socket: {}", view::fmt_unit(p.socket_power, 3, "W"));
    println!("Package: {}", view::fmt_unit(p.package_power, 3, "W"));
    println!("Core Total: {}", view::fmt_unit(p.total_core_power, 3, "W"));
    println!(
        "VDDCR CPU: {}   VDDCR SoC: {}",
        view::fmt_unit(p.vddcr_cpu_power, 3, "W"),
        view::fmt_unit(p.vddcr_soc_power, 3, "W")
    );
    println!(
        "IO VDDCR SoC: {}   GMI2 VDDG: {}   ROC: {}",
        view::fmt_unit(p.io_vddcr_soc_power, 3, "W"),
        view::fmt_unit(p.gmi2_vddg_power, 3, "W"),
        view::fmt_unit(p.roc_power, 3, "W")
    );
    println!(
        "L3 Logic: {}   L3 VDDM: {}",
        view::fmt_unit(p.l3_logic_power, 3, "W"),
        view::fmt_unit(p.l3_vddm_power, 3, "W")
    );
    println!(
        "VDDIO Mem: {} (IOD {})   DDR VDDP: {}   DDR PHY: {}",
        view::fmt_unit(p.vddio_mem_power, 3, "W"),
        view::fmt_unit(p.iod_vddio_mem_power, 3, "W"),
        view::fmt_unit(p.ddr_vddp_power, 3, "W"),
        view::fmt_unit(p.ddr_phy_power, 3, "W")
    );
    println!(
        "VDD18: {}   IO Display: {}   IO USB: {}",
        view::fmt_unit(p.vdd18_power, 3, "W"),
        view::fmt_unit(p.io_display_power, 3, "W"),
        view::fmt_unit(p.io_usb_power, 3, "W")
    );
    println!(
        "CPU Telemetry: {} / {} / {}",
        view::fmt_unit(p.cpu_telemetry_voltage, 3, "V"),
        view::fmt_unit(p.cpu_telemetry_current, 3, "A"),
        view::fmt_unit(p.cpu_telemetry_power, 3, "W")
    );
    println!(
        "SoC Telemetry: {} / {} / {}",
        view::fmt_unit(p.soc_telemetry_voltage, 3, "V"),
        view::fmt_unit(p.soc_telemetry_current, 3, "A"),
        view::fmt_unit(p.soc_telemetry_power, 3, "W")
    );

    if snapshot.graphics.is_populated() {
        let g = &snapshot.graphics;
        println!("\n--- Graphics ---");
        println!(
            "GFX Clock: {} (eff {})",
            view::fmt_unit(g.gfx_freq_mhz, 0, "MHz"),
            view::fmt_unit(g.gfx_freq_eff_mhz, 0, "MHz")
        );
        println!(
            "GFX Temp: {}   Voltage: {}   Busy: {}",
            view::fmt_unit(g.gfx_temp, 1, "°C"),
            view::fmt_unit(g.gfx_voltage, 3, "V"),
            view::fmt_unit(g.gfx_busy_percent, 1, "%")
        );
        println!(
            "GFX EDC: {} (residency {})   ROC: {}",
            view::fmt_unit(g.gfx_edc_limit, 1, "A"),
            view::fmt_unit(g.gfx_edc_residency, 1, "%"),
            view::fmt_unit(g.roc_power, 3, "W")
        );
        println!(
            "Displays: {}   FPS: {}",
            view::fmt_value(g.display_count, 0),
            view::fmt_value(g.fps, 0)
        );
        println!(
            "dGPU Power: {}   Clock Target: {}   Busy: {}",
            view::fmt_unit(g.dgpu_power, 3, "W"),
            view::fmt_unit(g.dgpu_freq_target_mhz, 0, "MHz"),
            view::fmt_unit(g.dgpu_busy_percent, 1, "%")
        );
    }

    Ok(())
}
