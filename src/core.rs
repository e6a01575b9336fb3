// Domain records for one SMU telemetry cycle. Everything here is a plain
// value type: the sensing library rebuilds all of it on every poll, and we
// keep only the last copy around for display.

/// Hard upper bound on per-core records requested from the sensing library.
pub const MAX_CORES: usize = 32;

#[derive(Debug, Clone)]
pub struct SystemInfo {
    // Static CPU identity, fetched once after init
    pub cpu_name: String,
    pub codename: String,
    pub smu_fw_version: String,
    pub cores: u32,
    pub ccds: u32,
    pub ccxs: u32,
    pub cores_per_ccx: u32,
    pub smu_if_version: u32,
    pub enabled_cores: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct CoreReading {
    // Per-core instantaneous state
    pub index: u32,
    pub frequency_mhz: f32,
    pub power_watts: f32,
    pub voltage: f32,
    pub temp_celsius: f32,
    pub c0_percent: f32,
    pub cc1_percent: f32,
    pub cc6_percent: f32,
    pub disabled: bool,
    pub sleeping: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintSnapshot {
    // Platform power/thermal budgets, live value plus configured limit
    pub peak_temp: f32,
    pub soc_temp: f32,
    pub gfx_temp: f32,
    pub vid_value: f32,
    pub vid_limit: f32,
    pub ppt_value: f32,
    pub ppt_limit: f32,
    pub ppt_apu_value: f32,
    pub ppt_apu_limit: f32,
    pub tdc_value: f32,
    pub tdc_limit: f32,
    pub tdc_actual: f32,
    pub tdc_soc_value: f32,
    pub tdc_soc_limit: f32,
    pub edc_value: f32,
    pub edc_limit: f32,
    pub edc_soc_value: f32,
    pub edc_soc_limit: f32,
    pub thm_value: f32,
    pub thm_limit: f32,
    pub thm_soc_value: f32,
    pub thm_soc_limit: f32,
    pub thm_gfx_value: f32,
    pub thm_gfx_limit: f32,
    pub fit_value: f32,
    pub fit_limit: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryInterfaceSnapshot {
    pub fclk_mhz: f32,
    pub fclk_eff_mhz: f32,
    pub uclk_mhz: f32,
    pub memclk_mhz: f32,
    pub v_vddm: f32,
    pub v_vddp: f32,
    pub v_vddg: f32,
    pub v_vddg_iod: f32,
    pub v_vddg_ccd: f32,
    // UCLK running 1:1 with MEMCLK
    pub coupled_mode: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PowerRailSnapshot {
    pub total_core_power: f32,
    pub vddcr_soc_power: f32,
    pub io_vddcr_soc_power: f32,
    pub gmi2_vddg_power: f32,
    pub roc_power: f32,
    pub l3_logic_power: f32,
    pub l3_vddm_power: f32,
    pub vddio_mem_power: f32,
    pub iod_vddio_mem_power: f32,
    pub ddr_vddp_power: f32,
    pub ddr_phy_power: f32,
    pub vdd18_power: f32,
    pub io_display_power: f32,
    pub io_usb_power: f32,
    pub socket_power: f32,
    pub package_power: f32,
    pub vddcr_cpu_power: f32,
    pub soc_telemetry_voltage: f32,
    pub soc_telemetry_current: f32,
    pub soc_telemetry_power: f32,
    pub cpu_telemetry_voltage: f32,
    pub cpu_telemetry_current: f32,
    pub cpu_telemetry_power: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GraphicsSnapshot {
    pub gfx_voltage: f32,
    pub roc_power: f32,
    pub gfx_temp: f32,
    pub gfx_freq_mhz: f32,
    pub gfx_freq_eff_mhz: f32,
    pub gfx_busy_percent: f32,
    pub gfx_edc_limit: f32,
    pub gfx_edc_residency: f32,
    pub display_count: f32,
    pub fps: f32,
    pub dgpu_power: f32,
    pub dgpu_freq_target_mhz: f32,
    pub dgpu_busy_percent: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DerivedStats {
    // Cross-core aggregates computed by the sensing library
    pub peak_core_frequency_mhz: f32,
    pub peak_core_temp: f32,
    pub peak_core_voltage: f32,
    pub avg_core_voltage: f32,
    pub avg_core_cc6: f32,
    pub total_core_power: f32,
    pub peak_core_voltage_smu: f32,
    pub package_cc6: f32,
}

/// Everything one `read_data` transaction produced.
#[derive(Debug, Clone)]
pub struct FullSnapshot {
    pub cores: Vec<CoreReading>,
    pub constraints: ConstraintSnapshot,
    pub memory: MemoryInterfaceSnapshot,
    pub power: PowerRailSnapshot,
    pub graphics: GraphicsSnapshot,
    pub stats: DerivedStats,
    pub timestamp: std::time::SystemTime,
}

impl GraphicsSnapshot {
    /// True when the graphics domain reported anything. Parts without an
    /// iGPU leave the whole record zeroed or NaN.
    pub fn is_populated(&self) -> bool {
        self.gfx_freq_mhz > 0.0 || self.gfx_temp > 0.0
    }
}
