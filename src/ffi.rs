// Fixed-layout records shared with libryzen_monitor.so. Field order and
// width are part of the ABI contract with the sensing library and must
// match its header exactly; the tests at the bottom pin the struct sizes.

use std::os::raw::c_int;

use libloading::Library;

use crate::core::{
    ConstraintSnapshot, CoreReading, DerivedStats, FullSnapshot, GraphicsSnapshot,
    MemoryInterfaceSnapshot, PowerRailSnapshot, SystemInfo,
};

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawCoreData {
    pub core_num: c_int,
    pub frequency: f32,
    pub power: f32,
    pub voltage: f32,
    pub temp: f32,
    pub c0: f32,
    pub cc1: f32,
    pub cc6: f32,
    pub disabled: c_int,
    pub sleeping: c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawSystemInfo {
    pub cpu_name: [u8; 256],
    pub codename: [u8; 64],
    pub smu_fw_ver: [u8; 32],
    pub cores: c_int,
    pub ccds: c_int,
    pub ccxs: c_int,
    pub cores_per_ccx: c_int,
    pub if_ver: c_int,
    pub enabled_cores_count: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawConstraints {
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

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawMemory {
    pub fclk_freq: f32,
    pub fclk_freq_eff: f32,
    pub uclk_freq: f32,
    pub memclk_freq: f32,
    pub v_vddm: f32,
    pub v_vddp: f32,
    pub v_vddg: f32,
    pub v_vddg_iod: f32,
    pub v_vddg_ccd: f32,
    pub coupled_mode: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawPower {
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

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawGraphics {
    pub gfx_voltage: f32,
    pub roc_power: f32,
    pub gfx_temp: f32,
    pub gfx_freq: f32,
    pub gfx_freq_eff: f32,
    pub gfx_busy: f32,
    pub gfx_edc_lim: f32,
    pub gfx_edc_residency: f32,
    pub display_count: f32,
    pub fps: f32,
    pub dgpu_power: f32,
    pub dgpu_freq_target: f32,
    pub dgpu_gfx_busy: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawStats {
    pub peak_core_frequency: f32,
    pub peak_core_temp: f32,
    pub peak_core_voltage: f32,
    pub avg_core_voltage: f32,
    pub avg_core_cc6: f32,
    pub total_core_power: f32,
    pub peak_core_voltage_smu: f32,
    pub package_cc6: f32,
}

impl Default for RawSystemInfo {
    fn default() -> Self {
        Self {
            cpu_name: [0; 256],
            codename: [0; 64],
            smu_fw_ver: [0; 32],
            cores: 0,
            ccds: 0,
            ccxs: 0,
            cores_per_ccx: 0,
            if_ver: 0,
            enabled_cores_count: 0,
        }
    }
}

impl Default for RawCoreData {
    fn default() -> Self {
        Self {
            core_num: 0,
            frequency: 0.0,
            power: 0.0,
            voltage: 0.0,
            temp: 0.0,
            c0: 0.0,
            cc1: 0.0,
            cc6: 0.0,
            disabled: 0,
            sleeping: 0,
        }
    }
}

macro_rules! zeroed_default {
    ($($ty:ty),+ $(,)?) => {
        $(impl Default for $ty {
            fn default() -> Self {
                // All-f32 records; a zeroed value is a valid (if empty) read
                unsafe { std::mem::zeroed() }
            }
        })+
    };
}

zeroed_default!(RawConstraints, RawMemory, RawPower, RawGraphics, RawStats);

/// Decode a fixed-length, null-terminated byte buffer as UTF-8 text.
pub fn decode_cstr(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

impl From<&RawSystemInfo> for SystemInfo {
    fn from(raw: &RawSystemInfo) -> Self {
        Self {
            cpu_name: decode_cstr(&raw.cpu_name),
            codename: decode_cstr(&raw.codename),
            smu_fw_version: decode_cstr(&raw.smu_fw_ver),
            cores: raw.cores.max(0) as u32,
            ccds: raw.ccds.max(0) as u32,
            ccxs: raw.ccxs.max(0) as u32,
            cores_per_ccx: raw.cores_per_ccx.max(0) as u32,
            smu_if_version: raw.if_ver.max(0) as u32,
            enabled_cores: raw.enabled_cores_count.max(0) as u32,
        }
    }
}

impl From<&RawCoreData> for CoreReading {
    fn from(raw: &RawCoreData) -> Self {
        Self {
            index: raw.core_num.max(0) as u32,
            frequency_mhz: raw.frequency,
            power_watts: raw.power,
            voltage: raw.voltage,
            temp_celsius: raw.temp,
            c0_percent: raw.c0,
            cc1_percent: raw.cc1,
            cc6_percent: raw.cc6,
            disabled: raw.disabled != 0,
            sleeping: raw.sleeping != 0,
        }
    }
}

impl From<&RawConstraints> for ConstraintSnapshot {
    fn from(raw: &RawConstraints) -> Self {
        Self {
            peak_temp: raw.peak_temp,
            soc_temp: raw.soc_temp,
            gfx_temp: raw.gfx_temp,
            vid_value: raw.vid_value,
            vid_limit: raw.vid_limit,
            ppt_value: raw.ppt_value,
            ppt_limit: raw.ppt_limit,
            ppt_apu_value: raw.ppt_apu_value,
            ppt_apu_limit: raw.ppt_apu_limit,
            tdc_value: raw.tdc_value,
            tdc_limit: raw.tdc_limit,
            tdc_actual: raw.tdc_actual,
            tdc_soc_value: raw.tdc_soc_value,
            tdc_soc_limit: raw.tdc_soc_limit,
            edc_value: raw.edc_value,
            edc_limit: raw.edc_limit,
            edc_soc_value: raw.edc_soc_value,
            edc_soc_limit: raw.edc_soc_limit,
            thm_value: raw.thm_value,
            thm_limit: raw.thm_limit,
            thm_soc_value: raw.thm_soc_value,
            thm_soc_limit: raw.thm_soc_limit,
            thm_gfx_value: raw.thm_gfx_value,
            thm_gfx_limit: raw.thm_gfx_limit,
            fit_value: raw.fit_value,
            fit_limit: raw.fit_limit,
        }
    }
}

impl From<&RawMemory> for MemoryInterfaceSnapshot {
    fn from(raw: &RawMemory) -> Self {
        Self {
            fclk_mhz: raw.fclk_freq,
            fclk_eff_mhz: raw.fclk_freq_eff,
            uclk_mhz: raw.uclk_freq,
            memclk_mhz: raw.memclk_freq,
            v_vddm: raw.v_vddm,
            v_vddp: raw.v_vddp,
            v_vddg: raw.v_vddg,
            v_vddg_iod: raw.v_vddg_iod,
            v_vddg_ccd: raw.v_vddg_ccd,
            coupled_mode: raw.coupled_mode != 0,
        }
    }
}

impl From<&RawPower> for PowerRailSnapshot {
    fn from(raw: &RawPower) -> Self {
        Self {
            total_core_power: raw.total_core_power,
            vddcr_soc_power: raw.vddcr_soc_power,
            io_vddcr_soc_power: raw.io_vddcr_soc_power,
            gmi2_vddg_power: raw.gmi2_vddg_power,
            roc_power: raw.roc_power,
            l3_logic_power: raw.l3_logic_power,
            l3_vddm_power: raw.l3_vddm_power,
            vddio_mem_power: raw.vddio_mem_power,
            iod_vddio_mem_power: raw.iod_vddio_mem_power,
            ddr_vddp_power: raw.ddr_vddp_power,
            ddr_phy_power: raw.ddr_phy_power,
            vdd18_power: raw.vdd18_power,
            io_display_power: raw.io_display_power,
            io_usb_power: raw.io_usb_power,
            socket_power: raw.socket_power,
            package_power: raw.package_power,
            vddcr_cpu_power: raw.vddcr_cpu_power,
            soc_telemetry_voltage: raw.soc_telemetry_voltage,
            soc_telemetry_current: raw.soc_telemetry_current,
            soc_telemetry_power: raw.soc_telemetry_power,
            cpu_telemetry_voltage: raw.cpu_telemetry_voltage,
            cpu_telemetry_current: raw.cpu_telemetry_current,
            cpu_telemetry_power: raw.cpu_telemetry_power,
        }
    }
}

impl From<&RawGraphics> for GraphicsSnapshot {
    fn from(raw: &RawGraphics) -> Self {
        Self {
            gfx_voltage: raw.gfx_voltage,
            roc_power: raw.roc_power,
            gfx_temp: raw.gfx_temp,
            gfx_freq_mhz: raw.gfx_freq,
            gfx_freq_eff_mhz: raw.gfx_freq_eff,
            gfx_busy_percent: raw.gfx_busy,
            gfx_edc_limit: raw.gfx_edc_lim,
            gfx_edc_residency: raw.gfx_edc_residency,
            display_count: raw.display_count,
            fps: raw.fps,
            dgpu_power: raw.dgpu_power,
            dgpu_freq_target_mhz: raw.dgpu_freq_target,
            dgpu_busy_percent: raw.dgpu_gfx_busy,
        }
    }
}

impl From<&RawStats> for DerivedStats {
    fn from(raw: &RawStats) -> Self {
        Self {
            peak_core_frequency_mhz: raw.peak_core_frequency,
            peak_core_temp: raw.peak_core_temp,
            peak_core_voltage: raw.peak_core_voltage,
            avg_core_voltage: raw.avg_core_voltage,
            avg_core_cc6: raw.avg_core_cc6,
            total_core_power: raw.total_core_power,
            peak_core_voltage_smu: raw.peak_core_voltage_smu,
            package_cc6: raw.package_cc6,
        }
    }
}

/// One filled set of output buffers, converted into the domain snapshot.
pub fn assemble_snapshot(
    cores: &[RawCoreData],
    constraints: &RawConstraints,
    memory: &RawMemory,
    power: &RawPower,
    graphics: &RawGraphics,
    stats: &RawStats,
) -> FullSnapshot {
    FullSnapshot {
        cores: cores.iter().map(CoreReading::from).collect(),
        constraints: constraints.into(),
        memory: memory.into(),
        power: power.into(),
        graphics: graphics.into(),
        stats: stats.into(),
        timestamp: std::time::SystemTime::now(),
    }
}

type InitFn = unsafe extern "C" fn() -> c_int;
type CleanupFn = unsafe extern "C" fn();
type SystemInfoFn = unsafe extern "C" fn(*mut RawSystemInfo) -> c_int;
type ReadDataFn = unsafe extern "C" fn(
    *mut RawCoreData,
    c_int,
    *mut RawConstraints,
    *mut RawMemory,
    *mut RawPower,
    *mut RawGraphics,
    *mut RawStats,
) -> c_int;

/// Handle to the loaded shared object with its four entry points resolved.
///
/// The function pointers are only valid while `_lib` is alive, which the
/// struct guarantees by owning it.
pub struct SensingLibrary {
    init: InitFn,
    cleanup: CleanupFn,
    system_info: SystemInfoFn,
    read_data: ReadDataFn,
    _lib: Library,
}

impl SensingLibrary {
    /// Load the shared object and resolve every symbol up front so a
    /// missing or incompatible binary fails at startup, not mid-poll.
    pub fn open(path: &str) -> Result<Self, libloading::Error> {
        // SAFETY: loading runs the library's constructors; the signatures
        // below match the C header this crate is built against.
        unsafe {
            let lib = Library::new(path)?;
            let init = *lib.get::<InitFn>(b"ryzen_init\0")?;
            let cleanup = *lib.get::<CleanupFn>(b"ryzen_cleanup\0")?;
            let system_info = *lib.get::<SystemInfoFn>(b"ryzen_get_system_info\0")?;
            let read_data = *lib.get::<ReadDataFn>(b"ryzen_read_data\0")?;
            Ok(Self {
                init,
                cleanup,
                system_info,
                read_data,
                _lib: lib,
            })
        }
    }

    /// `ryzen_init`: 0 on success, -1 when the SMU interface could not be
    /// opened, -2 when PM tables are unsupported.
    pub fn init(&self) -> i32 {
        unsafe { (self.init)() }
    }

    pub fn cleanup(&self) {
        unsafe { (self.cleanup)() }
    }

    pub fn system_info(&self, out: &mut RawSystemInfo) -> i32 {
        unsafe { (self.system_info)(out) }
    }

    /// `ryzen_read_data`: fills the caller-provided buffers and returns the
    /// populated core count, <= 0 on a failed transaction.
    #[allow(clippy::too_many_arguments)]
    pub fn read_data(
        &self,
        cores: &mut [RawCoreData],
        constraints: &mut RawConstraints,
        memory: &mut RawMemory,
        power: &mut RawPower,
        graphics: &mut RawGraphics,
        stats: &mut RawStats,
    ) -> i32 {
        unsafe {
            (self.read_data)(
                cores.as_mut_ptr(),
                cores.len() as c_int,
                constraints,
                memory,
                power,
                graphics,
                stats,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    // Sizes pinned against the C header; a mismatch here means the binding
    // no longer matches the library ABI.
    #[test]
    fn raw_struct_sizes_match_abi() {
        assert_eq!(size_of::<RawCoreData>(), 40);
        assert_eq!(size_of::<RawSystemInfo>(), 256 + 64 + 32 + 6 * 4);
        assert_eq!(size_of::<RawConstraints>(), 26 * 4);
        assert_eq!(size_of::<RawMemory>(), 10 * 4);
        assert_eq!(size_of::<RawPower>(), 23 * 4);
        assert_eq!(size_of::<RawGraphics>(), 13 * 4);
        assert_eq!(size_of::<RawStats>(), 8 * 4);
    }

    #[test]
    fn decode_cstr_stops_at_nul() {
        let mut buf = [0u8; 16];
        buf[..5].copy_from_slice(b"Ryzen");
        assert_eq!(decode_cstr(&buf), "Ryzen");
    }

    #[test]
    fn decode_cstr_without_terminator_takes_whole_buffer() {
        let buf = *b"AMD Ryzen 9 5950";
        assert_eq!(decode_cstr(&buf), "AMD Ryzen 9 5950");
    }

    #[test]
    fn decode_cstr_ignores_bytes_after_nul() {
        let buf = *b"Zen3\0garbage\0\0\0\0";
        assert_eq!(decode_cstr(&buf), "Zen3");
    }

    #[test]
    fn core_reading_flags_convert() {
        let raw = RawCoreData {
            core_num: 3,
            frequency: 4650.0,
            disabled: 1,
            sleeping: 0,
            ..Default::default()
        };
        let reading = CoreReading::from(&raw);
        assert_eq!(reading.index, 3);
        assert!(reading.disabled);
        assert!(!reading.sleeping);
    }

    #[test]
    fn system_info_decodes_text_fields() {
        let mut raw = RawSystemInfo::default();
        raw.cpu_name[..20].copy_from_slice(b"AMD Ryzen 7 5800X3D\0");
        raw.codename[..8].copy_from_slice(b"Vermeer\0");
        raw.smu_fw_ver[..9].copy_from_slice(b"56.50.00\0");
        raw.cores = 8;
        raw.enabled_cores_count = 8;
        let info = SystemInfo::from(&raw);
        assert_eq!(info.cpu_name, "AMD Ryzen 7 5800X3D");
        assert_eq!(info.codename, "Vermeer");
        assert_eq!(info.smu_fw_version, "56.50.00");
        assert_eq!(info.enabled_cores, 8);
    }
}
