use log::{debug, info};

use crate::core::{FullSnapshot, SystemInfo};
use crate::ffi::{
    RawConstraints, RawCoreData, RawGraphics, RawMemory, RawPower, RawStats, RawSystemInfo,
    SensingLibrary, assemble_snapshot,
};
use crate::util::error::{InitError, ReadError};

pub const DEFAULT_LIBRARY_PATH: &str = "libryzen_monitor.so";

// ryzen_init result codes, per the library header
const INIT_OK: i32 = 0;
const INIT_UNSUPPORTED: i32 = -2;

/// Source of telemetry snapshots. The production implementation wraps the
/// sensing library; tests substitute a scripted fake.
pub trait SnapshotReader {
    fn system_info(&mut self) -> Result<SystemInfo, ReadError>;

    /// Perform one read transaction, filling up to `max_cores` per-core
    /// records. A failed transaction is an `Err`; the caller decides what
    /// to display in the meantime.
    fn poll(&mut self, max_cores: usize) -> Result<FullSnapshot, ReadError>;

    /// Release the hardware channel. Must be idempotent.
    fn teardown(&mut self);
}

/// Reader over the loaded sensing library.
///
/// Lifecycle: `initialize` is the only constructor, so an `SmuReader` is
/// always in the initialized state; `teardown` is terminal and polling
/// afterwards returns `ReadError::TornDown`.
pub struct SmuReader {
    lib: SensingLibrary,
    torn_down: bool,
}

impl SmuReader {
    /// Load the shared object and run its init routine, acquiring the
    /// privileged SMU channel for the rest of the process lifetime.
    pub fn initialize(library_path: Option<&str>) -> Result<Self, InitError> {
        let path = library_path.unwrap_or(DEFAULT_LIBRARY_PATH);

        let lib = SensingLibrary::open(path).map_err(|source| InitError::LibraryLoad {
            path: path.to_string(),
            source,
        })?;
        debug!("loaded sensing library from '{path}'");

        match lib.init() {
            INIT_OK => {}
            INIT_UNSUPPORTED => return Err(InitError::Unsupported(INIT_UNSUPPORTED)),
            code => return Err(InitError::InitFailed(code)),
        }
        info!("sensing library initialized");

        Ok(Self {
            lib,
            torn_down: false,
        })
    }
}

impl SnapshotReader for SmuReader {
    fn system_info(&mut self) -> Result<SystemInfo, ReadError> {
        if self.torn_down {
            return Err(ReadError::TornDown);
        }

        let mut raw = RawSystemInfo::default();
        let code = self.lib.system_info(&mut raw);
        if code != 0 {
            return Err(ReadError::ReadFailed(code));
        }
        Ok(SystemInfo::from(&raw))
    }

    fn poll(&mut self, max_cores: usize) -> Result<FullSnapshot, ReadError> {
        if self.torn_down {
            return Err(ReadError::TornDown);
        }

        let mut cores = vec![RawCoreData::default(); max_cores];
        let mut constraints = RawConstraints::default();
        let mut memory = RawMemory::default();
        let mut power = RawPower::default();
        let mut graphics = RawGraphics::default();
        let mut stats = RawStats::default();

        let count = self.lib.read_data(
            &mut cores,
            &mut constraints,
            &mut memory,
            &mut power,
            &mut graphics,
            &mut stats,
        );

        // Zero or negative means the read transaction failed; nothing in
        // the buffers is trustworthy this cycle.
        if count <= 0 {
            return Err(ReadError::ReadFailed(count));
        }

        let populated = (count as usize).min(max_cores);
        Ok(assemble_snapshot(
            &cores[..populated],
            &constraints,
            &memory,
            &power,
            &graphics,
            &stats,
        ))
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.lib.cleanup();
        self.torn_down = true;
        info!("sensing library released");
    }
}

impl Drop for SmuReader {
    fn drop(&mut self) {
        self.teardown();
    }
}
