use log::{debug, warn};

use crate::core::{FullSnapshot, SystemInfo};
use crate::reader::SnapshotReader;
use crate::util::error::ReadError;

/// Owned polling context shared by every display mode: the reader, the
/// static identity record, and the last snapshot that actually arrived.
///
/// Transient read failures keep the previous snapshot in place so the
/// display never flickers back to an empty state.
pub struct MonitorSession<R: SnapshotReader> {
    reader: R,
    system: SystemInfo,
    last: Option<FullSnapshot>,
    max_cores: usize,
    consecutive_failures: u32,
}

impl<R: SnapshotReader> MonitorSession<R> {
    pub fn new(mut reader: R, max_cores: usize) -> Result<Self, ReadError> {
        let system = reader.system_info()?;
        Ok(Self {
            reader,
            system,
            last: None,
            max_cores,
            consecutive_failures: 0,
        })
    }

    pub fn system(&self) -> &SystemInfo {
        &self.system
    }

    /// Last snapshot that arrived intact, if any cycle has succeeded yet.
    pub fn snapshot(&self) -> Option<&FullSnapshot> {
        self.last.as_ref()
    }

    /// Poll once. Returns true when fresh data replaced the snapshot and
    /// false when this cycle was skipped (previous values stay on screen).
    pub fn refresh(&mut self) -> bool {
        match self.reader.poll(self.max_cores) {
            Ok(snapshot) if !snapshot.cores.is_empty() => {
                debug!("poll succeeded with {} core records", snapshot.cores.len());
                self.last = Some(snapshot);
                self.consecutive_failures = 0;
                true
            }
            Ok(_) => {
                // A structurally-ok reply with no cores is still "no data
                // this cycle"
                self.consecutive_failures += 1;
                warn!(
                    "poll returned no core records ({} consecutive empty cycles)",
                    self.consecutive_failures
                );
                false
            }
            Err(e) => {
                self.consecutive_failures += 1;
                warn!(
                    "poll failed: {e} ({} consecutive failures); keeping previous snapshot",
                    self.consecutive_failures
                );
                false
            }
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Release the hardware channel. Safe to call more than once; the
    /// reader guards the underlying cleanup.
    pub fn close(&mut self) {
        self.reader.teardown();
    }
}

impl<R: SnapshotReader> Drop for MonitorSession<R> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::{
        ConstraintSnapshot, CoreReading, DerivedStats, GraphicsSnapshot, MemoryInterfaceSnapshot,
        PowerRailSnapshot,
    };
    use std::collections::VecDeque;

    pub(crate) fn reading(index: u32, frequency_mhz: f32) -> CoreReading {
        CoreReading {
            index,
            frequency_mhz,
            power_watts: 5.0,
            voltage: 1.25,
            temp_celsius: 55.0,
            c0_percent: 80.0,
            cc1_percent: 10.0,
            cc6_percent: 10.0,
            disabled: false,
            sleeping: false,
        }
    }

    pub(crate) fn snapshot_with_cores(cores: Vec<CoreReading>) -> FullSnapshot {
        FullSnapshot {
            cores,
            constraints: ConstraintSnapshot::default(),
            memory: MemoryInterfaceSnapshot::default(),
            power: PowerRailSnapshot::default(),
            graphics: GraphicsSnapshot::default(),
            stats: DerivedStats::default(),
            timestamp: std::time::SystemTime::now(),
        }
    }

    fn test_system() -> SystemInfo {
        SystemInfo {
            cpu_name: "AMD Ryzen 7 5800X".into(),
            codename: "Vermeer".into(),
            smu_fw_version: "56.50.00".into(),
            cores: 8,
            ccds: 1,
            ccxs: 1,
            cores_per_ccx: 8,
            smu_if_version: 11,
            enabled_cores: 8,
        }
    }

    /// Scripted reader: pops one poll result per call, guards teardown the
    /// same way the production reader does.
    pub(crate) struct FakeReader {
        pub polls: VecDeque<Result<FullSnapshot, ReadError>>,
        pub cleanup_calls: u32,
        torn_down: bool,
    }

    impl FakeReader {
        pub fn scripted(polls: Vec<Result<FullSnapshot, ReadError>>) -> Self {
            Self {
                polls: polls.into(),
                cleanup_calls: 0,
                torn_down: false,
            }
        }
    }

    impl SnapshotReader for FakeReader {
        fn system_info(&mut self) -> Result<SystemInfo, ReadError> {
            if self.torn_down {
                return Err(ReadError::TornDown);
            }
            Ok(test_system())
        }

        fn poll(&mut self, _max_cores: usize) -> Result<FullSnapshot, ReadError> {
            if self.torn_down {
                return Err(ReadError::TornDown);
            }
            self.polls
                .pop_front()
                .unwrap_or(Err(ReadError::ReadFailed(0)))
        }

        fn teardown(&mut self) {
            if self.torn_down {
                return;
            }
            self.cleanup_calls += 1;
            self.torn_down = true;
        }
    }

    #[test]
    fn refresh_stores_successful_snapshot() {
        let reader = FakeReader::scripted(vec![Ok(snapshot_with_cores(vec![
            reading(0, 4700.0),
            reading(1, 4650.0),
        ]))]);
        let mut session = MonitorSession::new(reader, 32).unwrap();

        assert!(session.snapshot().is_none());
        assert!(session.refresh());
        assert_eq!(session.snapshot().unwrap().cores.len(), 2);
        assert_eq!(session.consecutive_failures(), 0);
    }

    #[test]
    fn failed_poll_retains_previous_snapshot() {
        let reader = FakeReader::scripted(vec![
            Ok(snapshot_with_cores(vec![reading(0, 4700.0)])),
            Err(ReadError::ReadFailed(-1)),
        ]);
        let mut session = MonitorSession::new(reader, 32).unwrap();

        assert!(session.refresh());
        assert!(!session.refresh());

        // Previous cycle's values stay, not a blank table
        let kept = session.snapshot().unwrap();
        assert_eq!(kept.cores.len(), 1);
        assert_eq!(kept.cores[0].frequency_mhz, 4700.0);
        assert_eq!(session.consecutive_failures(), 1);
    }

    #[test]
    fn empty_core_set_counts_as_no_data() {
        let reader = FakeReader::scripted(vec![
            Ok(snapshot_with_cores(vec![reading(0, 4700.0)])),
            Ok(snapshot_with_cores(vec![])),
        ]);
        let mut session = MonitorSession::new(reader, 32).unwrap();

        assert!(session.refresh());
        assert!(!session.refresh());
        assert_eq!(session.snapshot().unwrap().cores.len(), 1);
    }

    #[test]
    fn failure_count_resets_on_success() {
        let reader = FakeReader::scripted(vec![
            Err(ReadError::ReadFailed(-1)),
            Err(ReadError::ReadFailed(-1)),
            Ok(snapshot_with_cores(vec![reading(0, 4000.0)])),
        ]);
        let mut session = MonitorSession::new(reader, 32).unwrap();

        session.refresh();
        session.refresh();
        assert_eq!(session.consecutive_failures(), 2);
        assert!(session.refresh());
        assert_eq!(session.consecutive_failures(), 0);
    }

    #[test]
    fn teardown_is_idempotent() {
        let mut reader = FakeReader::scripted(vec![]);
        reader.teardown();
        reader.teardown();
        assert_eq!(reader.cleanup_calls, 1);
    }

    #[test]
    fn poll_after_teardown_is_rejected() {
        let mut reader =
            FakeReader::scripted(vec![Ok(snapshot_with_cores(vec![reading(0, 4000.0)]))]);
        reader.teardown();
        assert!(matches!(reader.poll(32), Err(ReadError::TornDown)));
    }

    #[test]
    fn close_is_safe_to_call_twice() {
        let reader = FakeReader::scripted(vec![]);
        let mut session = MonitorSession::new(reader, 32).unwrap();
        session.close();
        session.close();
    }
}
