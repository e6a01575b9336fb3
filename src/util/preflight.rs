// Best-effort environment checks run before touching the sensing library.
// None of these are authoritative: the real failure, if any, comes from
// `ryzen_init`. They only exist to turn an opaque init error into a useful
// warning up front.

use std::fs;
use std::path::Path;

const SMU_DRIVER_SYSFS: &str = "/sys/kernel/ryzen_smu_drv";

/// Read a sysfs attribute, trimming whitespace. Returns `None` when the
/// node is missing or unreadable.
fn read_sysfs_attr(path: impl AsRef<Path>) -> Option<String> {
    fs::read_to_string(path.as_ref())
        .ok()
        .map(|s| s.trim().to_string())
}

/// Whether the process has an effective UID of root. The SMU mailbox sits
/// behind a privileged device node, so anything else will almost certainly
/// fail at init.
pub fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

/// Whether the ryzen_smu kernel driver has registered its sysfs directory.
pub fn smu_driver_present() -> bool {
    Path::new(SMU_DRIVER_SYSFS).exists()
}

/// Driver version string as reported by sysfs, if the driver is loaded.
pub fn smu_driver_version() -> Option<String> {
    read_sysfs_attr(Path::new(SMU_DRIVER_SYSFS).join("drv_version"))
}

/// Log warnings for every preflight condition that looks wrong. Returns
/// true when everything checked out.
pub fn warn_on_missing_requirements() -> bool {
    let mut ok = true;

    if !running_as_root() {
        log::warn!(
            "not running as root; reading SMU telemetry usually requires elevated privileges"
        );
        ok = false;
    }

    if smu_driver_present() {
        if let Some(version) = smu_driver_version() {
            log::debug!("ryzen_smu driver present (version {version})");
        }
    } else {
        log::warn!(
            "ryzen_smu kernel driver not found at {SMU_DRIVER_SYSFS}; \
             the sensing library will likely fail to initialize"
        );
        ok = false;
    }

    ok
}
