// Presentation contract between snapshots and the widgets that show them.
// Everything here is a pure function over snapshot values so the display
// rules can be tested without a terminal or hardware.
//
// Two rules apply everywhere: NaN means "unavailable" and renders as `--`,
// and a gauge with a non-positive limit shows 0% instead of dividing.

use crate::core::{CoreReading, DerivedStats};

pub const PLACEHOLDER: &str = "--";

/// Format a float to the given precision; NaN becomes the placeholder.
pub fn fmt_value(value: f32, precision: usize) -> String {
    if value.is_nan() {
        PLACEHOLDER.to_string()
    } else {
        format!("{value:.precision$}")
    }
}

/// Format a float with a unit suffix, e.g. "4650 MHz".
pub fn fmt_unit(value: f32, precision: usize, unit: &str) -> String {
    if value.is_nan() {
        PLACEHOLDER.to_string()
    } else {
        format!("{value:.precision$} {unit}")
    }
}

/// Frequency column for one core: status text overrides the number.
pub fn freq_cell(core: &CoreReading) -> String {
    if core.disabled {
        "Disabled".to_string()
    } else if core.sleeping {
        "Sleeping".to_string()
    } else {
        fmt_value(core.frequency_mhz, 0)
    }
}

/// One rendered core-table row: Core / Freq / Power / Voltage / Temp /
/// C0 / C1 / C6.
pub fn core_row(core: &CoreReading) -> [String; 8] {
    [
        format!("Core {}", core.index),
        freq_cell(core),
        fmt_value(core.power_watts, 3),
        fmt_value(core.voltage, 3),
        fmt_value(core.temp_celsius, 1),
        fmt_value(core.c0_percent, 1),
        fmt_value(core.cc1_percent, 1),
        fmt_value(core.cc6_percent, 1),
    ]
}

/// Fill ratio for a value/limit gauge, as whole percent clamped to
/// 0..=100. A missing or non-positive limit yields 0 rather than a
/// division blowup.
pub fn gauge_percent(value: f32, limit: f32) -> u16 {
    if !(limit > 0.0) || value.is_nan() {
        return 0;
    }
    let pct = value / limit * 100.0;
    if pct <= 0.0 {
        0
    } else {
        pct.min(100.0) as u16
    }
}

/// Numeric label next to a gauge, e.g. "45.2 / 142 W".
pub fn limit_label(value: f32, limit: f32, unit: &str) -> String {
    format!("{} / {} {unit}", fmt_value(value, 1), fmt_value(limit, 0))
}

pub fn coupled_cell(coupled: bool) -> &'static str {
    if coupled { "ON" } else { "OFF" }
}

/// Package CC6 residency; unavailable on silicon without the counter.
pub fn package_cc6_cell(stats: &DerivedStats) -> String {
    if stats.package_cc6.is_nan() {
        PLACEHOLDER.to_string()
    } else {
        format!("{:.1} %", stats.package_cc6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{reading, snapshot_with_cores};

    #[test]
    fn frequency_cell_prefers_status_flags() {
        let mut core = reading(2, 4655.4);
        assert_eq!(freq_cell(&core), "4655");

        core.sleeping = true;
        assert_eq!(freq_cell(&core), "Sleeping");

        // Disabled wins even when the numeric frequency is garbage
        core.disabled = true;
        core.frequency_mhz = f32::NAN;
        assert_eq!(freq_cell(&core), "Disabled");
    }

    #[test]
    fn row_count_matches_reported_core_count() {
        let mut cores: Vec<_> = (0..8).map(|i| reading(i, 4500.0)).collect();
        cores[6].disabled = true;
        cores[7].disabled = true;

        let snapshot = snapshot_with_cores(cores);
        let rows: Vec<_> = snapshot.cores.iter().map(core_row).collect();

        assert_eq!(rows.len(), 8);
        assert_eq!(rows[6][1], "Disabled");
        assert_eq!(rows[7][1], "Disabled");
        assert_eq!(rows[0][1], "4500");
    }

    #[test]
    fn gauge_is_zero_when_limit_missing() {
        assert_eq!(gauge_percent(45.2, 0.0), 0);
        assert_eq!(gauge_percent(45.2, -1.0), 0);
        assert_eq!(gauge_percent(45.2, f32::NAN), 0);
        assert_eq!(gauge_percent(f32::NAN, 142.0), 0);
    }

    #[test]
    fn gauge_clamps_to_valid_range() {
        assert_eq!(gauge_percent(71.0, 142.0), 50);
        assert_eq!(gauge_percent(200.0, 142.0), 100);
        assert_eq!(gauge_percent(-5.0, 142.0), 0);
    }

    #[test]
    fn limit_label_with_zero_limit_still_renders() {
        assert_eq!(limit_label(45.2, 0.0, "W"), "45.2 / 0 W");
        assert_eq!(gauge_percent(45.2, 0.0), 0);
    }

    #[test]
    fn nan_renders_as_placeholder_not_nan_token() {
        assert_eq!(fmt_value(f32::NAN, 1), "--");
        assert_eq!(fmt_unit(f32::NAN, 0, "MHz"), "--");
        assert_eq!(limit_label(f32::NAN, f32::NAN, "A"), "-- / -- A");

        let row = core_row(&CoreReading {
            index: 0,
            frequency_mhz: f32::NAN,
            power_watts: f32::NAN,
            voltage: f32::NAN,
            temp_celsius: f32::NAN,
            c0_percent: f32::NAN,
            cc1_percent: f32::NAN,
            cc6_percent: f32::NAN,
            disabled: false,
            sleeping: false,
        });
        for cell in &row[1..] {
            assert_eq!(cell, "--");
        }
    }

    #[test]
    fn package_cc6_placeholder_when_unsupported() {
        let mut stats = crate::core::DerivedStats::default();
        stats.package_cc6 = f32::NAN;
        assert_eq!(package_cc6_cell(&stats), "--");

        stats.package_cc6 = 42.5;
        assert_eq!(package_cc6_cell(&stats), "42.5 %");
    }

    #[test]
    fn rounded_frequency_is_whole_mhz() {
        assert_eq!(freq_cell(&reading(0, 4649.7)), "4650");
    }
}
