//! Lookup tables and constants derived from the active profile. They are
//! rebuilt after every successful profile load.

use crate::defaults::MAX_THROTTLE;
use crate::records::ConfigProfile;

pub const RC_LOOKUP_LEN: usize = 5;
pub const THROTTLE_LOOKUP_LEN: usize = 11;

pub const POWER_LEVEL_SCALE: u32 = 50;
pub const POWER_LEVEL_DIV: u32 = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DerivedConstants {
    /// Roll/pitch stick curve, sampled at 0, 100, ..., 400 stick units.
    pub rc_lookup: [i16; RC_LOOKUP_LEN],
    /// Throttle curve per decile of stick travel, in PWM microseconds.
    pub throttle_lookup: [i16; THROTTLE_LOOKUP_LEN],
    /// Power meter alarm threshold in raw meter units, 0 disables it.
    pub power_alarm: u32,
    pub armed_time_warning_us: u64,
}

impl DerivedConstants {
    pub fn from_profile(profile: &ConfigProfile) -> Self {
        Self {
            rc_lookup: rc_curve(profile.rc_rate, profile.rc_expo),
            throttle_lookup: throttle_curve(
                profile.thr_mid,
                profile.thr_expo,
                profile.min_throttle,
                MAX_THROTTLE,
            ),
            power_alarm: (profile.power_trigger as u32)
                .saturating_mul(POWER_LEVEL_SCALE * POWER_LEVEL_DIV),
            armed_time_warning_us: profile.armed_time_warning as u64 * 1_000_000,
        }
    }
}

/// 1526 = 500/128 squared times 100; 1192 = 1526 * 100 / 128.
pub fn rc_curve(rate: u8, expo: u8) -> [i16; RC_LOOKUP_LEN] {
    core::array::from_fn(|i| {
        let i = i as i32;
        ((1526 + expo as i32 * (i * i - 15)) * i * rate as i32 / 1192) as i16
    })
}

/// Quadratic expo around `mid` (both in percent) rescaled from [0, 1000] into
/// [min_throttle, max_throttle].
pub fn throttle_curve(
    mid: u8,
    expo: u8,
    min_throttle: u16,
    max_throttle: u16,
) -> [i16; THROTTLE_LOOKUP_LEN] {
    let mid = mid as i32;
    let expo = expo as i32;
    core::array::from_fn(|i| {
        let tmp = 10 * i as i32 - mid;
        let y = match tmp {
            t if t > 0 => 100 - mid,
            t if t < 0 => mid,
            _ => 1,
        };
        let raw = 10 * mid + tmp * (100 - expo + expo * (tmp * tmp) / (y * y)) / 10;
        (min_throttle as i32 + (max_throttle as i32 - min_throttle as i32) * raw / 1000) as i16
    })
}
