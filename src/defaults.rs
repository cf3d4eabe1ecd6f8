//! Factory defaults for every record type.

use crate::layout::{FeatureSet, PidController};
use crate::records::{ConfigProfile, GpsConfig, PID_ITEMS, Pid, SERVO_COUNT, Servo, UsageLog};

pub const MIN_THROTTLE: u16 = 1150;
pub const MAX_THROTTLE: u16 = 1850;
pub const FAILSAFE_THROTTLE: u16 = MIN_THROTTLE + 200;
/// 4.02 degrees east, in tenths.
pub const MAG_DECLINATION: i16 = 40;
pub const ARMED_TIME_WARNING: u16 = 0;

pub const VBAT_SCALE: u8 = 131;
pub const VBAT_WARN1: u8 = 107;
pub const VBAT_WARN2: u8 = 99;
pub const VBAT_CRIT: u8 = 93;

pub const RC_RATE: u8 = 90;
pub const RC_EXPO: u8 = 65;
pub const THR_MID: u8 = 50;
pub const THR_EXPO: u8 = 0;
pub const FIXED_WING_DYN_THR_PID: u8 = 50;

pub const SERVO_MIN: i16 = 1020;
pub const SERVO_MAX: i16 = 2000;
pub const SERVO_MIDDLE: i16 = 1500;
pub const SERVO_RATES: [i8; SERVO_COUNT] = [30, 30, 100, 100, 100, 100, 100, 100];

/// Indexed by `PidAxis`.
pub const CLASSIC_PIDS: [Pid; PID_ITEMS] = [
    Pid::new(33, 30, 23),
    Pid::new(33, 30, 23),
    Pid::new(68, 45, 0),
    Pid::new(64, 25, 24),
    Pid::new(11, 0, 0),
    Pid::new(20, 8, 45),
    Pid::new(14, 20, 80),
    Pid::new(90, 10, 100),
    Pid::new(40, 0, 0),
    Pid::new(0, 0, 0),
];

pub const REWRITE_PIDS: [Pid; PID_ITEMS] = [
    Pid::new(28, 10, 7),
    Pid::new(28, 10, 7),
    Pid::new(68, 45, 0),
    Pid::new(64, 25, 24),
    Pid::new(11, 0, 0),
    Pid::new(20, 8, 45),
    Pid::new(14, 20, 80),
    Pid::new(30, 32, 0),
    Pid::new(40, 0, 0),
    Pid::new(0, 0, 0),
];

pub const GPS_WP_RADIUS: u16 = 100;
pub const SAFE_WP_DISTANCE: u16 = 500;
pub const MAX_NAV_ALTITUDE: u16 = 100;
pub const NAV_SPEED_MAX: u16 = 400;
pub const NAV_SPEED_MIN: u16 = 100;
/// 0.4, scaled by 100.
pub const CROSSTRACK_GAIN: u8 = 40;
pub const NAV_BANK_MAX: u16 = 3000;
pub const RTH_ALTITUDE: u16 = 15;
pub const FENCE_DISTANCE: u16 = 600;
pub const LAND_SPEED: u8 = 100;

/// Default tuning profile for the given build.
pub fn profile(features: &FeatureSet) -> ConfigProfile {
    let mut profile = ConfigProfile {
        pid: match features.pid_controller {
            PidController::Classic => CLASSIC_PIDS,
            PidController::Rewrite => REWRITE_PIDS,
        },
        rc_rate: RC_RATE,
        rc_expo: RC_EXPO,
        thr_mid: THR_MID,
        thr_expo: THR_EXPO,
        ..ConfigProfile::default()
    };

    if features.has_servos {
        profile.servos = core::array::from_fn(|i| Servo {
            min: SERVO_MIN,
            max: SERVO_MAX,
            middle: SERVO_MIDDLE,
            rate: SERVO_RATES[i],
        });
    }

    if features.fixed_wing {
        profile.dyn_thr_pid = FIXED_WING_DYN_THR_PID;
        profile.rc_expo = 0;
    }

    apply_build_constants(&mut profile);
    profile
}

/// Overwrites the profile fields that follow the board build rather than the
/// pilot's tuning.
pub fn apply_build_constants(profile: &mut ConfigProfile) {
    profile.failsafe_throttle = FAILSAFE_THROTTLE;
    profile.vbat_scale = VBAT_SCALE;
    profile.vbat_warn1 = VBAT_WARN1;
    profile.vbat_warn2 = VBAT_WARN2;
    profile.vbat_crit = VBAT_CRIT;
    profile.armed_time_warning = ARMED_TIME_WARNING;
    profile.min_throttle = MIN_THROTTLE;
    profile.mag_declination = MAG_DECLINATION;
}

/// Default navigation settings. `max_wp_number` comes from the layout.
pub fn gps_config(max_wp_number: u8) -> GpsConfig {
    GpsConfig {
        filtering: true,
        lead_filter: true,
        dont_reset_home_at_arm: false,
        nav_controls_heading: true,
        nav_tail_first: false,
        nav_rth_takeoff_heading: true,
        slow_nav: true,
        wait_for_rth_alt: true,
        ignore_throttle: true,
        takeover_baro: true,
        wp_radius: GPS_WP_RADIUS,
        safe_wp_distance: SAFE_WP_DISTANCE,
        nav_max_altitude: MAX_NAV_ALTITUDE,
        nav_speed_max: NAV_SPEED_MAX,
        nav_speed_min: NAV_SPEED_MIN,
        crosstrack_gain: CROSSTRACK_GAIN,
        nav_bank_max: NAV_BANK_MAX,
        rth_altitude: RTH_ALTITUDE,
        land_speed: LAND_SPEED,
        fence: FENCE_DISTANCE,
        max_wp_number,
    }
}

pub fn usage_log() -> UsageLog {
    UsageLog {
        running: 1,
        ..UsageLog::default()
    }
}

/// Steps of a full defaults pass, one per record type. Records the build
/// doesn't have are skipped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum DefaultsStep {
    Profile,
    Global,
    Gps,
    UsageLog,
    Done,
}

impl DefaultsStep {
    pub(crate) fn next(self, features: &FeatureSet) -> Self {
        match self {
            DefaultsStep::Profile => DefaultsStep::Global,
            DefaultsStep::Global if features.has_gps => DefaultsStep::Gps,
            DefaultsStep::Global | DefaultsStep::Gps if features.has_usage_log => {
                DefaultsStep::UsageLog
            }
            _ => DefaultsStep::Done,
        }
    }
}
