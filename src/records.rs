//! The persisted record types. Each one is a plain value; its on-EEPROM shape
//! is defined by the `Record` impl, not by its in-memory representation.

use crate::codec::{Decoder, Encoder, MAX_RECORD_SIZE, Record, RecordKind};
use strum::EnumCount;

pub const PID_ITEMS: usize = PidAxis::COUNT;
/// Number of flight mode boxes that can be bound to aux switch positions.
pub const ACTIVATE_ITEMS: usize = 12;
pub const SERVO_COUNT: usize = 8;

/// Calibration marker written into `acc_zero[ROLL]` when the global settings
/// failed their checksum.
pub const CONFIG_ERROR_MARKER: i16 = 5000;
pub const ROLL: usize = 0;
pub const PITCH: usize = 1;
pub const YAW: usize = 2;

/// Set in `Waypoint::flag` on the last step of a mission.
pub const MISSION_FLAG_END: u8 = 0xA5;

const _: () = assert!(
    GlobalSettings::SIZE <= MAX_RECORD_SIZE
        && ConfigProfile::SIZE <= MAX_RECORD_SIZE
        && GpsConfig::SIZE <= MAX_RECORD_SIZE
        && Waypoint::SIZE <= MAX_RECORD_SIZE
        && UsageLog::SIZE <= MAX_RECORD_SIZE,
    "record larger than the encode buffer"
);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GlobalSettings {
    /// Index of the active profile slot.
    pub current_set: u8,
    pub acc_zero: [i16; 3],
    pub mag_zero: [i16; 3],
    pub flash_sum: u16,
}

impl GlobalSettings {
    /// True if these settings were reset because the stored copy was corrupt.
    pub fn config_error(&self) -> bool {
        self.acc_zero[ROLL] == CONFIG_ERROR_MARKER
    }
}

impl Record for GlobalSettings {
    const KIND: RecordKind = RecordKind::GlobalSettings;
    const SIZE: usize = 16;

    fn encode(&self, out: &mut Encoder<'_>) {
        out.u8(self.current_set);
        self.acc_zero.iter().for_each(|&v| out.i16(v));
        self.mag_zero.iter().for_each(|&v| out.i16(v));
        out.u16(self.flash_sum);
    }

    fn decode(input: &mut Decoder<'_>) -> Self {
        Self {
            current_set: input.u8(),
            acc_zero: core::array::from_fn(|_| input.i16()),
            mag_zero: core::array::from_fn(|_| input.i16()),
            flash_sum: input.u16(),
        }
    }
}

#[derive(strum::EnumCount, strum::EnumIter, strum::FromRepr, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PidAxis {
    Roll,
    Pitch,
    Yaw,
    Alt,
    Pos,
    PosRate,
    NavRate,
    Level,
    Mag,
    Vel,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pid {
    pub p: u8,
    pub i: u8,
    pub d: u8,
}

impl Pid {
    pub const fn new(p: u8, i: u8, d: u8) -> Self {
        Self { p, i, d }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Servo {
    pub min: i16,
    pub max: i16,
    pub middle: i16,
    pub rate: i8,
}

/// One complete set of tuning parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigProfile {
    pub pid: [Pid; PID_ITEMS],
    pub rc_rate: u8,
    pub rc_expo: u8,
    pub roll_pitch_rate: u8,
    pub yaw_rate: u8,
    pub dyn_thr_pid: u8,
    pub thr_mid: u8,
    pub thr_expo: u8,
    pub angle_trim: [i16; 2],
    /// Aux channel bit masks per flight mode box.
    pub activate: [u16; ACTIVATE_ITEMS],
    pub power_trigger: u16,
    pub failsafe_throttle: u16,
    pub min_throttle: u16,
    /// Magnetic declination in tenths of a degree.
    pub mag_declination: i16,
    /// Seconds of armed time before the warning fires, 0 disables it.
    pub armed_time_warning: u16,
    pub vbat_scale: u8,
    pub vbat_warn1: u8,
    pub vbat_warn2: u8,
    pub vbat_crit: u8,
    pub servos: [Servo; SERVO_COUNT],
}

impl ConfigProfile {
    pub fn pid(&self, axis: PidAxis) -> Pid {
        self.pid[axis as usize]
    }

    pub fn set_pid(&mut self, axis: PidAxis, pid: Pid) {
        self.pid[axis as usize] = pid;
    }
}

impl Record for ConfigProfile {
    const KIND: RecordKind = RecordKind::ConfigProfile;
    const SIZE: usize = 136;

    fn encode(&self, out: &mut Encoder<'_>) {
        for pid in &self.pid {
            out.u8(pid.p);
            out.u8(pid.i);
            out.u8(pid.d);
        }
        out.u8(self.rc_rate);
        out.u8(self.rc_expo);
        out.u8(self.roll_pitch_rate);
        out.u8(self.yaw_rate);
        out.u8(self.dyn_thr_pid);
        out.u8(self.thr_mid);
        out.u8(self.thr_expo);
        self.angle_trim.iter().for_each(|&v| out.i16(v));
        self.activate.iter().for_each(|&v| out.u16(v));
        out.u16(self.power_trigger);
        out.u16(self.failsafe_throttle);
        out.u16(self.min_throttle);
        out.i16(self.mag_declination);
        out.u16(self.armed_time_warning);
        out.u8(self.vbat_scale);
        out.u8(self.vbat_warn1);
        out.u8(self.vbat_warn2);
        out.u8(self.vbat_crit);
        for servo in &self.servos {
            out.i16(servo.min);
            out.i16(servo.max);
            out.i16(servo.middle);
            out.i8(servo.rate);
        }
    }

    fn decode(input: &mut Decoder<'_>) -> Self {
        Self {
            pid: core::array::from_fn(|_| Pid {
                p: input.u8(),
                i: input.u8(),
                d: input.u8(),
            }),
            rc_rate: input.u8(),
            rc_expo: input.u8(),
            roll_pitch_rate: input.u8(),
            yaw_rate: input.u8(),
            dyn_thr_pid: input.u8(),
            thr_mid: input.u8(),
            thr_expo: input.u8(),
            angle_trim: core::array::from_fn(|_| input.i16()),
            activate: core::array::from_fn(|_| input.u16()),
            power_trigger: input.u16(),
            failsafe_throttle: input.u16(),
            min_throttle: input.u16(),
            mag_declination: input.i16(),
            armed_time_warning: input.u16(),
            vbat_scale: input.u8(),
            vbat_warn1: input.u8(),
            vbat_warn2: input.u8(),
            vbat_crit: input.u8(),
            servos: core::array::from_fn(|_| Servo {
                min: input.i16(),
                max: input.i16(),
                middle: input.i16(),
                rate: input.i8(),
            }),
        }
    }
}

/// Navigation behaviour and limits. Distances in cm, speeds in cm/s, bank in
/// centidegrees, altitudes in m.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsConfig {
    pub filtering: bool,
    pub lead_filter: bool,
    pub dont_reset_home_at_arm: bool,
    pub nav_controls_heading: bool,
    pub nav_tail_first: bool,
    pub nav_rth_takeoff_heading: bool,
    pub slow_nav: bool,
    pub wait_for_rth_alt: bool,
    pub ignore_throttle: bool,
    pub takeover_baro: bool,
    pub wp_radius: u16,
    pub safe_wp_distance: u16,
    pub nav_max_altitude: u16,
    pub nav_speed_max: u16,
    pub nav_speed_min: u16,
    pub crosstrack_gain: u8,
    pub nav_bank_max: u16,
    pub rth_altitude: u16,
    pub land_speed: u8,
    pub fence: u16,
    pub max_wp_number: u8,
}

impl Record for GpsConfig {
    const KIND: RecordKind = RecordKind::GpsConfig;
    const SIZE: usize = 30;

    fn encode(&self, out: &mut Encoder<'_>) {
        out.bool(self.filtering);
        out.bool(self.lead_filter);
        out.bool(self.dont_reset_home_at_arm);
        out.bool(self.nav_controls_heading);
        out.bool(self.nav_tail_first);
        out.bool(self.nav_rth_takeoff_heading);
        out.bool(self.slow_nav);
        out.bool(self.wait_for_rth_alt);
        out.bool(self.ignore_throttle);
        out.bool(self.takeover_baro);
        out.u16(self.wp_radius);
        out.u16(self.safe_wp_distance);
        out.u16(self.nav_max_altitude);
        out.u16(self.nav_speed_max);
        out.u16(self.nav_speed_min);
        out.u8(self.crosstrack_gain);
        out.u16(self.nav_bank_max);
        out.u16(self.rth_altitude);
        out.u8(self.land_speed);
        out.u16(self.fence);
        out.u8(self.max_wp_number);
    }

    fn decode(input: &mut Decoder<'_>) -> Self {
        Self {
            filtering: input.bool(),
            lead_filter: input.bool(),
            dont_reset_home_at_arm: input.bool(),
            nav_controls_heading: input.bool(),
            nav_tail_first: input.bool(),
            nav_rth_takeoff_heading: input.bool(),
            slow_nav: input.bool(),
            wait_for_rth_alt: input.bool(),
            ignore_throttle: input.bool(),
            takeover_baro: input.bool(),
            wp_radius: input.u16(),
            safe_wp_distance: input.u16(),
            nav_max_altitude: input.u16(),
            nav_speed_max: input.u16(),
            nav_speed_min: input.u16(),
            crosstrack_gain: input.u8(),
            nav_bank_max: input.u16(),
            rth_altitude: input.u16(),
            land_speed: input.u8(),
            fence: input.u16(),
            max_wp_number: input.u8(),
        }
    }
}

#[derive(strum::FromRepr, strum::Display, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MissionAction {
    Waypoint = 1,
    PosholdUnlimited = 2,
    PosholdTime = 3,
    ReturnToHome = 4,
    SetPoi = 5,
    Jump = 6,
    SetHeading = 7,
    Land = 8,
}

/// One mission step. Coordinates are degrees * 10^7, altitude in cm.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Waypoint {
    pub number: u8,
    pub action: u8,
    pub lat: i32,
    pub lon: i32,
    pub altitude: i32,
    pub parameter1: i16,
    pub parameter2: i16,
    pub parameter3: i16,
    pub flag: u8,
}

impl Waypoint {
    pub fn mission_action(&self) -> Option<MissionAction> {
        MissionAction::from_repr(self.action)
    }

    pub fn is_last(&self) -> bool {
        self.flag == MISSION_FLAG_END
    }
}

impl Record for Waypoint {
    const KIND: RecordKind = RecordKind::Waypoint;
    const SIZE: usize = 22;

    fn encode(&self, out: &mut Encoder<'_>) {
        out.u8(self.number);
        out.u8(self.action);
        out.i32(self.lat);
        out.i32(self.lon);
        out.i32(self.altitude);
        out.i16(self.parameter1);
        out.i16(self.parameter2);
        out.i16(self.parameter3);
        out.u8(self.flag);
    }

    fn decode(input: &mut Decoder<'_>) -> Self {
        Self {
            number: input.u8(),
            action: input.u8(),
            lat: input.i32(),
            lon: input.i32(),
            altitude: input.i32(),
            parameter1: input.i16(),
            parameter2: input.i16(),
            parameter3: input.i16(),
            flag: input.u8(),
        }
    }
}

/// Lifetime usage counters. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsageLog {
    pub arm: u16,
    pub disarm: u16,
    pub start: u16,
    pub failsafe: u16,
    pub i2c: u16,
    /// Set while the board runs, cleared on a clean shutdown.
    pub running: u8,
    pub lifetime: u32,
    pub armed_time: u32,
}

impl Record for UsageLog {
    const KIND: RecordKind = RecordKind::UsageLog;
    const SIZE: usize = 20;

    fn encode(&self, out: &mut Encoder<'_>) {
        out.u16(self.arm);
        out.u16(self.disarm);
        out.u16(self.start);
        out.u16(self.failsafe);
        out.u16(self.i2c);
        out.u8(self.running);
        out.u32(self.lifetime);
        out.u32(self.armed_time);
    }

    fn decode(input: &mut Decoder<'_>) -> Self {
        Self {
            arm: input.u16(),
            disarm: input.u16(),
            start: input.u16(),
            failsafe: input.u16(),
            i2c: input.u16(),
            running: input.u8(),
            lifetime: input.u32(),
            armed_time: input.u32(),
        }
    }
}
