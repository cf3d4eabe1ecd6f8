//! Static placement of all records inside the EEPROM address space.
//!
//! ```text
//! 0                                   GlobalSettings
//! global                              ConfigProfile[0..N)
//! global + N * profile                GpsConfig
//! gps + gps_size                      Waypoint[0..capacity)
//! total - 4 - usage_log               UsageLog
//! total - 4                           reserved, never written
//! ```
//!
//! Offsets are derived from the record sizes on every boot and are not stored
//! in the EEPROM. Changing a record size or the profile count between builds
//! makes the next boot read old bytes as different records; whether they pass
//! their checksum is then a matter of chance.

use crate::codec::Record;
use crate::error::Error;
use crate::records::{ConfigProfile, GlobalSettings, GpsConfig, UsageLog, Waypoint};
use core::ops::Range;

/// Highest waypoint sequence number that can ever be addressed.
pub const MAX_WAYPOINT_NUMBER: u8 = 254;

/// Bytes at the very end of the EEPROM that are kept untouched.
pub const RESERVED_TAIL: usize = 4;

#[derive(strum::FromRepr, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ProfileCount {
    Single = 1,
    Triple = 3,
}

/// Which PID controller the default gains are tuned for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PidController {
    Classic,
    Rewrite,
}

/// Build variant of the firmware. Selects the profile count and which optional
/// records exist, and tunes a few defaults.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FeatureSet {
    pub profile_count: ProfileCount,
    pub has_gps: bool,
    pub has_servos: bool,
    pub has_usage_log: bool,
    pub pid_controller: PidController,
    pub fixed_wing: bool,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self {
            profile_count: ProfileCount::Triple,
            has_gps: true,
            has_servos: true,
            has_usage_log: true,
            pid_controller: PidController::Classic,
            fixed_wing: false,
        }
    }
}

impl FeatureSet {
    pub const fn profiles(&self) -> u8 {
        self.profile_count as u8
    }
}

/// Encoded size of every record type, checksum byte included.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RecordSizes {
    pub global: usize,
    pub profile: usize,
    pub gps: usize,
    pub waypoint: usize,
    pub usage_log: usize,
}

impl RecordSizes {
    pub const CURRENT: RecordSizes = RecordSizes {
        global: GlobalSettings::SIZE,
        profile: ConfigProfile::SIZE,
        gps: GpsConfig::SIZE,
        waypoint: Waypoint::SIZE,
        usage_log: UsageLog::SIZE,
    };
}

#[derive(strum::Display, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegionKind {
    GlobalSettings,
    Profiles,
    GpsConfig,
    Waypoints,
    UsageLog,
    Reserved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub range: Range<u32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Layout {
    capacity: usize,
    profile_count: u8,
    sizes: RecordSizes,
    gps_base: usize,
    waypoint_base: usize,
    usage_log_base: usize,
    waypoint_capacity: u8,
}

impl Layout {
    /// Plans the layout for the records of this crate.
    pub fn new(capacity: usize, features: &FeatureSet) -> Result<Self, Error> {
        Self::with_sizes(capacity, features, RecordSizes::CURRENT)
    }

    /// Plans the layout for arbitrary record sizes. Disabled records take no space.
    pub fn with_sizes(
        capacity: usize,
        features: &FeatureSet,
        sizes: RecordSizes,
    ) -> Result<Self, Error> {
        let sizes = RecordSizes {
            gps: if features.has_gps { sizes.gps } else { 0 },
            usage_log: if features.has_usage_log {
                sizes.usage_log
            } else {
                0
            },
            ..sizes
        };

        let profile_count = features.profiles();
        let gps_base = sizes.global + profile_count as usize * sizes.profile;
        let waypoint_base = gps_base + sizes.gps;

        let required = waypoint_base + sizes.usage_log + RESERVED_TAIL;
        if required > capacity || capacity > u32::MAX as usize {
            return Err(Error::LayoutOverflow { required, capacity });
        }
        let usage_log_base = capacity - RESERVED_TAIL - sizes.usage_log;

        let waypoint_capacity = if features.has_gps && sizes.waypoint > 0 {
            ((usage_log_base - waypoint_base) / sizes.waypoint)
                .min(MAX_WAYPOINT_NUMBER as usize) as u8
        } else {
            0
        };

        Ok(Self {
            capacity,
            profile_count,
            sizes,
            gps_base,
            waypoint_base,
            usage_log_base,
            waypoint_capacity,
        })
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub const fn profile_count(&self) -> u8 {
        self.profile_count
    }

    pub const fn sizes(&self) -> &RecordSizes {
        &self.sizes
    }

    pub const fn global_offset(&self) -> u32 {
        0
    }

    /// Offset of profile slot `index`. The index must already be clamped.
    pub fn profile_offset(&self, index: u8) -> u32 {
        debug_assert!(index < self.profile_count);
        (self.sizes.global + index as usize * self.sizes.profile) as u32
    }

    pub fn gps_offset(&self) -> u32 {
        self.gps_base as u32
    }

    pub fn waypoint_base(&self) -> u32 {
        self.waypoint_base as u32
    }

    /// Offset of waypoint `number`, without checking it against the capacity.
    pub fn waypoint_offset(&self, number: u8) -> u32 {
        (self.waypoint_base + number as usize * self.sizes.waypoint) as u32
    }

    pub fn usage_log_offset(&self) -> u32 {
        self.usage_log_base as u32
    }

    /// Number of waypoints that fit between the GPS config and the usage log,
    /// capped at 254. Zero without GPS.
    pub const fn max_waypoint_capacity(&self) -> u8 {
        self.waypoint_capacity
    }

    /// All regions in address order. Disabled records show up as empty ranges.
    pub fn regions(&self) -> [Region; 6] {
        let region = |kind, start: usize, len: usize| Region {
            kind,
            range: start as u32..(start + len) as u32,
        };
        [
            region(RegionKind::GlobalSettings, 0, self.sizes.global),
            region(
                RegionKind::Profiles,
                self.sizes.global,
                self.profile_count as usize * self.sizes.profile,
            ),
            region(RegionKind::GpsConfig, self.gps_base, self.sizes.gps),
            region(
                RegionKind::Waypoints,
                self.waypoint_base,
                self.waypoint_capacity as usize * self.sizes.waypoint,
            ),
            region(
                RegionKind::UsageLog,
                self.usage_log_base,
                self.sizes.usage_log,
            ),
            region(
                RegionKind::Reserved,
                self.capacity - RESERVED_TAIL,
                RESERVED_TAIL,
            ),
        ]
    }
}
