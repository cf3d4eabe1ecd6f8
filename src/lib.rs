#![doc = include_str!("../README.md")]
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

pub mod codec;
pub mod curves;
pub mod defaults;
pub mod error;
pub mod layout;
pub mod media;
pub mod platform;
pub mod records;
mod store;
mod waypoint;

pub use codec::{Record, RecordKind};
pub use curves::DerivedConstants;
pub use layout::{FeatureSet, Layout, PidController, ProfileCount};
pub use media::MediaMirror;
pub use records::{ConfigProfile, GlobalSettings, GpsConfig, UsageLog, Waypoint};

use crate::error::Error;
use crate::platform::{Alarm, Platform};
pub(crate) use crate::store::Eeprom;

/// In-memory copies of all EEPROM records together with the storage they live
/// in. Records are read on `load_*`, changed through the `set_*` methods and
/// only written by an explicit `save_*`, except for the self-healing paths of
/// the GPS config and the usage log.
///
/// All operations are synchronous and meant to run between control loop
/// iterations, never from an interrupt.
pub struct ConfigStore<T: Platform, A: Alarm = ()> {
    pub(crate) eeprom: Eeprom<T>,
    pub(crate) alarm: A,
    pub(crate) features: FeatureSet,
    pub(crate) layout: Layout,

    pub(crate) global: GlobalSettings,
    pub(crate) profile: ConfigProfile,
    pub(crate) gps: GpsConfig,
    pub(crate) usage_log: UsageLog,
    pub(crate) derived: DerivedConstants,
    // last mission step returned by `recall_waypoint`
    pub(crate) waypoint: Option<Waypoint>,
}

impl<T: Platform, A: Alarm> ConfigStore<T, A> {
    /// Plans the layout for the capacity reported by `hal`. Nothing is read
    /// yet; call [`ConfigStore::boot`] or the individual `load_*` methods.
    pub fn new(hal: T, alarm: A, features: FeatureSet) -> Result<Self, Error> {
        let layout = Layout::new(hal.capacity(), &features)?;

        Ok(Self {
            eeprom: Eeprom::new(hal),
            alarm,
            features,
            layout,
            global: GlobalSettings::default(),
            profile: ConfigProfile::default(),
            gps: GpsConfig::default(),
            usage_log: UsageLog::default(),
            derived: DerivedConstants::default(),
            waypoint: None,
        })
    }

    /// Startup sequence: global settings first, they select the profile slot,
    /// then the profile (and with it the GPS config) and the usage log.
    ///
    /// Returns false if the profile was corrupt and defaults were written.
    pub fn boot(&mut self) -> Result<bool, Error> {
        self.load_global()?;
        let profile_ok = self.load_profile()?;
        self.load_usage_log()?;
        Ok(profile_ok)
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn global(&self) -> &GlobalSettings {
        &self.global
    }

    pub fn profile(&self) -> &ConfigProfile {
        &self.profile
    }

    pub fn gps_config(&self) -> &GpsConfig {
        &self.gps
    }

    pub fn usage_log(&self) -> &UsageLog {
        &self.usage_log
    }

    /// Lookup tables and constants of the last successfully loaded profile.
    pub fn derived(&self) -> &DerivedConstants {
        &self.derived
    }

    /// The mission step of the last successful [`ConfigStore::recall_waypoint`].
    pub fn last_waypoint(&self) -> Option<&Waypoint> {
        self.waypoint.as_ref()
    }

    /// Replaces the in-memory global settings. Persist with `save_global`.
    pub fn set_global(&mut self, global: GlobalSettings) {
        self.global = global;
    }

    /// Replaces the in-memory profile. Persist with `save_profile`.
    pub fn set_profile(&mut self, profile: ConfigProfile) {
        self.profile = profile;
    }

    pub fn set_gps_config(&mut self, gps: GpsConfig) {
        self.gps = gps;
    }

    pub fn set_usage_log(&mut self, usage_log: UsageLog) {
        self.usage_log = usage_log;
    }

    pub fn storage(&self) -> &T {
        self.eeprom.hal()
    }

    /// Direct access to the storage, bypassing checksums and the fault flag.
    pub fn storage_mut(&mut self) -> &mut T {
        self.eeprom.hal_mut()
    }

    pub fn alarm(&self) -> &A {
        &self.alarm
    }

    /// Gives back the storage and alarm.
    pub fn release(self) -> (T, A) {
        (self.eeprom.release(), self.alarm)
    }
}
