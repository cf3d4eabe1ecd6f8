use crate::codec::{MAX_RECORD_SIZE, Record, decode_record, encode_record};
use crate::curves::DerivedConstants;
use crate::defaults::{self, DefaultsStep};
use crate::error::Error;
use crate::platform::{Alarm, Platform, Signal};
use crate::records::{CONFIG_ERROR_MARKER, ConfigProfile, GlobalSettings, GpsConfig, ROLL, UsageLog};
use crate::{ConfigStore, RecordKind};
#[cfg(feature = "defmt")]
use defmt::{trace, warn};

/// Record level access to the raw storage. Once the storage reported an error
/// all further writes are refused.
pub(crate) struct Eeprom<T: Platform> {
    hal: T,
    faulted: bool,
}

impl<T: Platform> Eeprom<T> {
    pub(crate) fn new(hal: T) -> Self {
        Self {
            hal,
            faulted: false,
        }
    }

    pub(crate) fn hal(&self) -> &T {
        &self.hal
    }

    pub(crate) fn hal_mut(&mut self) -> &mut T {
        &mut self.hal
    }

    pub(crate) fn release(self) -> T {
        self.hal
    }

    /// Reads and decodes a record. `Ok(None)` means the checksum didn't match.
    pub(crate) fn read_record<R: Record>(&mut self, offset: u32) -> Result<Option<R>, Error> {
        #[cfg(feature = "defmt")]
        trace!("read_record: {} @{:#06x}[{}]", R::KIND, offset, R::SIZE);

        let mut buf = [0u8; MAX_RECORD_SIZE];
        let image = &mut buf[..R::SIZE];
        if self.hal.read(offset, image).is_err() {
            self.faulted = true;
            return Err(Error::StorageError);
        }

        match decode_record(image) {
            Ok(record) => Ok(Some(record)),
            Err(_) => {
                #[cfg(feature = "defmt")]
                warn!("checksum mismatch: {} @{:#06x}", R::KIND, offset);

                #[cfg(feature = "debug-logs")]
                println!("  Eeprom: checksum mismatch {} @{:#06x}: {:02x?}", R::KIND, offset, image);

                Ok(None)
            }
        }
    }

    pub(crate) fn write_record<R: Record>(&mut self, offset: u32, record: &R) -> Result<(), Error> {
        if self.faulted {
            return Err(Error::StorageError);
        }

        #[cfg(feature = "defmt")]
        trace!("write_record: {} @{:#06x}[{}]", R::KIND, offset, R::SIZE);

        let mut buf = [0u8; MAX_RECORD_SIZE];
        let image = encode_record(record, &mut buf);
        if self.hal.write(offset, image).is_err() {
            self.faulted = true;
            return Err(Error::StorageError);
        }
        Ok(())
    }
}

impl<T: Platform, A: Alarm> ConfigStore<T, A> {
    /// Reads the global settings. A corrupt record, or one selecting a profile
    /// that doesn't exist, is replaced in memory by settings with profile 0
    /// and the calibration error marker. Nothing is written back.
    ///
    /// Returns false if the stored settings were rejected.
    pub fn load_global(&mut self) -> Result<bool, Error> {
        let offset = self.layout.global_offset();
        match self.eeprom.read_record::<GlobalSettings>(offset)? {
            Some(global) if global.current_set < self.layout.profile_count() => {
                #[cfg(feature = "debug-logs")]
                println!("  ConfigStore: loaded {global:?}");

                self.global = global;
                Ok(true)
            }
            stored => {
                #[cfg(feature = "defmt")]
                warn!("global settings rejected, selecting profile 0");

                let mut global = stored.unwrap_or_default();
                global.current_set = 0;
                global.acc_zero[ROLL] = CONFIG_ERROR_MARKER;
                self.global = global;
                Ok(false)
            }
        }
    }

    pub fn save_global(&mut self) -> Result<(), Error> {
        self.write_global()?;
        self.alarm.signal(Signal::SettingsSaved);
        Ok(())
    }

    /// Makes `index` the active profile, persists the global settings and
    /// loads the selected profile.
    pub fn select_profile(&mut self, index: u8) -> Result<bool, Error> {
        if index >= self.layout.profile_count() {
            return Err(Error::ProfileOutOfRange(index));
        }
        self.global.current_set = index;
        self.write_global()?;
        self.load_profile()
    }

    /// Reads the active profile. On success the derived constants are rebuilt
    /// and, with GPS, the GPS config is loaded as well.
    ///
    /// On a checksum mismatch the alarm is raised and a full defaults pass is
    /// written. Returns false in that case; the caller should not try again
    /// in the same boot cycle.
    pub fn load_profile(&mut self) -> Result<bool, Error> {
        let index = self.active_index();
        let offset = self.layout.profile_offset(index);
        match self.eeprom.read_record::<ConfigProfile>(offset)? {
            Some(profile) => {
                #[cfg(feature = "debug-logs")]
                println!("  ConfigStore: loaded profile {index}: {profile:?}");

                self.profile = profile;
                self.derived = DerivedConstants::from_profile(&self.profile);
                if self.features.has_gps {
                    self.load_gps_config()?;
                }
                Ok(true)
            }
            None => {
                #[cfg(feature = "defmt")]
                warn!("profile {} corrupt, loading defaults", index);

                self.alarm.signal(Signal::ProfileCorrupted);
                self.load_defaults()?;
                Ok(false)
            }
        }
    }

    /// Writes the in-memory profile into the active slot (and the GPS config
    /// with it), then reloads it to verify the write and refresh the derived
    /// constants. Returns the result of that reload.
    pub fn save_profile(&mut self) -> Result<bool, Error> {
        self.write_profile()?;
        if self.features.has_gps {
            self.eeprom
                .write_record(self.layout.gps_offset(), &self.gps)?;
        }
        let verified = self.load_profile()?;
        self.alarm.signal(Signal::SettingsSaved);
        Ok(verified)
    }

    /// Rebuilds the derived constants from the in-memory profile without
    /// touching the storage, e.g. after `set_profile`.
    pub fn recompute_profile_constants(&mut self) -> &DerivedConstants {
        self.derived = DerivedConstants::from_profile(&self.profile);
        &self.derived
    }

    /// Reads the GPS config. A corrupt record is replaced by defaults and
    /// rewritten immediately. Returns false in that case.
    pub fn load_gps_config(&mut self) -> Result<bool, Error> {
        if !self.features.has_gps {
            return Ok(true);
        }

        match self
            .eeprom
            .read_record::<GpsConfig>(self.layout.gps_offset())?
        {
            Some(gps) => {
                self.gps = gps;
                Ok(true)
            }
            None => {
                #[cfg(feature = "defmt")]
                warn!("gps config corrupt, loading defaults");

                self.apply_defaults(DefaultsStep::Gps)?;
                Ok(false)
            }
        }
    }

    pub fn save_gps_config(&mut self) -> Result<(), Error> {
        if !self.features.has_gps {
            return Ok(());
        }
        self.eeprom.write_record(self.layout.gps_offset(), &self.gps)
    }

    /// Reads the usage log. A corrupt record raises the alarm, is reset to
    /// zero counters with the running flag set and rewritten immediately.
    /// Returns false in that case.
    pub fn load_usage_log(&mut self) -> Result<bool, Error> {
        if !self.features.has_usage_log {
            return Ok(true);
        }

        match self
            .eeprom
            .read_record::<UsageLog>(self.layout.usage_log_offset())?
        {
            Some(usage_log) => {
                self.usage_log = usage_log;
                Ok(true)
            }
            None => {
                #[cfg(feature = "defmt")]
                warn!("usage log corrupt, resetting counters");

                self.alarm.signal(Signal::UsageLogCorrupted);
                self.apply_defaults(DefaultsStep::UsageLog)?;
                Ok(false)
            }
        }
    }

    pub fn save_usage_log(&mut self) -> Result<(), Error> {
        if !self.features.has_usage_log {
            return Ok(());
        }
        self.eeprom
            .write_record(self.layout.usage_log_offset(), &self.usage_log)
    }

    /// Resets every record of the build to its factory defaults and writes
    /// it: profile, global settings (active index normalized, calibration
    /// kept), GPS config and usage log. Waypoints are left alone. The profile
    /// is read back afterwards to refresh the derived constants.
    ///
    /// Running this repeatedly always produces the same EEPROM contents.
    pub fn load_defaults(&mut self) -> Result<(), Error> {
        let mut step = DefaultsStep::Profile;
        while step != DefaultsStep::Done {
            self.apply_defaults(step)?;
            step = step.next(&self.features);
        }

        let index = self.active_index();
        let offset = self.layout.profile_offset(index);
        match self.eeprom.read_record::<ConfigProfile>(offset)? {
            Some(profile) => {
                self.profile = profile;
                self.derived = DerivedConstants::from_profile(&self.profile);
                Ok(())
            }
            None => Err(Error::ChecksumMismatch(RecordKind::ConfigProfile)),
        }
    }

    pub(crate) fn apply_defaults(&mut self, step: DefaultsStep) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        trace!("apply_defaults: {}", step);

        match step {
            DefaultsStep::Profile => {
                self.profile = defaults::profile(&self.features);
                self.write_profile()
            }
            DefaultsStep::Global => self.write_global(),
            DefaultsStep::Gps => {
                self.gps = defaults::gps_config(self.layout.max_waypoint_capacity());
                self.eeprom.write_record(self.layout.gps_offset(), &self.gps)
            }
            DefaultsStep::UsageLog => {
                self.usage_log = defaults::usage_log();
                self.eeprom
                    .write_record(self.layout.usage_log_offset(), &self.usage_log)
            }
            DefaultsStep::Done => Ok(()),
        }
    }

    fn write_global(&mut self) -> Result<(), Error> {
        self.active_index();
        self.eeprom
            .write_record(self.layout.global_offset(), &self.global)
    }

    fn write_profile(&mut self) -> Result<(), Error> {
        let index = self.active_index();
        let offset = self.layout.profile_offset(index);
        self.eeprom.write_record(offset, &self.profile)
    }

    /// Clamps the active profile index into range and returns it.
    fn active_index(&mut self) -> u8 {
        if self.global.current_set >= self.layout.profile_count() {
            self.global.current_set = 0;
        }
        self.global.current_set
    }
}
