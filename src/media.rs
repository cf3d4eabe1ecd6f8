//! Text mirror of the usage log and the GPS position log on removable media.
//!
//! The usage log file holds one `key=value` line per field:
//!
//! ```text
//! arm=3
//! disarm=2
//! start=12
//! armed_time=0
//! lifetime=120000
//! failsafe=0
//! i2c=0
//! running=1
//! checksum=252
//! ```
//!
//! The mirror is a convenience copy for inspection and recovery; the EEPROM
//! stays the source of truth. Without a working card every operation is a
//! successful no-op.

use crate::codec::Record;
use crate::error::Error;
use crate::platform::{Alarm, Media, OpenMode, Platform, Signal};
use crate::records::UsageLog;
use crate::{ConfigStore, defaults};
use core::str::FromStr;
#[cfg(feature = "defmt")]
use defmt::{trace, warn};
use embedded_io::{Read, Write};
use strum::IntoEnumIterator;

pub const USAGE_LOG_FILE: &str = "PERM.TXT";
pub const POSITION_LOG_FILE: &str = "GPS_DATA.RAW";

/// Longer keys are truncated, they can't match a known field anyway.
pub const MAX_KEY_LENGTH: usize = 12;
pub const MAX_VALUE_LENGTH: usize = 32;

/// Keys of the usage log file, in the order they are written.
#[derive(
    strum::EnumIter, strum::EnumString, strum::IntoStaticStr, Debug, Copy, Clone, PartialEq, Eq,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[strum(serialize_all = "snake_case")]
pub enum LogField {
    Arm,
    Disarm,
    Start,
    ArmedTime,
    Lifetime,
    Failsafe,
    #[strum(serialize = "i2c")]
    I2c,
    Running,
    Checksum,
}

impl LogField {
    pub fn key(self) -> &'static str {
        self.into()
    }

    fn value(self, log: &UsageLog, checksum: u8) -> u32 {
        match self {
            LogField::Arm => log.arm as u32,
            LogField::Disarm => log.disarm as u32,
            LogField::Start => log.start as u32,
            LogField::ArmedTime => log.armed_time,
            LogField::Lifetime => log.lifetime,
            LogField::Failsafe => log.failsafe as u32,
            LogField::I2c => log.i2c as u32,
            LogField::Running => log.running as u32,
            LogField::Checksum => checksum as u32,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ScanState {
    Key,
    Value,
}

/// Character scanner for the usage log file. Pairs are applied when their
/// line ends; an unterminated last line is dropped. Spaces and carriage
/// returns are ignored. Unknown keys, unparsable values and values longer
/// than [`MAX_VALUE_LENGTH`] are skipped.
#[derive(Debug)]
pub struct UsageLogParser {
    state: ScanState,
    key: heapless::String<MAX_KEY_LENGTH>,
    value: heapless::String<MAX_VALUE_LENGTH>,
    value_overflow: bool,
    log: UsageLog,
    checksum: u8,
}

impl UsageLogParser {
    /// Fields missing from the file keep their value from `base`, and so does
    /// the checksum if the file has no `checksum` line.
    pub fn new(base: UsageLog) -> Self {
        Self {
            state: ScanState::Key,
            key: heapless::String::new(),
            value: heapless::String::new(),
            value_overflow: false,
            checksum: base.checksum(),
            log: base,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        bytes.iter().for_each(|&byte| self.feed_byte(byte));
    }

    fn feed_byte(&mut self, byte: u8) {
        match (byte, self.state) {
            (b' ' | b'\r', _) => {}
            (b'=', ScanState::Key) => self.state = ScanState::Value,
            (b'\n', _) => {
                if !self.value_overflow {
                    self.apply();
                }
                self.key.clear();
                self.value.clear();
                self.value_overflow = false;
                self.state = ScanState::Key;
            }
            (_, ScanState::Key) => {
                // overflow is dropped silently
                let _ = self.key.push(byte as char);
            }
            (_, ScanState::Value) => {
                if self.value.push(byte as char).is_err() {
                    self.value_overflow = true;
                }
            }
        }
    }

    fn apply(&mut self) {
        let Ok(field) = LogField::from_str(&self.key) else {
            return;
        };
        let value = self.value.as_str();
        match field {
            LogField::Arm => parse_into(value, &mut self.log.arm),
            LogField::Disarm => parse_into(value, &mut self.log.disarm),
            LogField::Start => parse_into(value, &mut self.log.start),
            LogField::ArmedTime => parse_into(value, &mut self.log.armed_time),
            LogField::Lifetime => parse_into(value, &mut self.log.lifetime),
            LogField::Failsafe => parse_into(value, &mut self.log.failsafe),
            LogField::I2c => parse_into(value, &mut self.log.i2c),
            LogField::Running => parse_into(value, &mut self.log.running),
            LogField::Checksum => parse_into(value, &mut self.checksum),
        }
    }

    /// The reconstructed log and the checksum stated in the file.
    pub fn finish(self) -> (UsageLog, u8) {
        (self.log, self.checksum)
    }
}

fn parse_into<V: FromStr>(value: &str, field: &mut V) {
    if let Ok(parsed) = value.parse() {
        *field = parsed;
    }
}

/// Removable medium holding the text mirrors. Files are opened and closed
/// within each call.
pub struct MediaMirror<M: Media> {
    media: M,
    available: bool,
}

impl<M: Media> MediaMirror<M> {
    /// Initializes the card. If that fails the mirror stays inert.
    pub fn new(mut media: M) -> Self {
        let available = media.init().is_ok();

        if !available {
            #[cfg(feature = "defmt")]
            warn!("removable media unavailable");
        }

        Self { media, available }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    /// Rewrites the usage log file, including the checksum the EEPROM copy has.
    pub fn write_usage_log(&mut self, log: &UsageLog) -> Result<(), Error> {
        if !self.available {
            return Ok(());
        }

        #[cfg(feature = "defmt")]
        trace!("write_usage_log: {}", USAGE_LOG_FILE);

        let checksum = log.checksum();
        let mut file = self
            .media
            .open(USAGE_LOG_FILE, OpenMode::Truncate)
            .map_err(|_| Error::MediaError)?;
        for field in LogField::iter() {
            writeln!(file, "{}={}", field.key(), field.value(log, checksum))
                .map_err(|_| Error::MediaError)?;
        }
        file.flush().map_err(|_| Error::MediaError)
    }

    /// Parses the usage log file on top of `base`. Returns `None` without a
    /// card or if the file can't be opened.
    pub fn read_usage_log(&mut self, base: &UsageLog) -> Result<Option<(UsageLog, u8)>, Error> {
        if !self.available {
            return Ok(None);
        }

        #[cfg(feature = "defmt")]
        trace!("read_usage_log: {}", USAGE_LOG_FILE);

        let Ok(mut file) = self.media.open(USAGE_LOG_FILE, OpenMode::Read) else {
            #[cfg(feature = "defmt")]
            warn!("{} not readable, keeping usage log", USAGE_LOG_FILE);

            return Ok(None);
        };

        let mut parser = UsageLogParser::new(base.clone());
        let mut buf = [0u8; 32];
        loop {
            let read = file.read(&mut buf).map_err(|_| Error::MediaError)?;
            if read == 0 {
                break;
            }
            parser.feed(&buf[..read]);
        }
        Ok(Some(parser.finish()))
    }

    /// Appends one `latitude,longitude,altitude` line to the position log.
    pub fn append_position(&mut self, lat: i32, lon: i32, altitude: i32) -> Result<(), Error> {
        if !self.available {
            return Ok(());
        }

        let mut file = self
            .media
            .open(POSITION_LOG_FILE, OpenMode::Append)
            .map_err(|_| Error::MediaError)?;
        writeln!(file, "{lat},{lon},{altitude}").map_err(|_| Error::MediaError)?;
        file.flush().map_err(|_| Error::MediaError)
    }
}

impl<T: Platform, A: Alarm> ConfigStore<T, A> {
    /// Writes the in-memory usage log to the removable medium.
    pub fn mirror_usage_log_to_media<M: Media>(
        &mut self,
        mirror: &mut MediaMirror<M>,
    ) -> Result<(), Error> {
        mirror.write_usage_log(&self.usage_log)
    }

    /// Replaces the in-memory usage log with the copy on the removable
    /// medium. Fields and checksum absent from the file keep their in-memory
    /// values; a missing card or file leaves the log untouched. If the file's
    /// checksum doesn't match the parsed values, the log is reset to defaults,
    /// the alarm is raised and the file rewritten; false is returned in that
    /// case. The EEPROM is not written.
    pub fn load_usage_log_from_media<M: Media>(
        &mut self,
        mirror: &mut MediaMirror<M>,
    ) -> Result<bool, Error> {
        let Some((log, checksum)) = mirror.read_usage_log(&self.usage_log)? else {
            return Ok(true);
        };

        if checksum == log.checksum() {
            self.usage_log = log;
            return Ok(true);
        }

        #[cfg(feature = "defmt")]
        warn!("usage log on media corrupt, resetting counters");

        self.alarm.signal(Signal::UsageLogCorrupted);
        self.usage_log = defaults::usage_log();
        mirror.write_usage_log(&self.usage_log)?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> (UsageLog, u8) {
        let mut parser = UsageLogParser::new(UsageLog::default());
        parser.feed(text.as_bytes());
        parser.finish()
    }

    #[test]
    fn keys_in_file_order() {
        let keys: heapless::Vec<&str, 9> = LogField::iter().map(LogField::key).collect();
        assert_eq!(
            keys.as_slice(),
            [
                "arm",
                "disarm",
                "start",
                "armed_time",
                "lifetime",
                "failsafe",
                "i2c",
                "running",
                "checksum"
            ]
        );
    }

    #[test]
    fn parses_all_fields() {
        let (log, checksum) = parse(
            "arm=3\ndisarm=2\nstart=7\narmed_time=61\nlifetime=120000\n\
             failsafe=1\ni2c=4\nrunning=1\nchecksum=200\n",
        );
        assert_eq!(
            log,
            UsageLog {
                arm: 3,
                disarm: 2,
                start: 7,
                failsafe: 1,
                i2c: 4,
                running: 1,
                lifetime: 120000,
                armed_time: 61,
            }
        );
        assert_eq!(checksum, 200);
    }

    #[test]
    fn ignores_spaces_and_carriage_returns() {
        let (log, _) = parse(" arm = 12 \r\nlife time=5\r\n");
        assert_eq!(log.arm, 12);
        assert_eq!(log.lifetime, 5);
    }

    #[test]
    fn skips_bad_values_and_unknown_keys() {
        let base = UsageLog {
            arm: 9,
            disarm: 8,
            ..UsageLog::default()
        };
        let mut parser = UsageLogParser::new(base.clone());
        parser.feed(b"arm=x1\ndisarm=70000\nvoltage=12\n=4\nstart=2\nchecksum=300\n");
        let (log, checksum) = parser.finish();

        assert_eq!(log.arm, 9);
        assert_eq!(log.disarm, 8);
        assert_eq!(log.start, 2);
        // no valid checksum line, the one of the base is kept
        assert_eq!(checksum, base.checksum());
    }

    #[test]
    fn unterminated_line_is_dropped() {
        let (log, _) = parse("arm=1\ndisarm=2");
        assert_eq!(log.arm, 1);
        assert_eq!(log.disarm, 0);
    }

    #[test]
    fn long_keys_are_truncated() {
        let (log, _) = parse("armarmarmarmarm=5\nrunning=1\n");
        assert_eq!(log, UsageLog { running: 1, ..UsageLog::default() });
    }

    #[test]
    fn overlong_value_is_skipped() {
        let base = UsageLog {
            lifetime: 7,
            ..UsageLog::default()
        };
        let mut parser = UsageLogParser::new(base);
        // the first 32 characters alone would parse as 12
        parser.feed(b"lifetime=00000000000000000000000000000012345678\narm=4\n");
        let (log, _) = parser.finish();

        assert_eq!(log.lifetime, 7);
        assert_eq!(log.arm, 4);
    }
}
