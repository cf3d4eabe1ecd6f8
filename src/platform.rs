use embedded_storage::{ReadStorage, Storage};

/// Byte addressable non-volatile memory, typically an EEPROM. Any
/// `embedded_storage::Storage` implementation qualifies.
pub trait Platform: ReadStorage + Storage {}

impl<T: ReadStorage + Storage> Platform for T {}

/// Visible and audible feedback raised by the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signal {
    /// The active profile failed its checksum and defaults were written.
    ProfileCorrupted,
    /// The usage log failed its checksum and was reset.
    UsageLogCorrupted,
    /// Settings were written on request.
    SettingsSaved,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkPattern {
    pub flashes: u8,
    pub duration_ms: u8,
    pub repeat: u8,
}

impl Signal {
    pub const fn blink_pattern(&self) -> BlinkPattern {
        let (flashes, duration_ms, repeat) = match self {
            Signal::ProfileCorrupted => (6, 100, 3),
            Signal::UsageLogCorrupted => (9, 100, 3),
            Signal::SettingsSaved => (15, 20, 1),
        };
        BlinkPattern {
            flashes,
            duration_ms,
            repeat,
        }
    }

    pub const fn beeps(&self) -> u8 {
        match self {
            Signal::ProfileCorrupted | Signal::UsageLogCorrupted => 3,
            Signal::SettingsSaved => 1,
        }
    }
}

/// LED/buzzer sequencer of the surrounding firmware. `()` discards all signals.
pub trait Alarm {
    fn signal(&mut self, signal: Signal);
}

impl Alarm for () {
    fn signal(&mut self, _signal: Signal) {}
}

impl<T: Alarm> Alarm for &mut T {
    fn signal(&mut self, signal: Signal) {
        (*self).signal(signal)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenMode {
    Read,
    /// Create or truncate.
    Truncate,
    /// Create or append.
    Append,
}

/// Removable storage such as an SD card. A file handle lives only for the
/// duration of one operation and is closed when dropped.
pub trait Media {
    type Error;
    type File<'a>: embedded_io::Read + embedded_io::Write
    where
        Self: 'a;

    /// Brings up the card. Called once; a failure disables all media operations.
    fn init(&mut self) -> Result<(), Self::Error>;

    fn open(&mut self, name: &str, mode: OpenMode) -> Result<Self::File<'_>, Self::Error>;
}
