#![allow(dead_code)]

// filename according to https://doc.rust-lang.org/book/ch11-03-test-organization.html
use embedded_storage::{ReadStorage, Storage};
use fc_eeprom::platform::{Alarm, Media, OpenMode, Signal};
use std::collections::HashMap;

// erased EEPROM cells read as 0xFF
pub const ERASED: u8 = 0xff;

#[derive(Default)]
pub struct Eeprom {
    pub buf: Vec<u8>,
    pub fail_after_operation: usize,
    pub operations: Vec<Operation>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Read { offset: u32, len: usize },
    Write { offset: u32, len: usize },
}

impl Eeprom {
    pub fn new(size: usize) -> Self {
        Self {
            buf: vec![ERASED; size],
            fail_after_operation: usize::MAX,
            ..Default::default()
        }
    }

    pub fn new_with_fault(size: usize, fail_after_operation: usize) -> Self {
        Self {
            buf: vec![ERASED; size],
            fail_after_operation,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn disable_faults(&mut self) {
        self.fail_after_operation = usize::MAX;
    }

    /// Flips all bits of one byte without going through the operation log.
    pub fn corrupt(&mut self, offset: u32) {
        self.buf[offset as usize] ^= 0xff;
    }

    pub fn writes(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Write { .. }))
            .count()
    }

    pub fn written_offsets(&self) -> Vec<u32> {
        self.operations
            .iter()
            .filter_map(|op| match op {
                Operation::Write { offset, .. } => Some(*offset),
                _ => None,
            })
            .collect()
    }

    pub fn dump_operations(&self) {
        println!("Operations:");
        for op in &self.operations {
            println!("  {:?}", op);
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct EepromError;

impl ReadStorage for Eeprom {
    type Error = EepromError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        println!(
            "    eeprom: read:  0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        if self.operations.len() >= self.fail_after_operation {
            println!("    eeprom: FAULT");
            return Err(EepromError);
        }
        self.operations.push(Operation::Read {
            offset,
            len: bytes.len(),
        });

        let offset = offset as usize;
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl Storage for Eeprom {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        println!(
            "    eeprom: write: 0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        if self.operations.len() >= self.fail_after_operation {
            println!("    eeprom: FAULT");
            return Err(EepromError);
        }
        assert!(offset as usize + bytes.len() <= self.buf.len());

        self.operations.push(Operation::Write {
            offset,
            len: bytes.len(),
        });

        let offset = offset as usize;
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// Collects every signal raised by the store.
#[derive(Debug, Default)]
pub struct Signals(pub Vec<Signal>);

impl Alarm for Signals {
    fn signal(&mut self, signal: Signal) {
        println!("    alarm: {signal:?}");
        self.0.push(signal);
    }
}

/// SD card kept in memory. `open_files` counts handles not yet dropped.
#[derive(Debug, Default)]
pub struct Card {
    pub files: HashMap<String, Vec<u8>>,
    pub fail_init: bool,
    pub open_files: usize,
}

#[derive(Debug, PartialEq)]
pub enum CardError {
    NoCard,
    NotFound,
}

impl Card {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing() -> Self {
        Self {
            fail_init: true,
            ..Default::default()
        }
    }

    pub fn with_file(mut self, name: &str, content: &str) -> Self {
        self.files.insert(name.to_string(), content.as_bytes().to_vec());
        self
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.files
            .get(name)
            .map(|content| String::from_utf8_lossy(content).into_owned())
    }
}

pub struct CardFile<'a> {
    content: &'a mut Vec<u8>,
    position: usize,
    open_files: &'a mut usize,
}

impl Drop for CardFile<'_> {
    fn drop(&mut self) {
        *self.open_files -= 1;
    }
}

impl embedded_io::ErrorType for CardFile<'_> {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::Read for CardFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let rest = &self.content[self.position..];
        let len = rest.len().min(buf.len());
        buf[..len].copy_from_slice(&rest[..len]);
        self.position += len;
        Ok(len)
    }
}

impl embedded_io::Write for CardFile<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.content.truncate(self.position);
        self.content.extend_from_slice(buf);
        self.position += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Media for Card {
    type Error = CardError;
    type File<'a> = CardFile<'a>;

    fn init(&mut self) -> Result<(), Self::Error> {
        if self.fail_init {
            return Err(CardError::NoCard);
        }
        Ok(())
    }

    fn open(&mut self, name: &str, mode: OpenMode) -> Result<Self::File<'_>, Self::Error> {
        println!("    card: open {name} {mode:?}");
        if self.fail_init {
            return Err(CardError::NoCard);
        }

        let content = match mode {
            OpenMode::Read => self.files.get_mut(name).ok_or(CardError::NotFound)?,
            OpenMode::Truncate | OpenMode::Append => self.files.entry(name.to_string()).or_default(),
        };
        if mode == OpenMode::Truncate {
            content.clear();
        }
        let position = match mode {
            OpenMode::Append => content.len(),
            _ => 0,
        };

        self.open_files += 1;
        Ok(CardFile {
            content,
            position,
            open_files: &mut self.open_files,
        })
    }
}
