//! Record images: the explicit little-endian layout of every persisted record,
//! terminated by a single checksum byte.

use crate::error::Error;

/// Seed of the 8-bit additive checksum.
pub const CHECKSUM_SEED: u8 = 0x55;

/// Largest encoded record, see `records`.
pub(crate) const MAX_RECORD_SIZE: usize = 136;

#[derive(strum::Display, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordKind {
    GlobalSettings,
    ConfigProfile,
    GpsConfig,
    Waypoint,
    UsageLog,
}

/// Additive checksum over `bytes`, seeded with [`CHECKSUM_SEED`] and wrapping
/// modulo 256. The caller passes the payload only, never the checksum byte.
pub const fn checksum(bytes: &[u8]) -> u8 {
    let mut sum = CHECKSUM_SEED;
    let mut i = 0;
    while i < bytes.len() {
        sum = sum.wrapping_add(bytes[i]);
        i += 1;
    }
    sum
}

/// Returns true if the last byte of `image` is the checksum of the bytes before it.
pub fn verify(image: &[u8]) -> bool {
    match image.split_last() {
        Some((&stored, payload)) => checksum(payload) == stored,
        None => false,
    }
}

/// A fixed-size record with a versioned binary layout. `SIZE` includes the
/// trailing checksum byte; `encode` writes exactly `SIZE - 1` payload bytes.
pub trait Record: Sized {
    const KIND: RecordKind;
    const SIZE: usize;

    fn encode(&self, out: &mut Encoder<'_>);

    fn decode(input: &mut Decoder<'_>) -> Self;

    /// The checksum this record gets when it is written.
    fn checksum(&self) -> u8 {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        encode_record(self, &mut buf)[Self::SIZE - 1]
    }
}

/// Serializes `record` into the front of `buf` and appends its checksum.
///
/// Panics if `buf` is shorter than `R::SIZE`.
pub fn encode_record<'a, R: Record>(record: &R, buf: &'a mut [u8]) -> &'a [u8] {
    let image = &mut buf[..R::SIZE];
    let (payload, sum) = image.split_at_mut(R::SIZE - 1);
    let mut out = Encoder::new(payload);
    record.encode(&mut out);
    debug_assert_eq!(out.position(), R::SIZE - 1, "{} payload size", R::KIND);
    sum[0] = checksum(payload);
    image
}

/// Deserializes a record image, rejecting it if the checksum doesn't match.
pub fn decode_record<R: Record>(image: &[u8]) -> Result<R, Error> {
    if image.len() < R::SIZE || !verify(&image[..R::SIZE]) {
        return Err(Error::ChecksumMismatch(R::KIND));
    }
    let mut input = Decoder::new(&image[..R::SIZE - 1]);
    Ok(R::decode(&mut input))
}

pub struct Encoder<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Encoder<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn put<const N: usize>(&mut self, bytes: [u8; N]) {
        self.buf[self.pos..self.pos + N].copy_from_slice(&bytes);
        self.pos += N;
    }

    pub fn u8(&mut self, value: u8) {
        self.put([value]);
    }

    pub fn i8(&mut self, value: i8) {
        self.put(value.to_le_bytes());
    }

    pub fn bool(&mut self, value: bool) {
        self.put([value as u8]);
    }

    pub fn u16(&mut self, value: u16) {
        self.put(value.to_le_bytes());
    }

    pub fn i16(&mut self, value: i16) {
        self.put(value.to_le_bytes());
    }

    pub fn u32(&mut self, value: u32) {
        self.put(value.to_le_bytes());
    }

    pub fn i32(&mut self, value: i32) {
        self.put(value.to_le_bytes());
    }
}

pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        bytes
    }

    pub fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    pub fn i8(&mut self) -> i8 {
        i8::from_le_bytes(self.take())
    }

    // any non-zero byte reads as set
    pub fn bool(&mut self) -> bool {
        self.u8() != 0
    }

    pub fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    pub fn i16(&mut self) -> i16 {
        i16::from_le_bytes(self.take())
    }

    pub fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    pub fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }
}
