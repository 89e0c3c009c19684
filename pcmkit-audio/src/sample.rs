//! Numeric sample types and the byte orders they are stored in.
//!
//! Every concrete conversion in this crate is a generic function over a
//! [`Sample`] type and a [`ByteOrder`] marker. The runtime [`SampleFormat`]
//! of a buffer is mapped onto those type parameters by
//! [`with_sample_type!`](crate::sample::with_sample_type).
//!
//! [`SampleFormat`]: crate::format::SampleFormat

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub const NATIVE: Self = if cfg!(target_endian = "little") {
        Self::Little
    } else {
        Self::Big
    };
}

/// Byte order a sample is decoded from and encoded to.
pub trait ByteOrder: Copy + Send + Sync + 'static {
    const ENDIANNESS: Endianness;
}

#[derive(Debug, Clone, Copy)]
pub struct NativeEndian;

#[derive(Debug, Clone, Copy)]
pub struct LittleEndian;

#[derive(Debug, Clone, Copy)]
pub struct BigEndian;

impl ByteOrder for NativeEndian {
    const ENDIANNESS: Endianness = Endianness::NATIVE;
}

impl ByteOrder for LittleEndian {
    const ENDIANNESS: Endianness = Endianness::Little;
}

impl ByteOrder for BigEndian {
    const ENDIANNESS: Endianness = Endianness::Big;
}

/// Value range a sample type covers. Integers span their full width,
/// floating point samples span `[-1, 1]`.
pub trait NumericDomain: Copy {
    const MIN: Self;
    const MAX: Self;
}

pub trait Sample: NumericDomain + PartialOrd + Default + Debug + Send + Sync + 'static {
    const BYTES: usize;
    const FLOAT: bool;

    /// Accumulator type used when several channels are summed together.
    type Wide: Sample;

    /// Decodes a sample from the first `Self::BYTES` bytes of `bytes`.
    fn read<E: ByteOrder>(bytes: &[u8]) -> Self;

    /// Encodes the sample into the first `Self::BYTES` bytes of `bytes`.
    fn write<E: ByteOrder>(self, bytes: &mut [u8]);

    fn to_f64(self) -> f64;

    /// Saturating conversion, rounding to the nearest integer for integers.
    fn from_f64(value: f64) -> Self;

    fn to_i128(self) -> i128;

    fn from_i128(value: i128) -> Self;

    fn accumulate(self, other: Self) -> Self;

    /// Clamps floating point samples into `[-1, 1]`, integers are returned unchanged.
    fn clamp_to_domain(self) -> Self;
}

macro_rules! impl_integer_sample {
    ($($t:ty => $wide:ty),+ $(,)?) => {
        $(
            impl NumericDomain for $t {
                const MIN: Self = <$t>::MIN;
                const MAX: Self = <$t>::MAX;
            }

            impl Sample for $t {
                const BYTES: usize = size_of::<$t>();
                const FLOAT: bool = false;
                type Wide = $wide;

                #[inline]
                fn read<E: ByteOrder>(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; size_of::<$t>()];
                    raw.copy_from_slice(&bytes[..size_of::<$t>()]);
                    match E::ENDIANNESS {
                        Endianness::Little => <$t>::from_le_bytes(raw),
                        Endianness::Big => <$t>::from_be_bytes(raw),
                    }
                }

                #[inline]
                fn write<E: ByteOrder>(self, bytes: &mut [u8]) {
                    let raw = match E::ENDIANNESS {
                        Endianness::Little => self.to_le_bytes(),
                        Endianness::Big => self.to_be_bytes(),
                    };
                    bytes[..raw.len()].copy_from_slice(&raw);
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value.round() as $t
                }

                #[inline]
                fn to_i128(self) -> i128 {
                    self as i128
                }

                #[inline]
                fn from_i128(value: i128) -> Self {
                    value.clamp(<$t>::MIN as i128, <$t>::MAX as i128) as $t
                }

                #[inline]
                fn accumulate(self, other: Self) -> Self {
                    self.saturating_add(other)
                }

                #[inline]
                fn clamp_to_domain(self) -> Self {
                    self
                }
            }
        )+
    };
}

macro_rules! impl_float_sample {
    ($($t:ty),+ $(,)?) => {
        $(
            impl NumericDomain for $t {
                const MIN: Self = -1.0;
                const MAX: Self = 1.0;
            }

            impl Sample for $t {
                const BYTES: usize = size_of::<$t>();
                const FLOAT: bool = true;
                type Wide = f64;

                #[inline]
                fn read<E: ByteOrder>(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; size_of::<$t>()];
                    raw.copy_from_slice(&bytes[..size_of::<$t>()]);
                    match E::ENDIANNESS {
                        Endianness::Little => <$t>::from_le_bytes(raw),
                        Endianness::Big => <$t>::from_be_bytes(raw),
                    }
                }

                #[inline]
                fn write<E: ByteOrder>(self, bytes: &mut [u8]) {
                    let raw = match E::ENDIANNESS {
                        Endianness::Little => self.to_le_bytes(),
                        Endianness::Big => self.to_be_bytes(),
                    };
                    bytes[..raw.len()].copy_from_slice(&raw);
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $t
                }

                #[inline]
                fn to_i128(self) -> i128 {
                    self as i128
                }

                #[inline]
                fn from_i128(value: i128) -> Self {
                    value as $t
                }

                #[inline]
                fn accumulate(self, other: Self) -> Self {
                    self + other
                }

                #[inline]
                fn clamp_to_domain(self) -> Self {
                    self.clamp(-1.0, 1.0)
                }
            }
        )+
    };
}

impl_integer_sample!(
    i8 => i16,
    u8 => u16,
    i16 => i32,
    u16 => u32,
    i32 => i64,
    u32 => u64,
    i64 => f64,
    u64 => f64,
);

impl_float_sample!(f32, f64);

/// Binds the sample type and byte order of a runtime
/// [`SampleFormat`](crate::format::SampleFormat) to the given type aliases
/// and evaluates `$body` with them in scope.
macro_rules! with_sample_type {
    ($format:expr, |$t:ident, $e:ident| $body:expr) => {
        match $format {
            $crate::format::SampleFormat::S8 => {
                type $t = i8;
                type $e = $crate::sample::NativeEndian;
                $body
            }
            $crate::format::SampleFormat::U8 => {
                type $t = u8;
                type $e = $crate::sample::NativeEndian;
                $body
            }
            $crate::format::SampleFormat::S16Le => {
                type $t = i16;
                type $e = $crate::sample::LittleEndian;
                $body
            }
            $crate::format::SampleFormat::S16Be => {
                type $t = i16;
                type $e = $crate::sample::BigEndian;
                $body
            }
            $crate::format::SampleFormat::U16Le => {
                type $t = u16;
                type $e = $crate::sample::LittleEndian;
                $body
            }
            $crate::format::SampleFormat::U16Be => {
                type $t = u16;
                type $e = $crate::sample::BigEndian;
                $body
            }
            $crate::format::SampleFormat::S32Le => {
                type $t = i32;
                type $e = $crate::sample::LittleEndian;
                $body
            }
            $crate::format::SampleFormat::S32Be => {
                type $t = i32;
                type $e = $crate::sample::BigEndian;
                $body
            }
            $crate::format::SampleFormat::U32Le => {
                type $t = u32;
                type $e = $crate::sample::LittleEndian;
                $body
            }
            $crate::format::SampleFormat::U32Be => {
                type $t = u32;
                type $e = $crate::sample::BigEndian;
                $body
            }
            $crate::format::SampleFormat::S64Le => {
                type $t = i64;
                type $e = $crate::sample::LittleEndian;
                $body
            }
            $crate::format::SampleFormat::S64Be => {
                type $t = i64;
                type $e = $crate::sample::BigEndian;
                $body
            }
            $crate::format::SampleFormat::U64Le => {
                type $t = u64;
                type $e = $crate::sample::LittleEndian;
                $body
            }
            $crate::format::SampleFormat::U64Be => {
                type $t = u64;
                type $e = $crate::sample::BigEndian;
                $body
            }
            $crate::format::SampleFormat::FltLe => {
                type $t = f32;
                type $e = $crate::sample::LittleEndian;
                $body
            }
            $crate::format::SampleFormat::FltBe => {
                type $t = f32;
                type $e = $crate::sample::BigEndian;
                $body
            }
            $crate::format::SampleFormat::DblLe => {
                type $t = f64;
                type $e = $crate::sample::LittleEndian;
                $body
            }
            $crate::format::SampleFormat::DblBe => {
                type $t = f64;
                type $e = $crate::sample::BigEndian;
                $body
            }
        }
    };
}

pub(crate) use with_sample_type;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    #[test]
    fn read_write_respects_byte_order() {
        let mut bytes = [0u8; 2];
        0x1234i16.write::<BigEndian>(&mut bytes);
        assert_eq!(bytes, [0x12, 0x34]);
        assert_eq!(i16::read::<LittleEndian>(&bytes), 0x3412);
        assert_eq!(i16::read::<BigEndian>(&bytes), 0x1234);

        0x1234i16.write::<NativeEndian>(&mut bytes);
        assert_eq!(bytes, 0x1234i16.to_ne_bytes());
    }

    #[test]
    fn float_domain_is_unit_range() {
        assert_eq!(<f32 as NumericDomain>::MIN, -1.0);
        assert_eq!(<f64 as NumericDomain>::MAX, 1.0);
        assert_eq!(2.5f32.clamp_to_domain(), 1.0);
        assert_eq!((-7.0f64).clamp_to_domain(), -1.0);
    }

    #[test]
    fn integer_conversions_saturate() {
        assert_eq!(i16::from_f64(40_000.0), i16::MAX);
        assert_eq!(u8::from_f64(-3.0), 0);
        assert_eq!(i8::from_i128(1_000), i8::MAX);
        assert_eq!(i16::from_f64(1.5), 2);
        assert_eq!(i16::from_f64(-1.4), -1);
        assert_eq!(i16::MAX.accumulate(1), i16::MAX);
    }

    #[test]
    fn float_round_trip_bytes() {
        let mut bytes = [0u8; 4];
        0.25f32.write::<BigEndian>(&mut bytes);
        assert_eq!(bytes, 0.25f32.to_be_bytes());
        assert_eq!(f32::read::<BigEndian>(&bytes), 0.25);
    }
}
