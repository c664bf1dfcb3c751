//! Fixed-width integer and float codecs, big and little endian.
//!
//! Unsigned codecs are the primitives; signed variants reinterpret the
//! unsigned bits, and float variants reinterpret the IEEE bit pattern of
//! the matching-width unsigned codec. When the whole value fits in one
//! unit the write is a single slice copy; otherwise the byte loop in
//! [`super`] carries the remainder into the next unit.

use crate::chain::UnitChain;
use crate::error::Result;
use crate::pool::UnitPool;

use super::{get_bytes, prepend_bytes, read_exact, set_bytes, write_bytes, ValueCodec};

macro_rules! unsigned_codec {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $to:ident, $from:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl ValueCodec for $name {
            type Value = $ty;

            fn write<P: UnitPool>(&self, chain: &mut UnitChain<P>, value: $ty) {
                write_bytes(chain, &value.$to());
            }

            fn read<P: UnitPool>(&self, chain: &mut UnitChain<P>) -> Result<$ty> {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                read_exact(chain, &mut raw)?;
                Ok(<$ty>::$from(raw))
            }

            fn get<P: UnitPool>(&self, chain: &UnitChain<P>, index: usize) -> Result<$ty> {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                get_bytes(chain, index, &mut raw)?;
                Ok(<$ty>::$from(raw))
            }

            fn set<P: UnitPool>(
                &self,
                chain: &mut UnitChain<P>,
                index: usize,
                value: $ty,
            ) -> Result<()> {
                set_bytes(chain, index, &value.$to())
            }

            fn prepend<P: UnitPool>(&self, chain: &mut UnitChain<P>, value: $ty) {
                prepend_bytes(chain, &value.$to());
            }
        }
    };
}

macro_rules! reinterpret_codec {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $inner:ident, $into:expr, $from:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl ValueCodec for $name {
            type Value = $ty;

            fn write<P: UnitPool>(&self, chain: &mut UnitChain<P>, value: $ty) {
                $inner.write(chain, $into(value));
            }

            fn read<P: UnitPool>(&self, chain: &mut UnitChain<P>) -> Result<$ty> {
                $inner.read(chain).map($from)
            }

            fn get<P: UnitPool>(&self, chain: &UnitChain<P>, index: usize) -> Result<$ty> {
                $inner.get(chain, index).map($from)
            }

            fn set<P: UnitPool>(
                &self,
                chain: &mut UnitChain<P>,
                index: usize,
                value: $ty,
            ) -> Result<()> {
                $inner.set(chain, index, $into(value))
            }

            fn prepend<P: UnitPool>(&self, chain: &mut UnitChain<P>, value: $ty) {
                $inner.prepend(chain, $into(value));
            }
        }
    };
}

unsigned_codec!(
    /// Big-endian `u16`.
    U16Be, u16, to_be_bytes, from_be_bytes
);
unsigned_codec!(
    /// Little-endian `u16`.
    U16Le, u16, to_le_bytes, from_le_bytes
);
unsigned_codec!(
    /// Big-endian `u32`.
    U32Be, u32, to_be_bytes, from_be_bytes
);
unsigned_codec!(
    /// Little-endian `u32`.
    U32Le, u32, to_le_bytes, from_le_bytes
);
unsigned_codec!(
    /// Big-endian `u64`.
    U64Be, u64, to_be_bytes, from_be_bytes
);
unsigned_codec!(
    /// Little-endian `u64`.
    U64Le, u64, to_le_bytes, from_le_bytes
);

reinterpret_codec!(
    /// Big-endian `i16`, reinterpreting [`U16Be`].
    I16Be, i16, U16Be, |v: i16| v as u16, |v: u16| v as i16
);
reinterpret_codec!(
    /// Little-endian `i16`, reinterpreting [`U16Le`].
    I16Le, i16, U16Le, |v: i16| v as u16, |v: u16| v as i16
);
reinterpret_codec!(
    /// Big-endian `i32`, reinterpreting [`U32Be`].
    I32Be, i32, U32Be, |v: i32| v as u32, |v: u32| v as i32
);
reinterpret_codec!(
    /// Little-endian `i32`, reinterpreting [`U32Le`].
    I32Le, i32, U32Le, |v: i32| v as u32, |v: u32| v as i32
);
reinterpret_codec!(
    /// Big-endian `i64`, reinterpreting [`U64Be`].
    I64Be, i64, U64Be, |v: i64| v as u64, |v: u64| v as i64
);
reinterpret_codec!(
    /// Little-endian `i64`, reinterpreting [`U64Le`].
    I64Le, i64, U64Le, |v: i64| v as u64, |v: u64| v as i64
);
reinterpret_codec!(
    /// Big-endian IEEE `f32`, bit-reinterpreting [`U32Be`].
    F32Be, f32, U32Be, f32::to_bits, f32::from_bits
);
reinterpret_codec!(
    /// Little-endian IEEE `f32`, bit-reinterpreting [`U32Le`].
    F32Le, f32, U32Le, f32::to_bits, f32::from_bits
);
reinterpret_codec!(
    /// Big-endian IEEE `f64`, bit-reinterpreting [`U64Be`].
    F64Be, f64, U64Be, f64::to_bits, f64::from_bits
);
reinterpret_codec!(
    /// Little-endian IEEE `f64`, bit-reinterpreting [`U64Le`].
    F64Le, f64, U64Le, f64::to_bits, f64::from_bits
);
