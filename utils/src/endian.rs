use crate::bytes::{Cast, Unaligned};

macro_rules! define_types {
	( $( $int:ident ($le:ident $be:ident) )* ) => {
		$(
			#[doc = concat!("A ", stringify!($int), " represented in bytes in little-endian byteorder.")]
			#[derive(Clone, Copy)]
			#[repr(packed)]
			#[allow(non_camel_case_types)]
			pub struct $le(pub [u8; core::mem::size_of::<$int>()]);

			impl $le {
				/// Retrieves a copy of the value in native-endian representation.
				#[inline(always)]
				pub fn get(self) -> $int {
					$int::from_le_bytes(self.0)
				}
			}

			impl From<$int> for $le {
				#[inline(always)]
				fn from(value: $int) -> Self {
					Self(value.to_le_bytes())
				}
			}

			unsafe impl Cast for $le {}
			unsafe impl Unaligned for $le {}

			#[doc = concat!("A ", stringify!($int), " represented in bytes in big-endian byteorder.")]
			#[derive(Clone, Copy)]
			#[repr(packed)]
			#[allow(non_camel_case_types)]
			pub struct $be(pub [u8; core::mem::size_of::<$int>()]);

			impl $be {
				/// Retrieves a copy of the value in native-endian representation.
				#[inline(always)]
				pub fn get(self) -> $int {
					$int::from_be_bytes(self.0)
				}
			}

			impl From<$int> for $be {
				#[inline(always)]
				fn from(value: $int) -> Self {
					Self(value.to_be_bytes())
				}
			}

			unsafe impl Cast for $be {}
			unsafe impl Unaligned for $be {}
		)*
	};
}

define_types!( u16(u16le u16be) u32(u32le u32be) u64(u64le u64be) u128(u128le u128be) );
