//! Primitive types which may be copied to and from device memory.

use std::fmt::Debug;
use std::mem;
use std::ptr;
use std::slice;
use num_traits::Zero;

/// A primitive type usable within buffers, images and kernel arguments.
///
/// ## Safety
///
/// Implementors must be plain-old-data: any bit pattern of the right size
/// must be a valid value and the type must contain no padding.
pub unsafe trait OclPrm: Debug + Clone + Copy + Default + PartialEq + Zero + Send + Sync
        + 'static {}

unsafe impl OclPrm for u8 {}
unsafe impl OclPrm for i8 {}
unsafe impl OclPrm for u16 {}
unsafe impl OclPrm for i16 {}
unsafe impl OclPrm for u32 {}
unsafe impl OclPrm for i32 {}
unsafe impl OclPrm for u64 {}
unsafe impl OclPrm for i64 {}
unsafe impl OclPrm for usize {}
unsafe impl OclPrm for isize {}
unsafe impl OclPrm for f32 {}
unsafe impl OclPrm for f64 {}

/// Views a slice of primitives as raw bytes.
pub fn as_bytes<T: OclPrm>(data: &[T]) -> &[u8] {
    unsafe { slice::from_raw_parts(data.as_ptr() as *const u8, data.len() * mem::size_of::<T>()) }
}

/// Views a mutable slice of primitives as raw bytes.
pub fn as_bytes_mut<T: OclPrm>(data: &mut [T]) -> &mut [u8] {
    unsafe {
        slice::from_raw_parts_mut(data.as_mut_ptr() as *mut u8, data.len() * mem::size_of::<T>())
    }
}

/// Copies raw bytes into a vector of primitives. Trailing bytes which do not
/// fill a whole element are ignored.
pub fn from_bytes<T: OclPrm>(bytes: &[u8]) -> Vec<T> {
    let len = bytes.len() / mem::size_of::<T>();
    let mut vec = vec![T::zero(); len];
    as_bytes_mut(&mut vec).copy_from_slice(&bytes[..len * mem::size_of::<T>()]);
    vec
}

/// Reads a single primitive from the start of `bytes`.
pub fn scalar_from_bytes<T: OclPrm>(bytes: &[u8]) -> Option<T> {
    if bytes.len() < mem::size_of::<T>() { return None; }
    Some(unsafe { ptr::read_unaligned(bytes.as_ptr() as *const T) })
}
