use alloc::boxed::Box;
use core::ptr::NonNull;

// -----------------------------------------------------------------------------
// Deleter

/// A deletion policy, the capability to release a `T`.
///
/// [`UniquePtr`](crate::UniquePtr) calls [`delete`](Deleter::delete) exactly once
/// for every non-empty pointer it owns, and never for an empty one.
///
/// Any `FnMut(NonNull<T>)` is a deleter, so simple policies can be closures.
///
/// # Examples
///
/// Returning slots to a pool instead of freeing them:
///
/// ```
/// use core::ptr::NonNull;
/// use uniq_ptr::{Deleter, UniquePtr};
///
/// struct Pool {
///     free: Vec<NonNull<u64>>,
/// }
///
/// struct ReturnTo<'a>(&'a mut Pool);
///
/// impl Deleter<u64> for ReturnTo<'_> {
///     unsafe fn delete(&mut self, ptr: NonNull<u64>) {
///         self.0.free.push(ptr);
///     }
/// }
///
/// let mut slot = 0u64;
/// let mut pool = Pool { free: Vec::new() };
///
/// {
///     let ptr = unsafe { UniquePtr::from_raw_with(&raw mut slot, ReturnTo(&mut pool)) };
///     assert_eq!(*ptr, 0);
/// }
///
/// assert_eq!(pool.free, [NonNull::from(&mut slot)]);
/// ```
pub trait Deleter<T: ?Sized> {
    /// Releases the resource behind `ptr`.
    ///
    /// # Safety
    /// - `ptr` must be exclusively owned by the caller.
    /// - `ptr` must have been produced in the way this policy expects
    ///   (e.g. by `Box` for [`DefaultDelete`]).
    /// - `ptr` must not be used again after this call.
    unsafe fn delete(&mut self, ptr: NonNull<T>);
}

impl<T: ?Sized, F: FnMut(NonNull<T>)> Deleter<T> for F {
    #[inline]
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        self(ptr);
    }
}

// -----------------------------------------------------------------------------
// DefaultDelete

/// The default deletion policy: drops the value and frees its `Box` allocation.
///
/// Works for every `T: ?Sized`, so slices and trait objects are released with
/// the right length and drop glue.
///
/// # Examples
///
/// ```
/// use uniq_ptr::{DefaultDelete, UniquePtr};
///
/// let raw = Box::into_raw(Box::new([1, 2, 3]));
/// let ptr: UniquePtr<[i32; 3], DefaultDelete> = unsafe { UniquePtr::from_raw(raw) };
///
/// assert_eq!(ptr[1], 2);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefaultDelete;

impl<T: ?Sized> Deleter<T> for DefaultDelete {
    #[inline]
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        // SAFETY: the caller guarantees `ptr` came from `Box` and is owned.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}
