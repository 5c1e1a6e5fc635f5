use alloc::boxed::Box;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop};
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};

use crate::cfg;
use crate::deleter::{DefaultDelete, Deleter};
use crate::error::PtrError;
use crate::track;

// -----------------------------------------------------------------------------
// UniquePtr

/// A move-only pointer that exclusively owns at most one `T`.
///
/// The resource is released through the deletion policy `D` exactly once:
/// when the pointer is dropped, [`reset`](Self::reset) or
/// [`assign`](Self::assign)ed over. An empty pointer releases nothing.
///
/// # Ownership
///
/// - `UniquePtr` is not `Clone`, so a resource can never get a second owner
///   through it.
/// - Moving a `UniquePtr` moves the pointer **and** its deleter.
/// - [`take`](Self::take) and [`release`](Self::release) move the contents out
///   of a pointer that stays usable, leaving it empty.
///
/// Methods are inherent, so a pointee method with the same name
/// (e.g. `get`) must be called through `(*ptr).get()`.
///
/// # Examples
///
/// ```
/// use uniq_ptr::UniquePtr;
///
/// let mut a = UniquePtr::new(String::from("hello"));
/// a.push_str(" world");
///
/// let b = a.take();
/// assert!(a.is_null());
/// assert_eq!(*b, "hello world");
/// ```
pub struct UniquePtr<T: ?Sized, D: Deleter<T> = DefaultDelete> {
    ptr: Option<NonNull<T>>,
    deleter: D,
    // Logically owns a `T`, for drop check.
    _marker: PhantomData<T>,
}

// SAFETY: the pointee is not aliased, so `UniquePtr` can be sent or shared
// whenever the owned value and the deleter can.
unsafe impl<T: ?Sized + Send, D: Deleter<T> + Send> Send for UniquePtr<T, D> {}

// SAFETY: see `Send`.
unsafe impl<T: ?Sized + Sync, D: Deleter<T> + Sync> Sync for UniquePtr<T, D> {}

impl<T: ?Sized> UniquePtr<T> {
    /// Creates an empty pointer with the [`DefaultDelete`] policy.
    ///
    /// Does not allocate.
    ///
    /// # Examples
    ///
    /// ```
    /// use uniq_ptr::UniquePtr;
    ///
    /// let ptr = UniquePtr::<str>::null();
    /// assert!(ptr.get().is_none());
    /// ```
    #[inline]
    pub const fn null() -> Self {
        Self::null_with(DefaultDelete)
    }

    /// Converts the pointer back into a `Box`, or `None` if empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use uniq_ptr::UniquePtr;
    ///
    /// let ptr = UniquePtr::from(Box::new(5));
    /// assert_eq!(ptr.into_box(), Some(Box::new(5)));
    /// ```
    pub fn into_box(self) -> Option<Box<T>> {
        // SAFETY: pointers owned under `DefaultDelete` come from `Box`.
        self.into_raw().map(|ptr| unsafe { Box::from_raw(ptr.as_ptr()) })
    }

    /// Converts the pointer back into a `Box`.
    ///
    /// # Errors
    /// Returns [`PtrError::Empty`] if the pointer is empty.
    #[inline]
    pub fn try_into_box(self) -> Result<Box<T>, PtrError> {
        self.into_box().ok_or(PtrError::Empty)
    }

    /// Consumes the pointer and leaks the value, like [`Box::leak`].
    ///
    /// Returns `None` if empty.
    #[inline]
    pub fn leak<'a>(self) -> Option<&'a mut T>
    where
        T: 'a,
    {
        self.into_box().map(Box::leak)
    }
}

impl<T> UniquePtr<T> {
    /// Allocates `value` on the heap and takes ownership of it.
    ///
    /// # Examples
    ///
    /// ```
    /// use uniq_ptr::UniquePtr;
    ///
    /// let ptr = UniquePtr::new(5);
    /// assert_eq!(*ptr, 5);
    /// ```
    #[inline]
    pub fn new(value: T) -> Self {
        Self::from(Box::new(value))
    }

    /// Moves the value out of the pointer, or `None` if empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use uniq_ptr::UniquePtr;
    ///
    /// let ptr = UniquePtr::new(String::from("x"));
    /// assert_eq!(ptr.into_inner().as_deref(), Some("x"));
    /// ```
    #[inline]
    pub fn into_inner(self) -> Option<T> {
        self.into_box().map(|boxed| *boxed)
    }

    /// Moves the value out of the pointer.
    ///
    /// # Errors
    /// Returns [`PtrError::Empty`] if the pointer is empty.
    #[inline]
    pub fn try_into_inner(self) -> Result<T, PtrError> {
        self.into_inner().ok_or(PtrError::Empty)
    }
}

impl<T, D: Deleter<T>> UniquePtr<T, D> {
    /// Takes ownership of `ptr` with a default-constructed deleter.
    ///
    /// `ptr` may be null, which creates an empty pointer.
    ///
    /// # Safety
    /// - If non-null, `ptr` must point to a valid `T` that can be released by `D`.
    /// - No one else may own `ptr` afterwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use uniq_ptr::UniquePtr;
    ///
    /// let raw = Box::into_raw(Box::new(1u8));
    /// let ptr: UniquePtr<u8> = unsafe { UniquePtr::from_raw(raw) };
    /// assert_eq!(ptr.as_ptr(), raw);
    ///
    /// let null: UniquePtr<u8> = unsafe { UniquePtr::from_raw(core::ptr::null_mut()) };
    /// assert!(null.is_null());
    /// ```
    #[inline]
    pub unsafe fn from_raw(ptr: *mut T) -> Self
    where
        D: Default,
    {
        // SAFETY: guaranteed by the caller.
        unsafe { Self::from_raw_parts(NonNull::new(ptr), D::default()) }
    }

    /// Takes ownership of `ptr`, released later by `deleter`.
    ///
    /// `ptr` may be null, which creates an empty pointer holding `deleter`.
    ///
    /// # Safety
    /// - If non-null, `ptr` must point to a valid `T` that can be released by `deleter`.
    /// - No one else may own `ptr` afterwards.
    #[inline]
    pub unsafe fn from_raw_with(ptr: *mut T, deleter: D) -> Self {
        // SAFETY: guaranteed by the caller.
        unsafe { Self::from_raw_parts(NonNull::new(ptr), deleter) }
    }

    /// Returns the owned pointer, or null if empty.
    ///
    /// Ownership is not transferred.
    #[inline]
    pub const fn as_ptr(&self) -> *mut T {
        match self.ptr {
            Some(ptr) => ptr.as_ptr(),
            None => ptr::null_mut(),
        }
    }
}

impl<T: ?Sized, D: Deleter<T>> UniquePtr<T, D> {
    /// Creates an empty pointer holding `deleter`.
    ///
    /// Does not allocate.
    #[inline]
    pub const fn null_with(deleter: D) -> Self {
        Self {
            ptr: None,
            deleter,
            _marker: PhantomData,
        }
    }

    /// Takes ownership of `ptr` with a default-constructed deleter.
    ///
    /// Unlike [`from_raw`](Self::from_raw), also accepts unsized pointees.
    ///
    /// # Safety
    /// See [`from_raw_parts`](Self::from_raw_parts).
    #[inline]
    pub unsafe fn from_non_null(ptr: Option<NonNull<T>>) -> Self
    where
        D: Default,
    {
        // SAFETY: guaranteed by the caller.
        unsafe { Self::from_raw_parts(ptr, D::default()) }
    }

    /// Takes ownership of `ptr`, released later by `deleter`.
    ///
    /// `None` creates an empty pointer holding `deleter`.
    ///
    /// # Safety
    /// - If `Some`, `ptr` must point to a valid, aligned `T` that can be
    ///   released by `deleter`.
    /// - No one else may own `ptr` afterwards.
    ///
    /// # Panics
    /// With ownership tracking active, if `ptr` is already owned by another
    /// `UniquePtr`.
    ///
    /// An owner passed to [`mem::forget`] stays registered, so freeing its
    /// allocation by other means makes a later owner of the reused address
    /// panic here. Give up ownership with [`into_raw`](Self::into_raw) or
    /// [`release`](Self::release) instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::ptr::NonNull;
    /// use uniq_ptr::{DefaultDelete, UniquePtr};
    ///
    /// let slice: Box<[u8]> = Box::new([1, 2, 3]);
    /// let raw = NonNull::from(Box::leak(slice));
    ///
    /// let ptr = unsafe { UniquePtr::from_raw_parts(Some(raw), DefaultDelete) };
    /// assert_eq!(ptr.len(), 3);
    /// ```
    #[track_caller]
    pub unsafe fn from_raw_parts(ptr: Option<NonNull<T>>, deleter: D) -> Self {
        if let Some(ptr) = ptr {
            cfg::debug! {
                // SAFETY: the caller guarantees `ptr` points to a valid `T`.
                let align = align_of_val(unsafe { ptr.as_ref() });
                assert!(
                    ptr.cast::<u8>().addr().get().is_multiple_of(align),
                    "pointer {ptr:p} is not aligned to {align} for type {}",
                    core::any::type_name::<T>(),
                );
            }
            // SAFETY: the caller guarantees `ptr` points to a valid `T`.
            unsafe { track::adopt(ptr) };
        }

        Self {
            ptr,
            deleter,
            _marker: PhantomData,
        }
    }

    /// Decomposes the pointer into its raw pointer and deleter,
    /// without releasing anything.
    ///
    /// The caller becomes responsible for releasing the pointer.
    ///
    /// # Examples
    ///
    /// ```
    /// use uniq_ptr::UniquePtr;
    ///
    /// let ptr = UniquePtr::new(3);
    /// let (raw, deleter) = ptr.into_raw_parts();
    ///
    /// let ptr = unsafe { UniquePtr::from_raw_parts(raw, deleter) };
    /// assert_eq!(*ptr, 3);
    /// ```
    pub fn into_raw_parts(self) -> (Option<NonNull<T>>, D) {
        let mut this = ManuallyDrop::new(self);
        let ptr = this.release();
        // SAFETY: `this` is never dropped, so the deleter is moved out only once.
        let deleter = unsafe { ptr::read(&this.deleter) };
        (ptr, deleter)
    }

    /// Consumes the pointer and returns the raw pointer without releasing it.
    ///
    /// The deleter is dropped.
    #[inline]
    pub fn into_raw(self) -> Option<NonNull<T>> {
        self.into_raw_parts().0
    }

    /// Returns the owned pointer, or `None` if empty.
    ///
    /// Ownership is not transferred.
    #[inline]
    pub const fn get(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    /// Returns `true` if the pointer owns nothing.
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Returns a reference to the value, or `None` if empty.
    #[inline]
    pub fn as_deref(&self) -> Option<&T> {
        // SAFETY: an owned pointer is valid for as long as `self` is borrowed.
        self.ptr.map(|ptr| unsafe { ptr.as_ref() })
    }

    /// Returns a mutable reference to the value, or `None` if empty.
    #[inline]
    pub fn as_deref_mut(&mut self) -> Option<&mut T> {
        // SAFETY: an owned pointer is valid and unaliased for as long as
        // `self` is mutably borrowed.
        self.ptr.map(|mut ptr| unsafe { ptr.as_mut() })
    }

    /// Returns a reference to the value without checking for emptiness.
    ///
    /// Only checked in debug mode.
    ///
    /// # Safety
    /// The pointer must not be empty.
    #[cfg_attr(debug_assertions, track_caller)]
    #[cfg_attr(not(debug_assertions), inline(always))]
    pub unsafe fn as_ref_unchecked(&self) -> &T {
        cfg::debug! { assert!(self.ptr.is_some(), "dereferenced an empty UniquePtr"); }

        // SAFETY: the caller guarantees the pointer is not empty.
        unsafe { self.ptr.unwrap_unchecked().as_ref() }
    }

    /// Returns a mutable reference to the value without checking for emptiness.
    ///
    /// Only checked in debug mode.
    ///
    /// # Safety
    /// The pointer must not be empty.
    #[cfg_attr(debug_assertions, track_caller)]
    #[cfg_attr(not(debug_assertions), inline(always))]
    pub unsafe fn as_mut_unchecked(&mut self) -> &mut T {
        cfg::debug! { assert!(self.ptr.is_some(), "dereferenced an empty UniquePtr"); }

        // SAFETY: the caller guarantees the pointer is not empty.
        unsafe { self.ptr.unwrap_unchecked().as_mut() }
    }

    /// Returns the deleter.
    #[inline]
    pub const fn deleter(&self) -> &D {
        &self.deleter
    }

    /// Returns the deleter mutably.
    #[inline]
    pub const fn deleter_mut(&mut self) -> &mut D {
        &mut self.deleter
    }

    /// Gives up ownership and returns the raw pointer, leaving `self` empty.
    ///
    /// The deleter is not called and stays in `self`. The caller becomes
    /// responsible for releasing the returned pointer.
    ///
    /// # Examples
    ///
    /// ```
    /// use uniq_ptr::{DefaultDelete, Deleter, UniquePtr};
    ///
    /// let mut ptr = UniquePtr::new(7);
    /// let raw = ptr.release().unwrap();
    /// assert!(ptr.is_null());
    ///
    /// unsafe { DefaultDelete.delete(raw) };
    /// ```
    pub fn release(&mut self) -> Option<NonNull<T>> {
        let ptr = self.ptr.take();
        if let Some(ptr) = ptr {
            // SAFETY: `ptr` was owned until now, so it is valid.
            unsafe { track::forget(ptr) };
        }
        ptr
    }

    /// Releases the owned value, if any, leaving `self` empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use uniq_ptr::UniquePtr;
    ///
    /// let mut ptr = UniquePtr::new(7);
    /// ptr.reset();
    /// assert!(ptr.is_null());
    /// ```
    pub fn reset(&mut self) {
        if let Some(old) = self.release() {
            // SAFETY: `old` was exclusively owned by `self` and is dropped from it.
            unsafe { self.deleter.delete(old) };
        }
    }

    /// Replaces the owned pointer with `ptr`, then releases the old one.
    ///
    /// Resetting to the pointer already owned does nothing. Zero-sized values
    /// all share one dangling address, so for them `ptr` is always treated as
    /// a new value and the old one is released.
    ///
    /// # Safety
    /// Same as [`from_raw_parts`](Self::from_raw_parts), with the deleter of `self`.
    ///
    /// # Panics
    /// With ownership tracking active, if `ptr` is owned by another `UniquePtr`.
    #[track_caller]
    pub unsafe fn reset_to(&mut self, ptr: Option<NonNull<T>>) {
        if let Some(new) = ptr
            && addr_of(ptr) == self.addr()
            // SAFETY: the caller guarantees `new` points to a valid `T`.
            && size_of_val(unsafe { new.as_ref() }) != 0
        {
            return;
        }

        if let Some(new) = ptr {
            // SAFETY: guaranteed by the caller.
            unsafe { track::adopt(new) };
        }

        if let Some(old) = mem::replace(&mut self.ptr, ptr) {
            // SAFETY: `old` was exclusively owned by `self` and is no longer reachable.
            unsafe {
                track::forget(old);
                self.deleter.delete(old);
            }
        }
    }

    /// Moves the contents out, leaving `self` empty with a default deleter.
    ///
    /// This is the equivalent of constructing from a moved-from owner that
    /// remains accessible afterwards.
    #[inline]
    pub fn take(&mut self) -> Self
    where
        D: Default,
    {
        mem::take(self)
    }

    /// Takes over the contents of `other`, releasing what `self` owned before.
    ///
    /// Implemented by swapping, the previous contents are released when the
    /// swapped-out `other` is dropped at the end of the call.
    ///
    /// # Examples
    ///
    /// ```
    /// use uniq_ptr::UniquePtr;
    ///
    /// let mut a = UniquePtr::new(1);
    /// let mut b = UniquePtr::new(2);
    ///
    /// b.assign(a.take());
    /// assert!(a.is_null());
    /// assert_eq!(*b, 1);
    /// ```
    #[inline]
    pub fn assign(&mut self, mut other: Self) {
        self.swap(&mut other);
    }

    /// Exchanges the pointers and deleters of `self` and `other`.
    ///
    /// Never calls a deleter.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Converts the deleter into another policy, keeping the pointer.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::ptr::NonNull;
    /// use uniq_ptr::{DefaultDelete, Deleter, UniquePtr};
    ///
    /// struct Noisy;
    ///
    /// impl From<DefaultDelete> for Noisy {
    ///     fn from(_: DefaultDelete) -> Self { Noisy }
    /// }
    ///
    /// impl Deleter<i32> for Noisy {
    ///     unsafe fn delete(&mut self, ptr: NonNull<i32>) {
    ///         println!("delete {ptr:p}");
    ///         unsafe { DefaultDelete.delete(ptr) }
    ///     }
    /// }
    ///
    /// let ptr: UniquePtr<i32, Noisy> = UniquePtr::new(1).convert_deleter();
    /// assert_eq!(*ptr, 1);
    /// ```
    pub fn convert_deleter<E>(self) -> UniquePtr<T, E>
    where
        E: Deleter<T> + From<D>,
    {
        let (ptr, deleter) = self.into_raw_parts();
        // SAFETY: `ptr` was owned by `self` and is released by its converted policy.
        unsafe { UniquePtr::from_raw_parts(ptr, E::from(deleter)) }
    }

    #[inline(always)]
    fn addr(&self) -> usize {
        addr_of(self.ptr)
    }
}

/// Address of a possibly wide pointer, `0` for `None`.
#[inline(always)]
fn addr_of<T: ?Sized>(ptr: Option<NonNull<T>>) -> usize {
    ptr.map_or(0, |ptr| ptr.cast::<u8>().addr().get())
}

/// Exchanges the contents of two pointers, see [`UniquePtr::swap`].
///
/// # Examples
///
/// ```
/// use uniq_ptr::UniquePtr;
///
/// let mut a = UniquePtr::new('a');
/// let mut b = UniquePtr::new('b');
///
/// uniq_ptr::swap(&mut a, &mut b);
/// assert_eq!((*a, *b), ('b', 'a'));
/// ```
#[inline]
pub fn swap<T: ?Sized, D: Deleter<T>>(a: &mut UniquePtr<T, D>, b: &mut UniquePtr<T, D>) {
    a.swap(b);
}

impl<T: ?Sized, D: Deleter<T>> Drop for UniquePtr<T, D> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: ?Sized, D: Deleter<T> + Default> Default for UniquePtr<T, D> {
    #[inline]
    fn default() -> Self {
        Self::null_with(D::default())
    }
}

impl<T: ?Sized> From<Box<T>> for UniquePtr<T> {
    #[inline]
    fn from(value: Box<T>) -> Self {
        let ptr = NonNull::from(Box::leak(value));
        // SAFETY: a leaked `Box` is a unique allocation released by `DefaultDelete`.
        unsafe { Self::from_raw_parts(Some(ptr), DefaultDelete) }
    }
}

// -----------------------------------------------------------------------------
// Access

#[cold]
#[inline(never)]
#[track_caller]
fn deref_null() -> ! {
    panic!("dereferenced an empty UniquePtr")
}

impl<T: ?Sized, D: Deleter<T>> Deref for UniquePtr<T, D> {
    type Target = T;

    /// # Panics
    /// If the pointer is empty.
    #[inline]
    #[track_caller]
    fn deref(&self) -> &T {
        match self.as_deref() {
            Some(value) => value,
            None => deref_null(),
        }
    }
}

impl<T: ?Sized, D: Deleter<T>> DerefMut for UniquePtr<T, D> {
    /// # Panics
    /// If the pointer is empty.
    #[inline]
    #[track_caller]
    fn deref_mut(&mut self) -> &mut T {
        match self.as_deref_mut() {
            Some(value) => value,
            None => deref_null(),
        }
    }
}

// -----------------------------------------------------------------------------
// Comparison, by address

impl<T: ?Sized, D: Deleter<T>, U: ?Sized, E: Deleter<U>> PartialEq<UniquePtr<U, E>>
    for UniquePtr<T, D>
{
    #[inline]
    fn eq(&self, other: &UniquePtr<U, E>) -> bool {
        self.addr() == other.addr()
    }
}

impl<T: ?Sized, D: Deleter<T>> Eq for UniquePtr<T, D> {}

impl<T: ?Sized, D: Deleter<T>, U: ?Sized, E: Deleter<U>> PartialOrd<UniquePtr<U, E>>
    for UniquePtr<T, D>
{
    #[inline]
    fn partial_cmp(&self, other: &UniquePtr<U, E>) -> Option<Ordering> {
        Some(self.addr().cmp(&other.addr()))
    }
}

impl<T: ?Sized, D: Deleter<T>> Ord for UniquePtr<T, D> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl<T: ?Sized, D: Deleter<T>> Hash for UniquePtr<T, D> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

// -----------------------------------------------------------------------------
// Formatting

impl<T: ?Sized, D: Deleter<T>> fmt::Pointer for UniquePtr<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&ptr::without_provenance::<u8>(self.addr()), f)
    }
}

impl<T: ?Sized, D: Deleter<T>> fmt::Debug for UniquePtr<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr {
            Some(_) => write!(f, "UniquePtr({:p})", ptr::without_provenance::<u8>(self.addr())),
            None => f.write_str("UniquePtr(null)"),
        }
    }
}

// -----------------------------------------------------------------------------
// upcast

/// Converts a [`UniquePtr`] into an owner of a compatible type.
///
/// - `upcast!(ptr => Target)` keeps the deleter, which must implement
///   `Deleter<Target>`.
/// - `upcast!(ptr => Target, NewDeleter)` also converts the deleter through
///   `From`.
///
/// Only identity and unsizing coercions of the pointer compile, so the
/// converted owner releases the value with its original drop glue.
///
/// # Examples
///
/// ```
/// use core::fmt::Display;
/// use uniq_ptr::{UniquePtr, upcast};
///
/// let ptr = UniquePtr::new(42);
/// let addr = ptr.get().unwrap().cast::<u8>();
///
/// let ptr: UniquePtr<dyn Display> = upcast!(ptr => dyn Display);
/// assert_eq!(ptr.get().unwrap().cast::<u8>(), addr);
/// assert_eq!(ptr.to_string(), "42");
///
/// let array = UniquePtr::new([1, 2, 3]);
/// let slice = upcast!(array => [i32]);
/// assert_eq!(slice.len(), 3);
/// ```
///
/// Casting to an unrelated type is rejected:
///
/// ```compile_fail
/// use uniq_ptr::{UniquePtr, upcast};
///
/// let ptr = UniquePtr::new(42u32);
/// let ptr = upcast!(ptr => u64);
/// ```
#[macro_export]
macro_rules! upcast {
    ($ptr:expr => $target:ty, $deleter:ty $(,)?) => {{
        let (ptr, deleter) = $crate::UniquePtr::into_raw_parts($ptr);
        let ptr = ::core::option::Option::map(ptr, |ptr| -> ::core::ptr::NonNull<$target> { ptr });
        // SAFETY: `ptr` comes from an owner and was only coerced.
        #[allow(unsafe_code)]
        let owner = unsafe {
            $crate::UniquePtr::<$target, $deleter>::from_raw_parts(
                ptr,
                ::core::convert::From::from(deleter),
            )
        };
        owner
    }};
    ($ptr:expr => $target:ty $(,)?) => {{
        let (ptr, deleter) = $crate::UniquePtr::into_raw_parts($ptr);
        let ptr = ::core::option::Option::map(ptr, |ptr| -> ::core::ptr::NonNull<$target> { ptr });
        // SAFETY: `ptr` comes from an owner and was only coerced.
        #[allow(unsafe_code)]
        let owner = unsafe { $crate::UniquePtr::<$target, _>::from_raw_parts(ptr, deleter) };
        owner
    }};
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::format;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};
    use core::ptr::NonNull;
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::{UniquePtr, addr_of, swap};
    use crate::{Deleter, PtrError};

    /// Frees like `DefaultDelete` and records every released address.
    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<usize>>>);

    impl Recorder {
        fn calls(&self) -> Vec<usize> {
            self.0.borrow().clone()
        }
    }

    impl<T: ?Sized> Deleter<T> for Recorder {
        unsafe fn delete(&mut self, ptr: NonNull<T>) {
            self.0.borrow_mut().push(addr_of(Some(ptr)));
            drop(unsafe { Box::from_raw(ptr.as_ptr()) });
        }
    }

    /// Counts releases separately, converted from a `Recorder`.
    struct Tally(Recorder);

    impl From<Recorder> for Tally {
        fn from(value: Recorder) -> Self {
            Tally(value)
        }
    }

    impl<T: ?Sized> Deleter<T> for Tally {
        unsafe fn delete(&mut self, ptr: NonNull<T>) {
            unsafe { self.0.delete(ptr) }
        }
    }

    fn owned<T>(value: T, recorder: &Recorder) -> UniquePtr<T, Recorder> {
        let raw = Box::into_raw(Box::new(value));
        unsafe { UniquePtr::from_raw_with(raw, recorder.clone()) }
    }

    trait Shape {
        fn area(&self) -> u32;
    }

    struct Square {
        side: u32,
        dropped: Rc<Cell<bool>>,
    }

    impl Shape for Square {
        fn area(&self) -> u32 {
            self.side * self.side
        }
    }

    impl Drop for Square {
        fn drop(&mut self) {
            self.dropped.set(true);
        }
    }

    #[test]
    fn is_send_sync() {
        fn is_send<T: Send>() {}
        fn is_sync<T: Sync>() {}

        is_send::<UniquePtr<i32>>();
        is_sync::<UniquePtr<i32>>();
        is_send::<UniquePtr<[u8]>>();
        is_sync::<UniquePtr<str>>();
    }

    #[test]
    fn empty_releases_nothing() {
        let recorder = Recorder::default();
        {
            let a = UniquePtr::<u32, Recorder>::null_with(recorder.clone());
            let b = unsafe { UniquePtr::<u32, _>::from_raw_with(core::ptr::null_mut(), recorder.clone()) };
            let c = UniquePtr::<u32, Recorder>::default();

            assert!(a.get().is_none());
            assert!(b.get().is_none());
            assert!(c.is_null());
            assert!(a.as_ptr().is_null());
        }
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn releases_exactly_once() {
        let recorder = Recorder::default();
        let raw = Box::into_raw(Box::new(10u32));
        {
            let ptr = unsafe { UniquePtr::from_raw_with(raw, recorder.clone()) };
            assert_eq!(ptr.as_ptr(), raw);
            assert_eq!(*ptr, 10);
        }
        assert_eq!(recorder.calls(), [raw as usize]);
    }

    #[test]
    fn move_empties_source() {
        let recorder = Recorder::default();
        let mut a = owned(1u32, &recorder);
        let h = addr_of(a.get());

        let b = a.take();
        assert_eq!(addr_of(b.get()), h);
        assert!(a.is_null());

        // A plain move makes `b` inaccessible instead.
        let c = b;
        assert_eq!(addr_of(c.get()), h);

        drop(a);
        drop(c);
        assert_eq!(recorder.calls(), [h]);
    }

    #[test]
    fn assign_releases_previous() {
        let recorder = Recorder::default();
        let mut a = owned(1u32, &recorder);
        let mut b = owned(2u32, &recorder);
        let (h1, h2) = (addr_of(a.get()), addr_of(b.get()));
        assert_ne!(h1, h2);

        b.assign(a.take());
        assert_eq!(recorder.calls(), [h2]);
        assert_eq!(addr_of(b.get()), h1);
        assert!(a.is_null());
        assert_eq!(*b, 1);

        // Plain assignment drops the old value as well.
        let c = owned(3u32, &recorder);
        let h3 = addr_of(c.get());
        b = c;
        assert_eq!(recorder.calls(), [h2, h1]);

        drop(b);
        assert_eq!(recorder.calls(), [h2, h1, h3]);
    }

    #[test]
    fn release_hands_over_ownership() {
        let recorder = Recorder::default();
        let mut ptr = owned(5u32, &recorder);
        let h = ptr.get();

        let raw = ptr.release();
        assert_eq!(raw, h);
        assert!(ptr.get().is_none());
        assert!(ptr.release().is_none());

        drop(ptr);
        assert!(recorder.calls().is_empty());

        unsafe { recorder.clone().delete(raw.unwrap()) };
        assert_eq!(recorder.calls(), [addr_of(h)]);
    }

    #[test]
    fn self_transfer_is_noop() {
        let recorder = Recorder::default();
        let mut ptr = owned(5u32, &recorder);
        let h = ptr.get();

        unsafe { ptr.reset_to(h) };
        assert_eq!(ptr.get(), h);

        let contents = ptr.take();
        ptr.assign(contents);
        assert_eq!(ptr.get(), h);

        assert!(recorder.calls().is_empty());
        assert_eq!(*ptr, 5);
    }

    #[test]
    fn reset_to_releases_old() {
        let recorder = Recorder::default();
        let mut ptr = owned(1u32, &recorder);
        let old = addr_of(ptr.get());

        let new = NonNull::from(Box::leak(Box::new(2u32)));
        unsafe { ptr.reset_to(Some(new)) };
        assert_eq!(recorder.calls(), [old]);
        assert_eq!(*ptr, 2);

        ptr.reset();
        assert!(ptr.is_null());
        assert_eq!(recorder.calls(), [old, addr_of(Some(new))]);

        ptr.reset();
        assert_eq!(recorder.calls().len(), 2);
    }

    #[test]
    fn reset_to_zero_sized_releases_old() {
        static DROPS: AtomicUsize = AtomicUsize::new(0);

        struct Guard;

        impl Drop for Guard {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::Relaxed);
            }
        }

        let mut ptr = UniquePtr::new(Guard);
        let fresh = NonNull::from(Box::leak(Box::new(Guard)));
        assert_eq!(ptr.get(), Some(fresh));

        unsafe { ptr.reset_to(Some(fresh)) };
        assert_eq!(DROPS.load(Ordering::Relaxed), 1);
        assert_eq!(ptr.get(), Some(fresh));

        drop(ptr);
        assert_eq!(DROPS.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn swap_twice_restores() {
        let recorder = Recorder::default();
        let mut a = owned(1u32, &recorder);
        let mut b = owned(2u32, &recorder);
        let (h1, h2) = (a.get(), b.get());

        swap(&mut a, &mut b);
        assert_eq!((a.get(), b.get()), (h2, h1));

        a.swap(&mut b);
        assert_eq!((a.get(), b.get()), (h1, h2));

        let mut empty = UniquePtr::null_with(recorder.clone());
        a.swap(&mut empty);
        assert!(a.is_null());
        assert_eq!(empty.get(), h1);

        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn upcast_keeps_original_release() {
        let recorder = Recorder::default();
        let dropped = Rc::new(Cell::new(false));

        let square = owned(Square { side: 2, dropped: dropped.clone() }, &recorder);
        let h = addr_of(square.get());

        let shape: UniquePtr<dyn Shape, Recorder> = crate::upcast!(square => dyn Shape);
        assert_eq!(addr_of(shape.get()), h);
        assert_eq!(shape.area(), 4);
        assert!(recorder.calls().is_empty());

        drop(shape);
        assert_eq!(recorder.calls(), [h]);
        assert!(dropped.get());
    }

    #[test]
    fn upcast_converts_deleter() {
        let recorder = Recorder::default();
        let dropped = Rc::new(Cell::new(false));

        let square = owned(Square { side: 3, dropped: dropped.clone() }, &recorder);
        let h = addr_of(square.get());

        let shape = crate::upcast!(square => dyn Shape, Tally);
        assert_eq!(shape.area(), 9);

        drop(shape);
        assert_eq!(recorder.calls(), [h]);
        assert!(dropped.get());

        let empty = UniquePtr::<Square, Recorder>::null_with(recorder.clone());
        let empty = crate::upcast!(empty => dyn Shape, Tally);
        assert!(empty.is_null());
    }

    #[test]
    fn closure_deleter() {
        let mut released = 0;
        {
            let raw = Box::into_raw(Box::new(5u32));
            let ptr = unsafe {
                UniquePtr::from_raw_with(raw, |ptr: NonNull<u32>| {
                    released += 1;
                    drop(unsafe { Box::from_raw(ptr.as_ptr()) });
                })
            };
            assert_eq!(*ptr, 5);
        }
        assert_eq!(released, 1);
    }

    #[test]
    fn unsized_pointees() {
        let slice = UniquePtr::<[u32]>::from(vec![1, 2, 3].into_boxed_slice());
        assert_eq!(&*slice, [1, 2, 3]);

        let text = UniquePtr::<str>::from(Box::<str>::from("abc"));
        assert_eq!(text.len(), 3);
        assert_eq!(text.into_box().as_deref(), Some("abc"));
    }

    #[test]
    fn conversions() {
        assert_eq!(UniquePtr::new(4u8).into_inner(), Some(4));
        assert_eq!(UniquePtr::<u8>::null().into_inner(), None);
        assert_eq!(UniquePtr::<u8>::null().try_into_inner(), Err(PtrError::Empty));
        assert_eq!(UniquePtr::<u8>::null().try_into_box(), Err(PtrError::Empty));
        assert_eq!(UniquePtr::new(4u8).try_into_box(), Ok(Box::new(4)));

        let leaked = UniquePtr::new(6u8).leak().unwrap();
        *leaked += 1;
        assert_eq!(*leaked, 7);
        drop(unsafe { Box::from_raw(leaked) });
    }

    #[test]
    fn checked_access() {
        let mut ptr = UniquePtr::new(1u32);
        *ptr.as_deref_mut().unwrap() += 1;
        assert_eq!(ptr.as_deref(), Some(&2));
        assert_eq!(unsafe { *ptr.as_ref_unchecked() }, 2);
        *unsafe { ptr.as_mut_unchecked() } = 3;
        assert_eq!(*ptr, 3);

        ptr.reset();
        assert_eq!(ptr.as_deref(), None);
        assert_eq!(ptr.as_deref_mut(), None);
    }

    #[test]
    #[should_panic(expected = "dereferenced an empty UniquePtr")]
    fn deref_empty_panics() {
        let ptr = UniquePtr::<u32>::null();
        assert_eq!(*ptr, 0);
    }

    #[test]
    fn compare_and_format() {
        let null = UniquePtr::<u32>::null();
        let a = UniquePtr::new(1u32);
        let b = UniquePtr::new(1u32);

        assert_eq!(null, UniquePtr::<u64>::null());
        assert_ne!(a, b);
        assert!(null < a);
        assert_eq!(a.cmp(&a), core::cmp::Ordering::Equal);

        assert_eq!(format!("{null:?}"), "UniquePtr(null)");
        assert_eq!(format!("{a:?}"), format!("UniquePtr({:p})", a.as_ptr()));
        assert_eq!(format!("{a:p}"), format!("{:p}", a.as_ptr()));
    }

    #[test]
    fn format_wide_pointers() {
        let slice = UniquePtr::<[u8]>::from(vec![1, 2].into_boxed_slice());
        let addr = slice.get().unwrap().cast::<u8>();
        assert_eq!(format!("{slice:?}"), format!("UniquePtr({addr:p})"));
        assert_eq!(format!("{slice:p}"), format!("{addr:p}"));

        let shown = UniquePtr::new(1u32);
        let addr = shown.get().unwrap().cast::<u8>();
        let shown = crate::upcast!(shown => dyn core::fmt::Debug);
        assert_eq!(format!("{shown:?}"), format!("UniquePtr({addr:p})"));
        assert_eq!(format!("{:?}", &*shown), "1");
    }
}
