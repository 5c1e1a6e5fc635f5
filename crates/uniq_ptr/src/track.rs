//! Debug registry of the addresses currently owned by some `UniquePtr`.
//!
//! Only active under `cfg::track`, otherwise every function is an empty inline.
//!
//! Addresses leave the registry only through `UniquePtr` itself (release,
//! `into_raw`, reset, drop). A `UniquePtr` passed to `mem::forget` keeps its
//! address registered until the process ends.

use core::ptr::NonNull;

crate::cfg::switch! {
    crate::cfg::track => {
        use foldhash::fast::FixedState;
        use hashbrown::HashSet;
        use std::sync::{Mutex, PoisonError};

        /// A fixed hash seed.
        const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x95EE04C4F326B271);

        static LIVE: Mutex<Option<HashSet<usize, FixedState>>> = Mutex::new(None);

        /// Address used as registry key, `None` for zero-sized pointees
        /// because they all share a dangling address.
        ///
        /// # Safety
        /// `ptr` points to a valid `T`.
        unsafe fn key<T: ?Sized>(ptr: NonNull<T>) -> Option<usize> {
            // SAFETY: guaranteed by the caller.
            let size = size_of_val(unsafe { ptr.as_ref() });
            (size != 0).then(|| ptr.cast::<u8>().addr().get())
        }

        /// Records `ptr` as owned.
        ///
        /// # Panics
        /// If the address is already owned.
        ///
        /// # Safety
        /// `ptr` points to a valid `T`.
        #[track_caller]
        pub(crate) unsafe fn adopt<T: ?Sized>(ptr: NonNull<T>) {
            let Some(addr) = (unsafe { key(ptr) }) else {
                return;
            };

            let fresh = LIVE
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get_or_insert_with(|| HashSet::with_hasher(FIXED_HASH_STATE))
                .insert(addr);

            if !fresh {
                let name = core::any::type_name::<T>();
                log::error!("{addr:#x} ({name}) is adopted while another UniquePtr owns it");
                panic!("double ownership of {addr:#x} ({name})");
            }

            log::trace!("adopt {addr:#x}");
        }

        /// Removes `ptr` from the owned set.
        ///
        /// # Safety
        /// `ptr` points to a valid `T`.
        pub(crate) unsafe fn forget<T: ?Sized>(ptr: NonNull<T>) {
            let Some(addr) = (unsafe { key(ptr) }) else {
                return;
            };

            if let Some(live) = LIVE.lock().unwrap_or_else(PoisonError::into_inner).as_mut() {
                live.remove(&addr);
            }

            log::trace!("forget {addr:#x}");
        }

        /// Whether `ptr` is currently owned.
        ///
        /// # Safety
        /// `ptr` points to a valid `T`.
        #[cfg(test)]
        pub(crate) unsafe fn is_owned<T: ?Sized>(ptr: NonNull<T>) -> bool {
            let Some(addr) = (unsafe { key(ptr) }) else {
                return false;
            };

            LIVE.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .as_ref()
                .is_some_and(|live| live.contains(&addr))
        }
    }
    _ => {
        #[inline(always)]
        pub(crate) unsafe fn adopt<T: ?Sized>(_: NonNull<T>) {}

        #[inline(always)]
        pub(crate) unsafe fn forget<T: ?Sized>(_: NonNull<T>) {}
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    crate::cfg::track! {
        use core::ptr::NonNull;

        use super::is_owned;
        use crate::UniquePtr;

        #[test]
        fn owned_while_alive() {
            let mut ptr = UniquePtr::new(7u32);
            let raw = ptr.get().unwrap();
            assert!(unsafe { is_owned(raw) });

            let raw = ptr.release().unwrap();
            assert!(!unsafe { is_owned(raw) });

            let ptr: UniquePtr<u32> = unsafe { UniquePtr::from_non_null(Some(raw)) };
            assert!(unsafe { is_owned(raw) });
            assert_eq!(*ptr, 7);
        }

        #[test]
        fn zero_sized_values_are_not_tracked() {
            let a = UniquePtr::new(());
            let b = UniquePtr::new(());
            assert_eq!(a.get(), b.get());
            assert!(!unsafe { is_owned(NonNull::<()>::dangling()) });
        }

        #[test]
        fn into_raw_unregisters() {
            let ptr = UniquePtr::new(9u64);
            let raw = ptr.into_raw().unwrap();
            assert!(!unsafe { is_owned(raw) });

            // The same address can be owned again after a raw round trip.
            let again: UniquePtr<u64> = unsafe { UniquePtr::from_non_null(Some(raw)) };
            assert!(unsafe { is_owned(raw) });
            drop(again);
        }

        #[test]
        #[should_panic(expected = "double ownership")]
        fn forgotten_owner_stays_registered() {
            let ptr = UniquePtr::new(3u64);
            let raw = ptr.get().unwrap();
            core::mem::forget(ptr);

            let _again: UniquePtr<u64> = unsafe { UniquePtr::from_non_null(Some(raw)) };
        }

        #[test]
        #[should_panic(expected = "double ownership")]
        fn double_adoption_panics() {
            let owner = UniquePtr::new(7u32);
            let alias: UniquePtr<u32> = unsafe { UniquePtr::from_raw(owner.as_ptr()) };
            core::mem::forget(alias);
        }
    }
}
