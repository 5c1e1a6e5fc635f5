//! This crate provides [`UniquePtr`], a move-only owner of a single resource
//! that is released through a pluggable [`Deleter`].
//!
//! **UniquePtr**
//!
//! [`UniquePtr<T, D>`] is similar to [`Box<T>`](alloc::boxed::Box) but may be empty,
//! and the way the resource is released is decided by the deletion policy `D`
//! instead of always going back to the global allocator.
//!
//! - At any time a resource is owned by at most one `UniquePtr`.
//! - A non-empty pointer runs its deleter exactly once, when it is dropped or reset.
//! - Moving the contents out ([`take`](UniquePtr::take), [`release`](UniquePtr::release))
//!   leaves the source empty.
//!
//! **Deleter**
//!
//! [`Deleter<T>`] is the capability "able to release a `T`". [`DefaultDelete`]
//! rebuilds and drops the original `Box`; any `FnMut(NonNull<T>)` closure is a
//! deleter as well.
//!
//! **upcast!**
//!
//! [`upcast!`] converts an owner into an owner of a compatible (usually unsized)
//! type, optionally converting the deleter too. Only identity and unsizing
//! coercions are accepted.
//!
//! # Ownership tracking
//!
//! With the `std` and `debug` features and debug assertions, every adopted address
//! is recorded in a process-wide registry. Adopting an address that is already
//! owned panics instead of silently double-freeing later.
#![expect(unsafe_code, reason = "Owning raw pointers is inherently unsafe.")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Compilation config

/// Some macros used for compilation control.
pub mod cfg {
    pub(crate) use uniq_cfg::switch;

    uniq_cfg::define_alias! {
        #[cfg(feature = "std")] => std,
        #[cfg(all(feature = "debug", debug_assertions))] => debug,
        #[cfg(all(feature = "std", feature = "debug", debug_assertions))] => track,
    }
}

// -----------------------------------------------------------------------------
// no_std support

crate::cfg::std! { extern crate std; }

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod deleter;
mod error;
mod track;
mod unique;

// -----------------------------------------------------------------------------
// Top-level exports

pub use deleter::{DefaultDelete, Deleter};
pub use error::PtrError;
pub use unique::{UniquePtr, swap};
