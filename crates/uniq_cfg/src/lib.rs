//! Macros for compile-time configuration.
//!
//! Every crate of the workspace declares a `cfg` module of aliases:
//!
//! ```
//! mod cfg {
//!     uniq_cfg::define_alias! {
//!         #[cfg(feature = "std")] => std,
//!         #[cfg(debug_assertions)] => debug,
//!     }
//! }
//!
//! cfg::debug! {
//!     const CHECKED: bool = true;
//! }
//!
//! fn main() {
//!     let checked = cfg::debug! { if { CHECKED } else { false } };
//!     assert_eq!(checked, cfg!(debug_assertions));
//! }
//! ```
//!
//! An alias is a macro that either passes its input through ([`enabled`]) or
//! discards it ([`disabled`]). The `if { .. } else { .. }` form picks one of two
//! branches and can be used in expression position.
//!
//! [`switch`] chains aliases (or raw `#[cfg]` predicates) like a `match`:
//!
//! ```
//! mod cfg {
//!     uniq_cfg::define_alias! {
//!         #[cfg(feature = "never")] => never,
//!     }
//! }
//!
//! uniq_cfg::switch! {
//!     cfg::never => {
//!         const LEVEL: u8 = 2;
//!     }
//!     #[cfg(debug_assertions)] => {
//!         const LEVEL: u8 = 1;
//!     }
//!     _ => {
//!         const LEVEL: u8 = 0;
//!     }
//! }
//!
//! fn main() {
//!     assert!(LEVEL < 2);
//! }
//! ```
#![no_std]

/// Passes the input through.
///
/// With the `if { .. } else { .. }` form, only the first branch is kept.
#[macro_export]
macro_rules! enabled {
    () => { true };
    (if { $($p:tt)* } else { $($n:tt)* }) => { $($p)* };
    ($($p:tt)*) => { $($p)* };
}

/// Discards the input.
///
/// With the `if { .. } else { .. }` form, only the second branch is kept.
#[macro_export]
macro_rules! disabled {
    () => { false };
    (if { $($p:tt)* } else { $($n:tt)* }) => { $($n)* };
    ($($p:tt)*) => {};
}

/// Selects the first arm whose condition holds.
///
/// A condition is either an alias path created by [`define_alias`]
/// or a `#[cfg(..)]` predicate. `_` matches unconditionally.
#[macro_export]
macro_rules! switch {
    () => {};
    ({ $($tt:tt)* }) => {{
        $crate::switch! { $($tt)* }
    }};
    (_ => { $($output:tt)* }) => {
        $($output)*
    };
    (
        #[cfg($cfg:meta)] => $output:tt
        $($rest:tt)*
    ) => {
        #[cfg($cfg)]
        $crate::switch! { _ => $output }
        #[cfg(not($cfg))]
        $crate::switch! { $($rest)* }
    };
    (
        $cond:path => $output:tt
        $($rest:tt)*
    ) => {
        $cond! {
            if {
                $crate::switch! { _ => $output }
            } else {
                $crate::switch! { $($rest)* }
            }
        }
    };
}

/// Defines a list of `cfg` aliases.
///
/// Each `#[cfg(predicate)] => name` entry creates a macro `name!` that is
/// [`enabled`] when the predicate holds and [`disabled`] otherwise.
#[macro_export]
macro_rules! define_alias {
    () => {};
    (
        #[cfg($meta:meta)] => $alias:ident
        $(, $($rest:tt)*)?
    ) => {
        $crate::switch! {
            #[cfg($meta)] => {
                #[doc = concat!("Keeps the input, `#[cfg(", stringify!($meta), ")]` is active.")]
                pub use $crate::enabled as $alias;
            }
            _ => {
                #[doc = concat!("Drops the input, `#[cfg(", stringify!($meta), ")]` is not active.")]
                pub use $crate::disabled as $alias;
            }
        }

        $(
            $crate::define_alias! { $($rest)* }
        )?
    };
}
