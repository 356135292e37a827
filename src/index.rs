//! Sentinel-based arena handles.
//!
//! Links between cells use a reserved sentinel value (`u32::MAX`) instead of
//! `Option<u32>` to keep cells compact and link rewrites branch-free. A
//! handle is only ever produced by the arena that owns the slot, so the two
//! handle types are deliberately distinct: a [`NodeRef`] can never be used
//! where a [`GroupRef`] is expected.

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub(crate) struct $name(u32);

        impl $name {
            /// Sentinel value representing "no handle" / null link.
            pub(crate) const NONE: Self = Self(u32::MAX);

            #[inline]
            pub(crate) fn from_usize(val: usize) -> Self {
                debug_assert!(val < u32::MAX as usize, "arena index exceeds handle range");
                Self(val as u32)
            }

            #[inline]
            pub(crate) fn as_usize(self) -> usize {
                self.0 as usize
            }

            /// Returns `true` if this is the sentinel value.
            #[inline]
            pub(crate) fn is_none(self) -> bool {
                self == Self::NONE
            }

            /// Returns `true` if this is not the sentinel value.
            #[inline]
            pub(crate) fn is_some(self) -> bool {
                !self.is_none()
            }
        }
    };
}

define_handle! {
    /// Handle to one per-layer linked-list cell in the node arena.
    NodeRef
}

define_handle! {
    /// Handle to one logical entry (or sentinel) in the group arena.
    GroupRef
}
