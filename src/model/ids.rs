//! Typed handles into the document arenas.
//!
//! Links between nodes (a structure's base, a field's owner, a value's
//! enumeration) are plain indices into the owning [`Document`] rather than
//! pointers, so they cannot dangle and form no ownership cycles.
//!
//! [`Document`]: super::Document

use std::fmt;

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                Self(index as u32)
            }
        }
    };
}

arena_id!(
    /// Handle of a [`Structure`](super::Structure).
    StructureId
);
arena_id!(
    /// Handle of an [`Enumeration`](super::Enumeration), top-level or nested.
    EnumerationId
);
arena_id!(
    /// Handle of an [`Identifier`](super::Identifier).
    IdentifierId
);
arena_id!(
    /// Handle of a [`Specimen`](super::Specimen).
    SpecimenId
);
arena_id!(
    /// Handle of an [`Interface`](super::Interface).
    InterfaceId
);
arena_id!(
    /// Handle of a [`Factory`](super::Factory).
    FactoryId
);
arena_id!(
    /// Handle of a bound [`TemplateInstance`](super::TemplateInstance).
    TemplateId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_plain_indices() {
        let a = StructureId::new(3);
        assert_eq!(a.index(), 3);
        assert_eq!(StructureId::from(3usize), a);
        assert_eq!(format!("{:?}", a), "StructureId(3)");
        assert_eq!(std::mem::size_of::<TemplateId>(), 4);
    }
}
