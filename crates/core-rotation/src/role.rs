//! Rotation roles and their class vocabulary.
//!
//! The class names are the only contract external styling relies on.

bitflags::bitflags! {
    /// Set of rotation roles carried by one slide. Empty means "none".
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Roles: u8 {
        const ACTIVE = 0b001;
        const NEXT   = 0b010;
        const PREV   = 0b100;
    }
}

impl Roles {
    /// Class names in a stable order (`active`, `next`, `prev`).
    pub fn class_names(self) -> impl Iterator<Item = &'static str> {
        [
            (Roles::ACTIVE, "active"),
            (Roles::NEXT, "next"),
            (Roles::PREV, "prev"),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
    }

    /// Space-separated class attribute value.
    pub fn class_attr(self) -> String {
        self.class_names().collect::<Vec<_>>().join(" ")
    }
}
