//! Interned identifiers for attribute names and node labels.
//!
//! Attribute maps are keyed by [`Id`] so that repeated lookups of the same
//! column name (`"size"`, `"label"`, ...) compare a symbol instead of a string.

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner shared by every [`Id`].
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock");
    f(&mut interner)
}

/// Cheap, copyable identifier backed by a global string interner.
///
/// # Examples
///
/// ```
/// use trellis_core::identifier::Id;
///
/// let size = Id::new("size");
/// assert_eq!(size, "size");
/// assert_eq!(size, Id::new("size"));
/// assert_eq!(size.to_string(), "size");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Interns `name` and returns its identifier.
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Creates an identifier for an unnamed element from its index.
    ///
    /// ```
    /// use trellis_core::identifier::Id;
    ///
    /// assert_eq!(Id::from_anonymous(7), "__7");
    /// ```
    pub fn from_anonymous(idx: usize) -> Self {
        Self::new(&format!("__{idx}"))
    }

    /// Returns an owned copy of the interned string.
    pub fn as_string(&self) -> String {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .expect("Symbol should exist in interner")
                .to_owned()
        })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| interner.resolve(self.0) == Some(other))
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
