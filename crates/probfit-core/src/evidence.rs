//! Evidence assignments.

use std::collections::BTreeMap;
use std::fmt;

/// Truth values observed for ground atoms, ordered by atom name.
///
/// # Example
///
/// ```
/// use probfit_core::Evidence;
///
/// let evidence = Evidence::new().with("friends(anna,bob)", true).with("smokes(bob)", false);
/// assert_eq!(evidence.get("smokes(bob)"), Some(false));
/// assert_eq!(evidence.get("smokes(anna)"), None);
/// assert_eq!(evidence.to_string(), "friends(anna,bob)=true, smokes(bob)=false");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Evidence {
    atoms: BTreeMap<String, bool>,
}

impl Evidence {
    /// Creates empty evidence (an unconditional query).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observation, replacing any previous value for the atom.
    pub fn with(mut self, atom: impl Into<String>, value: bool) -> Self {
        self.set(atom, value);
        self
    }

    pub fn set(&mut self, atom: impl Into<String>, value: bool) -> Option<bool> {
        self.atoms.insert(atom.into(), value)
    }

    pub fn get(&self, atom: &str) -> Option<bool> {
        self.atoms.get(atom).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.atoms.iter().map(|(atom, value)| (atom.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (atom, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{atom}={value}")?;
        }
        Ok(())
    }
}

impl<A: Into<String>> FromIterator<(A, bool)> for Evidence {
    fn from_iter<I: IntoIterator<Item = (A, bool)>>(iter: I) -> Self {
        Self {
            atoms: iter
                .into_iter()
                .map(|(atom, value)| (atom.into(), value))
                .collect(),
        }
    }
}
