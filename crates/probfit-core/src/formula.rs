//! Formula identifiers and references.

use std::borrow::Borrow;
use std::fmt;

use smallvec::{smallvec, SmallVec};

/// Identifier of a weighted formula in a log-linear model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FormulaId(String);

impl FormulaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormulaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FormulaId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FormulaId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FormulaId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The query formula of a requirement and the formulas whose weights drive it.
///
/// The driven formulas receive the weight corrections computed for the
/// requirement. Unless stated otherwise, a query drives its own weight.
///
/// # Example
///
/// ```
/// use probfit_core::{FormulaId, FormulaRef};
///
/// let own = FormulaRef::new("smokes");
/// assert_eq!(own.driven(), &[FormulaId::from("smokes")]);
///
/// let shared = FormulaRef::driving("cancer_given_smokes", ["smokes", "cancer"]);
/// assert_eq!(shared.query().as_str(), "cancer_given_smokes");
/// assert_eq!(shared.driven().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaRef {
    query: FormulaId,
    driven: SmallVec<[FormulaId; 2]>,
}

impl FormulaRef {
    /// A query whose own weight is adjusted.
    pub fn new(query: impl Into<FormulaId>) -> Self {
        let query = query.into();
        Self {
            driven: smallvec![query.clone()],
            query,
        }
    }

    /// A query whose probability is corrected through other formulas' weights.
    ///
    /// An empty `driven` list falls back to the query formula itself.
    pub fn driving<I, F>(query: impl Into<FormulaId>, driven: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FormulaId>,
    {
        let query = query.into();
        let mut ids: SmallVec<[FormulaId; 2]> = SmallVec::new();
        for id in driven {
            let id = id.into();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            ids.push(query.clone());
        }
        Self { query, driven: ids }
    }

    pub fn query(&self) -> &FormulaId {
        &self.query
    }

    pub fn driven(&self) -> &[FormulaId] {
        &self.driven
    }

    /// Every formula this reference touches: the query followed by the
    /// driven formulas not equal to it.
    pub fn referenced(&self) -> impl Iterator<Item = &FormulaId> {
        std::iter::once(&self.query).chain(self.driven.iter().filter(|id| **id != self.query))
    }
}

impl From<FormulaId> for FormulaRef {
    fn from(query: FormulaId) -> Self {
        Self::new(query)
    }
}

impl From<&str> for FormulaRef {
    fn from(query: &str) -> Self {
        Self::new(query)
    }
}

impl From<String> for FormulaRef {
    fn from(query: String) -> Self {
        Self::new(query)
    }
}
