//! Identifiers for the locations covered by the trace files.
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

/// The name of a location, as given in the header row of a trace file.
///
/// Maps keyed by `LocationID` can be queried with a `&str`.
#[derive(Clone, Hash, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LocationID(pub Rc<str>);

impl LocationID {
    /// Create a new ID from a string slice
    pub fn new(id: &str) -> Self {
        Self(Rc::from(id))
    }
}

impl Borrow<str> for LocationID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationID {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for LocationID {
    fn from(s: String) -> Self {
        Self(Rc::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn test_lookup_by_str() {
        let map: IndexMap<LocationID, u32> = [("REZ-N1".into(), 1)].into_iter().collect();
        assert_eq!(map.get("REZ-N1"), Some(&1));
        assert_eq!(LocationID::new("REZ-N1").to_string(), "REZ-N1");
    }
}
