//! Code for handling IDs
use std::collections::HashSet;

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            std::hash::Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            serde::Deserialize,
            Debug,
            serde::Serialize,
        )]
        /// An ID type (e.g. `PlantID`, `CompanyID`, etc.)
        pub struct $name(pub std::sync::Arc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::sync::Arc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::sync::Arc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::sync::Arc::from(id))
            }

            /// The ID as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}
pub(crate) use define_id_type;

/// Interns IDs so that records referring to the same entity share one allocation
pub struct IDInterner<ID> {
    ids: HashSet<ID>,
}

impl<ID> Default for IDInterner<ID> {
    fn default() -> Self {
        Self {
            ids: HashSet::new(),
        }
    }
}

impl<ID> IDInterner<ID>
where
    ID: Clone + Eq + std::hash::Hash + std::borrow::Borrow<str> + for<'a> From<&'a str>,
{
    /// Create an empty interner
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the shared copy of the ID with the given string representation, creating it if needed
    pub fn intern(&mut self, id: &str) -> ID {
        if let Some(existing) = self.ids.get(id) {
            return existing.clone();
        }

        let new_id = ID::from(id);
        self.ids.insert(new_id.clone());
        new_id
    }
}

#[cfg(test)]
define_id_type!(GenericID);
