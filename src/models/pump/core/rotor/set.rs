use super::{super::error::DuplicateNameError, Rotor};

/// An ordered collection of rotors with unique names.
///
/// Insertion order is preserved; it is the order rotors appear in reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RotorSet {
    rotors: Vec<Rotor>,
}

impl RotorSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rotor and returns a reference to it.
    ///
    /// # Errors
    ///
    /// Returns a [`DuplicateNameError`] if a rotor with the same name exists.
    /// The collection is left unchanged.
    pub fn insert(&mut self, rotor: Rotor) -> Result<&Rotor, DuplicateNameError> {
        if self.contains(rotor.name()) {
            return Err(DuplicateNameError {
                name: rotor.name().to_owned(),
            });
        }
        self.rotors.push(rotor);
        let index = self.rotors.len() - 1;
        Ok(&self.rotors[index])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rotor> {
        self.rotors.iter().find(|r| r.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Rotor> {
        self.rotors.iter_mut().find(|r| r.name() == name)
    }

    /// Removes and returns the named rotor.
    pub fn remove(&mut self, name: &str) -> Option<Rotor> {
        let index = self.rotors.iter().position(|r| r.name() == name)?;
        Some(self.rotors.remove(index))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rotor> {
        self.rotors.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rotors.iter().map(Rotor::name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rotors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rotors.is_empty()
    }
}

impl<'a> IntoIterator for &'a RotorSet {
    type Item = &'a Rotor;
    type IntoIter = std::slice::Iter<'a, Rotor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::pump::core::test_support::tabulated;

    #[test]
    fn names_are_unique() {
        let mut set = RotorSet::new();
        set.insert(tabulated("A", 1750.0, &[])).unwrap();
        set.insert(tabulated("B", 1750.0, &[])).unwrap();

        let err = set.insert(tabulated("A", 3500.0, &[])).unwrap_err();
        assert_eq!(err.name, "A");
        assert_eq!(set.len(), 2);
        assert!((set.get("A").unwrap().rpm_value() - 1750.0).abs() < 1e-9);
    }

    #[test]
    fn preserves_order_and_removes() {
        let mut set = RotorSet::new();
        for name in ["C", "A", "B"] {
            set.insert(tabulated(name, 1750.0, &[])).unwrap();
        }
        assert_eq!(set.names().collect::<Vec<_>>(), ["C", "A", "B"]);

        let removed = set.remove("A").unwrap();
        assert_eq!(removed.name(), "A");
        assert!(set.remove("A").is_none());
        assert_eq!(set.names().collect::<Vec<_>>(), ["C", "B"]);
    }
}
