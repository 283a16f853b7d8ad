//! Collections addressed by element identity
//!
//! [`ReducerExt::for_each`](crate::reducer::ReducerExt::for_each) and the
//! runtime's element scoping look elements up by id through
//! [`IdentifiedCollection`]. `Vec<T>` supports it with a linear scan;
//! [`IdentifiedArray`] keeps insertion order and a hash index.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::Index;

/// A value with a stable identity
pub trait Identifiable {
    /// The identity type
    type Id: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static;

    /// The element's identity
    fn id(&self) -> Self::Id;
}

/// A collection whose elements can be looked up by id
pub trait IdentifiedCollection {
    /// Element type
    type Element: Identifiable;

    /// Borrow the element with `id`
    fn element(&self, id: &<Self::Element as Identifiable>::Id) -> Option<&Self::Element>;

    /// Mutably borrow the element with `id`
    fn element_mut(&mut self, id: &<Self::Element as Identifiable>::Id) -> Option<&mut Self::Element>;
}

impl<T: Identifiable> IdentifiedCollection for Vec<T> {
    type Element = T;

    fn element(&self, id: &T::Id) -> Option<&T> {
        self.iter().find(|element| element.id() == *id)
    }

    fn element_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        self.iter_mut().find(|element| element.id() == *id)
    }
}

/// Ordered collection of identifiable elements with O(1) lookup by id
///
/// Inserting an element whose id is already present replaces it in place.
#[derive(Clone)]
pub struct IdentifiedArray<T: Identifiable> {
    elements: Vec<T>,
    index: HashMap<T::Id, usize>,
}

impl<T: Identifiable> IdentifiedArray<T> {
    /// Create an empty array
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the array is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append `element`, or replace the element with the same id
    ///
    /// Returns the replaced element.
    pub fn push(&mut self, element: T) -> Option<T> {
        let id = element.id();
        if let Some(&position) = self.index.get(&id) {
            return Some(std::mem::replace(&mut self.elements[position], element));
        }
        self.index.insert(id, self.elements.len());
        self.elements.push(element);
        None
    }

    /// Insert `element` at `position`, or replace the element with the same id
    ///
    /// `position` is clamped to the length.
    pub fn insert(&mut self, position: usize, element: T) -> Option<T> {
        let id = element.id();
        if let Some(&existing) = self.index.get(&id) {
            return Some(std::mem::replace(&mut self.elements[existing], element));
        }
        let position = position.min(self.elements.len());
        self.elements.insert(position, element);
        self.reindex();
        None
    }

    /// Remove the element with `id`
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let position = self.index.remove(id)?;
        let removed = self.elements.remove(position);
        self.reindex();
        Some(removed)
    }

    /// Keep only elements matching `keep`
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.elements.retain(keep);
        self.reindex();
    }

    /// Whether an element with `id` exists
    #[must_use]
    pub fn contains(&self, id: &T::Id) -> bool {
        self.index.contains_key(id)
    }

    /// Position of the element with `id`
    #[must_use]
    pub fn position(&self, id: &T::Id) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Ids in order
    pub fn ids(&self) -> impl Iterator<Item = T::Id> + '_ {
        self.elements.iter().map(Identifiable::id)
    }

    /// Iterate elements in order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    /// Iterate elements mutably in order
    ///
    /// Changing an element's id through this iterator leaves the index stale.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.elements.iter_mut()
    }

    /// Borrow the elements as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    fn reindex(&mut self) {
        self.index = self
            .elements
            .iter()
            .enumerate()
            .map(|(position, element)| (element.id(), position))
            .collect();
    }
}

impl<T: Identifiable> IdentifiedCollection for IdentifiedArray<T> {
    type Element = T;

    fn element(&self, id: &T::Id) -> Option<&T> {
        self.index.get(id).and_then(|&position| self.elements.get(position))
    }

    fn element_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        let position = *self.index.get(id)?;
        self.elements.get_mut(position)
    }
}

impl<T: Identifiable> Default for IdentifiedArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identifiable + fmt::Debug> fmt::Debug for IdentifiedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.elements).finish()
    }
}

impl<T: Identifiable + PartialEq> PartialEq for IdentifiedArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl<T: Identifiable + Eq> Eq for IdentifiedArray<T> {}

impl<T: Identifiable> Index<usize> for IdentifiedArray<T> {
    type Output = T;

    fn index(&self, position: usize) -> &T {
        &self.elements[position]
    }
}

impl<T: Identifiable> FromIterator<T> for IdentifiedArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        for element in iter {
            array.push(element);
        }
        array
    }
}

impl<T: Identifiable> From<Vec<T>> for IdentifiedArray<T> {
    fn from(elements: Vec<T>) -> Self {
        elements.into_iter().collect()
    }
}

impl<T: Identifiable> IntoIterator for IdentifiedArray<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a, T: Identifiable> IntoIterator for &'a IdentifiedArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T: Identifiable + Serialize> Serialize for IdentifiedArray<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.elements.serialize(serializer)
    }
}

impl<'de, T: Identifiable + Deserialize<'de>> Deserialize<'de> for IdentifiedArray<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from)
    }
}
