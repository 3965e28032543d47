//! Atom table for normalized tag names.
//!
//! The ancestor stack and stop sets compare tag names constantly during
//! mis-nesting recovery; interning makes those comparisons integer equality.

use std::collections::HashMap;

/// Opaque atom identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(u32);

/// Parse-scoped atom table.
///
/// Invariant: names are stored exactly as given; normalization (upper-casing
/// outside strict mode) happens before interning, so equal atoms mean equal
/// normalized names.
#[derive(Debug, Default)]
pub struct AtomTable {
    atoms: Vec<Box<str>>,
    map: HashMap<Box<str>, AtomId>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self {
            atoms: Vec::new(),
            map: HashMap::new(),
        }
    }

    pub fn intern(&mut self, name: &str) -> AtomId {
        if let Some(id) = self.map.get(name) {
            return *id;
        }
        let id = AtomId(u32::try_from(self.atoms.len()).expect("atom table overflow"));
        let atom: Box<str> = Box::from(name);
        self.atoms.push(atom.clone());
        self.map.insert(atom, id);
        id
    }

    pub fn resolve(&self, id: AtomId) -> &str {
        &self.atoms[id.0 as usize]
    }
}
