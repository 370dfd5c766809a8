/// Chromosome name registry for mapping between integer IDs and string names
///
/// Locus keys carry the integer ID so that index lookups never hash a string.
use std::collections::HashMap;

/// Registry that interns chromosome names in first-appearance order
#[derive(Debug, Default, Clone)]
pub struct ChromosomeRegistry {
    /// Names indexed by ID
    names: Vec<String>,

    /// Map from name to ID
    name_to_id: HashMap<String, u32>,
}

impl ChromosomeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or assign an ID for a chromosome name
    pub fn get_or_assign_id(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }

        let id = self.names.len() as u32;
        self.names.push(name.to_string());
        self.name_to_id.insert(name.to_string(), id);
        id
    }

    /// Look up the ID of an already registered name
    pub fn get_id(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }

    /// Get chromosome name by ID
    pub fn get_name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(|s| s.as_str())
    }

    /// Names in first-appearance order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
