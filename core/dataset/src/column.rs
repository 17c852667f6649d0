//! FILENAME: core/dataset/src/column.rs
//! PURPOSE: Interned storage for one categorical column.
//! CONTEXT: Each distinct label is stored once and referenced by id. Ids are
//! handed out in first-occurrence order, so iterating ids in ascending order
//! reproduces the order in which labels first appear in the source rows.

use rustc_hash::FxHashMap;

/// A reference to an interned label within a column's unique value store.
/// Using u32 to save memory (supports up to 4B unique values per column).
pub type ValueId = u32;

#[derive(Debug, Clone, Default)]
pub struct CategoryColumn {
    /// Column name from the header row.
    pub name: String,

    /// Map from label to its unique id (for deduplication during build).
    label_to_id: FxHashMap<String, ValueId>,

    /// Ordered list of unique labels (indexed by ValueId).
    id_to_label: Vec<String>,

    /// ValueIds in ascending lexicographic label order.
    sorted_ids: Vec<ValueId>,
}

impl CategoryColumn {
    pub fn new(name: String) -> Self {
        CategoryColumn {
            name,
            label_to_id: FxHashMap::default(),
            id_to_label: Vec::new(),
            sorted_ids: Vec::new(),
        }
    }

    /// Interns a label and returns its ValueId.
    /// If the label already exists, returns the existing id.
    pub fn intern(&mut self, label: String) -> ValueId {
        if let Some(&id) = self.label_to_id.get(&label) {
            return id;
        }

        let id = self.id_to_label.len() as ValueId;
        self.id_to_label.push(label.clone());
        self.label_to_id.insert(label, id);
        id
    }

    /// Freezes the column: computes the sorted order once the last row is in.
    pub(crate) fn seal(&mut self) {
        let labels = &self.id_to_label;
        let mut ids: Vec<ValueId> = (0..labels.len() as ValueId).collect();
        ids.sort_by(|&a, &b| labels[a as usize].cmp(&labels[b as usize]));
        self.sorted_ids = ids;
    }

    pub fn label(&self, id: ValueId) -> Option<&str> {
        self.id_to_label.get(id as usize).map(String::as_str)
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, label: &str) -> Option<ValueId> {
        self.label_to_id.get(label).copied()
    }

    pub fn unique_count(&self) -> usize {
        self.id_to_label.len()
    }

    pub fn sorted_ids(&self) -> &[ValueId] {
        &self.sorted_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_first_occurrence() {
        let mut column = CategoryColumn::new("district_name".to_string());
        assert_eq!(column.intern("Lahore".to_string()), 0);
        assert_eq!(column.intern("Attock".to_string()), 1);
        assert_eq!(column.intern("Lahore".to_string()), 0);
        column.seal();

        assert_eq!(column.unique_count(), 2);
        assert_eq!(column.label(1), Some("Attock"));
        assert_eq!(column.sorted_ids(), &[1, 0]);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let mut column = CategoryColumn::new("area_type".to_string());
        column.intern("Urban".to_string());
        assert_eq!(column.lookup("Urban"), Some(0));
        assert_eq!(column.lookup("urban"), None);
        assert_eq!(column.lookup("Urban "), None);
    }
}
