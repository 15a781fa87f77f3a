use serde::{Deserialize, Serialize};

/// A standard the user attached to the next worksheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedStandard {
    pub code: String,
    /// Statement, or the code when the standard has none.
    pub name: String,
    pub framework: String,
}

/// Ordered selection, unique by code.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StandardSelection {
    items: Vec<SelectedStandard>,
}

impl StandardSelection {
    /// Adds `item` unless its code is already selected. Returns whether it was added.
    pub fn add(&mut self, item: SelectedStandard) -> bool {
        if self.items.iter().any(|s| s.code == item.code) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Removes the entry with `code`. Returns whether anything was removed.
    pub fn remove(&mut self, code: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|s| s.code != code);
        self.items.len() != before
    }

    pub fn items(&self) -> &[SelectedStandard] {
        &self.items
    }

    /// Codes in selection order, as printed in worksheet footers.
    pub fn codes(&self) -> Vec<String> {
        self.items.iter().map(|s| s.code.clone()).collect()
    }
}
