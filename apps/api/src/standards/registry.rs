//! In-memory registry of loaded standards packs.
//!
//! Packs are keyed by id with last-write-wins. Frameworks are flattened into one
//! browsable list, each tagged with the id of the pack it came from. Re-registering a
//! pack id replaces the pack but appends its frameworks again.

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::standards::models::{Framework, Standard, StandardsPack};

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredFramework {
    #[serde(flatten)]
    pub framework: Framework,
    #[serde(rename = "_packId")]
    pub pack_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackSummary {
    pub id: String,
    pub name: String,
    pub version: String,
    pub scope: String,
    pub framework_count: usize,
}

/// Entry for the framework picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameworkOption {
    pub id: String,
    pub label: String,
    #[serde(rename = "_packId")]
    pub pack_id: String,
}

/// Filters applied when browsing one framework's standards.
#[derive(Debug, Clone, Default)]
pub struct StandardFilter {
    pub grade_band: Option<String>,
    pub query: Option<String>,
}

impl StandardFilter {
    /// Grade filtering only applies to standards that list grades; the query is a
    /// case-insensitive substring match over code, statement and tags.
    pub fn matches(&self, standard: &Standard) -> bool {
        if let Some(band) = self.grade_band.as_deref().filter(|b| !b.is_empty()) {
            if !standard.grades.is_empty() && !standard.grades.iter().any(|g| g == band) {
                return false;
            }
        }
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            let haystack = format!(
                "{} {} {}",
                standard.code,
                standard.statement,
                standard.tags.join(" ")
            )
            .to_lowercase();
            return haystack.contains(&query.to_lowercase());
        }
        true
    }
}

#[derive(Debug, Default)]
pub struct PackRegistry {
    packs: HashMap<String, StandardsPack>,
    frameworks: Vec<RegisteredFramework>,
}

impl PackRegistry {
    /// Registers a pack and returns how many frameworks it added.
    pub fn register(&mut self, pack: StandardsPack) -> usize {
        let added = pack.frameworks.len();
        self.frameworks
            .extend(pack.frameworks.iter().cloned().map(|framework| RegisteredFramework {
                framework,
                pack_id: pack.id.clone(),
            }));
        info!(pack_id = %pack.id, frameworks = added, "registered standards pack");
        self.packs.insert(pack.id.clone(), pack);
        added
    }

    pub fn pack(&self, id: &str) -> Option<&StandardsPack> {
        self.packs.get(id)
    }

    pub fn pack_count(&self) -> usize {
        self.packs.len()
    }

    /// Pack summaries sorted by id.
    pub fn summaries(&self) -> Vec<PackSummary> {
        let mut summaries: Vec<_> = self
            .packs
            .values()
            .map(|p| PackSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                version: p.version.clone(),
                scope: p.scope.clone(),
                framework_count: p.frameworks.len(),
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub fn frameworks(&self) -> &[RegisteredFramework] {
        &self.frameworks
    }

    /// Picker entries labelled `"{framework} ({pack name})"`, in registration order.
    pub fn framework_options(&self) -> Vec<FrameworkOption> {
        self.frameworks
            .iter()
            .map(|rf| {
                let pack_name = self
                    .packs
                    .get(&rf.pack_id)
                    .map(|p| p.name.as_str())
                    .filter(|n| !n.is_empty())
                    .unwrap_or("Pack");
                FrameworkOption {
                    id: rf.framework.id.clone(),
                    label: format!("{} ({pack_name})", rf.framework.name),
                    pack_id: rf.pack_id.clone(),
                }
            })
            .collect()
    }

    /// First registered framework with this id.
    pub fn find_framework(&self, id: &str) -> Option<&RegisteredFramework> {
        self.frameworks.iter().find(|rf| rf.framework.id == id)
    }

    /// Standards of a framework that pass `filter`; `None` if the framework is unknown.
    pub fn search(&self, framework_id: &str, filter: &StandardFilter) -> Option<Vec<&Standard>> {
        self.find_framework(framework_id).map(|rf| {
            rf.framework
                .standards
                .iter()
                .filter(|s| filter.matches(s))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard(code: &str, statement: &str, grades: &[&str], tags: &[&str]) -> Standard {
        Standard {
            code: code.to_string(),
            statement: statement.to_string(),
            grades: grades.iter().map(|s| s.to_string()).collect(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn pack(id: &str, name: &str, framework_ids: &[&str]) -> StandardsPack {
        StandardsPack {
            id: id.to_string(),
            name: name.to_string(),
            version: "1".to_string(),
            scope: "state".to_string(),
            frameworks: framework_ids
                .iter()
                .map(|fid| Framework {
                    id: fid.to_string(),
                    name: format!("Framework {fid}"),
                    subjects: vec!["Math".to_string()],
                    grade_bands: vec!["3-5".to_string()],
                    standards: vec![
                        standard("4.NF.1", "Equivalent fractions", &["3-5"], &["fractions"]),
                        standard("6.RP.1", "Ratio language", &["6-8"], &["ratios"]),
                        standard("MP.1", "Make sense of problems", &[], &["practice"]),
                    ],
                })
                .collect(),
        }
    }

    #[test]
    fn test_same_pack_id_last_write_wins_and_frameworks_accumulate() {
        let mut registry = PackRegistry::default();
        registry.register(pack("p1", "First", &["fw-a"]));
        registry.register(pack("p1", "Second", &["fw-b"]));

        assert_eq!(registry.pack_count(), 1);
        assert_eq!(registry.pack("p1").unwrap().name, "Second");
        let ids: Vec<_> = registry.frameworks().iter().map(|f| f.framework.id.as_str()).collect();
        assert_eq!(ids, vec!["fw-a", "fw-b"]);
        assert!(registry.frameworks().iter().all(|f| f.pack_id == "p1"));
    }

    #[test]
    fn test_framework_options_label_with_pack_name() {
        let mut registry = PackRegistry::default();
        registry.register(pack("p1", "CCSS Math", &["fw-a"]));
        registry.register(pack("p2", "", &["fw-b"]));
        let options = registry.framework_options();
        assert_eq!(options[0].label, "Framework fw-a (CCSS Math)");
        assert_eq!(options[1].label, "Framework fw-b (Pack)");
        assert_eq!(options[1].pack_id, "p2");
    }

    #[test]
    fn test_registered_framework_serializes_pack_id_tag() {
        let mut registry = PackRegistry::default();
        registry.register(pack("p1", "CCSS Math", &["fw-a"]));
        let json = serde_json::to_value(&registry.frameworks()[0]).unwrap();
        assert_eq!(json["_packId"], "p1");
        assert_eq!(json["id"], "fw-a");
    }

    #[test]
    fn test_search_by_grade_band_keeps_ungraded_standards() {
        let mut registry = PackRegistry::default();
        registry.register(pack("p1", "CCSS Math", &["fw-a"]));
        let filter = StandardFilter {
            grade_band: Some("3-5".to_string()),
            query: None,
        };
        let codes: Vec<_> = registry
            .search("fw-a", &filter)
            .unwrap()
            .iter()
            .map(|s| s.code.as_str())
            .collect();
        assert_eq!(codes, vec!["4.NF.1", "MP.1"]);
    }

    #[test]
    fn test_search_query_matches_code_statement_and_tags() {
        let mut registry = PackRegistry::default();
        registry.register(pack("p1", "CCSS Math", &["fw-a"]));
        let by_tag = StandardFilter {
            grade_band: None,
            query: Some("RATIOS".to_string()),
        };
        assert_eq!(registry.search("fw-a", &by_tag).unwrap()[0].code, "6.RP.1");

        let by_code = StandardFilter {
            grade_band: None,
            query: Some("nf.1".to_string()),
        };
        assert_eq!(registry.search("fw-a", &by_code).unwrap().len(), 1);
    }

    #[test]
    fn test_search_unknown_framework_is_none() {
        let registry = PackRegistry::default();
        assert!(registry.search("missing", &StandardFilter::default()).is_none());
    }

    #[test]
    fn test_summaries_sorted_by_id() {
        let mut registry = PackRegistry::default();
        registry.register(pack("zeta", "Z", &["fw-z"]));
        registry.register(pack("alpha", "A", &["fw-a", "fw-b"]));
        let summaries = registry.summaries();
        assert_eq!(summaries[0].id, "alpha");
        assert_eq!(summaries[0].framework_count, 2);
        assert_eq!(summaries[1].id, "zeta");
    }
}
