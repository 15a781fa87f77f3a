use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standard {
    pub code: String,
    #[serde(default)]
    pub statement: String,
    /// Grade band labels, e.g. `"3-5"`. Empty means "any grade".
    #[serde(default)]
    pub grades: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Framework {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub grade_bands: Vec<String>,
    #[serde(default)]
    pub standards: Vec<Standard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardsPack {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub frameworks: Vec<Framework>,
}

impl StandardsPack {
    /// Parses an imported pack document. A pack without a non-blank `id` is rejected.
    pub fn from_json(value: Value) -> Result<Self, AppError> {
        let has_id = value
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.trim().is_empty());
        if !has_id {
            return Err(AppError::MalformedPack("Pack missing 'id'".to_string()));
        }
        serde_json::from_value(value)
            .map_err(|e| AppError::MalformedPack(format!("Invalid pack document: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_accepts_minimal_pack() {
        let pack = StandardsPack::from_json(json!({ "id": "p1" })).unwrap();
        assert_eq!(pack.id, "p1");
        assert!(pack.frameworks.is_empty());
    }

    #[test]
    fn test_from_json_parses_frameworks_and_standards() {
        let pack = StandardsPack::from_json(json!({
            "id": "ccss-math",
            "name": "CCSS Math (sample)",
            "version": "2024-01",
            "scope": "national",
            "frameworks": [{
                "id": "ccss-math-3-5",
                "name": "Math 3-5",
                "subjects": ["Math"],
                "grade_bands": ["3-5"],
                "standards": [{
                    "code": "4.NF.1",
                    "statement": "Explain why fractions are equivalent.",
                    "grades": ["3-5"],
                    "tags": ["fractions"]
                }]
            }]
        }))
        .unwrap();
        let standard = &pack.frameworks[0].standards[0];
        assert_eq!(standard.code, "4.NF.1");
        assert_eq!(standard.tags, vec!["fractions".to_string()]);
    }

    #[test]
    fn test_from_json_rejects_missing_or_blank_id() {
        for value in [json!({ "name": "No id" }), json!({ "id": "  " }), json!({ "id": 7 })] {
            let result = StandardsPack::from_json(value);
            assert!(matches!(result, Err(AppError::MalformedPack(_))));
        }
    }

    #[test]
    fn test_from_json_rejects_wrong_shape() {
        let result = StandardsPack::from_json(json!({ "id": "p1", "frameworks": "nope" }));
        assert!(matches!(result, Err(AppError::MalformedPack(_))));
    }
}
