use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Reporter,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Reporter => write!(f, "reporter"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shooter {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub club: Option<String>,
    #[serde(default)]
    pub nra_number: Option<String>,
}

/// Body for creating or replacing a shooter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShooterInput {
    pub name: String,
    #[serde(default)]
    pub club: Option<String>,
    #[serde(default)]
    pub nra_number: Option<String>,
}

/// One fired (or skipped) stage of a score.
///
/// `None` means the shooter did not fire the stage. It is never the same
/// thing as a score of zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub score: Option<u32>,
    #[serde(default)]
    pub x_count: Option<u32>,
}

impl Stage {
    pub fn fired(name: &str, score: u32, x_count: u32) -> Self {
        Self {
            name: name.to_string(),
            score: Some(score),
            x_count: Some(x_count),
        }
    }

    pub fn not_fired(name: &str) -> Self {
        Self {
            name: name.to_string(),
            score: None,
            x_count: None,
        }
    }
}

/// Named subtotals of a match type, in the order they were defined.
///
/// On the wire this is a JSON object (`{"Slow Fire": ["SF1", "SF2"], ...}`)
/// whose key order matters.
pub type SubtotalMappings = IndexMap<String, Vec<String>>;

/// Servers send `null` for a match type without subtotals.
fn nullable_mappings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SubtotalMappings, D::Error> {
    Ok(Option::<SubtotalMappings>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
pub(crate) fn subtotals(pairs: &[(&str, &[&str])]) -> SubtotalMappings {
    pairs
        .iter()
        .map(|(name, sources)| {
            (
                name.to_string(),
                sources.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}

/// Configuration of one match type entered in a match, e.g. the second
/// National Match Course of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTypeConfig {
    #[serde(rename = "type")]
    pub kind: String,
    /// User-assigned label, unique within the match. Scores point at it.
    pub instance_name: String,
    pub entry_stages: Vec<String>,
    #[serde(default, deserialize_with = "nullable_mappings")]
    pub subtotal_mappings: SubtotalMappings,
    pub max_score: u32,
    #[serde(default)]
    pub calibers: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateType {
    #[serde(rename = "1800 (2x900)")]
    TwoByNineHundred,
    #[serde(rename = "1800 (3x600)")]
    ThreeBySixHundred,
    #[serde(rename = "2700 (3x900)")]
    ThreeByNineHundred,
}

impl AggregateType {
    pub fn max_score(&self) -> u32 {
        match self {
            AggregateType::TwoByNineHundred | AggregateType::ThreeBySixHundred => 1800,
            AggregateType::ThreeByNineHundred => 2700,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AggregateType::TwoByNineHundred => "1800 (2x900)",
            AggregateType::ThreeBySixHundred => "1800 (3x600)",
            AggregateType::ThreeByNineHundred => "2700 (3x900)",
        }
    }
}

impl fmt::Display for AggregateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: u64,
    pub name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub match_types: Vec<MatchTypeConfig>,
    #[serde(default)]
    pub aggregate_type: Option<AggregateType>,
}

impl Match {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn match_type(&self, instance_name: &str) -> Option<&MatchTypeConfig> {
        self.match_types
            .iter()
            .find(|mt| mt.instance_name == instance_name)
    }
}

/// Body for creating or replacing a match. Also the format of the YAML
/// file accepted by `scorebook matches add`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchInput {
    pub name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub location: String,
    pub match_types: Vec<MatchTypeConfig>,
    #[serde(default)]
    pub aggregate_type: Option<AggregateType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub shooter_id: u64,
    pub match_id: u64,
    pub match_type_instance: String,
    pub caliber: String,
    pub stages: Vec<Stage>,
}

impl Score {
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCH_JSON: &str = r#"{
        "id": 12,
        "name": "Spring Regional",
        "date": "2024-04-13",
        "location": "Range 3",
        "aggregate_type": "2700 (3x900)",
        "match_types": [
            {
                "type": "900",
                "instance_name": "900 1",
                "entry_stages": ["SF1", "SF2", "TF1", "TF2", "RF1", "RF2", "NMC"],
                "subtotal_mappings": {
                    "Slow Fire": ["SF1", "SF2"],
                    "Timed Fire": ["TF1", "TF2"],
                    "Rapid Fire": ["RF1", "RF2"]
                },
                "max_score": 900,
                "calibers": ["TWENTYTWO"]
            }
        ]
    }"#;

    #[test]
    fn test_match_decodes() {
        let m: Match = serde_json::from_str(MATCH_JSON).unwrap();
        assert_eq!(m.id, 12);
        assert_eq!(m.year(), 2024);
        assert_eq!(m.aggregate_type, Some(AggregateType::ThreeByNineHundred));
        let mt = m.match_type("900 1").unwrap();
        assert_eq!(mt.kind, "900");
        assert_eq!(mt.entry_stages.len(), 7);
        assert!(mt.calibers.contains("TWENTYTWO"));
    }

    #[test]
    fn test_subtotal_mappings_keep_document_order() {
        let m: Match = serde_json::from_str(MATCH_JSON).unwrap();
        let names: Vec<&str> = m.match_types[0]
            .subtotal_mappings
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, vec!["Slow Fire", "Timed Fire", "Rapid Fire"]);

        let encoded = serde_json::to_string(&m.match_types[0].subtotal_mappings).unwrap();
        assert_eq!(
            encoded,
            r#"{"Slow Fire":["SF1","SF2"],"Timed Fire":["TF1","TF2"],"Rapid Fire":["RF1","RF2"]}"#
        );
    }

    #[test]
    fn test_subtotal_mappings_null_is_empty() {
        let json = r#"{"type":"NMC","instance_name":"NMC 1","entry_stages":["SF","TF","RF"],
            "subtotal_mappings":null,"max_score":300}"#;
        let mt: MatchTypeConfig = serde_json::from_str(json).unwrap();
        assert!(mt.subtotal_mappings.is_empty());
        assert!(mt.calibers.is_empty());
    }

    #[test]
    fn test_subtotal_mappings_missing_is_empty() {
        let json = r#"{"type":"NMC","instance_name":"NMC 1","entry_stages":["SF"],"max_score":100}"#;
        let mt: MatchTypeConfig = serde_json::from_str(json).unwrap();
        assert!(mt.subtotal_mappings.is_empty());
    }

    #[test]
    fn test_match_without_aggregate() {
        let json = r#"{"id":1,"name":"League Night","date":"2023-11-02","match_types":[]}"#;
        let m: Match = serde_json::from_str(json).unwrap();
        assert!(m.aggregate_type.is_none());
        assert_eq!(m.location, "");
    }

    #[test]
    fn test_stage_null_score_decodes() {
        let json = r#"{"name":"TF","score":null,"x_count":null}"#;
        let stage: Stage = serde_json::from_str(json).unwrap();
        assert_eq!(stage, Stage::not_fired("TF"));
    }

    #[test]
    fn test_match_input_from_yaml() {
        let yaml = r#"
name: Club 900
date: "2024-06-01"
location: Home range
aggregate_type: "1800 (2x900)"
match_types:
  - type: "900"
    instance_name: "900 .22"
    entry_stages: [SF1, SF2, TF, RF]
    subtotal_mappings:
      Slow Fire: [SF1, SF2]
      Timed Fire: [TF]
    max_score: 900
    calibers: [TWENTYTWO]
"#;
        let input: MatchInput = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(input.aggregate_type, Some(AggregateType::TwoByNineHundred));
        let mappings = &input.match_types[0].subtotal_mappings;
        assert_eq!(
            mappings.get("Slow Fire"),
            Some(&vec!["SF1".to_string(), "SF2".to_string()])
        );
        assert_eq!(mappings.len(), 2);
    }

    #[test]
    fn test_role_wire_names() {
        let user: User = serde_json::from_str(r#"{"username":"ana","role":"reporter"}"#).unwrap();
        assert_eq!(user.role, Role::Reporter);
        assert_eq!(user.role.to_string(), "reporter");
    }
}
