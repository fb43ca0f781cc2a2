use std::collections::HashSet;
use std::fs;
use std::ops::Deref;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::BuildError;

/// One catalogue entry as it appears in the upstream JSON feed.
///
/// Fields the build does not know about are kept in `extra` and written back
/// out unchanged in the snapshot. Leniently decoded fields are wrapped in
/// [`Verbatim`] so the snapshot carries the input JSON rather than the decoded
/// view.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DistroRecord {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_default")]
    pub family: String,
    #[serde(default, deserialize_with = "null_default")]
    pub badges: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub website: String,
    #[serde(default, deserialize_with = "null_default")]
    pub download_url: String,
    #[serde(default, deserialize_with = "null_default")]
    pub logo: String,
    #[serde(default, deserialize_with = "null_default")]
    pub screenshots: Vec<String>,
    #[serde(default, deserialize_with = "verbatim_section")]
    pub hardware_requirements: Verbatim<HardwareRequirements>,
    #[serde(default, deserialize_with = "verbatim_section")]
    pub benchmarks: Verbatim<Benchmarks>,
    #[serde(default, deserialize_with = "null_default")]
    pub target_users: Vec<String>,
    #[serde(default, deserialize_with = "verbatim_section")]
    pub compatibility: Verbatim<Compatibility>,
    #[serde(default, deserialize_with = "verbatim_text", skip_serializing_if = "Verbatim::is_absent")]
    pub origin: Verbatim<Option<String>>,
    #[serde(default, deserialize_with = "verbatim_text", skip_serializing_if = "Verbatim::is_absent")]
    pub first_release: Verbatim<Option<String>>,
    #[serde(default, deserialize_with = "null_default")]
    pub architecture: Vec<String>,
    #[serde(default, deserialize_with = "verbatim_text", skip_serializing_if = "Verbatim::is_absent")]
    pub desktop: Verbatim<Option<String>>,
    #[serde(default, deserialize_with = "verbatim_text", skip_serializing_if = "Verbatim::is_absent")]
    pub package_manager: Verbatim<Option<String>>,
    #[serde(default, deserialize_with = "verbatim_text", skip_serializing_if = "Verbatim::is_absent")]
    pub package_manager_explained: Verbatim<Option<String>>,
    #[serde(default, deserialize_with = "verbatim_text", skip_serializing_if = "Verbatim::is_absent")]
    pub status: Verbatim<Option<String>>,
    #[serde(default, deserialize_with = "null_default")]
    pub pros: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub cons: Vec<String>,
    #[serde(default, deserialize_with = "verbatim_text", skip_serializing_if = "Verbatim::is_absent")]
    pub developer: Verbatim<Option<String>>,
    #[serde(default, deserialize_with = "verbatim_text", skip_serializing_if = "Verbatim::is_absent")]
    pub seo_description: Verbatim<Option<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HardwareRequirements {
    #[serde(default, deserialize_with = "null_default")]
    pub minimum: HardwareTier,
    #[serde(default, deserialize_with = "null_default")]
    pub recommended: HardwareTier,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HardwareTier {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub ram: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

/// Benchmark signals; scores are nominally 0-10.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Benchmarks {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub boot_time: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub resource_usage: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub stability_score: u32,
    #[serde(default, deserialize_with = "lenient_score")]
    pub beginner_score: u32,
    #[serde(default, deserialize_with = "lenient_score")]
    pub power_user_score: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Compatibility {
    #[serde(default, deserialize_with = "null_default")]
    pub best_for: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub not_ideal_for: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub use_cases: Vec<String>,
}

/// A decoded field that serializes back as the JSON it was decoded from.
///
/// Values built in code (via `From`) have no source and serialize as decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verbatim<T> {
    value: T,
    source: Option<Value>,
}

impl<T> Verbatim<Option<T>> {
    /// Missing from the input and never set.
    pub fn is_absent(&self) -> bool {
        self.source.is_none() && self.value.is_none()
    }
}

impl<T> Deref for Verbatim<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> From<T> for Verbatim<T> {
    fn from(value: T) -> Self {
        Self {
            value,
            source: None,
        }
    }
}

impl<T: Serialize> Serialize for Verbatim<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self.source {
            Some(source) => source.serialize(serializer),
            None => self.value.serialize(serializer),
        }
    }
}

pub fn load_catalogue(path: &Path) -> Result<Vec<DistroRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_catalogue(&content).with_context(|| format!("failed to load {}", path.display()))
}

pub fn parse_catalogue(content: &str) -> Result<Vec<DistroRecord>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let records: Vec<DistroRecord> =
        serde_json::from_str(content).context("catalogue is not a JSON array of records")?;

    let mut seen = HashSet::new();
    for (index, record) in records.iter().enumerate() {
        if record.id.trim().is_empty() {
            return Err(BuildError::EmptyId { index }.into());
        }
        if !seen.insert(record.id.as_str()) {
            return Err(BuildError::DuplicateId {
                id: record.id.clone(),
            }
            .into());
        }
    }
    Ok(records)
}

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(text_value(&value))
}

fn verbatim_text<'de, D>(deserializer: D) -> Result<Verbatim<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let source = Value::deserialize(deserializer)?;
    Ok(Verbatim {
        value: text_value(&source),
        source: Some(source),
    })
}

fn verbatim_section<'de, D, T>(deserializer: D) -> Result<Verbatim<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let source = Value::deserialize(deserializer)?;
    let value = if source.is_null() {
        T::default()
    } else {
        T::deserialize(&source).map_err(D::Error::custom)?
    };
    Ok(Verbatim {
        value,
        source: Some(source),
    })
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn lenient_score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let score = match value {
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|value| *value > 0.0).map(|value| value as u64))
            .unwrap_or(0),
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| *value > 0.0)
            .map(|value| value as u64)
            .unwrap_or(0),
        _ => 0,
    };
    Ok(u32::try_from(score).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{load_catalogue, parse_catalogue};
    use crate::error::BuildError;

    #[test]
    fn parse_catalogue_reads_known_fields_and_keeps_extras() {
        let records = parse_catalogue(
            r#"[{
                "id": "debian",
                "name": "Debian",
                "family": "Debian-based",
                "badges": ["stable", "apt"],
                "first_release": 1993,
                "benchmarks": {"stability_score": "9", "beginner_score": 6.0, "power_user_score": null},
                "hardware_requirements": {"minimum": {"ram": "1 GB"}},
                "mascot": "swirl"
            }]"#,
        )
        .expect("parse");
        let record = &records[0];
        assert_eq!(record.name, "Debian");
        assert_eq!(record.badges, vec!["stable", "apt"]);
        assert_eq!(record.first_release.as_deref(), Some("1993"));
        assert_eq!(record.benchmarks.stability_score, 9);
        assert_eq!(record.benchmarks.beginner_score, 6);
        assert_eq!(record.benchmarks.power_user_score, 0);
        assert_eq!(
            record.hardware_requirements.minimum.ram.as_deref(),
            Some("1 GB")
        );
        assert!(record.hardware_requirements.recommended.cpu.is_none());
        assert_eq!(
            record.extra.get("mascot").and_then(|value| value.as_str()),
            Some("swirl")
        );
    }

    #[test]
    fn parse_catalogue_treats_nulls_as_empty() {
        let records =
            parse_catalogue(r#"[{"id": "void", "family": null, "badges": null, "logo": null}]"#)
                .expect("parse");
        assert!(records[0].family.is_empty());
        assert!(records[0].badges.is_empty());
        assert!(records[0].logo.is_empty());
    }

    #[test]
    fn parse_catalogue_rejects_duplicates_and_empty_ids() {
        let error = parse_catalogue(r#"[{"id": "arch"}, {"id": "arch"}]"#).expect_err("dup");
        assert_eq!(
            error.downcast_ref::<BuildError>(),
            Some(&BuildError::DuplicateId {
                id: "arch".to_string()
            })
        );

        let error = parse_catalogue(r#"[{"id": "arch"}, {"id": "  "}]"#).expect_err("empty");
        assert_eq!(
            error.downcast_ref::<BuildError>(),
            Some(&BuildError::EmptyId { index: 1 })
        );
    }

    #[test]
    fn load_catalogue_tolerates_byte_order_mark() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("catalogue.json");
        fs::write(&path, "\u{feff}[{\"id\": \"alpine\"}]").expect("write");
        let records = load_catalogue(&path).expect("load");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "alpine");
    }

    #[test]
    fn load_catalogue_reports_path_on_failure() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("catalogue.json");
        fs::write(&path, "{not json").expect("write");
        let error = load_catalogue(&path).expect_err("must fail");
        assert!(error.to_string().contains("failed to load"));
    }
}
