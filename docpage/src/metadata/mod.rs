use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page metadata read from the front-matter block.
///
/// `title` is the only required key. Keys the renderer does not know about
/// are kept in `extra` so a page can be re-serialized without losing them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordering hint within a section; lower sorts first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    /// Short label for navigation, falls back to `title`.
    #[serde(
        default,
        rename = "linkTitle",
        skip_serializing_if = "Option::is_none"
    )]
    pub link_title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
    /// Top-level TOML keys that held a datetime. They are kept as strings in
    /// `extra` and written back as bare TOML datetimes.
    #[serde(skip)]
    pub toml_datetimes: BTreeSet<String>,
}

/// Delimiter style of a front-matter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontMatterFormat {
    /// `---` delimited YAML.
    Yaml,
    /// `+++` delimited TOML.
    Toml,
}

impl FrontMatterFormat {
    pub fn delimiter(self) -> &'static str {
        match self {
            FrontMatterFormat::Yaml => "---",
            FrontMatterFormat::Toml => "+++",
        }
    }

    pub fn from_delimiter(line: &str) -> Option<Self> {
        match line {
            "---" => Some(FrontMatterFormat::Yaml),
            "+++" => Some(FrontMatterFormat::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for FrontMatterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontMatterFormat::Yaml => write!(f, "YAML"),
            FrontMatterFormat::Toml => write!(f, "TOML"),
        }
    }
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("front matter did not serialize to a TOML table")]
    TomlShape,
}

impl Metadata {
    /// Parse the text between the front-matter delimiters.
    pub fn parse(text: &str, format: FrontMatterFormat) -> Result<Self, MetadataError> {
        match format {
            FrontMatterFormat::Yaml => Ok(serde_yaml::from_str(text)?),
            FrontMatterFormat::Toml => {
                let mut table: toml::Table = toml::from_str(text)?;
                let mut datetimes = BTreeSet::new();
                for (key, value) in table.iter_mut() {
                    if matches!(value, toml::Value::Datetime(_)) {
                        datetimes.insert(key.clone());
                    }
                    stringify_datetimes(value);
                }
                let mut metadata: Metadata = toml::Value::Table(table).try_into()?;
                metadata.toml_datetimes = datetimes;
                Ok(metadata)
            }
        }
    }

    /// Serialize back into a complete delimited block, including the
    /// opening and closing delimiter lines.
    pub fn to_front_matter(&self, format: FrontMatterFormat) -> Result<String, MetadataError> {
        let mut inner = match format {
            FrontMatterFormat::Yaml => serde_yaml::to_string(self)?,
            FrontMatterFormat::Toml if self.toml_datetimes.is_empty() => toml::to_string(self)?,
            FrontMatterFormat::Toml => {
                let toml::Value::Table(mut table) = toml::Value::try_from(self)? else {
                    return Err(MetadataError::TomlShape);
                };
                for key in &self.toml_datetimes {
                    let datetime = match table.get(key) {
                        Some(toml::Value::String(s)) => s.parse::<toml::value::Datetime>().ok(),
                        _ => None,
                    };
                    if let Some(datetime) = datetime {
                        table.insert(key.clone(), toml::Value::Datetime(datetime));
                    }
                }
                toml::to_string(&table)?
            }
        };
        if !inner.ends_with('\n') {
            inner.push('\n');
        }
        let delimiter = format.delimiter();
        Ok(format!("{delimiter}\n{inner}{delimiter}\n"))
    }

    /// Navigation label: `linkTitle` when set, otherwise the title.
    pub fn nav_title(&self) -> &str {
        self.link_title.as_deref().unwrap_or(&self.title)
    }
}

/// Replace TOML datetimes with their string form, so they read as plain
/// strings in YAML and JSON output.
fn stringify_datetimes(value: &mut toml::Value) {
    match value {
        toml::Value::Datetime(datetime) => *value = toml::Value::String(datetime.to_string()),
        toml::Value::Array(items) => items.iter_mut().for_each(stringify_datetimes),
        toml::Value::Table(table) => table.iter_mut().for_each(|(_, v)| stringify_datetimes(v)),
        _ => {}
    }
}
