//! Shared domain models.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Label shown for entries without a usable name.
pub const UNNAMED_LABEL: &str = "(unnamed)";

/// A single game record as stored in the data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Display name; must not be blank.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Free-form version label.
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: String,
    /// Credited authors in display order.
    #[serde(default, deserialize_with = "lenient_list")]
    pub authors: Vec<String>,
    /// Search tags in display order.
    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Vec<String>,
    /// Download URL of the build archive.
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    /// Executable inside the downloaded archive.
    #[serde(
        rename = "buildFile",
        default,
        deserialize_with = "lenient_string"
    )]
    pub build_file: String,
    /// unityroom page.
    #[serde(default, deserialize_with = "lenient_string")]
    pub unityroomurl: String,
    /// Source repository.
    #[serde(default, deserialize_with = "lenient_string")]
    pub githuburl: String,
    /// Short description shown in listings.
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    /// Thumbnail URL.
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: String,
    /// Long-form description document URL.
    #[serde(default, deserialize_with = "lenient_string")]
    pub markdown: String,
    /// Keys this editor does not know about, kept so saving never drops them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entry {
    /// Returns the name used in lists, falling back to a placeholder.
    pub fn display_name(&self) -> &str {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            UNNAMED_LABEL
        } else {
            trimmed
        }
    }

    /// Non-empty URL-bearing fields in probe order.
    pub fn url_fields(&self) -> Vec<(Field, &str)> {
        Field::URLS
            .iter()
            .map(|field| (*field, self.text(*field)))
            .filter(|(_, value)| !value.trim().is_empty())
            .collect()
    }

    /// Raw text of a scalar field. List fields are not addressable this way.
    fn text(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Version => &self.version,
            Field::Url => &self.url,
            Field::BuildFile => &self.build_file,
            Field::UnityroomUrl => &self.unityroomurl,
            Field::GithubUrl => &self.githuburl,
            Field::Description => &self.description,
            Field::Image => &self.image,
            Field::Markdown => &self.markdown,
            Field::Authors | Field::Tags => "",
        }
    }
}

/// Editable fields of an [`Entry`], in form order.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Version,
    Authors,
    Tags,
    Url,
    BuildFile,
    UnityroomUrl,
    GithubUrl,
    Description,
    Image,
    Markdown,
}

impl Field {
    /// Every field in the order a form presents them.
    pub const ALL: [Field; 11] = [
        Field::Name,
        Field::Version,
        Field::Authors,
        Field::Tags,
        Field::Url,
        Field::BuildFile,
        Field::UnityroomUrl,
        Field::GithubUrl,
        Field::Description,
        Field::Image,
        Field::Markdown,
    ];

    /// Fields that hold URLs worth probing. `buildFile` is a file name, not a URL.
    pub const URLS: [Field; 5] = [
        Field::Url,
        Field::UnityroomUrl,
        Field::GithubUrl,
        Field::Image,
        Field::Markdown,
    ];

    /// Key used in the data file.
    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Version => "version",
            Field::Authors => "authors",
            Field::Tags => "tags",
            Field::Url => "url",
            Field::BuildFile => "buildFile",
            Field::UnityroomUrl => "unityroomurl",
            Field::GithubUrl => "githuburl",
            Field::Description => "description",
            Field::Image => "image",
            Field::Markdown => "markdown",
        }
    }

    /// Human-readable label for forms and reports.
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Version => "Version",
            Field::Authors => "Authors (comma separated)",
            Field::Tags => "Tags (comma separated)",
            Field::Url => "Download URL",
            Field::BuildFile => "Build file",
            Field::UnityroomUrl => "unityroom URL",
            Field::GithubUrl => "GitHub URL",
            Field::Description => "Description",
            Field::Image => "Image URL",
            Field::Markdown => "Markdown URL",
        }
    }

    fn index(self) -> usize {
        Field::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw form input, one string per [`Field`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    values: [String; 11],
}

impl FormFields {
    /// Read the raw text of a field.
    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    /// Replace the raw text of a field.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    /// Reset every field to empty.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether every field is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|value| value.trim().is_empty())
    }

    /// Populate a form from a stored entry; list fields are joined with `", "`.
    pub fn from_entry(entry: &Entry) -> Self {
        let mut form = Self::default();
        for field in Field::ALL {
            let value = match field {
                Field::Authors => join_list(&entry.authors),
                Field::Tags => join_list(&entry.tags),
                other => entry.text(other).to_string(),
            };
            form.set(field, value);
        }
        form
    }

    /// Build an entry from the form, trimming every value and splitting list fields.
    pub fn to_entry(&self) -> Entry {
        let text = |field: Field| self.get(field).trim().to_string();
        Entry {
            name: text(Field::Name),
            version: text(Field::Version),
            authors: split_list(self.get(Field::Authors)),
            tags: split_list(self.get(Field::Tags)),
            url: text(Field::Url),
            build_file: text(Field::BuildFile),
            unityroomurl: text(Field::UnityroomUrl),
            githuburl: text(Field::GithubUrl),
            description: text(Field::Description),
            image: text(Field::Image),
            markdown: text(Field::Markdown),
            extra: Map::new(),
        }
    }
}

/// Split comma separated input, trimming items and dropping empty ones.
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of [`split_list`] for display in a single-line input.
pub fn join_list(items: &[String]) -> String {
    items.join(", ")
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a string, found {other}"
            )))
        }
    })
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(text)) => Ok(split_list(&text)),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => Ok(text),
                Value::Number(number) => Ok(number.to_string()),
                other => Err(serde::de::Error::custom(format!(
                    "expected a list of strings, found item {other}"
                ))),
            })
            .collect(),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a list of strings, found {other}"
        ))),
    }
}
