use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What to do with input keys that match no declared field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    /// Report `Unknown field.` for each such key.
    #[default]
    Raise,
    /// Drop them silently.
    Exclude,
    /// Copy them into the loaded object unchanged.
    Include,
}

/// Which required-field checks to skip during a load.
///
/// Field paths may be dotted (`author.name`) to reach into nested schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "PartialRepr")]
pub enum Partial {
    #[default]
    Off,
    All,
    Fields(BTreeSet<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PartialRepr {
    Flag(bool),
    Fields(Vec<String>),
}

impl From<PartialRepr> for Partial {
    fn from(repr: PartialRepr) -> Self {
        match repr {
            PartialRepr::Flag(true) => Self::All,
            PartialRepr::Flag(false) => Self::Off,
            PartialRepr::Fields(fields) => Self::fields(fields),
        }
    }
}

impl From<bool> for Partial {
    fn from(flag: bool) -> Self {
        if flag {
            Self::All
        } else {
            Self::Off
        }
    }
}

impl Partial {
    /// Partial load restricted to the given field paths.
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fields(fields.into_iter().map(Into::into).collect())
    }

    /// Whether a missing `name` is tolerated even when required.
    pub fn skips(&self, name: &str) -> bool {
        match self {
            Self::Off => false,
            Self::All => true,
            Self::Fields(fields) => fields.contains(name),
        }
    }

    /// The partial setting seen by the nested schema under `name`.
    pub fn descend(&self, name: &str) -> Partial {
        match self {
            Self::Off => Self::Off,
            Self::All => Self::All,
            Self::Fields(fields) => {
                let prefix = format!("{name}.");
                let nested: BTreeSet<String> = fields
                    .iter()
                    .filter_map(|path| path.strip_prefix(&prefix).map(str::to_string))
                    .collect();
                if nested.is_empty() {
                    Self::Off
                } else {
                    Self::Fields(nested)
                }
            }
        }
    }
}

/// Definition-time schema configuration.
///
/// Names in `only`, `exclude`, `load_only` and `dump_only` must refer to
/// declared fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    /// Restrict the schema to these fields.
    pub only: Option<BTreeSet<String>>,
    /// Remove these fields from the schema.
    pub exclude: BTreeSet<String>,
    /// Treat input as a list of objects.
    pub many: bool,
    /// Free-form data handed to every custom validator during a load,
    /// nested fields included.
    pub context: Map<String, Value>,
    /// Fields read on load but never written on dump.
    pub load_only: BTreeSet<String>,
    /// Fields written on dump but treated as unknown on load.
    pub dump_only: BTreeSet<String>,
    /// Default required-field skipping.
    pub partial: Partial,
    /// Default handling of undeclared input keys.
    pub unknown: UnknownPolicy,
}

/// Per-call overrides; `None` falls back to the schema's [`SchemaOptions`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub many: Option<bool>,
    pub partial: Option<Partial>,
    pub unknown: Option<UnknownPolicy>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_many(mut self, many: bool) -> Self {
        self.many = Some(many);
        self
    }

    pub fn with_partial(mut self, partial: impl Into<Partial>) -> Self {
        self.partial = Some(partial.into());
        self
    }

    pub fn with_unknown(mut self, unknown: UnknownPolicy) -> Self {
        self.unknown = Some(unknown);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_descends_dotted_paths() {
        let partial = Partial::fields(["author.name", "author.email", "title"]);
        assert!(partial.skips("title"));
        assert!(!partial.skips("author"));
        assert_eq!(
            partial.descend("author"),
            Partial::fields(["name", "email"])
        );
        assert_eq!(partial.descend("title"), Partial::Off);
        assert_eq!(Partial::All.descend("anything"), Partial::All);
    }

    #[test]
    fn options_deserialize_from_json() {
        let options: SchemaOptions = serde_json::from_str(
            r#"{"many": true, "partial": ["a"], "unknown": "exclude", "exclude": ["b"]}"#,
        )
        .unwrap();
        assert!(options.many);
        assert_eq!(options.partial, Partial::fields(["a"]));
        assert_eq!(options.unknown, UnknownPolicy::Exclude);
        assert!(options.exclude.contains("b"));
        assert!(options.only.is_none());

        let load: LoadOptions = serde_json::from_str(r#"{"partial": true}"#).unwrap();
        assert_eq!(load.partial, Some(Partial::All));
        assert_eq!(load.many, None);
    }

    #[test]
    fn defaults_are_strict() {
        let options = SchemaOptions::default();
        assert_eq!(options.unknown, UnknownPolicy::Raise);
        assert_eq!(options.partial, Partial::Off);
        assert!(!options.many);
    }
}
