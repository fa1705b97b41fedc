use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use litscope_core::UnmappedPolicy;
use serde::Deserialize;

use crate::error::{Result, ScienceError};

const DEFAULT_MAPS: &str = include_str!("../../assets/table_maps.toml");

#[derive(Debug, Default, Deserialize)]
struct MapsFile {
    #[serde(default)]
    ignored: Vec<String>,
    #[serde(default)]
    cite_keys: BTreeMap<String, String>,
    #[serde(default)]
    tool_macros: BTreeMap<String, String>,
    #[serde(default)]
    features: BTreeMap<String, Vec<String>>,
}

/// Fixed label maps: paper titles to cite keys, tool names to macros, and
/// circumstances to feature columns.
#[derive(Debug, Clone)]
pub struct TableMaps {
    cite_keys: BTreeMap<String, String>,
    tool_macros: BTreeMap<String, String>,
    feature_of: HashMap<String, String>,
    ignored: HashSet<String>,
    policy: UnmappedPolicy,
}

impl TableMaps {
    /// Maps shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(DEFAULT_MAPS)
    }

    /// Maps from `path`, or the built-in ones when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                Self::from_toml(&contents).map_err(|e| {
                    ScienceError::Parse(format!("table maps {}: {e}", path.display()))
                })
            }
            None => Self::builtin(),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: MapsFile =
            toml::from_str(contents).map_err(|e| ScienceError::Parse(e.to_string()))?;

        let mut feature_of = HashMap::new();
        for (feature, circumstances) in &file.features {
            for circumstance in circumstances {
                if let Some(previous) = feature_of.insert(circumstance.clone(), feature.clone()) {
                    return Err(ScienceError::Parse(format!(
                        "circumstance {circumstance:?} listed under both {previous:?} and {feature:?}"
                    )));
                }
            }
        }

        Ok(Self {
            cite_keys: file.cite_keys,
            tool_macros: file.tool_macros,
            feature_of,
            ignored: file.ignored.into_iter().collect(),
            policy: UnmappedPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: UnmappedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> UnmappedPolicy {
        self.policy
    }

    /// Bibliography key for a paper title.
    pub fn cite_key<'a>(&'a self, title: &'a str) -> Result<Cow<'a, str>> {
        self.lookup("cite_keys", &self.cite_keys, title)
    }

    /// Macro suffix for a tool, as in `\varTool<suffix>{}`.
    pub fn tool_macro<'a>(&'a self, tool: &'a str) -> Result<Cow<'a, str>> {
        self.lookup("tool_macros", &self.tool_macros, tool)
    }

    /// Feature column a circumstance belongs to.
    ///
    /// `None` for ignored circumstances, and for unknown ones under
    /// [`UnmappedPolicy::Passthrough`].
    pub fn feature_for(&self, circumstance: &str) -> Result<Option<&str>> {
        if let Some(feature) = self.feature_of.get(circumstance) {
            return Ok(Some(feature.as_str()));
        }
        if self.ignored.contains(circumstance) {
            return Ok(None);
        }
        match self.policy {
            UnmappedPolicy::Error => Err(ScienceError::undefined_alias("features", circumstance)),
            UnmappedPolicy::Passthrough => {
                tracing::warn!("circumstance {circumstance:?} has no feature column, skipping");
                Ok(None)
            }
        }
    }

    fn lookup<'a>(
        &self,
        map_name: &str,
        map: &'a BTreeMap<String, String>,
        key: &'a str,
    ) -> Result<Cow<'a, str>> {
        match (map.get(key), self.policy) {
            (Some(value), _) => Ok(Cow::Borrowed(value.as_str())),
            (None, UnmappedPolicy::Passthrough) => Ok(Cow::Borrowed(key)),
            (None, UnmappedPolicy::Error) => Err(ScienceError::undefined_alias(map_name, key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_maps_load() {
        let maps = TableMaps::builtin().unwrap();
        assert_eq!(maps.cite_key("BinRec: Attack Surface Reduction Through Dynamic Binary Recovery").unwrap(), "binrec");
        assert_eq!(maps.tool_macro("Radare2").unwrap(), "RadareTwo");
        assert_eq!(maps.tool_macro("Rotalumé").unwrap(), "Rotalume");
        assert_eq!(maps.feature_for("High level view").unwrap(), Some("Decompilation"));
        assert_eq!(maps.feature_for("Emulation").unwrap(), None);
    }

    #[test]
    fn test_unmapped_is_an_error_by_default() {
        let maps = TableMaps::builtin().unwrap();
        match maps.tool_macro("Hopper") {
            Err(ScienceError::UndefinedAlias { map, key }) => {
                assert_eq!(map, "tool_macros");
                assert_eq!(key, "Hopper");
            }
            other => panic!("expected UndefinedAlias, got {other:?}"),
        }
        assert!(matches!(
            maps.feature_for("Time Travel"),
            Err(ScienceError::UndefinedAlias { .. })
        ));
    }

    #[test]
    fn test_passthrough_keeps_key() {
        let maps = TableMaps::builtin()
            .unwrap()
            .with_policy(UnmappedPolicy::Passthrough);
        assert_eq!(maps.cite_key("Unknown Paper").unwrap(), "Unknown Paper");
        assert_eq!(maps.feature_for("Time Travel").unwrap(), None);
    }

    #[test]
    fn test_circumstance_in_two_features_is_rejected() {
        let toml = r#"
[features]
"A" = ["x"]
"B" = ["x"]
"#;
        assert!(matches!(TableMaps::from_toml(toml), Err(ScienceError::Parse(_))));
    }
}
