use std::collections::HashMap;

use derive_more::From;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{EngineError, Error, Result};

/// A named unit of functionality gated by the decision engine.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// Unique key of the feature.
    pub key: String,
    /// Configuration values attached to the feature, in declaration order.
    #[serde(default, deserialize_with = "deserialize_variables")]
    pub variables: Vec<Variable>,
}

impl Feature {
    /// Create a feature with no variables.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            variables: Vec::new(),
        }
    }

    /// Append a variable, replacing any existing variable with the same key.
    pub fn with_variable(mut self, variable: Variable) -> Self {
        push_variable(&mut self.variables, variable);
        self
    }
}

fn push_variable(variables: &mut Vec<Variable>, variable: Variable) {
    variables.retain(|v| v.key != variable.key);
    variables.push(variable);
}

/// Variable keys are unique within a feature: a repeated key replaces the earlier declaration.
fn deserialize_variables<'de, D>(deserializer: D) -> std::result::Result<Vec<Variable>, D::Error>
where
    D: Deserializer<'de>,
{
    let declared = Vec::<Variable>::deserialize(deserializer)?;
    let mut variables = Vec::with_capacity(declared.len());
    for variable in declared {
        push_variable(&mut variables, variable);
    }
    Ok(variables)
}

/// A configuration value attached to a [`Feature`].
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Key of the variable, unique within its feature.
    pub key: String,
    /// Raw default value. Interpreted according to `variable_type`.
    pub default_value: String,
    /// Declared type of the value.
    #[serde(default, rename = "type")]
    pub variable_type: VariableType,
}

impl Variable {
    /// Create a string variable.
    pub fn new(key: impl Into<String>, default_value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            default_value: default_value.into(),
            variable_type: VariableType::String,
        }
    }

    /// Create a variable of the given type.
    pub fn typed(
        key: impl Into<String>,
        variable_type: VariableType,
        default_value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            default_value: default_value.into(),
            variable_type,
        }
    }

    /// Interpret the default value as `variable_type`. Returns `None` if the raw value does not
    /// parse as the declared type.
    pub fn typed_value(&self) -> Option<VariableValue> {
        let raw = self.default_value.as_str();
        Some(match self.variable_type {
            VariableType::String => VariableValue::String(raw.to_owned()),
            VariableType::Integer => VariableValue::Integer(raw.trim().parse().ok()?),
            VariableType::Double => VariableValue::Double(raw.trim().parse().ok()?),
            VariableType::Boolean => VariableValue::Boolean(raw.trim().parse().ok()?),
            VariableType::Json => VariableValue::Json(serde_json::from_str(raw).ok()?),
        })
    }
}

/// Declared type of a [`Variable`]. Serialized in lowercase, `string` when omitted.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    /// Raw string.
    #[default]
    String,
    /// Signed 64-bit integer.
    Integer,
    /// Floating point number.
    Double,
    /// `true` or `false`.
    Boolean,
    /// Arbitrary JSON document.
    Json,
}

/// Resolved value of a variable.
///
/// Unlike the raw default value, `VariableValue` carries its type, so it serializes tagged
/// (`{"Integer": 5}`) and survives a round trip.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, From)]
pub enum VariableValue {
    /// A boolean value.
    Boolean(bool),
    /// An integer value.
    Integer(i64),
    /// A floating point value.
    Double(f64),
    /// A string value.
    String(String),
    /// A parsed JSON value.
    Json(serde_json::Value),
}

impl VariableValue {
    /// Returns the string value, or `None` for any other variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
    /// Returns the integer value, or `None` for any other variant.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
    /// Returns the double value, or `None` for any other variant.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(n) => Some(*n),
            _ => None,
        }
    }
    /// Returns the boolean value, or `None` for any other variant.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
    /// Returns the JSON value, or `None` for any other variant.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// Map from variable key to resolved value.
pub type VariableMap = HashMap<String, VariableValue>;

/// `TryParse` allows the subfield to fail parsing without failing the parsing of the whole
/// structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub(crate) enum TryParse<T> {
    Parsed(T),
    ParseFailed(serde_json::Value),
}

/// Configuration document the [`DatafileEngine`](crate::DatafileEngine) decides from.
///
/// ```
/// # use decision_client::Datafile;
/// let datafile = Datafile::from_json(r#"
///   {
///     "version": "4",
///     "features": [{ "key": "checkout", "variables": [] }],
///     "rollouts": [{ "featureKey": "checkout" }]
///   }
/// "#).unwrap();
/// assert!(datafile.is_rolled_out("checkout"));
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Datafile {
    #[serde(default)]
    version: String,
    #[serde(default)]
    features: Vec<TryParse<Feature>>,
    #[serde(default)]
    rollouts: Vec<Rollout>,
}

/// Marks a feature as enabled for every user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Rollout {
    feature_key: String,
}

impl Datafile {
    /// Parse a datafile from its JSON representation.
    pub fn from_json(json: &str) -> Result<Datafile> {
        Ok(serde_json::from_str(json)?)
    }

    /// Version string declared by the datafile.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// All successfully parsed features, in datafile order.
    ///
    /// When a key is declared more than once, the last declaration wins and keeps the position of
    /// the first. A key whose last declaration failed to parse is skipped, matching
    /// [`Datafile::find_feature`].
    pub fn features(&self) -> Vec<&Feature> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut resolved: Vec<(&str, &TryParse<Feature>)> = Vec::new();
        for entry in &self.features {
            let key = match entry {
                TryParse::Parsed(feature) => feature.key.as_str(),
                TryParse::ParseFailed(value) => match unparsed_key(value) {
                    Some(key) => key,
                    None => {
                        log::warn!(target: "decision_client", "skipping feature without a key");
                        continue;
                    }
                },
            };
            match positions.get(key) {
                Some(&i) => resolved[i] = (key, entry),
                None => {
                    positions.insert(key, resolved.len());
                    resolved.push((key, entry));
                }
            }
        }

        resolved
            .into_iter()
            .filter_map(|(key, entry)| match entry {
                TryParse::Parsed(feature) => Some(feature),
                TryParse::ParseFailed(_) => {
                    log::warn!(target: "decision_client",
                               feature_key = key;
                               "skipping feature that failed to parse");
                    None
                }
            })
            .collect()
    }

    /// Find the feature declared under `feature_key`.
    ///
    /// # Errors
    ///
    /// - [`Error::FeatureNotFound`] if no entry declares `feature_key`.
    /// - [`EngineError::ConfigurationParseError`] if the latest entry for `feature_key` is
    /// malformed.
    pub fn find_feature(&self, feature_key: &str) -> Result<&Feature> {
        for entry in self.features.iter().rev() {
            match entry {
                TryParse::Parsed(feature) if feature.key == feature_key => return Ok(feature),
                TryParse::ParseFailed(value) if unparsed_key(value) == Some(feature_key) => {
                    return Err(EngineError::ConfigurationParseError(feature_key.to_owned()).into())
                }
                _ => {}
            }
        }
        Err(Error::FeatureNotFound(feature_key.to_owned()))
    }

    /// Return `true` if the datafile declares a full rollout for `feature_key`.
    pub fn is_rolled_out(&self, feature_key: &str) -> bool {
        self.rollouts
            .iter()
            .any(|rollout| rollout.feature_key == feature_key)
    }
}

fn unparsed_key(value: &serde_json::Value) -> Option<&str> {
    value.get("key").and_then(serde_json::Value::as_str)
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::BufReader};

    use crate::{EngineError, Error};

    use super::{Datafile, Feature, TryParse, Variable, VariableType, VariableValue};

    #[test]
    fn parse_datafile_fixture() {
        let f = File::open("tests/data/datafile.json")
            .expect("Failed to open tests/data/datafile.json");
        let datafile: Datafile = serde_json::from_reader(BufReader::new(f)).unwrap();
        assert_eq!(datafile.version(), "4");
        assert!(!datafile.features().is_empty());
    }

    #[test]
    fn parse_partially_if_unexpected() {
        let datafile = Datafile::from_json(
            r#"
              {
                "features": [
                  { "key": "success", "variables": [] },
                  {
                    "key": "fail_parsing",
                    "variables": [{ "key": "v", "defaultValue": "1", "type": "NEW_TYPE" }]
                  }
                ]
              }
            "#,
        )
        .unwrap();
        assert!(matches!(datafile.features[0], TryParse::Parsed(_)));
        assert!(matches!(datafile.features[1], TryParse::ParseFailed(_)));

        assert_eq!(datafile.features().len(), 1);
        assert!(matches!(
            datafile.find_feature("fail_parsing"),
            Err(Error::Upstream(EngineError::ConfigurationParseError(key))) if key == "fail_parsing"
        ));
    }

    #[test]
    fn later_declaration_wins() {
        let datafile = Datafile::from_json(
            r#"
              {
                "features": [
                  { "key": "a" },
                  { "key": "b" },
                  { "key": "a", "variables": [{ "key": "v", "defaultValue": "x" }] }
                ]
              }
            "#,
        )
        .unwrap();

        let keys: Vec<&str> = datafile.features().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(
            datafile.find_feature("a").unwrap(),
            &Feature::new("a").with_variable(Variable::new("v", "x"))
        );
        assert!(matches!(
            datafile.find_feature("c"),
            Err(Error::FeatureNotFound(key)) if key == "c"
        ));
    }

    #[test]
    fn malformed_redeclaration_hides_feature() {
        let datafile = Datafile::from_json(
            r#"
              {
                "features": [
                  { "key": "a" },
                  { "key": "b" },
                  {
                    "key": "a",
                    "variables": [{ "key": "v", "defaultValue": "1", "type": "NEW_TYPE" }]
                  }
                ]
              }
            "#,
        )
        .unwrap();

        let keys: Vec<&str> = datafile.features().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["b"]);
        assert!(matches!(
            datafile.find_feature("a"),
            Err(Error::Upstream(EngineError::ConfigurationParseError(key))) if key == "a"
        ));
    }

    #[test]
    fn well_formed_redeclaration_restores_feature() {
        let datafile = Datafile::from_json(
            r#"
              {
                "features": [
                  { "key": "a", "variables": [{ "key": "v", "defaultValue": "1", "type": "NEW_TYPE" }] },
                  { "key": "a" }
                ]
              }
            "#,
        )
        .unwrap();

        assert_eq!(datafile.features(), vec![&Feature::new("a")]);
        assert_eq!(datafile.find_feature("a").unwrap(), &Feature::new("a"));
    }

    #[test]
    fn repeated_variable_keys_keep_last_declaration() {
        let datafile = Datafile::from_json(
            r#"
              {
                "features": [
                  {
                    "key": "f",
                    "variables": [
                      { "key": "var1", "defaultValue": "first" },
                      { "key": "var2", "defaultValue": "x" },
                      { "key": "var1", "defaultValue": "second" }
                    ]
                  }
                ]
              }
            "#,
        )
        .unwrap();

        assert_eq!(
            datafile.find_feature("f").unwrap().variables,
            vec![Variable::new("var2", "x"), Variable::new("var1", "second")]
        );
    }

    #[test]
    fn variable_value_serializes_tagged() {
        let values = vec![
            VariableValue::Json(serde_json::json!(5)),
            VariableValue::Json(serde_json::json!("x")),
            VariableValue::Integer(5),
            VariableValue::from("x"),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[{"Json":5},{"Json":"x"},{"Integer":5},{"String":"x"}]"#);
        let parsed: Vec<VariableValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, values);
    }

    #[test]
    fn typed_values() {
        assert_eq!(
            Variable::typed("n", VariableType::Integer, "42").typed_value(),
            Some(VariableValue::Integer(42))
        );
        assert_eq!(
            Variable::typed("d", VariableType::Double, "0.5").typed_value(),
            Some(VariableValue::Double(0.5))
        );
        assert_eq!(
            Variable::typed("b", VariableType::Boolean, "true").typed_value(),
            Some(VariableValue::Boolean(true))
        );
        assert_eq!(
            Variable::typed("j", VariableType::Json, r#"{"a": 1}"#).typed_value(),
            Some(VariableValue::Json(serde_json::json!({"a": 1})))
        );
        assert_eq!(
            Variable::typed("n", VariableType::Integer, "forty-two").typed_value(),
            None
        );
    }

    #[test]
    fn with_variable_replaces_same_key() {
        let feature = Feature::new("f")
            .with_variable(Variable::new("v", "1"))
            .with_variable(Variable::new("v", "2"));
        assert_eq!(feature.variables, vec![Variable::new("v", "2")]);
    }
}
