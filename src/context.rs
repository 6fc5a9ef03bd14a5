use std::collections::HashMap;

use derive_more::From;
use serde::{Deserialize, Serialize};

/// Attributes of a user, used by the engine for targeting.
///
/// # Examples
/// ```
/// # use decision_client::{Attributes, AttributeValue};
/// let attributes = [
///     ("age".to_owned(), 30.0.into()),
///     ("is_premium_member".to_owned(), true.into()),
///     ("username".to_owned(), "john_doe".into()),
/// ].into_iter().collect::<Attributes>();
/// ```
pub type Attributes = HashMap<String, AttributeValue>;

/// Value of a single user attribute. Mirrors the shapes a JSON value can take.
#[derive(Debug, Serialize, Deserialize, PartialEq, From, Clone)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A string value.
    String(String),
    /// A numerical value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// An ordered collection of values.
    List(Vec<AttributeValue>),
    /// A nested mapping of values.
    Object(HashMap<String, AttributeValue>),
    /// A null value or absence of value.
    Null,
}

impl AttributeValue {
    /// Returns the string slice if this is a [`AttributeValue::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// The user a feature is evaluated for: an identifier plus its attributes.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    user_id: String,
    #[serde(default)]
    attributes: Attributes,
}

impl UserContext {
    /// Create a context for `user_id` with the given attributes.
    ///
    /// ```
    /// # use decision_client::UserContext;
    /// let context = UserContext::new("user-id", [("country".to_owned(), "nz".into())]);
    /// assert_eq!(context.user_id(), "user-id");
    /// ```
    pub fn new(
        user_id: impl Into<String>,
        attributes: impl IntoIterator<Item = (String, AttributeValue)>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            attributes: attributes.into_iter().collect(),
        }
    }

    /// Create a context with no attributes.
    pub fn without_attributes(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Attributes::new())
    }

    /// Identifier of the user.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Attributes of the user.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeValue, UserContext};

    #[test]
    fn parses_nested_attributes() {
        let context: UserContext = serde_json::from_str(
            r#"
              {
                "userId": "user-1",
                "attributes": {
                  "plan": "pro",
                  "seats": 12,
                  "beta": true,
                  "tags": ["a", "b"],
                  "org": { "id": "acme" },
                  "referrer": null
                }
              }
            "#,
        )
        .unwrap();

        let attributes = context.attributes();
        assert_eq!(context.user_id(), "user-1");
        assert_eq!(attributes["plan"], AttributeValue::from("pro"));
        assert_eq!(attributes["seats"], AttributeValue::Number(12.0));
        assert_eq!(attributes["beta"], AttributeValue::Boolean(true));
        assert_eq!(
            attributes["tags"],
            AttributeValue::List(vec!["a".into(), "b".into()])
        );
        assert!(matches!(&attributes["org"], AttributeValue::Object(org) if org["id"].as_str() == Some("acme")));
        assert_eq!(attributes["referrer"], AttributeValue::Null);
    }

    #[test]
    fn attributes_default_to_empty() {
        let context: UserContext = serde_json::from_str(r#"{"userId": "user-1"}"#).unwrap();
        assert!(context.attributes().is_empty());
    }
}
