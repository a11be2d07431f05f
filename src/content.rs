use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Timeline entry content, classified by shape when the JSON is decoded.
///
/// Mappings are matched against the known key sets in order: `left`/`right`,
/// then `equation`, then `from`/`to`. The first match wins, so a mapping that
/// carries both `left`/`right` and `equation` is a [`Content::Pair`].
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    List(Vec<Value>),
    Pair { left: Value, right: Value },
    Equation(Value),
    Transition { from: Value, to: Value },
    Mapping(Map<String, Value>),
    Other(Value),
}

impl Default for Content {
    fn default() -> Self {
        Content::Other(Value::Null)
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Content::Text(text),
            Value::Array(items) => Content::List(items),
            Value::Object(mut map) => {
                if map.contains_key("left") && map.contains_key("right") {
                    let left = map.remove("left").unwrap_or_default();
                    let right = map.remove("right").unwrap_or_default();
                    Content::Pair { left, right }
                } else if let Some(equation) = map.remove("equation") {
                    Content::Equation(equation)
                } else if map.contains_key("from") && map.contains_key("to") {
                    let from = map.remove("from").unwrap_or_default();
                    let to = map.remove("to").unwrap_or_default();
                    Content::Transition { from, to }
                } else {
                    Content::Mapping(map)
                }
            }
            other => Content::Other(other),
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl Content {
    /// Collapse the content into the single string a template constructor takes
    pub fn normalize(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::List(items) => items
                .iter()
                .map(display_value)
                .collect::<Vec<_>>()
                .join("\n"),
            Content::Pair { left, right } => {
                format!("{}|{}", display_value(left), display_value(right))
            }
            Content::Equation(equation) => display_value(equation),
            Content::Transition { from, to } => {
                format!("{} -> {}", display_value(from), display_value(to))
            }
            Content::Mapping(map) => Value::Object(map.clone()).to_string(),
            Content::Other(value) => display_value(value),
        }
    }

    /// Rebuild the JSON value this content was decoded from
    ///
    /// Key order of classified mappings is not preserved.
    pub fn to_value(&self) -> Value {
        match self {
            Content::Text(text) => Value::String(text.clone()),
            Content::List(items) => Value::Array(items.clone()),
            Content::Pair { left, right } => {
                serde_json::json!({ "left": left, "right": right })
            }
            Content::Equation(equation) => serde_json::json!({ "equation": equation }),
            Content::Transition { from, to } => serde_json::json!({ "from": from, "to": to }),
            Content::Mapping(map) => Value::Object(map.clone()),
            Content::Other(value) => value.clone(),
        }
    }
}

/// Strings come out raw, everything else as compact JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Content::from)
    }
}

impl Serialize for Content {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: Value) -> String {
        Content::from(value).normalize()
    }

    #[test]
    fn test_text_is_unchanged() {
        assert_eq!(normalize(json!("Welcome to calculus")), "Welcome to calculus");
    }

    #[test]
    fn test_list_joins_with_newlines() {
        assert_eq!(
            normalize(json!(["first", 2, 3.5, true])),
            "first\n2\n3.5\ntrue"
        );
    }

    #[test]
    fn test_pair() {
        assert_eq!(normalize(json!({"left": "2x+3", "right": "7"})), "2x+3|7");
    }

    #[test]
    fn test_equation_verbatim() {
        assert_eq!(normalize(json!({"equation": "y = x^2"})), "y = x^2");
    }

    #[test]
    fn test_transition() {
        assert_eq!(normalize(json!({"from": "A", "to": "B"})), "A -> B");
    }

    #[test]
    fn test_pair_wins_over_equation() {
        let content = Content::from(json!({"equation": "E", "left": "L", "right": "R"}));
        assert!(matches!(content, Content::Pair { .. }));
        assert_eq!(content.normalize(), "L|R");
    }

    #[test]
    fn test_equation_wins_over_transition() {
        assert_eq!(
            normalize(json!({"from": "A", "to": "B", "equation": "x"})),
            "x"
        );
    }

    #[test]
    fn test_partial_keys_fall_back_to_mapping() {
        let content = Content::from(json!({"left": "only"}));
        assert!(matches!(content, Content::Mapping(_)));
        assert_eq!(content.normalize(), r#"{"left":"only"}"#);
    }

    #[test]
    fn test_scalars_use_generic_conversion() {
        assert_eq!(normalize(json!(42)), "42");
        assert_eq!(normalize(Value::Null), "null");
    }

    #[test]
    fn test_deserialize_from_entry_json() {
        let content: Content = serde_json::from_str(r#"{"from": 1, "to": 2}"#).unwrap();
        assert_eq!(content.normalize(), "1 -> 2");
        assert_eq!(content.to_value(), json!({"from": 1, "to": 2}));
    }
}
