//! Dotted-decimal keys for scenes and sub-scenes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;

/// A dotted-decimal number such as `"1.2"` or `"1.2.1"`.
///
/// Ordering compares dot-separated components as integers, padding the
/// shorter key with zeros on the right, so `"1.10"` sorts after `"1.9"` and
/// `"1.2"` before `"1.2.1"`. Components that are not integers sort after
/// numeric ones and compare as text. Keys that compare equal numerically
/// (`"1.2"` and `"1.2.0"`) are ordered by their raw text.
///
/// Model output sometimes uses bare JSON numbers for these keys, so
/// deserialization accepts `1.2` as well as `"1.2"`.
///
/// # Examples
///
/// ```
/// use scriptorium_core::SceneNumber;
///
/// let a = SceneNumber::from("1.9");
/// let b = SceneNumber::from("1.10");
/// assert!(a < b);
///
/// let parsed: SceneNumber = serde_json::from_str("2.1").unwrap();
/// assert_eq!(parsed.as_str(), "2.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SceneNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Component {
    Number(u64),
    Text(String),
}

impl SceneNumber {
    /// Create a scene number from raw text.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    /// The raw dotted text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn components(&self) -> Vec<Component> {
        self.0
            .split('.')
            .map(|part| {
                let part = part.trim();
                part.parse::<u64>()
                    .map(Component::Number)
                    .unwrap_or_else(|_| Component::Text(part.to_string()))
            })
            .collect()
    }

    /// Integer value of the first component, if it is numeric.
    ///
    /// ```
    /// use scriptorium_core::SceneNumber;
    ///
    /// assert_eq!(SceneNumber::from("3.1.2").leading_number(), Some(3));
    /// assert_eq!(SceneNumber::from("Scene 3.1").leading_number(), None);
    /// ```
    pub fn leading_number(&self) -> Option<u64> {
        match self.components().first() {
            Some(Component::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// First run of ASCII digits anywhere in the text.
    ///
    /// ```
    /// use scriptorium_core::SceneNumber;
    ///
    /// assert_eq!(SceneNumber::from("Scene 3.1").first_digits(), Some(3));
    /// assert_eq!(SceneNumber::from("epilogue").first_digits(), None);
    /// ```
    pub fn first_digits(&self) -> Option<u64> {
        let start = self.0.find(|c: char| c.is_ascii_digit())?;
        let digits: String = self.0[start..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }

    /// Whether this key lies under `parent` in the dotted hierarchy.
    ///
    /// ```
    /// use scriptorium_core::SceneNumber;
    ///
    /// assert!(SceneNumber::from("1.2.1").extends("1.2"));
    /// assert!(SceneNumber::from("1.2").extends("1"));
    /// assert!(!SceneNumber::from("1.20").extends("1.2"));
    /// assert!(!SceneNumber::from("1.2").extends("1.2"));
    /// ```
    pub fn extends(&self, parent: &str) -> bool {
        let parent = SceneNumber::new(parent).components();
        let own = self.components();
        own.len() > parent.len() && own[..parent.len()] == parent[..]
    }
}

/// Compare two dotted-decimal strings with the [`SceneNumber`] ordering.
///
/// ```
/// use scriptorium_core::compare_scene_numbers;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_scene_numbers("1.2", "1.2.1"), Ordering::Less);
/// assert_eq!(compare_scene_numbers("1.10", "1.9"), Ordering::Greater);
/// ```
pub fn compare_scene_numbers(a: &str, b: &str) -> Ordering {
    SceneNumber::new(a).cmp(&SceneNumber::new(b))
}

impl Ord for SceneNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let (left, right) = (self.components(), other.components());
        let zero = Component::Number(0);
        let len = left.len().max(right.len());
        (0..len)
            .map(|i| {
                let a = left.get(i).unwrap_or(&zero);
                let b = right.get(i).unwrap_or(&zero);
                a.cmp(b)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for SceneNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for SceneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneNumber {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for SceneNumber {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl Serialize for SceneNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for SceneNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawNumber::deserialize(deserializer)? {
            RawNumber::Text(text) => SceneNumber::new(text),
            RawNumber::Number(number) => SceneNumber::new(number.to_string()),
        })
    }
}

/// Deserialize an integer key that may arrive as a number or numeric string.
pub(crate) fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    use serde::de::Error;

    let raw = RawNumber::deserialize(deserializer)?;
    let text = match raw {
        RawNumber::Text(text) => text,
        RawNumber::Number(number) => number.to_string(),
    };
    let text = text.trim();
    text.parse::<u32>()
        .ok()
        .or_else(|| {
            text.parse::<f64>()
                .ok()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u32)
        })
        .ok_or_else(|| D::Error::custom(format!("expected an integer, found '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_shorter_key_with_zeros() {
        assert!(SceneNumber::from("1.2") < SceneNumber::from("1.2.1"));
        assert!(SceneNumber::from("1.2.1") < SceneNumber::from("1.3"));
    }

    #[test]
    fn compares_numerically_not_lexicographically() {
        assert!(SceneNumber::from("1.10") > SceneNumber::from("1.9"));
        assert!(SceneNumber::from("10") > SceneNumber::from("9.9"));
    }

    #[test]
    fn equal_numeric_keys_fall_back_to_text() {
        let a = SceneNumber::from("1.2");
        let b = SceneNumber::from("1.2.0");
        assert_eq!(a.cmp(&b), Ordering::Less);
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn text_components_sort_after_numbers() {
        assert!(SceneNumber::from("1.2") < SceneNumber::from("1.b"));
        assert!(SceneNumber::from("1.a") < SceneNumber::from("1.b"));
    }

    #[test]
    fn deserializes_strings_and_numbers() {
        let keys: Vec<SceneNumber> = serde_json::from_str(r#"["1.2.1", 3, 1.5]"#).unwrap();
        let raw: Vec<&str> = keys.iter().map(SceneNumber::as_str).collect();
        assert_eq!(raw, vec!["1.2.1", "3", "1.5"]);
    }

    #[test]
    fn lenient_u32_accepts_numeric_strings() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(deserialize_with = "lenient_u32")]
            n: u32,
        }

        let from_int: Probe = serde_json::from_str(r#"{"n": 2}"#).unwrap();
        let from_text: Probe = serde_json::from_str(r#"{"n": " 3 "}"#).unwrap();
        let from_float: Probe = serde_json::from_str(r#"{"n": 4.0}"#).unwrap();
        assert_eq!((from_int.n, from_text.n, from_float.n), (2, 3, 4));
        assert!(serde_json::from_str::<Probe>(r#"{"n": "two"}"#).is_err());
    }
}
