//! Structural checks for generated scene content.
//!
//! Model output is only trusted after it passes [`validate_scene`]; from then
//! on the pipeline works with the typed [`SceneContent`].

use scriptorium_core::{ContentItem, SceneContent, SceneNumber};
use serde_json::{Map, Value};

const REQUIRED_FIELDS: [&str; 4] = ["scene_number", "location", "time", "content"];

/// Why a scene payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SceneIssue {
    /// The payload is not a JSON object
    #[display("Scene is not a JSON object")]
    NotAnObject,
    /// A required top-level key is absent
    #[display("Scene is missing '{}'", _0)]
    MissingField(&'static str),
    /// `content` is not an array
    #[display("Scene 'content' is not an array")]
    ContentNotArray,
    /// A content item is not an object
    #[display("Content item {} is not an object", _0)]
    ItemNotObject(usize),
    /// A content item has no usable `type`
    #[display("Content item {} has unknown type '{}'", index, found)]
    UnknownItemType {
        /// Position in `content`
        index: usize,
        /// The offending type, empty when absent
        found: String,
    },
    /// A content item lacks a field its type requires
    #[display("Content item {} is missing '{}'", index, field)]
    MissingItemField {
        /// Position in `content`
        index: usize,
        /// The missing field
        field: &'static str,
    },
}

/// Check a scene payload and convert it to [`SceneContent`].
///
/// Requires an object with `scene_number`, `location`, `time` and a
/// `content` array whose items each carry a `type` of `action`, `dialog` or
/// `transition` plus `text`; dialog items also need `character`. Scalar
/// values that are not strings are kept as their JSON text.
///
/// # Examples
///
/// ```
/// use scriptorium_narrative::{SceneIssue, validate_scene};
/// use serde_json::json;
///
/// let scene = validate_scene(&json!({
///     "scene_number": "1.1.1",
///     "location": "Lighthouse gallery",
///     "time": "Dusk",
///     "content": [
///         {"type": "action", "text": "Wind rattles the glass."},
///         {"type": "dialog", "character": "Maren", "text": "Someone's out there."}
///     ]
/// })).unwrap();
/// assert_eq!(scene.content.len(), 2);
///
/// let issue = validate_scene(&json!({
///     "scene_number": "1.1.1",
///     "location": "Lighthouse gallery",
///     "time": "Dusk",
///     "content": [{"type": "dialog", "text": "Who said that?"}]
/// })).unwrap_err();
/// assert_eq!(issue, SceneIssue::MissingItemField { index: 0, field: "character" });
/// ```
pub fn validate_scene(payload: &Value) -> Result<SceneContent, SceneIssue> {
    let object = payload.as_object().ok_or(SceneIssue::NotAnObject)?;

    if let Some(missing) = REQUIRED_FIELDS
        .iter()
        .find(|field| object.get(**field).is_none_or(Value::is_null))
    {
        return Err(SceneIssue::MissingField(*missing));
    }

    let items = object
        .get("content")
        .and_then(Value::as_array)
        .ok_or(SceneIssue::ContentNotArray)?;

    let content = items
        .iter()
        .enumerate()
        .map(|(index, item)| content_item(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SceneContent {
        scene_number: SceneNumber::new(scalar_text(&object["scene_number"])),
        location: scalar_text(&object["location"]),
        time: scalar_text(&object["time"]),
        content,
    })
}

fn content_item(index: usize, item: &Value) -> Result<ContentItem, SceneIssue> {
    let object = item.as_object().ok_or(SceneIssue::ItemNotObject(index))?;
    let kind = object.get("type").and_then(Value::as_str).unwrap_or("");

    let text = |field: &'static str, object: &Map<String, Value>| {
        object
            .get(field)
            .filter(|v| !v.is_null())
            .map(scalar_text)
            .ok_or(SceneIssue::MissingItemField { index, field })
    };

    match kind.trim().to_ascii_lowercase().as_str() {
        "action" => Ok(ContentItem::Action {
            text: text("text", object)?,
        }),
        "dialog" => Ok(ContentItem::Dialog {
            character: text("character", object)?,
            text: text("text", object)?,
        }),
        "transition" => Ok(ContentItem::Transition {
            text: text("text", object)?,
        }),
        _ => Err(SceneIssue::UnknownItemType {
            index,
            found: kind.to_string(),
        }),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scene(content: Value) -> Value {
        json!({
            "scene_number": "2.1.3",
            "location": "Harbor",
            "time": "Night",
            "content": content
        })
    }

    #[test]
    fn rejects_non_objects() {
        assert_eq!(validate_scene(&json!([1, 2])), Err(SceneIssue::NotAnObject));
        assert_eq!(validate_scene(&json!("scene")), Err(SceneIssue::NotAnObject));
    }

    #[test]
    fn reports_first_missing_field() {
        let issue = validate_scene(&json!({"scene_number": "1", "content": []})).unwrap_err();
        assert_eq!(issue, SceneIssue::MissingField("location"));
    }

    #[test]
    fn content_must_be_an_array() {
        let issue = validate_scene(&scene(json!("INT. HARBOR"))).unwrap_err();
        assert_eq!(issue, SceneIssue::ContentNotArray);
    }

    #[test]
    fn unknown_item_type_is_reported_with_position() {
        let issue = validate_scene(&scene(json!([
            {"type": "action", "text": "Fog."},
            {"type": "montage", "text": "Years pass."}
        ])))
        .unwrap_err();
        assert_eq!(
            issue,
            SceneIssue::UnknownItemType {
                index: 1,
                found: "montage".to_string()
            }
        );
    }

    #[test]
    fn item_without_text_is_rejected() {
        let issue = validate_scene(&scene(json!([{"type": "transition"}]))).unwrap_err();
        assert_eq!(
            issue,
            SceneIssue::MissingItemField {
                index: 0,
                field: "text"
            }
        );
    }

    #[test]
    fn numeric_scene_number_is_accepted() {
        let mut payload = scene(json!([{"type": "Action", "text": "Gulls."}]));
        payload["scene_number"] = json!(2.1);
        let content = validate_scene(&payload).unwrap();
        assert_eq!(content.scene_number.as_str(), "2.1");
        assert_eq!(content.content[0].text(), "Gulls.");
    }

    #[test]
    fn empty_content_is_structurally_valid() {
        assert!(validate_scene(&scene(json!([]))).is_ok());
    }
}
