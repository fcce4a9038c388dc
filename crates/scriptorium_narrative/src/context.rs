//! Context carried from one scene's generation to the next.

use crate::act_of;
use scriptorium_core::{ElementScope, SceneNumber, StoryElement};
use tracing::debug;

/// Story elements in scope for the scene being generated.
///
/// Global elements live for the whole run. Act elements are dropped when the
/// act changes. Scene elements are never kept.
///
/// # Examples
///
/// ```
/// use scriptorium_core::{ElementScope, SceneNumber, StoryElement};
/// use scriptorium_narrative::StoryContext;
///
/// let element = |scope, content: &str| StoryElement {
///     kind: "object".into(),
///     content: content.into(),
///     scope,
///     scene_number: None,
/// };
///
/// let mut context = StoryContext::default();
/// context.enter_act(1);
/// context.absorb(
///     &SceneNumber::from("1.1.1"),
///     vec![
///         element(ElementScope::Global, "The brass key"),
///         element(ElementScope::Act, "The storm"),
///         element(ElementScope::Scene, "A spilled cup"),
///     ],
/// );
/// assert_eq!(context.elements().count(), 2);
///
/// context.enter_act(2);
/// let kept: Vec<&str> = context.elements().map(|e| e.content.as_str()).collect();
/// assert_eq!(kept, vec!["The brass key"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StoryContext {
    global: Vec<StoryElement>,
    act: Vec<StoryElement>,
    current_act: Option<u32>,
}

impl StoryContext {
    /// Move to `act_number`, dropping act-scoped elements from any other act.
    pub fn enter_act(&mut self, act_number: u32) {
        if self.current_act != Some(act_number) {
            if !self.act.is_empty() {
                debug!(
                    dropped = self.act.len(),
                    act_number, "Leaving act, dropping act-scoped elements"
                );
            }
            self.act.clear();
            self.current_act = Some(act_number);
        }
    }

    /// Fold newly extracted elements in.
    ///
    /// Elements without a scene number are attributed to `scene_number`.
    /// Act-scoped elements whose scene number points at another act are dropped.
    pub fn absorb(&mut self, scene_number: &SceneNumber, elements: Vec<StoryElement>) {
        for mut element in elements {
            let origin = element
                .scene_number
                .get_or_insert_with(|| scene_number.clone());
            match element.scope {
                ElementScope::Global => self.global.push(element),
                ElementScope::Act => {
                    let origin_act = act_of(origin);
                    let current = self.current_act.map(u64::from);
                    if origin_act.is_none() || current.is_none() || origin_act == current {
                        self.act.push(element);
                    }
                }
                ElementScope::Scene => {}
            }
        }
    }

    /// Elements in scope: global, then current-act.
    pub fn elements(&self) -> impl Iterator<Item = &StoryElement> {
        self.global.iter().chain(self.act.iter())
    }

    /// Whether nothing is in scope.
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.act.is_empty()
    }

    /// Elements in scope as pretty JSON, for prompts.
    pub fn to_prompt_text(&self) -> String {
        let elements: Vec<&StoryElement> = self.elements().collect();
        serde_json::to_string_pretty(&elements).unwrap_or_else(|_| "[]".to_string())
    }
}

/// The last `limit` characters of `script`, or all of it when `limit` is `None`.
///
/// ```
/// use scriptorium_narrative::script_tail;
///
/// assert_eq!(script_tail("abcdef", Some(3)), "def");
/// assert_eq!(script_tail("abc", Some(10)), "abc");
/// assert_eq!(script_tail("naïve", Some(3)), "ïve");
/// assert_eq!(script_tail("abc", None), "abc");
/// ```
pub fn script_tail(script: &str, limit: Option<usize>) -> &str {
    let Some(limit) = limit else {
        return script;
    };
    let count = script.chars().count();
    if count <= limit {
        return script;
    }
    let start = script
        .char_indices()
        .nth(count - limit)
        .map(|(index, _)| index)
        .unwrap_or(0);
    &script[start..]
}
