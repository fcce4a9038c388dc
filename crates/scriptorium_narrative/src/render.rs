//! Markdown rendering of scenes and scripts.

use scriptorium_core::{ContentItem, GeneratedScene, SceneContent, SceneNumber};

/// Act number inferred from a scene key.
///
/// Uses the leading numeric component, else the first run of digits anywhere
/// in the key. `None` means the act is unknown.
///
/// ```
/// use scriptorium_core::SceneNumber;
/// use scriptorium_narrative::act_of;
///
/// assert_eq!(act_of(&SceneNumber::from("2.3.1")), Some(2));
/// assert_eq!(act_of(&SceneNumber::from("Scene 4.1")), Some(4));
/// assert_eq!(act_of(&SceneNumber::from("epilogue")), None);
/// ```
pub fn act_of(scene_number: &SceneNumber) -> Option<u64> {
    scene_number
        .leading_number()
        .or_else(|| scene_number.first_digits())
}

/// Render one scene as markdown.
///
/// Action lines become paragraphs, dialog puts the upper-cased speaker on
/// its own line above the text, and transitions are upper-cased.
///
/// ```
/// use scriptorium_core::{ContentItem, SceneContent, SceneNumber};
/// use scriptorium_narrative::render_scene;
///
/// let scene = SceneContent {
///     scene_number: SceneNumber::from("1.1.1"),
///     location: "Pier".into(),
///     time: "Dawn".into(),
///     content: vec![
///         ContentItem::Dialog { character: "Ines".into(), text: "It's late.".into() },
///         ContentItem::Transition { text: "cut to:".into() },
///     ],
/// };
/// let markdown = render_scene(&SceneNumber::from("1.1.1"), &scene);
/// assert!(markdown.contains("INES\nIt's late."));
/// assert!(markdown.contains("CUT TO:"));
/// ```
pub fn render_scene(scene_number: &SceneNumber, scene: &SceneContent) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "## Scene {}: {} - {}\n\n",
        scene_number, scene.location, scene.time
    ));

    for item in &scene.content {
        match item {
            ContentItem::Action { text } => out.push_str(&format!("{}\n\n", text)),
            ContentItem::Dialog { character, text } => {
                out.push_str(&format!("{}\n{}\n\n", character.to_uppercase(), text))
            }
            ContentItem::Transition { text } => {
                out.push_str(&format!("{}\n\n", text.to_uppercase()))
            }
        }
    }

    out
}

/// Render generated scenes in order as one markdown script.
///
/// An act heading is emitted whenever the inferred act changes. Scenes
/// without usable content are left out.
pub fn render_script(scenes: &[GeneratedScene]) -> String {
    let mut out = String::new();
    let mut current_act: Option<Option<u64>> = None;

    for generated in scenes {
        let Some(content) = &generated.content else {
            continue;
        };

        let act = act_of(&generated.scene_number);
        if current_act != Some(act) {
            match act {
                Some(number) => out.push_str(&format!("# Act {}\n\n", number)),
                None => out.push_str("# Act ?\n\n"),
            }
            current_act = Some(act);
        }

        out.push_str(&render_scene(&generated.scene_number, content));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(number: &str, content: Option<Vec<ContentItem>>) -> GeneratedScene {
        GeneratedScene {
            scene_number: SceneNumber::from(number),
            content: content.map(|content| SceneContent {
                scene_number: SceneNumber::from(number),
                location: "Deck".into(),
                time: "Noon".into(),
                content,
            }),
            evaluation: None,
            score: 0,
            accepted: false,
        }
    }

    fn action(text: &str) -> Vec<ContentItem> {
        vec![ContentItem::Action { text: text.into() }]
    }

    #[test]
    fn act_headings_only_on_change() {
        let script = render_script(&[
            generated("1.1.1", Some(action("One."))),
            generated("1.1.2", Some(action("Two."))),
            generated("2.1.1", Some(action("Three."))),
        ]);
        assert_eq!(script.matches("# Act 1\n").count(), 1);
        assert_eq!(script.matches("# Act 2\n").count(), 1);
        assert!(script.find("Two.").unwrap() < script.find("# Act 2").unwrap());
    }

    #[test]
    fn unknown_act_gets_sentinel_heading() {
        let script = render_script(&[generated("coda", Some(action("Silence.")))]);
        assert!(script.starts_with("# Act ?\n"));
    }

    #[test]
    fn scenes_without_content_are_skipped() {
        let script = render_script(&[
            generated("1.1.1", None),
            generated("1.1.2", Some(action("Kept."))),
        ]);
        assert!(!script.contains("1.1.1"));
        assert!(script.contains("## Scene 1.1.2: Deck - Noon"));
    }

    #[test]
    fn scene_layout_is_exact() {
        let scene = SceneContent {
            scene_number: SceneNumber::from("1.2.1"),
            location: "Dock".into(),
            time: "Dusk".into(),
            content: vec![
                ContentItem::Action {
                    text: "Ropes creak.".into(),
                },
                ContentItem::Dialog {
                    character: "Ines".into(),
                    text: "Cast off.".into(),
                },
                ContentItem::Transition {
                    text: "fade out.".into(),
                },
            ],
        };
        assert_eq!(
            render_scene(&SceneNumber::from("1.2.1"), &scene),
            "## Scene 1.2.1: Dock - Dusk\n\nRopes creak.\n\nINES\nCast off.\n\nFADE OUT.\n\n"
        );
    }

    #[test]
    fn action_renders_as_paragraph() {
        let scene = generated("1.1.1", Some(action("Rain on tin."))).content.unwrap();
        let markdown = render_scene(&SceneNumber::from("1.1.1"), &scene);
        assert!(markdown.ends_with("Rain on tin.\n\n"));
    }
}
