use crate::dom::document::{Document, NodeId};
use crate::extract::extractor::ExtractedPost;
use crate::platform::descriptor::ControlAnchor;

/// Marker class carried by every save control; the scanner's only
/// "already annotated" test.
pub const CONTROL_CLASS: &str = "linkogenei-save-btn";
pub const STATE_ATTRIBUTE: &str = "data-linkogenei-state";
pub const SAVED_CLASS: &str = "saved";

pub const LABEL_IDLE: &str = "Save to Genei";
pub const LABEL_SUBMITTING: &str = "Saving...";
pub const LABEL_SAVED: &str = "Saved!";

/// Lifecycle of one save control. `Saved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Submitting,
    Saved,
}

impl SaveState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveState::Idle => "idle",
            SaveState::Submitting => "submitting",
            SaveState::Saved => "saved",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "idle" => Some(SaveState::Idle),
            "submitting" => Some(SaveState::Submitting),
            "saved" => Some(SaveState::Saved),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SaveState::Idle => LABEL_IDLE,
            SaveState::Submitting => LABEL_SUBMITTING,
            SaveState::Saved => LABEL_SAVED,
        }
    }
}

/// A save control injected into a post, together with the post data it
/// submits when clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveControl {
    pub id: NodeId,
    pub post: NodeId,
    pub extracted: ExtractedPost,
}

/// Injects save controls into post containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Annotator {
    anchor: ControlAnchor,
}

impl Annotator {
    pub fn new(anchor: ControlAnchor) -> Self {
        Self { anchor }
    }

    /// Whether `post` already carries a save control as a direct child.
    pub fn is_annotated(&self, doc: &Document, post: NodeId) -> bool {
        doc.children(post)
            .iter()
            .any(|child| doc.has_class(*child, CONTROL_CLASS))
    }

    /// Attach one control to `post` as an absolutely positioned overlay.
    ///
    /// A post in default static flow is switched to relative positioning so
    /// the overlay does not shift its siblings; any other positioning is left
    /// alone.
    pub fn annotate(&self, doc: &mut Document, post: NodeId, extracted: ExtractedPost) -> SaveControl {
        if doc.computed_position(post) == "static" {
            doc.set_style(post, "position", "relative");
        }

        let control = doc.create_element("button");
        doc.set_attribute(control, "type", "button");
        doc.set_attribute(control, "class", CONTROL_CLASS);
        doc.set_attribute(control, "title", &extracted.url);
        doc.set_attribute(control, "style", &anchor_style(self.anchor));
        apply_state(doc, control, SaveState::Idle);
        doc.append_child(post, control);

        SaveControl {
            id: control,
            post,
            extracted,
        }
    }
}

fn anchor_style(anchor: ControlAnchor) -> String {
    let (vertical, horizontal) = match anchor {
        ControlAnchor::TopRight => ("top", "right"),
        ControlAnchor::TopLeft => ("top", "left"),
        ControlAnchor::BottomRight => ("bottom", "right"),
        ControlAnchor::BottomLeft => ("bottom", "left"),
    };
    format!(
        "position: absolute; {}: 8px; {}: 8px; z-index: 9999;",
        vertical, horizontal
    )
}

/// Current state of a control, read back from its state attribute.
pub fn control_state(doc: &Document, control: NodeId) -> Option<SaveState> {
    doc.attribute(control, STATE_ATTRIBUTE).and_then(SaveState::parse)
}

/// Move a control to `state`, updating its label and enabled flag.
/// Returns false (and changes nothing) when the control is already saved.
pub fn set_control_state(doc: &mut Document, control: NodeId, state: SaveState) -> bool {
    if control_state(doc, control) == Some(SaveState::Saved) && state != SaveState::Saved {
        return false;
    }
    apply_state(doc, control, state);
    true
}

fn apply_state(doc: &mut Document, control: NodeId, state: SaveState) {
    match state {
        SaveState::Idle => doc.remove_attribute(control, "disabled"),
        SaveState::Submitting | SaveState::Saved => doc.set_attribute(control, "disabled", ""),
    }
    if state == SaveState::Saved {
        doc.add_class(control, SAVED_CLASS);
    }
    doc.set_text(control, state.label());
    doc.set_attribute(control, STATE_ATTRIBUTE, state.as_str());
}

pub fn is_disabled(doc: &Document, control: NodeId) -> bool {
    doc.attribute(control, "disabled").is_some()
}

/// Remove every save control from the page. Returns how many were removed.
pub fn remove_all_controls(doc: &mut Document) -> usize {
    let body = doc.body();
    let controls: Vec<NodeId> = doc
        .descendants(body)
        .into_iter()
        .filter(|n| doc.has_class(*n, CONTROL_CLASS))
        .collect();

    controls.into_iter().filter(|c| doc.remove(*c)).count()
}
