//! Interaction records forwarded from the presentation layer to content generators.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// What the user did to produce an [`InteractionRecord`].
pub enum InteractionKind {
    /// An application was opened from the desktop or the taskbar.
    AppOpen,
    /// A generated element was clicked.
    ElementClick,
    /// A generated form was submitted.
    FormSubmit,
    /// Text was entered into a generated field.
    TextInput,
    /// The window close control was activated.
    CloseButton,
    /// Any other forwarded event.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
/// Abstract UI role of the element that produced an interaction.
pub enum ElementKind {
    /// Desktop or taskbar icon.
    Icon,
    /// Push button.
    Button,
    /// Hyperlink-like element.
    Link,
    /// Input field.
    Field,
    /// Menu entry.
    MenuItem,
    /// Static text.
    Text,
    /// Unclassified element.
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One user-originated event fed to the content generator.
///
/// `id` identifies the originating element within its app and is reused when the same element is
/// activated again; it is not unique across time.
pub struct InteractionRecord {
    /// Stable element identifier.
    pub id: String,
    /// Interaction tag.
    pub kind: InteractionKind,
    /// Human-readable element label used as generation context.
    #[serde(default)]
    pub display_text: String,
    /// UI role of the element.
    #[serde(default)]
    pub element_kind: ElementKind,
    /// App the interaction happened in; `None` for desktop-level events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_context: Option<String>,
}

impl InteractionRecord {
    /// Creates a record with no app context.
    pub fn new(id: impl Into<String>, kind: InteractionKind) -> Self {
        Self {
            id: id.into(),
            kind,
            display_text: String::new(),
            element_kind: ElementKind::Other,
            app_context: None,
        }
    }

    /// Synthetic record emitted when an app is opened.
    pub fn app_open(app_id: impl Into<String>, app_name: impl Into<String>) -> Self {
        let app_id = app_id.into();
        Self {
            id: app_id.clone(),
            kind: InteractionKind::AppOpen,
            display_text: app_name.into(),
            element_kind: ElementKind::Icon,
            app_context: Some(app_id),
        }
    }

    /// Click on a generated element.
    pub fn click(id: impl Into<String>, display_text: impl Into<String>) -> Self {
        Self::new(id, InteractionKind::ElementClick)
            .with_text(display_text)
            .with_element_kind(ElementKind::Button)
    }

    /// Sets the display text.
    pub fn with_text(mut self, display_text: impl Into<String>) -> Self {
        self.display_text = display_text.into();
        self
    }

    /// Sets the element role.
    pub fn with_element_kind(mut self, element_kind: ElementKind) -> Self {
        self.element_kind = element_kind;
        self
    }

    /// Attaches the app the interaction occurred in.
    pub fn in_app(mut self, app_id: impl Into<String>) -> Self {
        self.app_context = Some(app_id.into());
        self
    }

    /// Returns whether the interaction happened on the desktop rather than inside an app.
    pub fn is_desktop_level(&self) -> bool {
        self.app_context.as_deref().map_or(true, str::is_empty)
    }
}

/// Parses a JSON interaction payload forwarded by the presentation layer.
///
/// Empty `app_context` strings are normalized to `None`.
///
/// # Errors
///
/// Returns an error when the payload is not a valid interaction record or carries an empty id.
pub fn parse_interaction_payload(raw: &str) -> Result<InteractionRecord, String> {
    let mut record: InteractionRecord = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    if record.id.trim().is_empty() {
        return Err("interaction payload has an empty id".to_string());
    }
    if record.app_context.as_deref() == Some("") {
        record.app_context = None;
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_open_record_carries_app_context() {
        let record = InteractionRecord::app_open("notepad", "Notepad");
        assert_eq!(record.id, "notepad");
        assert_eq!(record.kind, InteractionKind::AppOpen);
        assert_eq!(record.element_kind, ElementKind::Icon);
        assert_eq!(record.app_context.as_deref(), Some("notepad"));
        assert!(!record.is_desktop_level());
    }

    #[test]
    fn payload_parsing_normalizes_empty_app_context() {
        let record = parse_interaction_payload(
            r#"{"id":"save","kind":"element_click","display_text":"Save","element_kind":"button","app_context":""}"#,
        )
        .expect("parse");
        assert_eq!(record.kind, InteractionKind::ElementClick);
        assert_eq!(record.element_kind, ElementKind::Button);
        assert!(record.is_desktop_level());
    }

    #[test]
    fn payload_parsing_rejects_blank_ids_and_unknown_kinds() {
        assert!(parse_interaction_payload(r#"{"id":"  ","kind":"app_open"}"#).is_err());
        assert!(parse_interaction_payload(r#"{"id":"x","kind":"hover"}"#).is_err());
    }
}
