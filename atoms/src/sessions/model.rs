use mirage_shared::{Provider, Viewport};
use serde::{Deserialize, Serialize};

// ========== SESSION ==========

/// One ongoing simulated-browsing interaction.
///
/// `current_image` always corresponds to the image that produced the most
/// recent `click_history` entry (or the initial generation when the history
/// is empty), and `input_fields` are always detected against `current_image`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Session {
    pub session_id: String,
    pub initial_prompt: String,
    /// Canonical data-URL encoding of the most recently produced image.
    pub current_image: String,
    pub click_history: Vec<ClickEvent>,
    pub input_fields: Vec<InputFieldRegion>,
    pub state: SessionState,
    pub provider: Provider,
    pub viewport: Viewport,
    pub created_at: String,
    pub updated_at: String,
}

/// `Empty` is the absence of a record; a stored session is either idle or has
/// exactly one operation in flight.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Ready,
    Pending,
}

// ========== CLICK EVENT ==========

/// Immutable record of one accepted click-edit.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClickEvent {
    /// Normalized percentage coordinates (0-100) relative to the image the
    /// user clicked on.
    pub x: f64,
    pub y: f64,
    pub timestamp: String,
    pub description: String,
    /// The annotated image actually submitted to the edit call, kept for
    /// provenance and history display. Owned by this event, never mutated.
    pub image_with_dot: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClickClassification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClickClassification {
    pub kind: ClickKind,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationHint>,
}

impl ClickClassification {
    /// The safe default: treat the click as a button press. Misreading an
    /// input as a button still produces a visible edit; the reverse silently
    /// swallows the click.
    pub fn fallback() -> Self {
        ClickClassification {
            kind: ClickKind::Button,
            confidence: Confidence::Low,
            navigation: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClickKind {
    Button,
    Input,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NavigationHint {
    pub will_navigate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

// ========== INPUT FIELD ==========

/// A detected type-into-able region, in normalized 0-1 fractions of the image
/// dimensions. Valid only for the image it was detected against.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InputFieldRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl InputFieldRegion {
    /// Hit-test against a click given in 0-100 percent coordinates.
    pub fn contains_percent(&self, x: f64, y: f64) -> bool {
        let left = self.x * 100.0;
        let top = self.y * 100.0;
        let right = left + self.width * 100.0;
        let bottom = top + self.height * 100.0;
        x >= left && x <= right && y >= top && y <= bottom
    }
}

impl Session {
    /// Builds the `Ready` session produced by a successful initial generation.
    pub fn create(
        initial_prompt: String,
        current_image: String,
        input_fields: Vec<InputFieldRegion>,
        provider: Provider,
        viewport: Viewport,
    ) -> Session {
        let now = chrono::Utc::now().to_rfc3339();
        Session {
            session_id: uuid::Uuid::new_v4().to_string(),
            initial_prompt,
            current_image,
            click_history: Vec::new(),
            input_fields,
            state: SessionState::Ready,
            provider,
            viewport,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Applies one accepted click-edit: the event is appended, the current
    /// image becomes the edit output (not the annotated submission), and the
    /// detected input fields are replaced wholesale, never merged.
    pub fn apply_click_edit(
        &mut self,
        click: ClickEvent,
        new_image: String,
        input_fields: Vec<InputFieldRegion>,
    ) {
        self.click_history.push(click);
        self.current_image = new_image;
        self.input_fields = input_fields;
        self.state = SessionState::Ready;
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Finds the detected input region under a click, if any.
    pub fn find_input_at(&self, x: f64, y: f64) -> Option<&InputFieldRegion> {
        self.input_fields
            .iter()
            .find(|input| input.contains_percent(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(x: f64, y: f64, dot_image: &str) -> ClickEvent {
        ClickEvent {
            x,
            y,
            timestamp: chrono::Utc::now().to_rfc3339(),
            description: format!("User clicked at position ({}, {})", x, y),
            image_with_dot: dot_image.to_string(),
            classification: None,
            user_text: None,
        }
    }

    fn session() -> Session {
        Session::create(
            "A minimalist portfolio site for a photographer".to_string(),
            "data:image/png;base64,aW5pdGlhbA==".to_string(),
            vec![],
            Provider::Gemini,
            Viewport::default(),
        )
    }

    #[test]
    fn create_starts_ready_with_empty_history() {
        let s = session();
        assert_eq!(s.state, SessionState::Ready);
        assert!(s.click_history.is_empty());
        assert_eq!(s.created_at, s.updated_at);
    }

    #[test]
    fn accepted_edits_append_in_order_and_track_the_edit_output() {
        let mut s = session();
        for n in 1..=3 {
            let edited = format!("data:image/png;base64,ZWRpdHtufQ=={}", n);
            s.apply_click_edit(click(50.0, 10.0 * n as f64, "data:annotated"), edited.clone(), vec![]);
            assert_eq!(s.click_history.len(), n);
            // The session tracks the edit output, never the annotated submission
            assert_eq!(s.current_image, edited);
        }
        assert_eq!(s.click_history[0].y, 10.0);
        assert_eq!(s.click_history[2].y, 30.0);
    }

    #[test]
    fn input_fields_are_replaced_not_merged() {
        let mut s = session();
        let first = InputFieldRegion {
            x: 0.1,
            y: 0.1,
            width: 0.5,
            height: 0.05,
            label: "Search".to_string(),
            field_type: "search".to_string(),
        };
        s.apply_click_edit(click(50.0, 50.0, "dot"), "data:a".to_string(), vec![first]);
        assert_eq!(s.input_fields.len(), 1);

        s.apply_click_edit(click(60.0, 60.0, "dot"), "data:b".to_string(), vec![]);
        assert!(s.input_fields.is_empty());
    }

    #[test]
    fn find_input_at_hit_tests_in_percent_space() {
        let mut s = session();
        s.input_fields = vec![InputFieldRegion {
            x: 0.25,
            y: 0.1,
            width: 0.5,
            height: 0.08,
            label: "Search box".to_string(),
            field_type: "search".to_string(),
        }];
        assert!(s.find_input_at(50.0, 14.0).is_some());
        assert!(s.find_input_at(50.0, 30.0).is_none());
        assert!(s.find_input_at(10.0, 14.0).is_none());
        // Edges are inclusive
        assert!(s.find_input_at(25.0, 10.0).is_some());
        assert!(s.find_input_at(75.0, 18.0).is_some());
    }
}
