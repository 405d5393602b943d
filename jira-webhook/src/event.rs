//! Jira webhook event projection.
//!
//! Only a handful of fields are read from the payload. Extraction is
//! best-effort: a missing or wrongly typed field becomes `None` and never
//! fails the request.
//!
//! ```text
//! raw JSON → serde_json::Value → ParsedEvent → summary + change lines
//! ```

use serde_json::Value;

/// Marker shown for each known Jira event type.
const EVENT_MARKERS: &[(&str, &str)] = &[
    ("jira:issue_created", "💡"),
    ("jira:issue_updated", "🛠️"),
    ("jira:issue_deleted", "🔥"),
];

/// Marker for a `webhookEvent` value, if it is a known event type.
pub fn event_marker(webhook_event: &str) -> Option<&'static str> {
    EVENT_MARKERS
        .iter()
        .find(|(event, _)| *event == webhook_event)
        .map(|(_, marker)| *marker)
}

/// A single field-level change attached to an issue update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangelogItem {
    pub field_id: Option<String>,
    pub from_string: Option<String>,
    pub to_string: Option<String>,
}

impl ChangelogItem {
    fn from_value(value: &Value) -> Self {
        Self {
            field_id: string_at(value, "/fieldId"),
            from_string: string_at(value, "/fromString"),
            to_string: string_at(value, "/toString"),
        }
    }

    /// Render as `   👉 field : from -> to`.
    pub fn change_line(&self) -> String {
        format!(
            "   👉 {} : {} -> {}",
            or_empty(&self.field_id),
            or_empty(&self.from_string),
            or_empty(&self.to_string)
        )
    }
}

/// Fields projected out of a Jira webhook payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEvent {
    /// `webhookEvent`
    pub webhook_event: Option<String>,
    /// `issue.key`
    pub issue_key: Option<String>,
    /// `issue.fields.project.key`
    pub project_key: Option<String>,
    /// `changelog.items[]`
    pub changes: Vec<ChangelogItem>,
}

impl ParsedEvent {
    /// Parse raw body bytes. Fails only when the body is not valid JSON.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(Self::from_value(&value))
    }

    /// Project the known fields out of an already parsed payload.
    pub fn from_value(value: &Value) -> Self {
        let changes = value
            .pointer("/changelog/items")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(ChangelogItem::from_value).collect())
            .unwrap_or_default();

        Self {
            webhook_event: string_at(value, "/webhookEvent"),
            issue_key: string_at(value, "/issue/key"),
            project_key: string_at(value, "/issue/fields/project/key"),
            changes,
        }
    }

    /// Marker for this event's type; empty for unknown or absent types.
    pub fn marker(&self) -> &'static str {
        self.webhook_event
            .as_deref()
            .and_then(event_marker)
            .unwrap_or_default()
    }

    /// Render the one-line summary, taking the ids from the request path.
    pub fn summary_line(&self, project_id: &str, issue_id: &str) -> String {
        format!(
            "{} issue {} ({}) in project {} (id: {})",
            self.marker(),
            or_empty(&self.issue_key),
            issue_id,
            or_empty(&self.project_key),
            project_id
        )
    }
}

fn string_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn or_empty(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or_default()
}
