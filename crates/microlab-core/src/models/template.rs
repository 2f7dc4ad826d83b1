//! Questionnaire templates: named lists of simple fields, no branching.

use serde::{Deserialize, Serialize};

/// How a template field is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Pick one entry of the comma-separated options
    SingleChoice,
    #[default]
    ShortText,
    LongText,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::SingleChoice => "single_choice",
            FieldKind::ShortText => "short_text",
            FieldKind::LongText => "long_text",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim() {
            "single_choice" => Some(FieldKind::SingleChoice),
            "short_text" => Some(FieldKind::ShortText),
            "long_text" => Some(FieldKind::LongText),
            _ => None,
        }
    }
}

/// One question of a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TemplateField {
    pub title: String,
    #[serde(default)]
    pub kind: FieldKind,
    /// Comma-separated choices (single choice only)
    #[serde(default)]
    pub options: String,
}

impl TemplateField {
    /// Trimmed, non-blank choices.
    pub fn choices(&self) -> Vec<&str> {
        self.options
            .split(',')
            .map(str::trim)
            .filter(|choice| !choice.is_empty())
            .collect()
    }
}

/// A named questionnaire template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    /// Server-assigned ID
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Ordered field definitions
    pub fields: Vec<TemplateField>,
}

impl Template {
    /// Build an unsaved template. `id` is assigned by the store.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choices() {
        let field = TemplateField {
            title: "Smoker".into(),
            kind: FieldKind::SingleChoice,
            options: "Yes, No,, Former ".into(),
        };
        assert_eq!(field.choices(), vec!["Yes", "No", "Former"]);
    }

    #[test]
    fn test_field_kind_tags() {
        assert_eq!(FieldKind::parse("long_text"), Some(FieldKind::LongText));
        assert_eq!(FieldKind::parse("checkbox"), None);
        assert_eq!(FieldKind::SingleChoice.as_str(), "single_choice");
    }

    #[test]
    fn test_field_json_defaults() {
        let field: TemplateField = serde_json::from_str(r#"{"title": "Notes"}"#).unwrap();
        assert_eq!(field.kind, FieldKind::ShortText);
        assert!(field.choices().is_empty());
    }
}
