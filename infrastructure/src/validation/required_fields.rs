//! Required-field schema check for generated documents

use pipeline_application::SchemaValidator;
use pipeline_domain::{Document, SchemaValidationError, Stage};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy)]
enum Kind {
    String,
    Array,
}

impl Kind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Kind::String => value.is_string(),
            Kind::Array => value.is_array(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Kind::String => "a string",
            Kind::Array => "an array",
        }
    }
}

/// Top-level fields per stage
fn required(stage: Stage) -> &'static [(&'static str, Kind)] {
    match stage {
        Stage::Requirements => &[
            ("title", Kind::String),
            ("description", Kind::String),
            ("objectives", Kind::Array),
        ],
        Stage::Design => &[("summary", Kind::String), ("screens", Kind::Array)],
        Stage::Tickets => &[("milestone", Kind::String), ("tickets", Kind::Array)],
    }
}

/// Array field whose items must be objects carrying the given string fields
fn required_items(stage: Stage) -> Option<(&'static str, &'static [&'static str])> {
    match stage {
        Stage::Requirements => None,
        Stage::Design => Some(("screens", &["name"])),
        Stage::Tickets => Some(("tickets", &["id", "title"])),
    }
}

/// Accepts a JSON object that has every required field with the right type.
///
/// Extra fields are kept untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequiredFieldsValidator;

impl RequiredFieldsValidator {
    fn check_fields(
        stage: Stage,
        object: &Map<String, Value>,
        prefix: &str,
        fields: &[(&str, Kind)],
    ) -> Result<(), SchemaValidationError> {
        for (field, kind) in fields {
            let path = format!("{prefix}{field}");
            match object.get(*field) {
                None | Some(Value::Null) => {
                    return Err(SchemaValidationError::MissingField { stage, field: path });
                }
                Some(value) if !kind.matches(value) => {
                    return Err(SchemaValidationError::WrongType {
                        stage,
                        field: path,
                        expected: kind.describe().to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl SchemaValidator for RequiredFieldsValidator {
    fn validate(&self, stage: Stage, normalized: &str) -> Result<Document, SchemaValidationError> {
        let value: Value =
            serde_json::from_str(normalized).map_err(|e| SchemaValidationError::NotJson {
                stage,
                message: e.to_string(),
            })?;
        let Value::Object(object) = &value else {
            return Err(SchemaValidationError::NotAnObject { stage });
        };

        Self::check_fields(stage, object, "", required(stage))?;

        if let Some((array_field, item_fields)) = required_items(stage)
            && let Some(Value::Array(items)) = object.get(array_field)
        {
            let item_fields: Vec<_> = item_fields.iter().map(|f| (*f, Kind::String)).collect();
            for (index, item) in items.iter().enumerate() {
                let prefix = format!("{array_field}[{index}].");
                let Value::Object(item) = item else {
                    return Err(SchemaValidationError::WrongType {
                        stage,
                        field: format!("{array_field}[{index}]"),
                        expected: "an object".into(),
                    });
                };
                Self::check_fields(stage, item, &prefix, &item_fields)?;
            }
        }

        Ok(Document::new(stage, value))
    }
}
