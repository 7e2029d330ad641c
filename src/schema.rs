//! Declarative payload shapes and the validator that enforces them.
//!
//! A [`Shape`] is a fixed list of [`Field`]s. [`Shape::validate`] narrows an
//! arbitrary JSON value to exactly those fields or returns the first
//! [`ValidationFailure`], checking fields in declaration order.

use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: Kind,
    pub required: bool,
    /// Maximum length in characters, mirrors the column width.
    pub max_len: Option<usize>,
}

impl Field {
    const fn required_string(name: &'static str, max_len: usize) -> Self {
        Self {
            name,
            kind: Kind::String,
            required: true,
            max_len: Some(max_len),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Shape {
    pub fields: &'static [Field],
}

pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 300;
pub const USER_MAX: usize = 100;

/// Body accepted by `POST /adv/`. `id` and `creationDate` belong to the store.
pub const CREATE_ADVERTISEMENT: Shape = Shape {
    fields: &[
        Field::required_string("title", TITLE_MAX),
        Field::required_string("description", DESCRIPTION_MAX),
        Field::required_string("user", USER_MAX),
    ],
};

/// Why a payload was rejected.
///
/// `loc` is the path to the offending field, `input` is the rejected value
/// (the enclosing object when a field is missing).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ValidationFailure {
    #[serde(rename = "type")]
    #[schema(value_type = String)]
    pub kind: &'static str,
    pub loc: Vec<String>,
    pub msg: String,
    #[schema(value_type = Object)]
    pub input: Value,
}

impl ValidationFailure {
    fn at(field: &Field, kind: &'static str, msg: String, input: Value) -> Self {
        Self {
            kind,
            loc: vec![field.name.to_string()],
            msg,
            input,
        }
    }

    /// The body could not be read as JSON at all.
    #[must_use]
    pub fn json_invalid(reason: impl Into<String>) -> Self {
        Self {
            kind: "json_invalid",
            loc: Vec::new(),
            msg: reason.into(),
            input: Value::Null,
        }
    }

    /// Name of the offending field, if the failure is tied to one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.loc.first().map(String::as_str)
    }
}

impl Shape {
    /// Narrow `payload` to this shape.
    ///
    /// Unknown keys are dropped. Keys absent from the payload are absent from
    /// the result; an explicit `null` on an optional field is kept.
    /// # Errors
    /// Returns the first field that is missing, mistyped or too long.
    pub fn validate(&self, payload: &Value) -> Result<Map<String, Value>, ValidationFailure> {
        let Some(object) = payload.as_object() else {
            return Err(ValidationFailure {
                kind: "model_type",
                loc: Vec::new(),
                msg: "Input should be a valid dictionary".to_string(),
                input: payload.clone(),
            });
        };

        let mut narrowed = Map::new();
        for field in self.fields {
            match object.get(field.name) {
                None if field.required => {
                    return Err(ValidationFailure::at(
                        field,
                        "missing",
                        "Field required".to_string(),
                        payload.clone(),
                    ));
                }
                None => {}
                Some(Value::Null) if !field.required => {
                    narrowed.insert(field.name.to_string(), Value::Null);
                }
                Some(value) => {
                    check(field, value)?;
                    narrowed.insert(field.name.to_string(), value.clone());
                }
            }
        }

        Ok(narrowed)
    }
}

fn check(field: &Field, value: &Value) -> Result<(), ValidationFailure> {
    match field.kind {
        Kind::String => {
            let Some(text) = value.as_str() else {
                return Err(ValidationFailure::at(
                    field,
                    "string_type",
                    "Input should be a valid string".to_string(),
                    value.clone(),
                ));
            };
            if let Some(max) = field.max_len {
                if text.chars().count() > max {
                    return Err(ValidationFailure::at(
                        field,
                        "string_too_long",
                        format!("String should have at most {max} characters"),
                        value.clone(),
                    ));
                }
            }
        }
    }

    Ok(())
}
