//! Field schemas
//!
//! A `FieldSchema` describes the fields of one resource: how to label them,
//! how to render a cell, which inputs the edit form shows and which rules a
//! submitted value must pass. Select options are plain values on the schema;
//! refreshing them produces a new schema instead of mutating a shared one.

use serde::{Deserialize, Serialize};

use crate::error::{DashError, Result};
use crate::record::{Collection, Record};
use crate::validation::{FieldErrors, Rule, ValidationError};
use crate::value::{parse_datetime, Value};

/// Input kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Date,
    Select,
}

/// One `{value, label}` choice of a select field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Build options from a related collection, e.g. programs for a student form.
    ///
    /// The option value is the string form of `value_field`; records without
    /// that field are skipped.
    pub fn from_collection<F>(collection: &Collection, value_field: &str, label: F) -> Vec<Self>
    where
        F: Fn(&Record) -> String,
    {
        collection
            .iter()
            .filter(|r| !r.value(value_field).is_blank())
            .map(|r| Self::new(r.value(value_field).key(), label(r)))
            .collect()
    }
}

/// Declaration of a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

impl FieldSpec {
    fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            options: Vec::new(),
            required: false,
            rules: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn email(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Email).rule(Rule::Email)
    }

    pub fn tel(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Tel)
    }

    pub fn date(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Date)
    }

    pub fn select(
        name: impl Into<String>,
        label: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        Self {
            options,
            ..Self::new(name, label, FieldKind::Select)
        }
    }

    /// Mark the field as mandatory
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Append a validation rule
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Label of the option whose value matches `value`
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }

    /// Text shown in a table cell for `value`
    pub fn display(&self, value: &Value) -> String {
        match self.kind {
            FieldKind::Select => self
                .option_label(&value.key())
                .unwrap_or("N/A")
                .to_string(),
            FieldKind::Date => value
                .as_datetime()
                .map(|dt| dt.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| value.to_string()),
            _ => value.to_string(),
        }
    }

    /// Validate the text of a submitted value
    pub fn check(&self, text: &str) -> std::result::Result<(), ValidationError> {
        if text.trim().is_empty() {
            if self.required {
                return Err(ValidationError::Empty {
                    field: self.label.clone(),
                });
            }
            return Ok(());
        }

        for rule in &self.rules {
            rule.check(&self.label, text)?;
        }

        match self.kind {
            FieldKind::Select if !self.options.is_empty() && self.option_label(text).is_none() => {
                Err(ValidationError::InvalidVariant {
                    field: self.label.clone(),
                    value: text.to_string(),
                })
            }
            FieldKind::Date if parse_datetime(text).is_none() => Err(ValidationError::InvalidFormat {
                field: self.label.clone(),
                reason: "expected a date (YYYY-MM-DD)",
            }),
            _ => Ok(()),
        }
    }
}

/// Ordered field declarations of one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    identity: String,
    /// The backend assigns the identity on create
    #[serde(default)]
    generated_identity: bool,
    fields: Vec<FieldSpec>,
}

impl FieldSchema {
    pub fn builder(identity: impl Into<String>) -> FieldSchemaBuilder {
        FieldSchemaBuilder {
            identity: identity.into(),
            generated_identity: false,
            fields: Vec::new(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn generated_identity(&self) -> bool {
        self.generated_identity
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// A copy of this schema with `field`'s options replaced
    pub fn with_options(&self, field: &str, options: Vec<SelectOption>) -> Result<Self> {
        let mut schema = self.clone();
        let spec = schema
            .fields
            .iter_mut()
            .find(|f| f.name == field)
            .ok_or_else(|| DashError::unknown_field(field))?;
        spec.options = options;
        Ok(schema)
    }

    /// Cell text for `field` of `record`
    pub fn display(&self, record: &Record, field: &str) -> String {
        let value = record.value(field);
        match self.field(field) {
            Some(spec) => spec.display(value),
            None => value.to_string(),
        }
    }

    /// Validate every declared field of `record`
    pub fn validate(&self, record: &Record) -> Result<()> {
        self.check_fields(record, |_| true)
    }

    /// Validate a record about to be created; a generated identity may be absent
    pub fn validate_new(&self, record: &Record) -> Result<()> {
        self.check_fields(record, |spec| {
            !(self.generated_identity && spec.name == self.identity)
        })
    }

    fn check_fields(&self, record: &Record, include: impl Fn(&FieldSpec) -> bool) -> Result<()> {
        let mut errors = FieldErrors::new();
        for spec in &self.fields {
            if !include(spec) {
                continue;
            }
            if let Err(e) = spec.check(&record.value(&spec.name).to_string()) {
                errors.insert(spec.name.clone(), e);
            }
        }
        errors.into_result()
    }
}

/// Consuming builder for `FieldSchema`
#[derive(Debug)]
pub struct FieldSchemaBuilder {
    identity: String,
    generated_identity: bool,
    fields: Vec<FieldSpec>,
}

impl FieldSchemaBuilder {
    /// The backend assigns identities, so create forms leave it blank
    pub fn generated_identity(mut self) -> Self {
        self.generated_identity = true;
        self
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Finish the schema. The identity field must be declared and required.
    pub fn build(mut self) -> Result<FieldSchema> {
        let identity = self
            .fields
            .iter_mut()
            .find(|f| f.name == self.identity)
            .ok_or_else(|| DashError::unknown_field(&self.identity))?;
        identity.required = true;

        Ok(FieldSchema {
            identity: self.identity,
            generated_identity: self.generated_identity,
            fields: self.fields,
        })
    }
}
