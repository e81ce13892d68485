//! Delete confirmation and edit dialogs
//!
//! Both are plain state machines; rendering them is up to the surface (CLI
//! prompt or TUI overlay). Neither performs network calls.

use serde_json::Number;

use crate::error::{DashError, Result};
use crate::record::Record;
use crate::schema::{FieldKind, FieldSchema, SelectOption};
use crate::value::Value;

/// Confirmation gate for deleting one record: the operator must retype its identity
#[derive(Debug, Clone)]
pub struct DeleteConfirmation {
    identity_field: String,
    identity: Option<String>,
    item_type: String,
}

impl DeleteConfirmation {
    pub fn for_record(record: &Record, identity_field: &str, item_type: &str) -> Self {
        Self {
            identity_field: identity_field.to_string(),
            identity: record.identity_key(identity_field),
            item_type: item_type.to_string(),
        }
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    pub fn prompt(&self) -> String {
        format!(
            "This cannot be undone. Type the {} of the {} to confirm",
            self.identity_field, self.item_type
        )
    }

    /// Accept `typed` only if it equals the identity verbatim. Returns the identity.
    pub fn confirm(&self, typed: &str) -> Result<String> {
        let expected = self
            .identity
            .as_ref()
            .ok_or_else(|| DashError::missing_identity(&self.identity_field))?;

        if typed != expected {
            return Err(DashError::IdentityMismatch {
                field: self.identity_field.clone(),
                expected: expected.clone(),
                entered: typed.to_string(),
            });
        }
        Ok(expected.clone())
    }
}

/// One input of the edit form
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInput {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: String,
    pub options: Vec<SelectOption>,
    pub disabled: bool,
}

impl FieldInput {
    /// Label of the selected option, for select inputs
    pub fn selected_label(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == self.value)
            .map(|o| o.label.as_str())
    }
}

/// Edit form state for one record
#[derive(Debug, Clone)]
pub struct EditDraft {
    schema: FieldSchema,
    original: Record,
    inputs: Vec<FieldInput>,
    item_type: String,
    is_new: bool,
}

impl EditDraft {
    /// One input per schema field; the identity input is disabled
    pub fn from_record(schema: &FieldSchema, record: &Record, item_type: &str) -> Self {
        let inputs = schema
            .fields()
            .iter()
            .map(|spec| FieldInput {
                name: spec.name.clone(),
                label: spec.label.clone(),
                kind: spec.kind,
                value: record.value(&spec.name).to_string(),
                options: spec.options.clone(),
                disabled: spec.name == schema.identity(),
            })
            .collect();

        Self {
            schema: schema.clone(),
            original: record.clone(),
            inputs,
            item_type: item_type.to_string(),
            is_new: false,
        }
    }

    /// Empty form for a new record. The identity input is editable unless the
    /// backend assigns identities.
    pub fn blank(schema: &FieldSchema, item_type: &str) -> Self {
        let mut draft = Self::from_record(schema, &Record::new(), item_type);
        draft.is_new = true;
        for input in &mut draft.inputs {
            input.disabled = schema.generated_identity() && input.name == schema.identity();
        }
        draft
    }

    /// True for drafts made with `blank`
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    pub fn original(&self) -> &Record {
        &self.original
    }

    pub fn inputs(&self) -> &[FieldInput] {
        &self.inputs
    }

    pub fn input(&self, field: &str) -> Option<&FieldInput> {
        self.inputs.iter().find(|i| i.name == field)
    }

    fn input_mut(&mut self, field: &str) -> Result<&mut FieldInput> {
        let input = self
            .inputs
            .iter_mut()
            .find(|i| i.name == field)
            .ok_or_else(|| DashError::unknown_field(field))?;
        if input.disabled {
            return Err(DashError::ReadOnlyField {
                field: field.to_string(),
            });
        }
        Ok(input)
    }

    /// Set the text of an input. Select inputs only take one of their option values.
    pub fn set(&mut self, field: &str, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        let input = self.input_mut(field)?;
        if input.kind == FieldKind::Select
            && !input.options.is_empty()
            && !text.is_empty()
            && !input.options.iter().any(|o| o.value == text)
        {
            return Err(DashError::InvalidOption {
                field: field.to_string(),
                value: text,
            });
        }
        input.value = text;
        Ok(())
    }

    /// Move a select input to the next (or previous) option, wrapping around
    pub fn cycle_option(&mut self, field: &str, forward: bool) -> Result<()> {
        let input = self.input_mut(field)?;
        let n = input.options.len();
        if n == 0 {
            return Ok(());
        }
        let current = input.options.iter().position(|o| o.value == input.value);
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => n - 1,
            (Some(i), true) => (i + 1) % n,
            (Some(i), false) => (i + n - 1) % n,
        };
        input.value = input.options[next].value.clone();
        Ok(())
    }

    /// True when any input differs from the original record
    pub fn is_dirty(&self) -> bool {
        self.inputs
            .iter()
            .any(|i| i.value != self.original.value(&i.name).to_string())
    }

    /// Validate the inputs and produce the record to send.
    ///
    /// New drafts leave out blank inputs and skip a backend-assigned identity.
    pub fn finish(&self) -> Result<Record> {
        let mut record = self.original.clone();
        for input in &self.inputs {
            if self.is_new && input.value.trim().is_empty() {
                continue;
            }
            let original = self.original.value(&input.name);
            record.set(input.name.clone(), coerce(original, &input.value));
        }
        if self.is_new {
            self.schema.validate_new(&record)?;
        } else {
            self.schema.validate(&record)?;
        }
        Ok(record)
    }
}

/// Convert form text back to a value, keeping the original's runtime type when it fits
pub(crate) fn coerce(original: &Value, text: &str) -> Value {
    if original.to_string() == text {
        return original.clone();
    }
    match original {
        Value::Number(_) => parse_number(text).unwrap_or_else(|| Value::from(text)),
        Value::Bool(_) => match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::from(text),
        },
        Value::Null if text.is_empty() => Value::Null,
        _ => Value::from(text),
    }
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::from(n));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use crate::validation::Rule;

    fn schema() -> FieldSchema {
        FieldSchema::builder("agente_id")
            .field(FieldSpec::text("agente_id", "ID"))
            .field(FieldSpec::text("nombre_agente", "Nombre").required().rule(Rule::Letters))
            .field(FieldSpec::select(
                "jornada",
                "Jornada",
                vec![SelectOption::new("diurna", "Diurna"), SelectOption::new("nocturna", "Nocturna")],
            ))
            .build()
            .unwrap()
    }

    fn agent() -> Record {
        Record::new()
            .with("agente_id", 7i64)
            .with("nombre_agente", "Lucía")
            .with("jornada", "diurna")
    }

    #[test]
    fn confirmation_requires_exact_identity() {
        let dialog = DeleteConfirmation::for_record(&agent(), "agente_id", "agente");
        assert!(matches!(
            dialog.confirm("8"),
            Err(DashError::IdentityMismatch { .. })
        ));
        assert!(dialog.confirm(" 7").is_err());
        assert_eq!(dialog.confirm("7").unwrap(), "7");
    }

    #[test]
    fn confirmation_rejects_incomplete_record() {
        let dialog = DeleteConfirmation::for_record(&Record::new(), "agente_id", "agente");
        assert!(matches!(
            dialog.confirm(""),
            Err(DashError::MissingIdentity { .. })
        ));
    }

    #[test]
    fn identity_input_is_disabled() {
        let mut draft = EditDraft::from_record(&schema(), &agent(), "agente");
        assert!(draft.input("agente_id").unwrap().disabled);
        assert!(matches!(
            draft.set("agente_id", "8"),
            Err(DashError::ReadOnlyField { .. })
        ));
        assert!(matches!(
            draft.set("color", "red"),
            Err(DashError::UnknownField { .. })
        ));
    }

    #[test]
    fn finish_keeps_types_and_validates() {
        let mut draft = EditDraft::from_record(&schema(), &agent(), "agente");
        assert!(!draft.is_dirty());
        draft.set("nombre_agente", "Lucía Pérez").unwrap();
        assert!(draft.is_dirty());

        let updated = draft.finish().unwrap();
        assert_eq!(updated.value("agente_id"), &Value::from(7i64));
        assert_eq!(updated.value("nombre_agente").to_string(), "Lucía Pérez");

        draft.set("nombre_agente", "").unwrap();
        assert!(matches!(draft.finish(), Err(DashError::Validation(_))));
    }

    #[test]
    fn select_inputs_take_options_only() {
        let mut draft = EditDraft::from_record(&schema(), &agent(), "agente");
        assert!(matches!(
            draft.set("jornada", "mixta"),
            Err(DashError::InvalidOption { .. })
        ));
        draft.cycle_option("jornada", true).unwrap();
        assert_eq!(draft.input("jornada").unwrap().selected_label(), Some("Nocturna"));
        draft.cycle_option("jornada", true).unwrap();
        assert_eq!(draft.input("jornada").unwrap().value, "diurna");
    }

    #[test]
    fn blank_drafts_build_new_records() {
        let generated = FieldSchema::builder("agente_id")
            .generated_identity()
            .field(FieldSpec::text("agente_id", "ID"))
            .field(FieldSpec::text("nombre_agente", "Nombre").required())
            .field(FieldSpec::text("telefono_agente", "Teléfono"))
            .build()
            .unwrap();

        let mut draft = EditDraft::blank(&generated, "agente");
        assert!(draft.is_new());
        assert!(draft.input("agente_id").unwrap().disabled);
        assert!(matches!(draft.finish(), Err(DashError::Validation(_))));

        draft.set("nombre_agente", "Rosa").unwrap();
        let record = draft.finish().unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.value("nombre_agente").to_string(), "Rosa");

        let mut keyed = EditDraft::blank(&schema(), "agente");
        assert!(!keyed.input("agente_id").unwrap().disabled);
        keyed.set("nombre_agente", "Rosa").unwrap();
        assert!(keyed.finish().is_err());
        keyed.set("agente_id", "12").unwrap();
        assert_eq!(keyed.finish().unwrap().value("agente_id").to_string(), "12");
    }

    #[test]
    fn coerce_numbers() {
        assert_eq!(coerce(&Value::from(3i64), "42"), Value::from(42i64));
        assert_eq!(coerce(&Value::from(3i64), "abc"), Value::from("abc"));
        assert_eq!(coerce(&Value::Null, ""), Value::Null);
        assert_eq!(coerce(&Value::from("x"), "y"), Value::from("y"));
    }
}
