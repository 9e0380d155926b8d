use std::collections::BTreeMap;

use shared::{
    domain::{FieldId, FieldKind, FieldMarker, ValidationResult},
    messages,
    protocol::StoredSnapshot,
};

/// Current answers and the marker each field carries from its last validation.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    values: BTreeMap<FieldId, String>,
    markers: BTreeMap<FieldId, FieldMarker>,
}

impl FormState {
    pub fn value(&self, field: FieldId) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or_default()
    }

    pub fn set_value(&mut self, field: FieldId, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn is_blank(&self, field: FieldId) -> bool {
        self.value(field).trim().is_empty()
    }

    pub fn marker(&self, field: FieldId) -> FieldMarker {
        self.markers.get(&field).copied().unwrap_or_default()
    }

    pub fn set_marker(&mut self, field: FieldId, marker: FieldMarker) {
        self.markers.insert(field, marker);
    }

    pub fn has_any_value(&self) -> bool {
        FieldId::value_fields().any(|field| !self.is_blank(field))
    }

    pub fn has_active_error(&self) -> bool {
        self.markers.values().any(|m| *m == FieldMarker::Invalid)
    }

    /// Every non-file field, blank ones included, plus the given file names.
    pub fn to_snapshot(&self, uploaded_file_names: Vec<String>) -> StoredSnapshot {
        StoredSnapshot {
            fields: FieldId::value_fields()
                .map(|field| (field.as_str().to_string(), self.value(field).to_string()))
                .collect(),
            uploaded_file_names,
        }
    }
}

pub fn validate(field: FieldId, form: &FormState, attachment_count: usize) -> ValidationResult {
    let spec = field.spec();

    if spec.kind == FieldKind::File {
        if spec.required && attachment_count == 0 {
            return ValidationResult::invalid(messages::ATTACHMENT_REQUIRED);
        }
        return ValidationResult::ok();
    }

    let value = form.value(field).trim();
    if value.is_empty() {
        if spec.required {
            return ValidationResult::invalid(messages::REQUIRED_FIELD);
        }
        return ValidationResult::ok();
    }

    if spec.kind == FieldKind::Number {
        let Some(number) = parse_number(value).filter(|n| !spec.non_negative || *n >= 0.0) else {
            return ValidationResult::invalid(messages::INVALID_NUMBER);
        };

        if let Some(bound_field) = spec.bounded_by {
            let bound = parse_number(form.value(bound_field).trim()).unwrap_or(0.0);
            if bound > 0.0 && number > bound {
                return ValidationResult::invalid(messages::EXCEEDS_NEW_LEADS);
            }
        }
    }

    if let Some(max_len) = spec.max_len {
        if utf16_len(value) > max_len {
            return ValidationResult::invalid(messages::COMMENTS_TOO_LONG);
        }
    }

    ValidationResult::ok()
}

/// Fields whose validity depends on `driver` and must be re-checked when it changes.
pub fn dependents_of(driver: FieldId) -> impl Iterator<Item = FieldId> {
    FieldId::ALL
        .iter()
        .copied()
        .filter(move |field| field.spec().bounded_by == Some(driver))
}

/// Non-blocking hint raised on another field after `changed` was edited.
pub fn advisory_for(changed: FieldId, form: &FormState) -> Option<(FieldId, &'static str)> {
    if changed != FieldId::ClosedDeals {
        return None;
    }
    let closed_deals = parse_number(form.value(FieldId::ClosedDeals).trim()).unwrap_or(0.0);
    (closed_deals > 0.0 && form.is_blank(FieldId::DealAmount))
        .then_some((FieldId::DealAmount, messages::DEAL_AMOUNT_ADVISORY))
}

/// Keeps digits and a single decimal point with at most two decimals.
pub fn normalize_currency_input(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut parts = cleaned.split('.');
    let whole = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        return whole.to_string();
    }

    let fraction: String = rest.concat().chars().take(2).collect();
    format!("{whole}.{fraction}")
}

/// Length as counted by the form widgets: UTF-16 code units.
pub fn utf16_len(value: &str) -> usize {
    value.encode_utf16().count()
}

fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}
