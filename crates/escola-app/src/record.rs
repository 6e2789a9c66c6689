// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use time::Date;

/// Identity of a record within one source result set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKey {
    Int(i64),
    Code(String),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Code(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Int(i64),
    Decimal(f64),
    Bool(bool),
    Date(Date),
}

impl<'a> FieldValue<'a> {
    pub fn text(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }

    pub fn owned(value: String) -> Self {
        Self::Text(Cow::Owned(value))
    }

    pub fn display(&self) -> Cow<'_, str> {
        match self {
            Self::Text(value) => Cow::Borrowed(value.as_ref()),
            Self::Int(value) => Cow::Owned(value.to_string()),
            Self::Decimal(value) => Cow::Owned(value.to_string()),
            Self::Bool(value) => Cow::Borrowed(if *value { "true" } else { "false" }),
            Self::Date(value) => Cow::Owned(format_date(*value)),
        }
    }

    /// Lower-cased text form used for substring search.
    pub fn search_text(&self) -> String {
        self.display().to_lowercase()
    }

    pub fn matches_exact(&self, expected: &str) -> bool {
        self.display() == expected
    }
}

pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Read access to a list row by dotted field path (`course.name`).
///
/// Lookups for unknown paths, or through absent nested references, return
/// `None` rather than failing.
pub trait Record {
    fn key(&self) -> RecordKey;
    fn field(&self, path: &str) -> Option<FieldValue<'_>>;
}

impl Record for Value {
    fn key(&self) -> RecordKey {
        for name in ["id", "codigo"] {
            match self.get(name) {
                Some(Value::Number(number)) => {
                    if let Some(value) = number.as_i64() {
                        return RecordKey::Int(value);
                    }
                }
                Some(Value::String(value)) => return RecordKey::Code(value.clone()),
                _ => {}
            }
        }
        RecordKey::Code(String::new())
    }

    fn field(&self, path: &str) -> Option<FieldValue<'_>> {
        let mut current = self;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        match current {
            Value::String(value) => Some(FieldValue::text(value)),
            Value::Number(number) => number
                .as_i64()
                .map(FieldValue::Int)
                .or_else(|| number.as_f64().map(FieldValue::Decimal)),
            Value::Bool(value) => Some(FieldValue::Bool(*value)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, Record, RecordKey, format_date};
    use serde_json::json;
    use time::{Date, Month};

    #[test]
    fn json_lookup_walks_nested_objects() {
        let record = json!({
            "id": 7,
            "nome": "Ana",
            "tb_cursos": { "designacao": "Informática" },
        });
        assert_eq!(record.key(), RecordKey::Int(7));
        assert_eq!(
            record.field("tb_cursos.designacao"),
            Some(FieldValue::text("Informática"))
        );
    }

    #[test]
    fn json_lookup_through_missing_reference_is_none() {
        let record = json!({ "id": 1, "tb_cursos": null, "dataNascimento": {} });
        assert_eq!(record.field("tb_cursos.designacao"), None);
        assert_eq!(record.field("nome"), None);
        assert_eq!(record.field("dataNascimento"), None);
    }

    #[test]
    fn json_key_falls_back_to_codigo() {
        let record = json!({ "codigo": "T-10A" });
        assert_eq!(record.key(), RecordKey::Code("T-10A".to_owned()));
        assert_eq!(record.key().to_string(), "T-10A");
    }

    #[test]
    fn numbers_and_dates_render_for_search() {
        assert_eq!(FieldValue::Int(2024).search_text(), "2024");
        let date = Date::from_calendar_date(2026, Month::March, 4).expect("valid date");
        assert_eq!(format_date(date), "2026-03-04");
        assert_eq!(FieldValue::Date(date).display(), "2026-03-04");
        assert_eq!(FieldValue::text("ATIVO").search_text(), "ativo");
    }
}
