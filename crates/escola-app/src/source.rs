// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

use crate::{FormPayload, FromForm, Record, RecordKey};

/// Paging metadata reported by a server that pages on its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items_per_page: usize,
}

/// Parameters a source may honour. Static sources ignore them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchQuery {
    pub page: usize,
    pub per_page: usize,
    pub search: String,
    pub filters: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch<R> {
    pub records: Vec<R>,
    pub pagination: Option<ServerPagination>,
}

impl<R> RecordBatch<R> {
    pub fn complete(records: Vec<R>) -> Self {
        Self {
            records,
            pagination: None,
        }
    }

    pub fn paged(records: Vec<R>, pagination: ServerPagination) -> Self {
        Self {
            records,
            pagination: Some(pagination),
        }
    }
}

pub trait RecordSource<R> {
    fn fetch(&self, query: &FetchQuery) -> Result<RecordBatch<R>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MutationOutcome {
    pub key: Option<RecordKey>,
    pub message: Option<String>,
}

pub trait RecordMutator {
    fn create(&self, form: &FormPayload) -> Result<MutationOutcome>;
    fn update(&self, key: &RecordKey, form: &FormPayload) -> Result<MutationOutcome>;
    fn delete(&self, key: &RecordKey) -> Result<MutationOutcome>;
}

/// A fixed in-process record list standing in for a backend.
#[derive(Debug, Default)]
pub struct MemorySource<R> {
    records: Mutex<Vec<R>>,
}

impl<R: Record + Clone> MemorySource<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn snapshot(&self) -> Result<Vec<R>> {
        Ok(self.lock()?.clone())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<R>>> {
        self.records
            .lock()
            .map_err(|_| anyhow!("in-memory record list is poisoned"))
    }
}

impl<R: Record + Clone> RecordSource<R> for MemorySource<R> {
    fn fetch(&self, _query: &FetchQuery) -> Result<RecordBatch<R>> {
        Ok(RecordBatch::complete(self.snapshot()?))
    }
}

impl<R: Record + Clone + FromForm> RecordMutator for MemorySource<R> {
    fn create(&self, form: &FormPayload) -> Result<MutationOutcome> {
        form.validate()?;
        let mut records = self.lock()?;
        let next_id = records
            .iter()
            .filter_map(|record| match record.key() {
                RecordKey::Int(id) => Some(id),
                RecordKey::Code(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;
        let record = R::from_form(next_id, form)?;
        let key = record.key();
        records.push(record);
        Ok(MutationOutcome {
            key: Some(key),
            message: Some("registo criado".to_owned()),
        })
    }

    fn update(&self, key: &RecordKey, form: &FormPayload) -> Result<MutationOutcome> {
        form.validate()?;
        let RecordKey::Int(id) = key else {
            bail!("in-memory records are keyed by integer ids, got {key}");
        };
        let mut records = self.lock()?;
        let Some(slot) = records.iter_mut().find(|record| &record.key() == key) else {
            bail!("record {key} not found");
        };
        *slot = R::from_form(*id, form)?;
        Ok(MutationOutcome {
            key: Some(key.clone()),
            message: Some("registo atualizado".to_owned()),
        })
    }

    fn delete(&self, key: &RecordKey) -> Result<MutationOutcome> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|record| &record.key() != key);
        if records.len() == before {
            bail!("record {key} not found");
        }
        Ok(MutationOutcome {
            key: Some(key.clone()),
            message: Some("registo eliminado".to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchQuery, MemorySource, RecordMutator, RecordSource};
    use crate::{
        FormPayload, Gender, RecordKey, Student, StudentForm, StudentId, StudentStatus,
    };
    use anyhow::Result;

    fn student(id: i64, name: &str) -> Student {
        Student {
            id: StudentId::new(id),
            student_number: format!("2025-{id:04}"),
            name: name.to_owned(),
            email: String::new(),
            phone: String::new(),
            gender: Gender::Male,
            birth_date: None,
            status: StudentStatus::Active,
            course: None,
            class: None,
        }
    }

    fn form(name: &str) -> FormPayload {
        FormPayload::Student(StudentForm {
            student_number: "2025-0100".to_owned(),
            name: name.to_owned(),
            email: String::new(),
            phone: String::new(),
            gender: Gender::Female,
            birth_date: None,
            status: StudentStatus::Active,
            course: None,
            class: None,
        })
    }

    #[test]
    fn fetch_returns_everything_without_pagination() -> Result<()> {
        let source = MemorySource::new(vec![student(1, "A"), student(2, "B")]);
        let batch = source.fetch(&FetchQuery {
            page: 2,
            per_page: 1,
            ..FetchQuery::default()
        })?;
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.pagination, None);
        Ok(())
    }

    #[test]
    fn create_assigns_next_id() -> Result<()> {
        let source = MemorySource::new(vec![student(4, "A")]);
        let outcome = source.create(&form("Beatriz"))?;
        assert_eq!(outcome.key, Some(RecordKey::Int(5)));
        assert_eq!(source.len()?, 2);
        Ok(())
    }

    #[test]
    fn create_rejects_invalid_form() -> Result<()> {
        let source = MemorySource::new(vec![student(1, "A")]);
        let error = source.create(&form("")).expect_err("empty name should fail");
        assert!(error.to_string().contains("name"));
        assert_eq!(source.len()?, 1);
        Ok(())
    }

    #[test]
    fn update_replaces_in_place() -> Result<()> {
        let source = MemorySource::new(vec![student(1, "A"), student(2, "B")]);
        source.update(&RecordKey::Int(2), &form("Bea"))?;
        let names = source
            .snapshot()?
            .into_iter()
            .map(|student| student.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["A".to_owned(), "Bea".to_owned()]);
        Ok(())
    }

    #[test]
    fn delete_missing_record_fails() -> Result<()> {
        let source = MemorySource::new(vec![student(1, "A")]);
        source.delete(&RecordKey::Int(1))?;
        assert!(source.delete(&RecordKey::Int(1)).is_err());
        Ok(())
    }
}
