// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use escola_app::{
    FetchQuery, FormPayload, MutationOutcome, Record, RecordBatch, RecordKey, RecordMutator,
    RecordSource,
};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

type Scripted<R> = std::result::Result<RecordBatch<R>, String>;

/// A source that answers from a script and records what it was asked.
///
/// Queued responses are served first, in order. Once the queue is empty,
/// fetches return the fallback records without pagination.
#[derive(Debug)]
pub struct ScriptedSource<R> {
    responses: Mutex<VecDeque<Scripted<R>>>,
    records: Mutex<Vec<R>>,
    queries: Mutex<Vec<FetchQuery>>,
    mutations: Mutex<Vec<String>>,
    mutation_failure: Mutex<Option<String>>,
}

impl<R: Record + Clone> ScriptedSource<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            records: Mutex::new(records),
            queries: Mutex::new(Vec::new()),
            mutations: Mutex::new(Vec::new()),
            mutation_failure: Mutex::new(None),
        }
    }

    pub fn push_batch(&self, batch: RecordBatch<R>) {
        lock(&self.responses).push_back(Ok(batch));
    }

    pub fn push_failure(&self, message: &str) {
        lock(&self.responses).push_back(Err(message.to_owned()));
    }

    /// Makes every mutation fail with `message` until cleared.
    pub fn fail_mutations(&self, message: Option<&str>) {
        *lock(&self.mutation_failure) = message.map(str::to_owned);
    }

    pub fn queries(&self) -> Vec<FetchQuery> {
        lock(&self.queries).clone()
    }

    pub fn mutations(&self) -> Vec<String> {
        lock(&self.mutations).clone()
    }

    pub fn records(&self) -> Vec<R> {
        lock(&self.records).clone()
    }

    fn mutate(&self, label: String) -> Result<()> {
        lock(&self.mutations).push(label);
        match lock(&self.mutation_failure).as_ref() {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }
}

impl<R: Record + Clone> RecordSource<R> for ScriptedSource<R> {
    fn fetch(&self, query: &FetchQuery) -> Result<RecordBatch<R>> {
        lock(&self.queries).push(query.clone());
        match lock(&self.responses).pop_front() {
            Some(Ok(batch)) => Ok(batch),
            Some(Err(message)) => Err(anyhow!("{message}")),
            None => Ok(RecordBatch::complete(self.records())),
        }
    }
}

impl<R: Record + Clone> RecordMutator for ScriptedSource<R> {
    fn create(&self, form: &FormPayload) -> Result<MutationOutcome> {
        self.mutate(format!("create {}", form.resource().path()))?;
        Ok(MutationOutcome::default())
    }

    fn update(&self, key: &RecordKey, form: &FormPayload) -> Result<MutationOutcome> {
        self.mutate(format!("update {} {key}", form.resource().path()))?;
        Ok(MutationOutcome {
            key: Some(key.clone()),
            message: None,
        })
    }

    fn delete(&self, key: &RecordKey) -> Result<MutationOutcome> {
        self.mutate(format!("delete {key}"))?;
        lock(&self.records).retain(|record| &record.key() != key);
        Ok(MutationOutcome {
            key: Some(key.clone()),
            message: None,
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
