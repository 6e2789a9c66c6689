// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Record;

/// Keeps records where at least one of `fields` contains `term`,
/// case-insensitively. An empty term keeps everything. Input order is
/// preserved.
pub fn search<'a, R: Record + ?Sized>(records: &[&'a R], term: &str, fields: &[&str]) -> Vec<&'a R> {
    if term.is_empty() {
        return records.to_vec();
    }

    let needle = term.to_lowercase();
    records
        .iter()
        .copied()
        .filter(|record| record_matches(*record, &needle, fields))
        .collect()
}

/// `needle` must already be lower-cased.
pub fn record_matches<R: Record + ?Sized>(record: &R, needle: &str, fields: &[&str]) -> bool {
    fields.iter().any(|path| {
        record
            .field(path)
            .is_some_and(|value| value.search_text().contains(needle))
    })
}
