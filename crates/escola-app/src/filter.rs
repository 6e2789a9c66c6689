// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::Record;

pub const ALL_SENTINEL: &str = "all";
pub const PRESENT: &str = "present";
pub const MISSING: &str = "missing";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterChoice {
    #[default]
    All,
    Only(String),
}

impl FilterChoice {
    pub fn parse(value: &str) -> Self {
        if value == ALL_SENTINEL {
            Self::All
        } else {
            Self::Only(value.to_owned())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_SENTINEL,
            Self::Only(value) => value,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(value) => Some(value),
        }
    }
}

const UNCONSTRAINED: &FilterChoice = &FilterChoice::All;

/// Currently selected value per filter name. Names never set read as `All`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    choices: BTreeMap<String, FilterChoice>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choice(&self, name: &str) -> &FilterChoice {
        self.choices.get(name).unwrap_or(UNCONSTRAINED)
    }

    /// Returns whether the stored choice changed.
    pub fn set(&mut self, name: &str, choice: FilterChoice) -> bool {
        if self.choice(name) == &choice {
            return false;
        }
        match choice {
            FilterChoice::All => {
                self.choices.remove(name);
            }
            other => {
                self.choices.insert(name.to_owned(), other);
            }
        }
        true
    }

    /// Returns whether any filter was active.
    pub fn clear(&mut self) -> bool {
        let had_active = self.has_active();
        self.choices.clear();
        had_active
    }

    pub fn has_active(&self) -> bool {
        !self.choices.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.choices
            .iter()
            .filter_map(|(name, choice)| choice.value().map(|value| (name.as_str(), value)))
    }
}

type Predicate<R> = Box<dyn Fn(&R, &str) -> bool + Send + Sync>;

/// Named field-level predicates. Declaration order is kept for display.
pub struct FilterSet<R> {
    predicates: Vec<(String, Predicate<R>)>,
}

impl<R> Default for FilterSet<R> {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }
}

impl<R: Record + 'static> FilterSet<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, name: &str, predicate: F) -> Self
    where
        F: Fn(&R, &str) -> bool + Send + Sync + 'static,
    {
        self.predicates.push((name.to_owned(), Box::new(predicate)));
        self
    }

    /// Field display text equals the selected value.
    pub fn exact(self, name: &str, path: &'static str) -> Self {
        self.with(name, move |record: &R, value: &str| {
            record
                .field(path)
                .is_some_and(|field| field.matches_exact(value))
        })
    }

    /// Field text contains the selected value, ignoring case.
    pub fn contains(self, name: &str, path: &'static str) -> Self {
        self.with(name, move |record: &R, value: &str| {
            let needle = value.to_lowercase();
            record
                .field(path)
                .is_some_and(|field| field.search_text().contains(&needle))
        })
    }

    /// `present` keeps records with a value at `path`, `missing` keeps the rest.
    pub fn presence(self, name: &str, path: &'static str) -> Self {
        self.with(name, move |record: &R, value: &str| {
            let present = record.field(path).is_some();
            match value {
                PRESENT => present,
                MISSING => !present,
                _ => false,
            }
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.predicates.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.predicate(name).is_some()
    }

    fn predicate(&self, name: &str) -> Option<&Predicate<R>> {
        self.predicates
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, predicate)| predicate)
    }
}

/// ANDs every active filter. Filter names without a predicate are skipped.
pub fn apply_filters<'a, R: Record + 'static>(
    records: &[&'a R],
    filters: &FilterState,
    predicates: &FilterSet<R>,
) -> Vec<&'a R> {
    let mut active = Vec::new();
    for (name, value) in filters.active() {
        match predicates.predicate(name) {
            Some(predicate) => active.push((predicate, value)),
            None => {
                if cfg!(debug_assertions) {
                    tracing::warn!(filter = name, value, "ignoring filter with no predicate");
                }
            }
        }
    }

    if active.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .copied()
        .filter(|record| {
            active
                .iter()
                .all(|&(predicate, value)| predicate(*record, value))
        })
        .collect()
}
