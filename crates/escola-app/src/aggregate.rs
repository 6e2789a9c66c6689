// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

type CategoryPredicate<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

pub struct Category<R> {
    label: String,
    predicate: CategoryPredicate<R>,
}

impl<R> Category<R> {
    pub fn new<F>(label: &str, predicate: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.to_owned(),
            predicate: Box::new(predicate),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn matches(&self, record: &R) -> bool {
        (self.predicate)(record)
    }
}

/// Counts matching records per category label. Callers choose whether
/// `records` is the full or the filtered set.
pub fn aggregate<'c, R: 'c>(
    records: &[&R],
    categories: impl IntoIterator<Item = &'c Category<R>>,
) -> BTreeMap<String, usize> {
    categories
        .into_iter()
        .map(|category| {
            let count = records
                .iter()
                .filter(|record| category.matches(**record))
                .count();
            (category.label.clone(), count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Category, aggregate};
    use serde_json::{Value, json};

    #[test]
    fn counts_each_category_independently() {
        let data = (1..=10)
            .map(|id| json!({ "id": id, "sexo": if id <= 6 { "F" } else { "M" } }))
            .collect::<Vec<_>>();
        let refs = data.iter().collect::<Vec<_>>();
        let categories = [
            Category::new("A", |record: &Value| record["sexo"] == "F"),
            Category::new("B", |record: &Value| record["sexo"] == "M"),
        ];

        let stats = aggregate(&refs, &categories);
        assert_eq!(stats.get("A"), Some(&6));
        assert_eq!(stats.get("B"), Some(&4));
    }

    #[test]
    fn empty_input_yields_zero_counts() {
        let categories = [Category::new("total", |_: &Value| true)];
        let empty: Vec<&Value> = Vec::new();
        let stats = aggregate(&empty, &categories);
        assert_eq!(stats.get("total"), Some(&0));
    }
}
