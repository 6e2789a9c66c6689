// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use escola_api::{Client, ResourceClient};
use escola_app::{
    Enrollment, FetchQuery, MemorySource, MutationOutcome, Payment, RecordKey, RecordMutator,
    RecordSource, Resource, SchoolClass, Student, Teacher,
};
use escola_testkit::School;
use escola_tui::{FetchedBatch, ListRuntime};

trait Collection<R>: RecordSource<R> + RecordMutator {}

impl<R, T: RecordSource<R> + RecordMutator> Collection<R> for T {}

/// One source per list page, either the REST backend or seeded memory.
pub struct SchoolRuntime {
    students: Box<dyn Collection<Student>>,
    teachers: Box<dyn Collection<Teacher>>,
    classes: Box<dyn Collection<SchoolClass>>,
    enrollments: Box<dyn Collection<Enrollment>>,
    payments: Box<dyn Collection<Payment>>,
}

impl SchoolRuntime {
    pub fn api(client: &Client) -> Self {
        Self {
            students: Box::new(ResourceClient::<Student>::new(
                client.clone(),
                Resource::Students,
            )),
            teachers: Box::new(ResourceClient::<Teacher>::new(
                client.clone(),
                Resource::Teachers,
            )),
            classes: Box::new(ResourceClient::<SchoolClass>::new(
                client.clone(),
                Resource::Classes,
            )),
            enrollments: Box::new(ResourceClient::<Enrollment>::new(
                client.clone(),
                Resource::Enrollments,
            )),
            payments: Box::new(ResourceClient::<Payment>::new(
                client.clone(),
                Resource::Payments,
            )),
        }
    }

    pub fn demo(school: School) -> Self {
        Self {
            students: Box::new(MemorySource::new(school.students)),
            teachers: Box::new(MemorySource::new(school.teachers)),
            classes: Box::new(MemorySource::new(school.classes)),
            enrollments: Box::new(MemorySource::new(school.enrollments)),
            payments: Box::new(MemorySource::new(school.payments)),
        }
    }
}

impl ListRuntime for SchoolRuntime {
    fn fetch(&mut self, resource: Resource, query: &FetchQuery) -> Result<FetchedBatch> {
        tracing::debug!(resource = resource.path(), page = query.page, "fetching");
        let batch = match resource {
            Resource::Students => self.students.fetch(query)?.into(),
            Resource::Teachers => self.teachers.fetch(query)?.into(),
            Resource::Classes => self.classes.fetch(query)?.into(),
            Resource::Enrollments => self.enrollments.fetch(query)?.into(),
            Resource::Payments => self.payments.fetch(query)?.into(),
        };
        Ok(batch)
    }

    fn delete(&mut self, resource: Resource, key: &RecordKey) -> Result<MutationOutcome> {
        match resource {
            Resource::Students => self.students.delete(key),
            Resource::Teachers => self.teachers.delete(key),
            Resource::Classes => self.classes.delete(key),
            Resource::Enrollments => self.enrollments.delete(key),
            Resource::Payments => self.payments.delete(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SchoolRuntime;
    use escola_app::{FetchQuery, Record, RecordKey, Resource};
    use escola_testkit::SchoolFaker;
    use escola_tui::{FetchedBatch, ListRuntime};

    fn demo() -> (SchoolRuntime, escola_testkit::School) {
        let school = SchoolFaker::new(7).school(60);
        (SchoolRuntime::demo(school.clone()), school)
    }

    #[test]
    fn demo_fetch_returns_every_resource_unpaged() -> anyhow::Result<()> {
        let (mut runtime, school) = demo();
        for resource in Resource::ALL {
            let batch = runtime.fetch(resource, &FetchQuery::default())?;
            assert_eq!(batch.resource(), resource);
            let expected = match resource {
                Resource::Students => school.students.len(),
                Resource::Teachers => school.teachers.len(),
                Resource::Classes => school.classes.len(),
                Resource::Enrollments => school.enrollments.len(),
                Resource::Payments => school.payments.len(),
            };
            assert_eq!(batch.len(), expected, "{}", resource.path());
        }
        Ok(())
    }

    #[test]
    fn demo_delete_removes_only_that_record() -> anyhow::Result<()> {
        let (mut runtime, school) = demo();
        let key = school.students[0].key();
        runtime.delete(Resource::Students, &key)?;

        let FetchedBatch::Students(batch) = runtime.fetch(Resource::Students, &FetchQuery::default())?
        else {
            panic!("students fetch returned another resource");
        };
        assert_eq!(batch.records.len(), school.students.len() - 1);
        assert!(batch.records.iter().all(|student| student.key() != key));

        let payments = runtime.fetch(Resource::Payments, &FetchQuery::default())?;
        assert_eq!(payments.len(), school.payments.len());
        Ok(())
    }

    #[test]
    fn demo_delete_of_unknown_key_fails() {
        let (mut runtime, _) = demo();
        assert!(
            runtime
                .delete(Resource::Teachers, &RecordKey::Int(999_999))
                .is_err()
        );
    }
}
