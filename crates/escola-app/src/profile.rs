// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::model::*;
use crate::{Category, FilterSet, MISSING, PRESENT, Record, aggregate, format_date};

/// Which record set a summary card counts over. Each card states its own
/// scope; totals usually ignore the current filters, breakdowns follow them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatScope {
    AllRecords,
    Filtered,
}

pub struct StatCard<R> {
    pub category: Category<R>,
    pub scope: StatScope,
    /// Counts every record of its scope, so a server-reported total can
    /// stand in for it.
    pub total: bool,
}

/// `count` is `None` when the loaded rows cannot answer the card, as with a
/// breakdown over a single server page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatValue {
    pub label: String,
    pub count: Option<usize>,
    pub scope: StatScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_owned(),
            label: label.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOptions {
    Fixed(Vec<FilterOption>),
    /// Distinct values of a field across the loaded records.
    Distinct(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterControl {
    pub name: &'static str,
    pub label: &'static str,
    pub options: FilterOptions,
}

pub struct Column<R> {
    pub label: &'static str,
    pub render: fn(&R) -> String,
}

/// Everything that distinguishes one list page from another.
pub struct ListProfile<R> {
    pub title: &'static str,
    pub search_fields: Vec<&'static str>,
    pub filters: FilterSet<R>,
    pub filter_controls: Vec<FilterControl>,
    pub cards: Vec<StatCard<R>>,
    pub columns: Vec<Column<R>>,
}

impl<R: Record + 'static> ListProfile<R> {
    pub fn new(title: &'static str) -> Self {
        Self {
            title,
            search_fields: Vec::new(),
            filters: FilterSet::new(),
            filter_controls: Vec::new(),
            cards: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn search_fields(mut self, fields: &[&'static str]) -> Self {
        self.search_fields = fields.to_vec();
        self
    }

    pub fn exact_filter(
        mut self,
        name: &'static str,
        label: &'static str,
        path: &'static str,
        options: FilterOptions,
    ) -> Self {
        self.filters = std::mem::take(&mut self.filters).exact(name, path);
        self.filter_controls.push(FilterControl {
            name,
            label,
            options,
        });
        self
    }

    pub fn presence_filter(
        mut self,
        name: &'static str,
        label: &'static str,
        path: &'static str,
    ) -> Self {
        self.filters = std::mem::take(&mut self.filters).presence(name, path);
        self.filter_controls.push(FilterControl {
            name,
            label,
            options: FilterOptions::Fixed(vec![
                FilterOption::new(PRESENT, "Preenchida"),
                FilterOption::new(MISSING, "Em falta"),
            ]),
        });
        self
    }

    pub fn card<F>(mut self, label: &str, scope: StatScope, predicate: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.cards.push(StatCard {
            category: Category::new(label, predicate),
            scope,
            total: false,
        });
        self
    }

    pub fn total_card(mut self, label: &str, scope: StatScope) -> Self {
        self.cards.push(StatCard {
            category: Category::new(label, |_: &R| true),
            scope,
            total: true,
        });
        self
    }

    pub fn column(mut self, label: &'static str, render: fn(&R) -> String) -> Self {
        self.columns.push(Column { label, render });
        self
    }

    /// Card counts in declaration order.
    pub fn stats(&self, all: &[&R], filtered: &[&R]) -> Vec<StatValue> {
        let over_all = aggregate(
            all,
            self.cards
                .iter()
                .filter(|card| card.scope == StatScope::AllRecords)
                .map(|card| &card.category),
        );
        let over_filtered = aggregate(
            filtered,
            self.cards
                .iter()
                .filter(|card| card.scope == StatScope::Filtered)
                .map(|card| &card.category),
        );

        self.cards
            .iter()
            .map(|card| {
                let counts = match card.scope {
                    StatScope::AllRecords => &over_all,
                    StatScope::Filtered => &over_filtered,
                };
                StatValue {
                    label: card.category.label().to_owned(),
                    count: Some(counts.get(card.category.label()).copied().unwrap_or(0)),
                    scope: card.scope,
                }
            })
            .collect()
    }

    /// Card values when the server pages. Only total cards are known, from
    /// the server's `total_items`, which already reflects the criteria sent
    /// with the request. An all-records total is therefore known only while
    /// no criteria are active.
    pub fn server_stats(&self, total_items: usize, criteria_active: bool) -> Vec<StatValue> {
        self.cards
            .iter()
            .map(|card| {
                let known = card.total
                    && (card.scope == StatScope::Filtered || !criteria_active);
                StatValue {
                    label: card.category.label().to_owned(),
                    count: known.then_some(total_items),
                    scope: card.scope,
                }
            })
            .collect()
    }

    pub fn options_for(&self, control: &FilterControl, records: &[&R]) -> Vec<FilterOption> {
        match &control.options {
            FilterOptions::Fixed(options) => options.clone(),
            FilterOptions::Distinct(path) => records
                .iter()
                .filter_map(|record| record.field(path).map(|value| value.display().into_owned()))
                .filter(|value| !value.is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|value| FilterOption {
                    label: value.clone(),
                    value,
                })
                .collect(),
        }
    }

    pub fn render_row(&self, record: &R) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| (column.render)(record))
            .collect()
    }
}

macro_rules! enum_options {
    ($kind:ty) => {
        <$kind>::ALL
            .iter()
            .map(|item| FilterOption::new(item.as_str(), item.label()))
            .collect::<Vec<_>>()
    };
}

fn optional_date(date: Option<time::Date>) -> String {
    date.map(format_date).unwrap_or_default()
}

pub fn students_profile() -> ListProfile<Student> {
    ListProfile::new(Resource::Students.label())
        .search_fields(&["name", "student_number", "email", "course.name"])
        .exact_filter(
            "status",
            "Estado",
            "status",
            FilterOptions::Fixed(enum_options!(StudentStatus)),
        )
        .exact_filter(
            "gender",
            "Género",
            "gender",
            FilterOptions::Fixed(enum_options!(Gender)),
        )
        .exact_filter(
            "course",
            "Curso",
            "course.name",
            FilterOptions::Distinct("course.name"),
        )
        .presence_filter("birth_date", "Data de nascimento", "birth_date")
        .total_card("Total", StatScope::AllRecords)
        .card("Ativos", StatScope::AllRecords, |student: &Student| {
            student.status == StudentStatus::Active
        })
        .card("Inativos", StatScope::AllRecords, |student: &Student| {
            student.status == StudentStatus::Inactive
        })
        .card(
            "Sem data de nascimento",
            StatScope::Filtered,
            |student: &Student| !student.has_birth_date(),
        )
        .column("Nº", |student| student.student_number.clone())
        .column("Nome", |student| student.name.clone())
        .column("Curso", |student| {
            student
                .course
                .as_ref()
                .map(|course| course.name.clone())
                .unwrap_or_default()
        })
        .column("Turma", |student| {
            student
                .class
                .as_ref()
                .map(|class| class.code.clone())
                .unwrap_or_default()
        })
        .column("Género", |student| student.gender.label().to_owned())
        .column("Nascimento", |student| optional_date(student.birth_date))
        .column("Estado", |student| student.status.label().to_owned())
}

pub fn teachers_profile() -> ListProfile<Teacher> {
    ListProfile::new(Resource::Teachers.label())
        .search_fields(&["name", "email", "department"])
        .exact_filter(
            "status",
            "Estado",
            "status",
            FilterOptions::Fixed(enum_options!(TeacherStatus)),
        )
        .exact_filter(
            "qualification",
            "Habilitação",
            "qualification",
            FilterOptions::Fixed(enum_options!(Qualification)),
        )
        .exact_filter(
            "department",
            "Departamento",
            "department",
            FilterOptions::Distinct("department"),
        )
        .total_card("Total", StatScope::AllRecords)
        .card("Ativos", StatScope::AllRecords, |teacher: &Teacher| {
            teacher.status == TeacherStatus::Active
        })
        .card("De licença", StatScope::AllRecords, |teacher: &Teacher| {
            teacher.status == TeacherStatus::OnLeave
        })
        .card("Doutorados", StatScope::Filtered, |teacher: &Teacher| {
            teacher.qualification == Qualification::Doctorate
        })
        .column("Nome", |teacher| teacher.name.clone())
        .column("Email", |teacher| teacher.email.clone())
        .column("Departamento", |teacher| teacher.department.clone())
        .column("Habilitação", |teacher| {
            teacher.qualification.label().to_owned()
        })
        .column("Estado", |teacher| teacher.status.label().to_owned())
}

pub fn classes_profile() -> ListProfile<SchoolClass> {
    ListProfile::new(Resource::Classes.label())
        .search_fields(&["code", "name", "course.name", "room"])
        .exact_filter(
            "shift",
            "Turno",
            "shift",
            FilterOptions::Fixed(enum_options!(Shift)),
        )
        .exact_filter(
            "grade_level",
            "Classe",
            "grade_level",
            FilterOptions::Distinct("grade_level"),
        )
        .exact_filter(
            "academic_year",
            "Ano letivo",
            "academic_year",
            FilterOptions::Distinct("academic_year"),
        )
        .total_card("Total", StatScope::AllRecords)
        .card("Manhã", StatScope::Filtered, |class: &SchoolClass| {
            class.shift == Shift::Morning
        })
        .card("Tarde", StatScope::Filtered, |class: &SchoolClass| {
            class.shift == Shift::Afternoon
        })
        .card("Noite", StatScope::Filtered, |class: &SchoolClass| {
            class.shift == Shift::Evening
        })
        .card("Lotadas", StatScope::Filtered, SchoolClass::is_full)
        .column("Código", |class| class.code.clone())
        .column("Designação", |class| class.name.clone())
        .column("Curso", |class| {
            class
                .course
                .as_ref()
                .map(|course| course.name.clone())
                .unwrap_or_default()
        })
        .column("Classe", |class| format!("{}ª", class.grade_level))
        .column("Turno", |class| class.shift.label().to_owned())
        .column("Sala", |class| class.room.clone())
        .column("Ocupação", |class| {
            format!("{}/{}", class.enrolled, class.capacity)
        })
}

pub fn enrollments_profile() -> ListProfile<Enrollment> {
    ListProfile::new(Resource::Enrollments.label())
        .search_fields(&["student.name", "class.code", "course.name"])
        .exact_filter(
            "status",
            "Estado",
            "status",
            FilterOptions::Fixed(enum_options!(EnrollmentStatus)),
        )
        .exact_filter(
            "academic_year",
            "Ano letivo",
            "academic_year",
            FilterOptions::Distinct("academic_year"),
        )
        .exact_filter(
            "course",
            "Curso",
            "course.name",
            FilterOptions::Distinct("course.name"),
        )
        .total_card("Total", StatScope::AllRecords)
        .card("Ativas", StatScope::AllRecords, |enrollment: &Enrollment| {
            enrollment.status == EnrollmentStatus::Active
        })
        .card("Pendentes", StatScope::AllRecords, |enrollment: &Enrollment| {
            enrollment.status == EnrollmentStatus::Pending
        })
        .card("Canceladas", StatScope::AllRecords, |enrollment: &Enrollment| {
            enrollment.status == EnrollmentStatus::Cancelled
        })
        .column("Aluno", |enrollment| enrollment.student.name.clone())
        .column("Turma", |enrollment| {
            enrollment
                .class
                .as_ref()
                .map(|class| class.code.clone())
                .unwrap_or_default()
        })
        .column("Curso", |enrollment| {
            enrollment
                .course
                .as_ref()
                .map(|course| course.name.clone())
                .unwrap_or_default()
        })
        .column("Ano letivo", |enrollment| enrollment.academic_year.clone())
        .column("Data", |enrollment| format_date(enrollment.enrolled_on))
        .column("Estado", |enrollment| enrollment.status.label().to_owned())
}

pub fn payments_profile() -> ListProfile<Payment> {
    ListProfile::new(Resource::Payments.label())
        .search_fields(&["reference", "student.name", "description"])
        .exact_filter(
            "status",
            "Estado",
            "status",
            FilterOptions::Fixed(enum_options!(PaymentStatus)),
        )
        .exact_filter(
            "kind",
            "Tipo",
            "kind",
            FilterOptions::Fixed(enum_options!(PaymentKind)),
        )
        .total_card("Total", StatScope::AllRecords)
        .card("Pagos", StatScope::Filtered, |payment: &Payment| {
            payment.status == PaymentStatus::Paid
        })
        .card("Pendentes", StatScope::Filtered, |payment: &Payment| {
            payment.status == PaymentStatus::Pending
        })
        .card("Em atraso", StatScope::Filtered, |payment: &Payment| {
            payment.status == PaymentStatus::Overdue
        })
        .column("Referência", |payment| payment.reference.clone())
        .column("Aluno", |payment| payment.student.name.clone())
        .column("Tipo", |payment| payment.kind.label().to_owned())
        .column("Valor", |payment| format_amount(payment.amount_cents))
        .column("Vencimento", |payment| format_date(payment.due_date))
        .column("Pago em", |payment| optional_date(payment.paid_on))
        .column("Estado", |payment| payment.status.label().to_owned())
}

#[cfg(test)]
mod tests {
    use super::{FilterOptions, ListProfile, StatScope, students_profile};
    use crate::{
        ClassId, ClassRef, CourseId, CourseRef, FilterChoice, FilterState, Gender, Student,
        StudentId, StudentStatus, apply_filters, search,
    };
    use serde_json::{Value, json};
    use time::{Date, Month};

    fn student(id: i64, status: StudentStatus, course: &str, born: bool) -> Student {
        Student {
            id: StudentId::new(id),
            student_number: format!("2025-{id:04}"),
            name: format!("Aluno {id}"),
            email: String::new(),
            phone: String::new(),
            gender: if id % 2 == 0 { Gender::Female } else { Gender::Male },
            birth_date: born
                .then(|| Date::from_calendar_date(2008, Month::June, 1).expect("valid date")),
            status,
            course: Some(CourseRef {
                id: CourseId::new(1),
                name: course.to_owned(),
            }),
            class: Some(ClassRef {
                id: ClassId::new(1),
                code: "10A".to_owned(),
            }),
        }
    }

    #[test]
    fn cards_respect_their_declared_scope() {
        let profile = ListProfile::<Value>::new("test")
            .total_card("Total", StatScope::AllRecords)
            .total_card("Visíveis", StatScope::Filtered);
        let data = (1..=5).map(|id| json!({ "id": id })).collect::<Vec<_>>();
        let all = data.iter().collect::<Vec<_>>();
        let filtered = all[..2].to_vec();

        let stats = profile.stats(&all, &filtered);
        assert_eq!(stats[0].label, "Total");
        assert_eq!(stats[0].count, Some(5));
        assert_eq!(stats[1].count, Some(2));
    }

    #[test]
    fn student_profile_filters_by_course_and_birth_date() {
        let profile = students_profile();
        let data = vec![
            student(1, StudentStatus::Active, "Informática", true),
            student(2, StudentStatus::Active, "Gestão", false),
            student(3, StudentStatus::Inactive, "Informática", false),
        ];
        let all = data.iter().collect::<Vec<_>>();

        let mut filters = FilterState::new();
        filters.set("course", FilterChoice::parse("Informática"));
        filters.set("birth_date", FilterChoice::parse("missing"));
        let kept = apply_filters(&all, &filters, &profile.filters);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, StudentId::new(3));

        let stats = profile.stats(&all, &kept);
        let counts = stats
            .iter()
            .map(|stat| (stat.label.as_str(), stat.count.unwrap_or_default()))
            .collect::<Vec<_>>();
        assert_eq!(
            counts,
            vec![
                ("Total", 3),
                ("Ativos", 2),
                ("Inativos", 1),
                ("Sem data de nascimento", 1),
            ]
        );
    }

    #[test]
    fn student_search_reaches_course_names() {
        let profile = students_profile();
        let data = vec![
            student(1, StudentStatus::Active, "Informática", true),
            student(2, StudentStatus::Active, "Gestão", true),
        ];
        let all = data.iter().collect::<Vec<_>>();
        let found = search(&all, "GEST", &profile.search_fields);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn distinct_options_are_sorted_and_unique() {
        let profile = students_profile();
        let data = vec![
            student(1, StudentStatus::Active, "Informática", true),
            student(2, StudentStatus::Active, "Gestão", true),
            student(3, StudentStatus::Active, "Informática", true),
        ];
        let all = data.iter().collect::<Vec<_>>();
        let control = profile
            .filter_controls
            .iter()
            .find(|control| control.name == "course")
            .expect("course filter exists");
        assert_eq!(control.options, FilterOptions::Distinct("course.name"));
        let values = profile
            .options_for(control, &all)
            .into_iter()
            .map(|option| option.value)
            .collect::<Vec<_>>();
        assert_eq!(values, vec!["Gestão".to_owned(), "Informática".to_owned()]);
    }

    #[test]
    fn rows_render_in_column_order() {
        let profile = students_profile();
        let row = profile.render_row(&student(4, StudentStatus::Active, "Gestão", false));
        assert_eq!(row[0], "2025-0004");
        assert_eq!(row[2], "Gestão");
        assert_eq!(row[5], "");
        assert_eq!(row[6], "Ativo");
        assert_eq!(row.len(), profile.columns.len());
    }
}
