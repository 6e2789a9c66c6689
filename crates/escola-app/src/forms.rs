// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use time::Date;

use crate::ids::*;
use crate::model::*;

/// Field-level validation messages keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first message recorded for a field.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }

    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (field, message)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

pub type ValidationResult = std::result::Result<(), FieldErrors>;

fn require_text(errors: &mut FieldErrors, field: &'static str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{label} é obrigatório"));
    }
}

fn check_email(errors: &mut FieldErrors, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    let valid = value
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
    if !valid {
        errors.add("email", "email inválido");
    }
}

/// Accepts `2025/2026`: two consecutive years.
pub fn is_academic_year(value: &str) -> bool {
    let Some((start, end)) = value.trim().split_once('/') else {
        return false;
    };
    match (start.parse::<i32>(), end.parse::<i32>()) {
        (Ok(start), Ok(end)) => start >= 1900 && end == start + 1,
        _ => false,
    }
}

fn check_academic_year(errors: &mut FieldErrors, value: &str) {
    if !is_academic_year(value) {
        errors.add("academic_year", "ano letivo deve ter o formato 2025/2026");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentForm {
    pub student_number: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: Gender,
    #[serde(with = "date_serde::lenient")]
    pub birth_date: Option<Date>,
    pub status: StudentStatus,
    pub course: Option<CourseRef>,
    pub class: Option<ClassRef>,
}

impl StudentForm {
    pub fn validate(&self) -> ValidationResult {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "name", &self.name, "nome");
        require_text(
            &mut errors,
            "student_number",
            &self.student_number,
            "número de processo",
        );
        check_email(&mut errors, &self.email);
        if let Some(birth_date) = self.birth_date
            && birth_date.year() < 1900
        {
            errors.add("birth_date", "data de nascimento inválida");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub qualification: Qualification,
    pub status: TeacherStatus,
    #[serde(with = "date_serde::lenient")]
    pub hired_on: Option<Date>,
}

impl TeacherForm {
    pub fn validate(&self) -> ValidationResult {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "name", &self.name, "nome");
        require_text(&mut errors, "department", &self.department, "departamento");
        check_email(&mut errors, &self.email);
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassForm {
    pub code: String,
    pub name: String,
    pub course: Option<CourseRef>,
    pub grade_level: i64,
    pub shift: Shift,
    pub room: String,
    pub academic_year: String,
    pub capacity: i64,
}

impl ClassForm {
    pub fn validate(&self) -> ValidationResult {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "code", &self.code, "código");
        require_text(&mut errors, "name", &self.name, "designação");
        if !(1..=13).contains(&self.grade_level) {
            errors.add("grade_level", "classe deve estar entre 1 e 13");
        }
        if self.capacity <= 0 {
            errors.add("capacity", "capacidade deve ser positiva");
        }
        check_academic_year(&mut errors, &self.academic_year);
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentForm {
    pub student: StudentRef,
    pub class: Option<ClassRef>,
    pub course: Option<CourseRef>,
    pub academic_year: String,
    #[serde(with = "date_serde")]
    pub enrolled_on: Date,
    pub status: EnrollmentStatus,
}

impl EnrollmentForm {
    pub fn validate(&self) -> ValidationResult {
        let mut errors = FieldErrors::new();
        if self.student.id.get() <= 0 {
            errors.add("student", "aluno é obrigatório");
        }
        check_academic_year(&mut errors, &self.academic_year);
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentForm {
    pub reference: String,
    pub student: StudentRef,
    pub kind: PaymentKind,
    pub description: String,
    pub amount_cents: i64,
    #[serde(with = "date_serde")]
    pub due_date: Date,
    #[serde(with = "date_serde::lenient")]
    pub paid_on: Option<Date>,
    pub status: PaymentStatus,
}

impl PaymentForm {
    pub fn validate(&self) -> ValidationResult {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "reference", &self.reference, "referência");
        if self.student.id.get() <= 0 {
            errors.add("student", "aluno é obrigatório");
        }
        if self.amount_cents <= 0 {
            errors.add("amount_cents", "valor deve ser positivo");
        }
        match (self.status, self.paid_on) {
            (PaymentStatus::Paid, None) => {
                errors.add("paid_on", "pagamento liquidado precisa da data de pagamento");
            }
            (PaymentStatus::Pending | PaymentStatus::Overdue, Some(_)) => {
                errors.add("status", "pagamento com data de pagamento deve estar liquidado");
            }
            _ => {}
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FormPayload {
    Student(StudentForm),
    Teacher(TeacherForm),
    Class(ClassForm),
    Enrollment(EnrollmentForm),
    Payment(PaymentForm),
}

impl FormPayload {
    pub const fn resource(&self) -> Resource {
        match self {
            Self::Student(_) => Resource::Students,
            Self::Teacher(_) => Resource::Teachers,
            Self::Class(_) => Resource::Classes,
            Self::Enrollment(_) => Resource::Enrollments,
            Self::Payment(_) => Resource::Payments,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        match self {
            Self::Student(form) => form.validate(),
            Self::Teacher(form) => form.validate(),
            Self::Class(form) => form.validate(),
            Self::Enrollment(form) => form.validate(),
            Self::Payment(form) => form.validate(),
        }
    }
}

/// Builds a stored record out of a validated form. Used by in-memory
/// sources; the REST backend builds its own.
pub trait FromForm: Sized {
    fn from_form(id: i64, form: &FormPayload) -> Result<Self>;
}

fn wrong_form(expected: Resource, form: &FormPayload) -> anyhow::Error {
    anyhow::anyhow!(
        "{} form cannot build a {} record",
        form.resource().path(),
        expected.path()
    )
}

impl FromForm for Student {
    fn from_form(id: i64, form: &FormPayload) -> Result<Self> {
        let FormPayload::Student(form) = form else {
            return Err(wrong_form(Resource::Students, form));
        };
        Ok(Self {
            id: StudentId::new(id),
            student_number: form.student_number.trim().to_owned(),
            name: form.name.trim().to_owned(),
            email: form.email.trim().to_owned(),
            phone: form.phone.trim().to_owned(),
            gender: form.gender,
            birth_date: form.birth_date,
            status: form.status,
            course: form.course.clone(),
            class: form.class.clone(),
        })
    }
}

impl FromForm for Teacher {
    fn from_form(id: i64, form: &FormPayload) -> Result<Self> {
        let FormPayload::Teacher(form) = form else {
            return Err(wrong_form(Resource::Teachers, form));
        };
        Ok(Self {
            id: TeacherId::new(id),
            name: form.name.trim().to_owned(),
            email: form.email.trim().to_owned(),
            phone: form.phone.trim().to_owned(),
            department: form.department.trim().to_owned(),
            qualification: form.qualification,
            status: form.status,
            hired_on: form.hired_on,
        })
    }
}

impl FromForm for SchoolClass {
    fn from_form(id: i64, form: &FormPayload) -> Result<Self> {
        let FormPayload::Class(form) = form else {
            return Err(wrong_form(Resource::Classes, form));
        };
        Ok(Self {
            id: ClassId::new(id),
            code: form.code.trim().to_owned(),
            name: form.name.trim().to_owned(),
            course: form.course.clone(),
            grade_level: form.grade_level,
            shift: form.shift,
            room: form.room.trim().to_owned(),
            academic_year: form.academic_year.trim().to_owned(),
            capacity: form.capacity,
            enrolled: 0,
        })
    }
}

impl FromForm for Enrollment {
    fn from_form(id: i64, form: &FormPayload) -> Result<Self> {
        let FormPayload::Enrollment(form) = form else {
            return Err(wrong_form(Resource::Enrollments, form));
        };
        Ok(Self {
            id: EnrollmentId::new(id),
            student: form.student.clone(),
            class: form.class.clone(),
            course: form.course.clone(),
            academic_year: form.academic_year.trim().to_owned(),
            enrolled_on: form.enrolled_on,
            status: form.status,
        })
    }
}

impl FromForm for Payment {
    fn from_form(id: i64, form: &FormPayload) -> Result<Self> {
        let FormPayload::Payment(form) = form else {
            return Err(wrong_form(Resource::Payments, form));
        };
        if form.amount_cents <= 0 {
            bail!("payment amount must be positive");
        }
        Ok(Self {
            id: PaymentId::new(id),
            reference: form.reference.trim().to_owned(),
            student: form.student.clone(),
            kind: form.kind,
            description: form.description.trim().to_owned(),
            amount_cents: form.amount_cents,
            due_date: form.due_date,
            paid_on: form.paid_on,
            status: form.status,
        })
    }
}
