// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::Date;

use crate::ids::*;
use crate::{FieldValue, Record, RecordKey};

macro_rules! labeled_enum {
    ($name:ident { $($variant:ident => ($value:literal, $label:literal)),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

labeled_enum!(Gender {
    Female => ("F", "Feminino"),
    Male => ("M", "Masculino"),
});

labeled_enum!(StudentStatus {
    Active => ("active", "Ativo"),
    Inactive => ("inactive", "Inativo"),
    Transferred => ("transferred", "Transferido"),
    Graduated => ("graduated", "Concluído"),
});

labeled_enum!(TeacherStatus {
    Active => ("active", "Ativo"),
    OnLeave => ("on_leave", "De licença"),
    Inactive => ("inactive", "Inativo"),
});

labeled_enum!(Qualification {
    Licentiate => ("licentiate", "Licenciatura"),
    Master => ("master", "Mestrado"),
    Doctorate => ("doctorate", "Doutoramento"),
});

labeled_enum!(Shift {
    Morning => ("morning", "Manhã"),
    Afternoon => ("afternoon", "Tarde"),
    Evening => ("evening", "Noite"),
});

labeled_enum!(EnrollmentStatus {
    Active => ("active", "Ativa"),
    Pending => ("pending", "Pendente"),
    Cancelled => ("cancelled", "Cancelada"),
});

labeled_enum!(PaymentStatus {
    Paid => ("paid", "Pago"),
    Pending => ("pending", "Pendente"),
    Overdue => ("overdue", "Em atraso"),
});

labeled_enum!(PaymentKind {
    Tuition => ("tuition", "Propina"),
    EnrollmentFee => ("enrollment_fee", "Matrícula"),
    Exam => ("exam", "Exame"),
    Other => ("other", "Outro"),
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    pub id: CourseId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRef {
    pub id: StudentId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRef {
    pub id: ClassId,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub student_number: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub gender: Gender,
    #[serde(default, with = "date_serde::lenient")]
    pub birth_date: Option<Date>,
    pub status: StudentStatus,
    #[serde(default)]
    pub course: Option<CourseRef>,
    #[serde(default)]
    pub class: Option<ClassRef>,
}

impl Student {
    pub const fn has_birth_date(&self) -> bool {
        self.birth_date.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub department: String,
    pub qualification: Qualification,
    pub status: TeacherStatus,
    #[serde(default, with = "date_serde::lenient")]
    pub hired_on: Option<Date>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolClass {
    pub id: ClassId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub course: Option<CourseRef>,
    pub grade_level: i64,
    pub shift: Shift,
    #[serde(default)]
    pub room: String,
    pub academic_year: String,
    pub capacity: i64,
    #[serde(default)]
    pub enrolled: i64,
}

impl SchoolClass {
    pub const fn is_full(&self) -> bool {
        self.capacity > 0 && self.enrolled >= self.capacity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student: StudentRef,
    #[serde(default)]
    pub class: Option<ClassRef>,
    #[serde(default)]
    pub course: Option<CourseRef>,
    pub academic_year: String,
    #[serde(with = "date_serde")]
    pub enrolled_on: Date,
    pub status: EnrollmentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub reference: String,
    pub student: StudentRef,
    pub kind: PaymentKind,
    #[serde(default)]
    pub description: String,
    pub amount_cents: i64,
    #[serde(with = "date_serde")]
    pub due_date: Date,
    #[serde(default, with = "date_serde::lenient")]
    pub paid_on: Option<Date>,
    pub status: PaymentStatus,
}

fn course_field<'a>(course: Option<&'a CourseRef>, rest: &str) -> Option<FieldValue<'a>> {
    let course = course?;
    match rest {
        "id" => Some(FieldValue::Int(course.id.get())),
        "name" => Some(FieldValue::text(&course.name)),
        _ => None,
    }
}

fn class_field<'a>(class: Option<&'a ClassRef>, rest: &str) -> Option<FieldValue<'a>> {
    let class = class?;
    match rest {
        "id" => Some(FieldValue::Int(class.id.get())),
        "code" => Some(FieldValue::text(&class.code)),
        _ => None,
    }
}

fn student_field<'a>(student: &'a StudentRef, rest: &str) -> Option<FieldValue<'a>> {
    match rest {
        "id" => Some(FieldValue::Int(student.id.get())),
        "name" => Some(FieldValue::text(&student.name)),
        _ => None,
    }
}

impl Record for Student {
    fn key(&self) -> RecordKey {
        self.id.into()
    }

    fn field(&self, path: &str) -> Option<FieldValue<'_>> {
        if let Some(rest) = path.strip_prefix("course.") {
            return course_field(self.course.as_ref(), rest);
        }
        if let Some(rest) = path.strip_prefix("class.") {
            return class_field(self.class.as_ref(), rest);
        }
        match path {
            "id" => Some(FieldValue::Int(self.id.get())),
            "student_number" => Some(FieldValue::text(&self.student_number)),
            "name" => Some(FieldValue::text(&self.name)),
            "email" => Some(FieldValue::text(&self.email)),
            "phone" => Some(FieldValue::text(&self.phone)),
            "gender" => Some(FieldValue::text(self.gender.as_str())),
            "birth_date" => self.birth_date.map(FieldValue::Date),
            "status" => Some(FieldValue::text(self.status.as_str())),
            _ => None,
        }
    }
}

impl Record for Teacher {
    fn key(&self) -> RecordKey {
        self.id.into()
    }

    fn field(&self, path: &str) -> Option<FieldValue<'_>> {
        match path {
            "id" => Some(FieldValue::Int(self.id.get())),
            "name" => Some(FieldValue::text(&self.name)),
            "email" => Some(FieldValue::text(&self.email)),
            "phone" => Some(FieldValue::text(&self.phone)),
            "department" => Some(FieldValue::text(&self.department)),
            "qualification" => Some(FieldValue::text(self.qualification.as_str())),
            "status" => Some(FieldValue::text(self.status.as_str())),
            "hired_on" => self.hired_on.map(FieldValue::Date),
            _ => None,
        }
    }
}

impl Record for SchoolClass {
    fn key(&self) -> RecordKey {
        self.id.into()
    }

    fn field(&self, path: &str) -> Option<FieldValue<'_>> {
        if let Some(rest) = path.strip_prefix("course.") {
            return course_field(self.course.as_ref(), rest);
        }
        match path {
            "id" => Some(FieldValue::Int(self.id.get())),
            "code" => Some(FieldValue::text(&self.code)),
            "name" => Some(FieldValue::text(&self.name)),
            "grade_level" => Some(FieldValue::Int(self.grade_level)),
            "shift" => Some(FieldValue::text(self.shift.as_str())),
            "room" => Some(FieldValue::text(&self.room)),
            "academic_year" => Some(FieldValue::text(&self.academic_year)),
            "capacity" => Some(FieldValue::Int(self.capacity)),
            "enrolled" => Some(FieldValue::Int(self.enrolled)),
            _ => None,
        }
    }
}

impl Record for Enrollment {
    fn key(&self) -> RecordKey {
        self.id.into()
    }

    fn field(&self, path: &str) -> Option<FieldValue<'_>> {
        if let Some(rest) = path.strip_prefix("student.") {
            return student_field(&self.student, rest);
        }
        if let Some(rest) = path.strip_prefix("class.") {
            return class_field(self.class.as_ref(), rest);
        }
        if let Some(rest) = path.strip_prefix("course.") {
            return course_field(self.course.as_ref(), rest);
        }
        match path {
            "id" => Some(FieldValue::Int(self.id.get())),
            "academic_year" => Some(FieldValue::text(&self.academic_year)),
            "enrolled_on" => Some(FieldValue::Date(self.enrolled_on)),
            "status" => Some(FieldValue::text(self.status.as_str())),
            _ => None,
        }
    }
}

impl Record for Payment {
    fn key(&self) -> RecordKey {
        self.id.into()
    }

    fn field(&self, path: &str) -> Option<FieldValue<'_>> {
        if let Some(rest) = path.strip_prefix("student.") {
            return student_field(&self.student, rest);
        }
        match path {
            "id" => Some(FieldValue::Int(self.id.get())),
            "reference" => Some(FieldValue::text(&self.reference)),
            "kind" => Some(FieldValue::text(self.kind.as_str())),
            "description" => Some(FieldValue::text(&self.description)),
            "amount_cents" => Some(FieldValue::Int(self.amount_cents)),
            "due_date" => Some(FieldValue::Date(self.due_date)),
            "paid_on" => self.paid_on.map(FieldValue::Date),
            "status" => Some(FieldValue::text(self.status.as_str())),
            _ => None,
        }
    }
}

/// The list pages of the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Students,
    Teachers,
    Classes,
    Enrollments,
    Payments,
}

impl Resource {
    pub const ALL: [Self; 5] = [
        Self::Students,
        Self::Teachers,
        Self::Classes,
        Self::Enrollments,
        Self::Payments,
    ];

    /// REST collection path and navigation feature segment.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Teachers => "teachers",
            Self::Classes => "classes",
            Self::Enrollments => "enrollments",
            Self::Payments => "payments",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Students => "Alunos",
            Self::Teachers => "Professores",
            Self::Classes => "Turmas",
            Self::Enrollments => "Matrículas",
            Self::Payments => "Pagamentos",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|resource| resource.path() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Details(Resource, RecordKey),
    Edit(Resource, RecordKey),
    Add(Resource),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Details(resource, key) => format!("/{}/details/{key}", resource.path()),
            Self::Edit(resource, key) => format!("/{}/edit/{key}", resource.path()),
            Self::Add(resource) => format!("/{}/add", resource.path()),
        }
    }
}

/// Renders cents as `12 500,00 Kz`.
pub fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped},{:02} Kz", cents % 100)
}

/// `YYYY-MM-DD` dates on the wire.
pub mod date_serde {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _, ser::Error as _};
    use time::Date;
    use time::macros::format_description;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = date
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<Date, time::error::Parse> {
        let day = raw.get(..10).unwrap_or(raw);
        Date::parse(day, format_description!("[year]-[month]-[day]"))
    }

    /// Optional dates. Absent values arrive as `null`, `""`, or `{}`; all of
    /// them decode to `None`.
    pub mod lenient {
        use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
        use serde_json::Value;
        use time::Date;

        pub fn serialize<S: Serializer>(
            date: &Option<Date>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Date>, D::Error> {
            match Option::<Value>::deserialize(deserializer)? {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
                Some(Value::String(raw)) => super::parse(raw.trim()).map(Some).map_err(D::Error::custom),
                Some(Value::Object(map)) if map.is_empty() => Ok(None),
                Some(other) => Err(D::Error::custom(format!(
                    "expected YYYY-MM-DD date, got {other}"
                ))),
            }
        }
    }
}
