// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod scripted;

pub use scripted::ScriptedSource;

use escola_app::{
    ClassId, ClassRef, CourseId, CourseRef, Enrollment, EnrollmentId, EnrollmentStatus, Gender,
    Payment, PaymentId, PaymentKind, PaymentStatus, Qualification, SchoolClass, Shift, Student,
    StudentId, StudentRef, StudentStatus, Teacher, TeacherId, TeacherStatus,
};
use time::macros::date;
use time::{Date, Duration};

const ACADEMIC_YEAR: &str = "2025/2026";
const REFERENCE_DATE: Date = date!(2026 - 01 - 15);

const COURSES: [(&str, &str); 6] = [
    ("IG", "Informática de Gestão"),
    ("CG", "Contabilidade e Gestão"),
    ("CFB", "Ciências Físicas e Biológicas"),
    ("CEJ", "Ciências Económicas e Jurídicas"),
    ("ENF", "Enfermagem"),
    ("ELE", "Electricidade"),
];

const FEMALE_NAMES: [&str; 14] = [
    "Ana", "Beatriz", "Catarina", "Domingas", "Esperança", "Filomena", "Graça", "Helena",
    "Isabel", "Joana", "Luzia", "Maria", "Nádia", "Rosa",
];
const MALE_NAMES: [&str; 14] = [
    "António", "Bernardo", "Carlos", "Domingos", "Eduardo", "Francisco", "Gaspar", "Hélder",
    "João", "Lucas", "Manuel", "Nelson", "Paulo", "Ricardo",
];
const SURNAMES: [&str; 16] = [
    "Afonso", "Baptista", "Cardoso", "Domingos", "Fernandes", "Gomes", "Kiala", "Lopes",
    "Mateus", "Neto", "Pedro", "Quintas", "Santos", "Silva", "Tavares", "Vunge",
];
const DEPARTMENTS: [&str; 5] = ["Matemática", "Línguas", "Ciências", "Informática", "Gestão"];
const ROOMS: [&str; 8] = [
    "Sala 1", "Sala 2", "Sala 3", "Sala 4", "Sala 5", "Laboratório A", "Laboratório B",
    "Auditório",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    /// True roughly `percent` times out of a hundred.
    fn chance(&mut self, percent: usize) -> bool {
        self.int_n(100) < percent
    }
}

/// A whole seeded school: every list the back office shows.
#[derive(Debug, Clone, PartialEq)]
pub struct School {
    pub students: Vec<Student>,
    pub teachers: Vec<Teacher>,
    pub classes: Vec<SchoolClass>,
    pub enrollments: Vec<Enrollment>,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone)]
pub struct SchoolFaker {
    rng: DeterministicRng,
    seed: u64,
    next_student: i64,
    next_teacher: i64,
    next_class: i64,
    next_enrollment: i64,
    next_payment: i64,
}

impl SchoolFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
            next_student: 1,
            next_teacher: 1,
            next_class: 1,
            next_enrollment: 1,
            next_payment: 1,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn course(&mut self) -> CourseRef {
        let index = self.rng.int_n(COURSES.len());
        course_ref(index)
    }

    pub fn school_class(&mut self) -> SchoolClass {
        let id = take_id(&mut self.next_class);
        let course_index = self.rng.int_n(COURSES.len());
        let (abbreviation, _) = COURSES[course_index];
        let grade_level = 10 + self.rng.int_n(4) as i64;
        let letter = char::from(b'A' + self.rng.int_n(3) as u8);
        let shift = Shift::ALL[self.rng.int_n(Shift::ALL.len())];
        let shift_initial = match shift {
            Shift::Morning => 'M',
            Shift::Afternoon => 'T',
            Shift::Evening => 'N',
        };
        let capacity = if self.rng.chance(50) { 30 } else { 35 };

        SchoolClass {
            id: ClassId::new(id),
            code: format!("{abbreviation}{grade_level}{letter}-{shift_initial}"),
            name: format!("{grade_level}ª {letter}"),
            course: Some(course_ref(course_index)),
            grade_level,
            shift,
            room: self.pick(&ROOMS).to_owned(),
            academic_year: ACADEMIC_YEAR.to_owned(),
            capacity,
            enrolled: self.rng.int_n(capacity as usize + 1) as i64,
        }
    }

    /// A student placed in `class`, or in no class at all.
    pub fn student_in(&mut self, class: Option<&SchoolClass>) -> Student {
        let id = take_id(&mut self.next_student);
        let gender = if self.rng.chance(50) {
            Gender::Female
        } else {
            Gender::Male
        };
        let first = match gender {
            Gender::Female => self.pick(&FEMALE_NAMES),
            Gender::Male => self.pick(&MALE_NAMES),
        };
        let last = self.pick(&SURNAMES);
        let status = match self.rng.int_n(20) {
            0..=14 => StudentStatus::Active,
            15..=16 => StudentStatus::Inactive,
            17..=18 => StudentStatus::Transferred,
            _ => StudentStatus::Graduated,
        };
        let birth_date = if self.rng.chance(80) {
            let year = 2004 + self.rng.int_n(8) as i32;
            Date::from_ordinal_date(year, 1 + self.rng.int_n(365) as u16).ok()
        } else {
            None
        };

        Student {
            id: StudentId::new(id),
            student_number: format!("2025-{id:04}"),
            name: format!("{first} {last}"),
            email: format!(
                "{}.{}{id}@escola.ao",
                ascii_lower(first),
                ascii_lower(last)
            ),
            phone: self.phone(),
            gender,
            birth_date,
            status,
            course: class.and_then(|class| class.course.clone()),
            class: class.map(|class| ClassRef {
                id: class.id,
                code: class.code.clone(),
            }),
        }
    }

    pub fn student(&mut self) -> Student {
        let class = self.school_class();
        self.student_in(Some(&class))
    }

    pub fn teacher(&mut self) -> Teacher {
        let id = take_id(&mut self.next_teacher);
        let first = if self.rng.chance(50) {
            self.pick(&FEMALE_NAMES)
        } else {
            self.pick(&MALE_NAMES)
        };
        let last = self.pick(&SURNAMES);
        let qualification = match self.rng.int_n(10) {
            0..=5 => Qualification::Licentiate,
            6..=8 => Qualification::Master,
            _ => Qualification::Doctorate,
        };
        let status = match self.rng.int_n(10) {
            0..=7 => TeacherStatus::Active,
            8 => TeacherStatus::OnLeave,
            _ => TeacherStatus::Inactive,
        };

        Teacher {
            id: TeacherId::new(id),
            name: format!("{first} {last}"),
            email: format!("{}.{}@escola.ao", ascii_lower(first), ascii_lower(last)),
            phone: self.phone(),
            department: self.pick(&DEPARTMENTS).to_owned(),
            qualification,
            status,
            hired_on: Some(self.days_before_reference(365 * 15)),
        }
    }

    pub fn enrollment(&mut self, student: &Student) -> Enrollment {
        let id = take_id(&mut self.next_enrollment);
        let status = match student.status {
            StudentStatus::Inactive | StudentStatus::Transferred => EnrollmentStatus::Cancelled,
            StudentStatus::Active if self.rng.chance(10) => EnrollmentStatus::Pending,
            _ => EnrollmentStatus::Active,
        };

        Enrollment {
            id: EnrollmentId::new(id),
            student: student_ref(student),
            class: student.class.clone(),
            course: student.course.clone(),
            academic_year: ACADEMIC_YEAR.to_owned(),
            enrolled_on: self.days_before_reference(150),
            status,
        }
    }

    pub fn payment(&mut self, student: &Student) -> Payment {
        let id = take_id(&mut self.next_payment);
        let kind = match self.rng.int_n(10) {
            0..=6 => PaymentKind::Tuition,
            7 => PaymentKind::EnrollmentFee,
            8 => PaymentKind::Exam,
            _ => PaymentKind::Other,
        };
        let amount_cents = match kind {
            PaymentKind::Tuition => 2_500_000,
            PaymentKind::EnrollmentFee => 1_500_000,
            PaymentKind::Exam => 500_000,
            PaymentKind::Other => 100_000 * (1 + self.rng.int_n(10) as i64),
        };
        let due_date = self.days_before_reference(120);
        let (status, paid_on) = if self.rng.chance(60) {
            let paid_on = due_date.saturating_sub(Duration::days(self.rng.int_n(10) as i64));
            (PaymentStatus::Paid, Some(paid_on))
        } else if self.rng.chance(50) {
            (PaymentStatus::Overdue, None)
        } else {
            (PaymentStatus::Pending, None)
        };

        Payment {
            id: PaymentId::new(id),
            reference: format!("PAG-{id:05}"),
            student: student_ref(student),
            kind,
            description: format!("{} {ACADEMIC_YEAR}", kind.label()),
            amount_cents,
            due_date,
            paid_on,
            status,
        }
    }

    /// Builds a consistent school: students sit in generated classes, and
    /// every student has one enrollment and two payments.
    pub fn school(&mut self, student_count: usize) -> School {
        let class_count = (student_count / 25).clamp(4, 24);
        let mut classes = (0..class_count)
            .map(|_| self.school_class())
            .collect::<Vec<_>>();
        for class in &mut classes {
            class.enrolled = 0;
        }

        let mut students = Vec::with_capacity(student_count);
        for _ in 0..student_count {
            let index = self.rng.int_n(classes.len());
            let student = self.student_in(Some(&classes[index]));
            if student.status == StudentStatus::Active {
                classes[index].enrolled += 1;
            }
            students.push(student);
        }

        let teachers = (0..class_count.div_ceil(2) + 2)
            .map(|_| self.teacher())
            .collect::<Vec<_>>();
        let enrollments = students
            .iter()
            .map(|student| self.enrollment(student))
            .collect::<Vec<_>>();
        let payments = students
            .iter()
            .flat_map(|student| [student, student])
            .map(|student| self.payment(student))
            .collect::<Vec<_>>();

        School {
            students,
            teachers,
            classes,
            enrollments,
            payments,
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn phone(&mut self) -> String {
        format!(
            "+244 9{:02} {:03} {:03}",
            self.rng.int_n(100),
            self.rng.int_n(1000),
            self.rng.int_n(1000)
        )
    }

    fn days_before_reference(&mut self, max_days: usize) -> Date {
        REFERENCE_DATE.saturating_sub(Duration::days(self.rng.int_n(max_days + 1) as i64))
    }
}

/// `count` active students named `Aluno 01`, `Aluno 02`, ... with ids
/// matching their position, all in the same class.
pub fn numbered_students(count: usize) -> Vec<Student> {
    (1..=count)
        .map(|index| {
            let id = index as i64;
            Student {
                id: StudentId::new(id),
                student_number: format!("2025-{id:04}"),
                name: format!("Aluno {index:02}"),
                email: format!("aluno{index:02}@escola.ao"),
                phone: String::new(),
                gender: if index % 2 == 0 {
                    Gender::Female
                } else {
                    Gender::Male
                },
                birth_date: None,
                status: StudentStatus::Active,
                course: Some(course_ref(0)),
                class: Some(ClassRef {
                    id: ClassId::new(1),
                    code: "IG10A-M".to_owned(),
                }),
            }
        })
        .collect()
}

pub fn reference_date() -> Date {
    REFERENCE_DATE
}

pub fn course_names() -> impl Iterator<Item = &'static str> {
    COURSES.iter().map(|(_, name)| *name)
}

fn course_ref(index: usize) -> CourseRef {
    CourseRef {
        id: CourseId::new(index as i64 + 1),
        name: COURSES[index].1.to_owned(),
    }
}

fn student_ref(student: &Student) -> StudentRef {
    StudentRef {
        id: student.id,
        name: student.name.clone(),
    }
}

fn take_id(counter: &mut i64) -> i64 {
    let id = *counter;
    *counter += 1;
    id
}

fn ascii_lower(name: &str) -> String {
    name.chars()
        .map(|ch| match ch {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}
