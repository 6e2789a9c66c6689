// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::RecordKey;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for RecordKey {
            fn from(value: $name) -> Self {
                RecordKey::Int(value.0)
            }
        }
    };
}

entity_id!(StudentId);
entity_id!(TeacherId);
entity_id!(CourseId);
entity_id!(ClassId);
entity_id!(EnrollmentId);
entity_id!(PaymentId);
