// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod aggregate;
pub mod filter;
pub mod forms;
pub mod ids;
pub mod model;
pub mod pager;
pub mod profile;
pub mod record;
pub mod search;
pub mod source;
pub mod state;

pub use aggregate::*;
pub use filter::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use pager::*;
pub use profile::*;
pub use record::*;
pub use search::*;
pub use source::*;
pub use state::*;
