// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod expansion;
pub mod ids;
pub mod model;
pub mod navigation;
pub mod registry;
pub mod source;
pub mod state;
pub mod tables;
pub mod views;

pub use expansion::*;
pub use ids::*;
pub use model::*;
pub use navigation::*;
pub use registry::*;
pub use source::*;
pub use state::*;
pub use tables::*;
pub use views::*;
