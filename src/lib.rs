// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

pub mod decode;
mod number;
pub mod schema;
pub mod state;
mod types;
pub mod unmarshal;
mod value;

pub use number::{Number, ParseNumberError};
pub use schema::{
    AttributeSchema, BlockSchema, NestedAttributeType, NestedBlockSchema, NestingMode, Requirement,
};
pub use types::{ConformanceError, ObjectType, Type};
pub use unmarshal::{unmarshal, UnmarshalError};
pub use value::Value;

#[cfg(feature = "yaml")]
pub use unmarshal::unmarshal_yaml;

// Values are reference counted. With the `arc` feature they can be shared
// across threads.
#[cfg(feature = "arc")]
pub use std::sync::Arc as Rc;

#[cfg(not(feature = "arc"))]
pub use std::rc::Rc;

/// Schemas deeper than this are cut off instead of being walked further.
pub const MAX_SCHEMA_DEPTH: usize = 64;
