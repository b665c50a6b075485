// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;
use std::collections::BTreeMap;

use crate::value::Value;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
    pub byte: usize,
}

/// A span of configuration source text.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    pub filename: String,
    pub start: Pos,
    pub end: Pos,
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{}-{},{}",
            self.filename, self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

/// An already evaluated expression: a literal value, possibly unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub value: Value,
    pub range: Option<Range>,
}

impl Expression {
    pub fn literal(value: Value) -> Self {
        Expression { value, range: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub expr: Expression,
    pub range: Option<Range>,
}

#[derive(Debug)]
pub struct Block {
    pub type_name: String,
    pub labels: Vec<String>,
    pub body: Box<dyn Body>,
    pub range: Option<Range>,
}

impl Block {
    pub fn new(type_name: impl Into<String>, body: impl Body + 'static) -> Self {
        Block {
            type_name: type_name.into(),
            labels: vec![],
            body: Box::new(body),
            range: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }
}

/// Attributes and nested blocks of a body, blocks in source order.
#[derive(Debug, Default)]
pub struct BodyContent {
    pub attributes: BTreeMap<String, Attribute>,
    pub blocks: Vec<Block>,
}

impl BodyContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        self.attributes.insert(
            name.clone(),
            Attribute {
                name,
                expr: Expression::literal(value),
                range: None,
            },
        );
        self
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }
}

/// A configuration body to decode.
pub trait Body: fmt::Debug {
    fn content(&self) -> &BodyContent;

    /// Whether the body stands for an unknown number of blocks, such as an
    /// unexpanded generator.
    fn is_unknown(&self) -> bool {
        false
    }
}

impl Body for BodyContent {
    fn content(&self) -> &BodyContent {
        self
    }
}

/// A body whose expansion is not known yet.
#[derive(Debug, Default)]
pub struct UnknownBody(pub BodyContent);

impl Body for UnknownBody {
    fn content(&self) -> &BodyContent {
        &self.0
    }

    fn is_unknown(&self) -> bool {
        true
    }
}
