// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::Pos;
use async_graphql_value::Value;

#[derive(Debug, Clone)]
pub struct DirectiveNode {
    pub name: String,
    pub arguments: Vec<(String, Value)>,
    pub pos: Pos,
}

/// A field of the selection tree, with fragments already flattened into their parent.
#[derive(Debug, Clone)]
pub struct SelectionNode {
    pub alias: Option<String>,
    pub name: String,
    /// Arguments in document order, still unevaluated
    pub arguments: Vec<(String, Value)>,
    /// The field's own directives followed by those of any enclosing fragment spread
    pub directives: Vec<DirectiveNode>,
    /// Empty for a leaf field
    pub selections: Vec<SelectionNode>,
    pub pos: Pos,
}

impl SelectionNode {
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn is_typename(&self) -> bool {
        self.name == "__typename"
    }
}
