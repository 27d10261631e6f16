// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use common::value::Val;

use crate::coercion::{Variables, coerce};

use super::{DirectiveNode, DocumentError, SelectionNode};

/// Remove the selections excluded by `@include`/`@skip`, depth-first and pre-order, so the
/// subtree of a removed selection is never evaluated.
///
/// When `@include` is present its condition decides; otherwise `@skip` does. A selection
/// without either directive is kept. Other directives are ignored.
pub fn prune(
    selections: Vec<SelectionNode>,
    variables: &Variables,
) -> Result<Vec<SelectionNode>, DocumentError> {
    let mut kept = Vec::with_capacity(selections.len());

    for mut selection in selections {
        if is_selected(&selection, variables)? {
            selection.selections = prune(std::mem::take(&mut selection.selections), variables)?;
            kept.push(selection);
        }
    }

    Ok(kept)
}

fn is_selected(selection: &SelectionNode, variables: &Variables) -> Result<bool, DocumentError> {
    let includes = conditions(selection, "include", variables)?;
    if !includes.is_empty() {
        return Ok(includes.into_iter().all(|included| included));
    }

    let skips = conditions(selection, "skip", variables)?;
    Ok(!skips.into_iter().any(|skipped| skipped))
}

fn conditions(
    selection: &SelectionNode,
    directive_name: &str,
    variables: &Variables,
) -> Result<Vec<bool>, DocumentError> {
    selection
        .directives
        .iter()
        .filter(|directive| directive.name == directive_name)
        .map(|directive| condition(directive, variables))
        .collect()
}

fn condition(directive: &DirectiveNode, variables: &Variables) -> Result<bool, DocumentError> {
    let (_, value) = directive
        .arguments
        .iter()
        .find(|(name, _)| name == "if")
        .ok_or_else(|| {
            DocumentError::MissingDirectiveCondition(directive.name.clone(), directive.pos)
        })?;

    match coerce(value, variables)? {
        Val::Bool(condition) => Ok(condition),
        other => Err(DocumentError::InvalidDirectiveCondition {
            directive: directive.name.clone(),
            actual: other.type_name(),
            pos: directive.pos,
        }),
    }
}
