// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Lookup of configuration values, from the process environment or from a fixed table.

use std::collections::HashMap;

use thiserror::Error;

/// A source of `RECORDQL_*` settings.
pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Read an on/off setting. Unset means `default`; anything unrecognized is an error.
    fn flag(&self, key: &str, default: bool) -> Result<bool, EnvError> {
        let Some(value) = self.get(key) else {
            return Ok(default);
        };

        if ["1", "true", "yes", "on"]
            .iter()
            .any(|on| value.eq_ignore_ascii_case(on))
        {
            Ok(true)
        } else if ["0", "false", "no", "off"]
            .iter()
            .any(|off| value.eq_ignore_ascii_case(off))
        {
            Ok(false)
        } else {
            Err(EnvError::InvalidFlag {
                key: key.to_string(),
                value,
            })
        }
    }
}

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("{key} must be one of 1, true, yes, on, 0, false, no, off (got '{value}')")]
    InvalidFlag { key: String, value: String },

    #[error("{key} has an invalid value '{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Settings of the running process.
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Settings from a fixed table, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment(HashMap<String, String>);

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Environment for MapEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for MapEnvironment {
    fn from(entries: [(&str, &str); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }
}
