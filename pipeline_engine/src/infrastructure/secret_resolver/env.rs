// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! An environment-variable-backed `SecretResolver` (spec.md §4.2/§6): the
//! `secrets.get(code)` operator helper resolves `code` by uppercasing it and
//! prefixing it, then reading that environment variable.

use async_trait::async_trait;
use pipeline_domain::error::PipelineError;
use pipeline_domain::repositories::secret_resolver::SecretResolver;

const DEFAULT_PREFIX: &str = "SECRET_";

pub struct EnvSecretResolver {
    prefix: String,
}

impl EnvSecretResolver {
    pub fn new() -> Self {
        Self { prefix: DEFAULT_PREFIX.to_string() }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    fn env_var_name(&self, code: &str) -> String {
        format!("{}{}", self.prefix, code.to_uppercase())
    }
}

impl Default for EnvSecretResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretResolver for EnvSecretResolver {
    async fn resolve(&self, code: &str) -> Result<Option<String>, PipelineError> {
        Ok(std::env::var(self.env_var_name(code)).ok())
    }
}
