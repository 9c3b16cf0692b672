// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `Operator` — the two-shape contract implemented by built-in and custom
//! operators (spec.md §4.2), and `OperatorHelpers`, the capability bundle
//! passed to every operator call.

use crate::error::PipelineError;
use crate::record::{as_value, from_value, Record};
use crate::repositories::secret_resolver::SecretResolver;
use crate::util::{path, stable, unit};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha1::Sha1;
use std::sync::Arc;
use uuid::Uuid;

/// A batch operator implements [`Operator::apply`] directly; a
/// single-record operator implements [`Operator::apply_one`] and inherits
/// the default `apply`, which maps it over the batch and drops records that
/// return `None` (the filter semantics of `applyOne`).
#[async_trait]
pub trait Operator: Send + Sync {
    async fn apply(
        &self,
        records: Vec<Record>,
        args: &Value,
        helpers: &OperatorHelpers,
    ) -> Result<Vec<Record>, PipelineError> {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            if let Some(mapped) = self.apply_one(record, args, helpers).await? {
                out.push(mapped);
            }
        }
        Ok(out)
    }

    async fn apply_one(
        &self,
        _record: Record,
        _args: &Value,
        _helpers: &OperatorHelpers,
    ) -> Result<Option<Record>, PipelineError> {
        Err(PipelineError::InternalError(
            "operator implements neither apply nor apply_one".into(),
        ))
    }
}

/// Dotted-path, formatting, conversion, crypto, and secret-lookup helpers
/// passed to every operator invocation (spec.md §4.2).
pub struct OperatorHelpers {
    secrets: Option<Arc<dyn SecretResolver>>,
}

impl OperatorHelpers {
    pub fn new(secrets: Option<Arc<dyn SecretResolver>>) -> Self {
        Self { secrets }
    }

    pub fn get<'a>(&self, record: &'a Record, dotted_path: &str) -> Option<&'a Value> {
        let segs = path::segments(dotted_path);
        let (first, rest) = segs.split_first()?;
        let head = record.get(*first)?;
        if rest.is_empty() {
            Some(head)
        } else {
            path::get_segments(head, rest)
        }
    }

    pub fn set(&self, record: &mut Record, dotted_path: &str, value: Value) {
        let mut wrapped = as_value(record);
        path::set(&mut wrapped, dotted_path, value);
        *record = from_value(wrapped);
    }

    pub fn remove(&self, record: &mut Record, dotted_path: &str) {
        let mut wrapped = as_value(record);
        path::remove(&mut wrapped, dotted_path);
        *record = from_value(wrapped);
    }

    pub fn format(&self) -> FormatHelpers {
        FormatHelpers
    }

    pub fn convert(&self) -> ConvertHelpers {
        ConvertHelpers
    }

    pub fn crypto(&self) -> CryptoHelpers {
        CryptoHelpers
    }

    /// Asynchronous secret lookup via the configured `SecretResolver`.
    /// `None` when no resolver was wired in (e.g. dry-run).
    pub async fn secrets_get(&self, code: &str) -> Result<Option<String>, PipelineError> {
        match &self.secrets {
            Some(resolver) => resolver.resolve(code).await,
            None => Ok(None),
        }
    }
}

pub struct FormatHelpers;

impl FormatHelpers {
    pub fn currency(&self, amount: f64, code: &str) -> String {
        match code.to_ascii_uppercase().as_str() {
            "USD" => format!("${amount:.2}"),
            "EUR" => format!("€{amount:.2}"),
            "GBP" => format!("£{amount:.2}"),
            other => format!("{amount:.2} {other}"),
        }
    }

    pub fn date(&self, ts: &DateTime<Utc>, fmt: &str) -> String {
        ts.format(fmt).to_string()
    }

    pub fn number(&self, n: f64, decimals: usize) -> String {
        format!("{n:.decimals$}")
    }

    /// Expands `{{dotted.path}}` placeholders against `data`.
    pub fn template(&self, template: &str, data: &Record) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];
            match after_open.find("}}") {
                Some(end) => {
                    let key = after_open[..end].trim();
                    let wrapped = as_value(data);
                    let value = path::get(&wrapped, key)
                        .map(value_to_display)
                        .unwrap_or_default();
                    out.push_str(&value);
                    rest = &after_open[end + 2..];
                }
                None => {
                    out.push_str("{{");
                    rest = after_open;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub struct ConvertHelpers;

impl ConvertHelpers {
    pub fn to_minor_units(&self, amount: f64) -> i64 {
        (amount * 100.0).round() as i64
    }

    pub fn from_minor_units(&self, minor: i64) -> f64 {
        minor as f64 / 100.0
    }

    pub fn unit(&self, value: f64, from: &str, to: &str) -> f64 {
        value * unit::unit_factor(from, to)
    }

    /// Tries RFC 3339 first, then a bare `YYYY-MM-DD` date.
    pub fn parse_date(&self, s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

pub struct CryptoHelpers;

type HmacSha1 = Hmac<Sha1>;

impl CryptoHelpers {
    pub fn hash(&self, value: &Value) -> String {
        stable::hash_stable(value)
    }

    pub fn hmac(&self, value: &Value, key: &[u8]) -> Result<String, PipelineError> {
        let mut mac = HmacSha1::new_from_slice(key)
            .map_err(|e| PipelineError::InternalError(format!("hmac key: {e}")))?;
        mac.update(stable::stable_stringify(value).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn uuid(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn template_expands_dotted_paths() {
        let mut record = Record::new();
        record.insert("name".into(), json!("Ada"));
        let helpers = OperatorHelpers::new(None);
        let rendered = helpers.format().template("Hello, {{name}}!", &record);
        assert_eq!(rendered, "Hello, Ada!");
    }

    #[test]
    fn template_leaves_unmatched_placeholder_empty() {
        let record = Record::new();
        let helpers = OperatorHelpers::new(None);
        let rendered = helpers.format().template("{{missing}}", &record);
        assert_eq!(rendered, "");
    }

    #[test]
    fn convert_minor_units_round_trip() {
        let helpers = OperatorHelpers::new(None);
        let convert = helpers.convert();
        assert_eq!(convert.to_minor_units(12.34), 1234);
        assert!((convert.from_minor_units(1234) - 12.34).abs() < 1e-9);
    }

    #[test]
    fn crypto_hash_is_stable() {
        let helpers = OperatorHelpers::new(None);
        let a = helpers.crypto().hash(&json!({"a": 1, "b": 2}));
        let b = helpers.crypto().hash(&json!({"b": 2, "a": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn get_set_remove_round_trip() {
        let helpers = OperatorHelpers::new(None);
        let mut record = Record::new();
        helpers.set(&mut record, "a.b", json!(1));
        assert_eq!(helpers.get(&record, "a.b"), Some(&json!(1)));
        helpers.remove(&mut record, "a.b");
        assert_eq!(helpers.get(&record, "a.b"), None);
    }
}
