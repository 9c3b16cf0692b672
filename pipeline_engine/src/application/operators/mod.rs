// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The built-in operator catalog (spec.md §4.2 minimum set): `map`,
//! `template`, `when`, `lookup`, `currency`, `unit`, `aggregate`, `set`,
//! `remove`, `rename`, `deltaFilter`, `validateRequired`, `validateFormat`,
//! `script`.

pub mod aggregate;
pub mod field_ops;
pub mod filter_ops;
pub mod script_op;

use std::sync::Arc;

use pipeline_domain::repositories::operator::Operator;

use aggregate::AggregateOperator;
use field_ops::{CurrencyOperator, LookupOperator, MapOperator, RemoveOperator, RenameOperator, SetOperator, TemplateOperator, UnitOperator};
use filter_ops::{DeltaFilterOperator, ValidateFormatOperator, ValidateRequiredOperator, WhenOperator};
use script_op::ScriptOperator;

/// Returns the built-in table as `(code, operator)` pairs, in the order
/// they are documented. `deltaFilter` carries per-registration state (the
/// set of keys seen so far) so it is instantiated fresh here rather than
/// shared as a singleton.
pub fn built_in_table() -> Vec<(&'static str, Arc<dyn Operator>)> {
    vec![
        ("map", Arc::new(MapOperator)),
        ("template", Arc::new(TemplateOperator)),
        ("when", Arc::new(WhenOperator)),
        ("lookup", Arc::new(LookupOperator)),
        ("currency", Arc::new(CurrencyOperator)),
        ("unit", Arc::new(UnitOperator)),
        ("aggregate", Arc::new(AggregateOperator)),
        ("set", Arc::new(SetOperator)),
        ("remove", Arc::new(RemoveOperator)),
        ("rename", Arc::new(RenameOperator)),
        ("deltaFilter", Arc::new(DeltaFilterOperator::new())),
        ("validateRequired", Arc::new(ValidateRequiredOperator)),
        ("validateFormat", Arc::new(ValidateFormatOperator)),
        ("script", Arc::new(ScriptOperator)),
    ]
}
