// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::chart_request::{ChartKind, ChartRequest};
use crate::data_profiler::{ClassifyConfig, ColumnClassifier, ColumnKind};
use itertools::Itertools;
use log::debug;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}
impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fatal,
            message: message.into(),
        }
    }
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}
impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "warning: {}", self.message),
            Severity::Fatal => write!(f, "error: {}", self.message),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    Accepted {
        request: ChartRequest,
        warnings: Vec<Diagnostic>,
    },
    Rejected(Vec<Diagnostic>),
}
impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted { .. })
    }
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            ValidationOutcome::Accepted { warnings, .. } => warnings,
            ValidationOutcome::Rejected(diagnostics) => diagnostics,
        }
    }
}

pub struct Validator {
    classifier: ColumnClassifier,
}
impl Validator {
    pub fn new() -> Self {
        Self {
            classifier: ColumnClassifier::new(),
        }
    }
    pub fn with_config(config: ClassifyConfig) -> Self {
        Self {
            classifier: ColumnClassifier::with_config(config),
        }
    }

    /// Checks a request against the table and the per-kind rule table.
    /// Scatter and bubble requests may rewrite a string x column into a
    /// datetime column in place; the mutation is the only state this
    /// function carries between calls.
    pub fn validate(&self, table: &mut DataFrame, request: &ChartRequest) -> ValidationOutcome {
        if table.height() == 0 {
            return ValidationOutcome::Rejected(vec![Diagnostic::fatal("the dataset has no rows")]);
        }
        let mut accepted = request.clone();
        let mut diagnostics = Vec::new();
        match request.kind {
            ChartKind::Line
            | ChartKind::Bar
            | ChartKind::Area
            | ChartKind::BoxPlot
            | ChartKind::Violin
            | ChartKind::Radar => {
                self.check_plain_x(table, request, &mut diagnostics);
                self.check_numeric_ys(table, request, &mut diagnostics);
            }
            ChartKind::Scatter => {
                self.check_coercible_x(table, request, &mut diagnostics);
                self.check_numeric_ys(table, request, &mut diagnostics);
            }
            ChartKind::Bubble => {
                self.check_coercible_x(table, request, &mut diagnostics);
                if request.y.len() < 2 {
                    diagnostics.push(Diagnostic::fatal(
                        "select at least two columns for the y-axis (value and size)",
                    ));
                } else {
                    self.check_numeric_ys(table, request, &mut diagnostics);
                }
            }
            ChartKind::Histogram => {
                match request.x.as_deref() {
                    None => diagnostics.push(Diagnostic::fatal("select a column for the x-axis")),
                    Some(x) => match self.classifier.classify(table, x) {
                        ColumnKind::Numeric => {}
                        ColumnKind::Unsuitable if table.column(x).is_err() => diagnostics
                            .push(Diagnostic::fatal(format!(
                                "column '{x}' not found in the dataset"
                            ))),
                        _ => diagnostics.push(Diagnostic::fatal(format!(
                            "column '{x}' is not numeric and cannot be used for a histogram"
                        ))),
                    },
                }
                accepted.y.clear();
            }
            ChartKind::Pie => {
                self.check_categorical_x(table, request, &mut diagnostics);
                match request.y.first() {
                    None => diagnostics.push(Diagnostic::fatal(
                        "select at least one column for the y-axis",
                    )),
                    Some(first) => {
                        if self.classifier.classify(table, first) != ColumnKind::Numeric {
                            diagnostics.push(Diagnostic::fatal(format!(
                                "column '{first}' is not numeric and cannot be used for the y-axis"
                            )));
                        }
                        if request.y.len() > 1 {
                            diagnostics.push(Diagnostic::warning(format!(
                                "pie charts use a single y-axis column; ignoring {}",
                                request.y[1..].iter().map(|c| format!("'{c}'")).join(", ")
                            )));
                            accepted.y.truncate(1);
                        }
                    }
                }
            }
            ChartKind::Sunburst => {
                self.check_categorical_x(table, request, &mut diagnostics);
                if request.y.is_empty() {
                    diagnostics.push(Diagnostic::fatal(
                        "select at least one column for the y-axis",
                    ));
                }
                for column in &request.y {
                    if self.classifier.classify(table, column) != ColumnKind::Categorical {
                        diagnostics.push(Diagnostic::fatal(format!(
                            "column '{column}' is not categorical and cannot be used in the sunburst path"
                        )));
                    }
                }
            }
            ChartKind::Heatmap => {
                let mut numeric = Vec::new();
                for column in &request.y {
                    match self.classifier.classify(table, column) {
                        ColumnKind::Numeric => numeric.push(column.clone()),
                        _ => diagnostics.push(Diagnostic::warning(format!(
                            "column '{column}' is not numeric and was excluded from the correlation heatmap"
                        ))),
                    }
                }
                if numeric.len() < 2 {
                    diagnostics.push(Diagnostic::fatal(
                        "select at least two numeric columns for a correlation heatmap",
                    ));
                }
                accepted.x = None;
                accepted.y = numeric;
            }
        }
        if diagnostics.iter().any(Diagnostic::is_fatal) {
            return ValidationOutcome::Rejected(diagnostics);
        }
        self.warn_on_missing_values(table, &accepted, &mut diagnostics);
        ValidationOutcome::Accepted {
            request: accepted,
            warnings: diagnostics,
        }
    }

    fn check_plain_x(
        &self,
        table: &DataFrame,
        request: &ChartRequest,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        match request.x.as_deref() {
            None => diagnostics.push(Diagnostic::fatal("select a column for the x-axis")),
            Some(x) => match self.classifier.classify(table, x) {
                ColumnKind::Categorical | ColumnKind::Numeric => {}
                ColumnKind::Unsuitable if table.column(x).is_err() => diagnostics.push(
                    Diagnostic::fatal(format!("column '{x}' not found in the dataset")),
                ),
                _ => diagnostics.push(Diagnostic::fatal(format!(
                    "column '{x}' must be categorical or numeric for the x-axis"
                ))),
            },
        }
    }

    fn check_categorical_x(
        &self,
        table: &DataFrame,
        request: &ChartRequest,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        match request.x.as_deref() {
            None => diagnostics.push(Diagnostic::fatal("select a column for the x-axis")),
            Some(x) => match self.classifier.classify(table, x) {
                ColumnKind::Categorical => {}
                ColumnKind::Unsuitable if table.column(x).is_err() => diagnostics.push(
                    Diagnostic::fatal(format!("column '{x}' not found in the dataset")),
                ),
                _ => diagnostics.push(Diagnostic::fatal(format!(
                    "column '{x}' must be categorical for the x-axis"
                ))),
            },
        }
    }

    fn check_coercible_x(
        &self,
        table: &mut DataFrame,
        request: &ChartRequest,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let x = match request.x.as_deref() {
            None => {
                diagnostics.push(Diagnostic::fatal("select a column for the x-axis"));
                return;
            }
            Some(x) => x,
        };
        if table.column(x).is_err() {
            diagnostics.push(Diagnostic::fatal(format!(
                "column '{x}' not found in the dataset"
            )));
            return;
        }
        match self.classifier.classify(table, x) {
            ColumnKind::Numeric => {}
            ColumnKind::DatetimeConvertible => {
                if let Err(diagnostic) = self.coerce_to_datetime(table, x) {
                    diagnostics.push(diagnostic);
                }
            }
            _ => diagnostics.push(Diagnostic::fatal(format!(
                "column '{x}' contains invalid dates or cannot be converted to datetime"
            ))),
        }
    }

    fn coerce_to_datetime(&self, table: &mut DataFrame, column: &str) -> Result<(), Diagnostic> {
        let invalid = || {
            Diagnostic::fatal(format!(
                "column '{column}' contains invalid dates or cannot be converted to datetime"
            ))
        };
        let series = match table.column(column) {
            Ok(col) => match col.as_series() {
                Some(series) => series.clone(),
                None => return Err(invalid()),
            },
            Err(_) => return Err(invalid()),
        };
        if matches!(series.dtype(), DataType::Date | DataType::Datetime(_, _)) {
            return Ok(());
        }
        let str_ca = series.str().map_err(|_| invalid())?;
        let config = self.classifier.config();
        let mut millis: Vec<Option<i64>> = Vec::with_capacity(str_ca.len());
        for value in str_ca.into_iter() {
            match value {
                None => millis.push(None),
                Some(v) => match config.parse_datetime(v) {
                    Some(dt) => millis.push(Some(dt.and_utc().timestamp_millis())),
                    None => return Err(invalid()),
                },
            }
        }
        let coerced = Series::new(column.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .map_err(|_| invalid())?;
        table.replace(column, coerced).map_err(|_| invalid())?;
        debug!("coerced column '{column}' to datetime");
        Ok(())
    }

    fn check_numeric_ys(
        &self,
        table: &DataFrame,
        request: &ChartRequest,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if request.y.is_empty() {
            diagnostics.push(Diagnostic::fatal(
                "select at least one column for the y-axis",
            ));
            return;
        }
        for column in &request.y {
            match self.classifier.classify(table, column) {
                ColumnKind::Numeric => {}
                ColumnKind::Unsuitable if table.column(column).is_err() => diagnostics.push(
                    Diagnostic::fatal(format!("column '{column}' not found in the dataset")),
                ),
                _ => diagnostics.push(Diagnostic::fatal(format!(
                    "column '{column}' is not numeric and cannot be used for the y-axis"
                ))),
            }
        }
    }

    fn warn_on_missing_values(
        &self,
        table: &DataFrame,
        request: &ChartRequest,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let used = request.x.iter().chain(request.y.iter());
        for column in used {
            if let Ok(col) = table.column(column) {
                if col.null_count() > 0 {
                    debug!("column '{column}' carries {} nulls", col.null_count());
                    diagnostics.push(Diagnostic::warning(format!(
                        "column '{column}' has missing values"
                    )));
                }
            }
        }
    }
}
impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
