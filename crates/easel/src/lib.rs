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

pub mod batch;
pub mod chart_request;
pub mod data_profiler;
pub mod error;
pub mod export;
pub mod renderer;
pub mod validator;

pub use batch::{render_batch, BatchEntry};
pub use chart_request::{ChartKind, ChartRequest, ColorScale, SharedAxes, Theme};
pub use data_profiler::{ClassifyConfig, ColumnClassifier, ColumnKind, ColumnProfile};
pub use error::{DataError, EaselError, ExportError, RequestError, Result};
pub use export::{ExportCollector, PageSlot, FIGURES_PER_PAGE};
pub use renderer::render;
pub use validator::{Diagnostic, Severity, ValidationOutcome, Validator};

use plotly::Plot;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

pub struct ChartOutcome {
    pub kind: ChartKind,
    pub figure_collected: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// One table, one validator, one figure collector. Single requests and
/// batches run against the same table, so a datetime coercion made by
/// one request is visible to the next.
pub struct ChartWorkbench {
    table: DataFrame,
    validator: Validator,
    collector: ExportCollector,
}
impl ChartWorkbench {
    pub fn from_dataframe(table: DataFrame) -> Result<Self> {
        if table.width() == 0 {
            return Err(DataError::EmptyDataset.into());
        }
        Ok(Self {
            table,
            validator: Validator::new(),
            collector: ExportCollector::new(),
        })
    }
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_dataframe(data_profiler::load_csv(path)?)
    }
    pub fn from_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_dataframe(data_profiler::load_parquet(path)?)
    }
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_dataframe(data_profiler::load_json(path)?)
    }
    pub fn with_classify_config(mut self, config: ClassifyConfig) -> Self {
        self.validator = Validator::with_config(config);
        self
    }
    pub fn table(&self) -> &DataFrame {
        &self.table
    }
    pub fn profile(&self) -> Result<Vec<ColumnProfile>> {
        let classifier = ColumnClassifier::new();
        Ok(classifier.profile_dataframe(&self.table)?)
    }
    pub fn chart(&mut self, request: &ChartRequest) -> ChartOutcome {
        let entry = batch::run_one(&mut self.table, &self.validator, request);
        self.collect_entry(entry)
    }
    pub fn chart_batch(&mut self, shared: &SharedAxes, enabled: &[ChartKind]) -> Vec<ChartOutcome> {
        let entries = batch::render_batch(&mut self.table, &self.validator, shared, enabled);
        entries
            .into_iter()
            .map(|entry| self.collect_entry(entry))
            .collect()
    }
    fn collect_entry(&mut self, entry: BatchEntry) -> ChartOutcome {
        let collected = entry.figure.is_some();
        if let Some(figure) = entry.figure {
            self.collector.push(entry.kind, figure);
        }
        ChartOutcome {
            kind: entry.kind,
            figure_collected: collected,
            diagnostics: entry.diagnostics,
        }
    }
    pub fn collector(&self) -> &ExportCollector {
        &self.collector
    }
    pub fn clear_figures(&mut self) {
        self.collector.clear();
    }
    pub fn export_html<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        Ok(self.collector.export_html(dir)?)
    }
}

pub fn render_one(table: &mut DataFrame, request: &ChartRequest) -> (Option<Plot>, Vec<Diagnostic>) {
    let validator = Validator::new();
    let entry = batch::run_one(table, &validator, request);
    (entry.figure, entry.diagnostics)
}
