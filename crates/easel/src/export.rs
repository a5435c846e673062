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

use crate::chart_request::ChartKind;
use crate::error::ExportError;
use log::info;
use plotly::Plot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const FIGURES_PER_PAGE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSlot {
    pub figure_index: usize,
    pub page: usize,
    pub slot: usize,
}

pub struct CollectedFigure {
    pub kind: ChartKind,
    pub figure: Plot,
}

/// Accumulates successful figures across a session and lays them out
/// two to a page: figure i lands on page i/2, slot i%2.
#[derive(Default)]
pub struct ExportCollector {
    figures: Vec<CollectedFigure>,
}
impl ExportCollector {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, kind: ChartKind, figure: Plot) {
        self.figures.push(CollectedFigure { kind, figure });
    }
    pub fn len(&self) -> usize {
        self.figures.len()
    }
    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }
    pub fn clear(&mut self) {
        self.figures.clear();
    }
    pub fn figures(&self) -> &[CollectedFigure] {
        &self.figures
    }
    pub fn pages(&self) -> Vec<PageSlot> {
        (0..self.figures.len())
            .map(|i| PageSlot {
                figure_index: i,
                page: i / FIGURES_PER_PAGE,
                slot: i % FIGURES_PER_PAGE,
            })
            .collect()
    }
    pub fn page_count(&self) -> usize {
        self.figures.len().div_ceil(FIGURES_PER_PAGE)
    }
    pub fn export_html<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>, ExportError> {
        if self.figures.is_empty() {
            return Err(ExportError::NoFigures);
        }
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| ExportError::FigureWriteError {
            path: dir.display().to_string(),
            source,
        })?;
        let mut written = Vec::with_capacity(self.figures.len());
        for slot in self.pages() {
            let collected = &self.figures[slot.figure_index];
            let path = dir.join(format!(
                "page{}_slot{}_{}.html",
                slot.page, slot.slot, collected.kind
            ));
            collected.figure.write_html(&path);
            written.push(path);
        }
        info!(
            "exported {} figures across {} pages",
            self.figures.len(),
            self.page_count()
        );
        Ok(written)
    }
}
