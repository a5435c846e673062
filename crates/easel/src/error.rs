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

use thiserror::Error;
#[derive(Error, Debug)]
pub enum EaselError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Request error: {0}")]
    Request(#[from] RequestError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}
#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read data file '{path}': {source}")]
    DataFileError {
        path: String,
        #[source]
        source: polars::error::PolarsError,
    },
    #[error("Empty dataset provided")]
    EmptyDataset,
    #[error("Failed to profile column '{column}': {source}")]
    ColumnProfilingError {
        column: String,
        #[source]
        source: polars::error::PolarsError,
    },
}
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Unknown chart kind: '{name}'")]
    UnknownChartKind { name: String },
    #[error("Unknown chart theme: '{name}'")]
    UnknownTheme { name: String },
    #[error("Unknown colour scale: '{name}'")]
    UnknownColorScale { name: String },
}
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No figures to export")]
    NoFigures,
    #[error("Failed to write figure to '{path}': {source}")]
    FigureWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
pub type Result<T> = std::result::Result<T, EaselError>;
pub type DataResult<T> = std::result::Result<T, DataError>;
impl EaselError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EaselError::Request(_) | EaselError::Export(ExportError::NoFigures)
        )
    }
    pub fn category(&self) -> &'static str {
        match self {
            EaselError::Data(_) => "Data",
            EaselError::Request(_) => "Request",
            EaselError::Export(_) => "Export",
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            EaselError::Data(DataError::EmptyDataset) => {
                "The dataset appears to be empty. Please provide data with at least one row."
                    .to_string()
            }
            EaselError::Export(ExportError::NoFigures) => {
                "No charts to export. Generate at least one chart first.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_name_the_failing_stage() {
        assert_eq!(EaselError::from(DataError::EmptyDataset).category(), "Data");
        assert_eq!(
            EaselError::from(RequestError::UnknownTheme {
                name: "dark".to_string()
            })
            .category(),
            "Request"
        );
        assert_eq!(
            EaselError::from(ExportError::NoFigures).category(),
            "Export"
        );
    }

    #[test]
    fn only_request_and_empty_export_errors_are_recoverable() {
        assert!(EaselError::from(ExportError::NoFigures).is_recoverable());
        assert!(EaselError::from(RequestError::UnknownChartKind {
            name: "spider".to_string()
        })
        .is_recoverable());
        assert!(!EaselError::from(DataError::EmptyDataset).is_recoverable());
    }
}
