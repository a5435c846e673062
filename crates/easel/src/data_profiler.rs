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

use crate::error::{DataError, DataResult};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Categorical,
    Numeric,
    DatetimeConvertible,
    Unsuitable,
}
impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Numeric)
    }
    pub fn is_categorical(&self) -> bool {
        matches!(self, ColumnKind::Categorical)
    }
}

#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    pub max_sample_values: usize,
    pub temporal_formats: Vec<String>,
}
impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            max_sample_values: 10,
            temporal_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%SZ".to_string(),
                "%m/%d/%Y".to_string(),
                "%d/%m/%Y".to_string(),
                "%Y%m%d".to_string(),
            ],
        }
    }
}
impl ClassifyConfig {
    pub fn parse_datetime(&self, value: &str) -> Option<NaiveDateTime> {
        for format in &self.temporal_formats {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
                return Some(dt);
            }
            if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return date.and_hms_opt(0, 0, 0);
            }
        }
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub total_count: usize,
    pub null_count: usize,
    pub null_percentage: f64,
    pub cardinality: Option<usize>,
    pub sample_values: Vec<String>,
}
impl ColumnProfile {
    pub fn has_missing_values(&self) -> bool {
        self.null_count > 0
    }
}
impl std::fmt::Display for ColumnProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:?}, {} rows, {:.1}% null)",
            self.name,
            self.kind,
            self.total_count,
            self.null_percentage * 100.0
        )
    }
}

pub struct ColumnClassifier {
    config: ClassifyConfig,
}
impl ColumnClassifier {
    pub fn new() -> Self {
        Self {
            config: ClassifyConfig::default(),
        }
    }
    pub fn with_config(config: ClassifyConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &ClassifyConfig {
        &self.config
    }
    pub fn classify(&self, df: &DataFrame, column: &str) -> ColumnKind {
        match df.column(column) {
            Ok(col) => match col.as_series() {
                Some(series) => self.classify_series(series),
                None => ColumnKind::Unsuitable,
            },
            Err(_) => ColumnKind::Unsuitable,
        }
    }
    pub fn classify_series(&self, series: &Series) -> ColumnKind {
        match series.dtype() {
            dt if dt.is_primitive_numeric() => ColumnKind::Numeric,
            DataType::Date | DataType::Datetime(_, _) => ColumnKind::DatetimeConvertible,
            DataType::String => {
                if self.all_values_parse_as_datetime(series) {
                    ColumnKind::DatetimeConvertible
                } else {
                    ColumnKind::Categorical
                }
            }
            DataType::Boolean => ColumnKind::Categorical,
            dt if dt.is_categorical() => ColumnKind::Categorical,
            _ => ColumnKind::Unsuitable,
        }
    }
    fn all_values_parse_as_datetime(&self, series: &Series) -> bool {
        let str_ca = match series.str() {
            Ok(ca) => ca,
            Err(_) => return false,
        };
        let mut saw_value = false;
        for value in str_ca.into_iter().flatten() {
            saw_value = true;
            if self.config.parse_datetime(value).is_none() {
                return false;
            }
        }
        saw_value
    }
    pub fn profile_dataframe(&self, df: &DataFrame) -> DataResult<Vec<ColumnProfile>> {
        let total_rows = df.height();
        df.get_columns()
            .par_iter()
            .map(|column| match column.as_series() {
                Some(series) => self.profile_column(series, total_rows),
                None => Err(DataError::ColumnProfilingError {
                    column: column.name().to_string(),
                    source: PolarsError::ComputeError("column is not a series".into()),
                }),
            })
            .collect()
    }
    fn profile_column(&self, series: &Series, total_rows: usize) -> DataResult<ColumnProfile> {
        let name = series.name().to_string();
        let null_count = series.null_count();
        let null_percentage = if total_rows > 0 {
            null_count as f64 / total_rows as f64
        } else {
            0.0
        };
        let kind = self.classify_series(series);
        let cardinality = match kind {
            ColumnKind::Categorical | ColumnKind::DatetimeConvertible => Some(
                series
                    .n_unique()
                    .map_err(|source| DataError::ColumnProfilingError {
                        column: name.clone(),
                        source,
                    })?,
            ),
            _ => None,
        };
        let sample_values =
            self.sample_values(series)
                .map_err(|source| DataError::ColumnProfilingError {
                    column: name.clone(),
                    source,
                })?;
        Ok(ColumnProfile {
            name,
            kind,
            total_count: total_rows,
            null_count,
            null_percentage,
            cardinality,
            sample_values,
        })
    }
    fn sample_values(&self, series: &Series) -> Result<Vec<String>, PolarsError> {
        let unique = series.unique()?;
        let sample = unique.head(Some(self.config.max_sample_values));
        let str_series = sample.cast(&DataType::String)?;
        let str_chunked = str_series.str()?;
        Ok(str_chunked
            .into_iter()
            .filter_map(|opt_s| opt_s.map(String::from))
            .collect())
    }
}
impl Default for ColumnClassifier {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_csv<P: AsRef<Path>>(path: P) -> DataResult<DataFrame> {
    let display = path.as_ref().display().to_string();
    let file = File::open(&path)?;
    CsvReader::new(file)
        .finish()
        .map_err(|source| DataError::DataFileError {
            path: display,
            source,
        })
}
pub fn load_parquet<P: AsRef<Path>>(path: P) -> DataResult<DataFrame> {
    let display = path.as_ref().display().to_string();
    let file = File::open(&path)?;
    ParquetReader::new(file)
        .finish()
        .map_err(|source| DataError::DataFileError {
            path: display,
            source,
        })
}
pub fn load_json<P: AsRef<Path>>(path: P) -> DataResult<DataFrame> {
    let display = path.as_ref().display().to_string();
    let file = File::open(&path)?;
    JsonReader::new(file)
        .finish()
        .map_err(|source| DataError::DataFileError {
            path: display,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        df! {
            "region" => ["north", "south", "east", "west"],
            "revenue" => [120.5, 98.0, 143.2, 110.9],
            "units" => [12i64, 9, 14, 11],
            "day" => ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"],
        }
        .unwrap()
    }

    #[test]
    fn numeric_storage_classifies_as_numeric() {
        let df = sample_frame();
        let classifier = ColumnClassifier::new();
        assert_eq!(classifier.classify(&df, "revenue"), ColumnKind::Numeric);
        assert_eq!(classifier.classify(&df, "units"), ColumnKind::Numeric);
    }

    #[test]
    fn fully_parseable_strings_are_datetime_convertible() {
        let df = sample_frame();
        let classifier = ColumnClassifier::new();
        assert_eq!(
            classifier.classify(&df, "day"),
            ColumnKind::DatetimeConvertible
        );
    }

    #[test]
    fn plain_strings_are_categorical() {
        let df = sample_frame();
        let classifier = ColumnClassifier::new();
        assert_eq!(classifier.classify(&df, "region"), ColumnKind::Categorical);
    }

    #[test]
    fn one_unparseable_value_breaks_datetime_convertibility() {
        let df = df! {
            "day" => ["2024-01-01", "not a date", "2024-01-03"],
        }
        .unwrap();
        let classifier = ColumnClassifier::new();
        assert_eq!(classifier.classify(&df, "day"), ColumnKind::Categorical);
    }

    #[test]
    fn missing_column_is_unsuitable() {
        let df = sample_frame();
        let classifier = ColumnClassifier::new();
        assert_eq!(classifier.classify(&df, "absent"), ColumnKind::Unsuitable);
    }

    #[test]
    fn nulls_do_not_decide_datetime_convertibility() {
        let df = df! {
            "day" => [Some("2024-01-01"), None, Some("2024-01-03")],
        }
        .unwrap();
        let classifier = ColumnClassifier::new();
        assert_eq!(
            classifier.classify(&df, "day"),
            ColumnKind::DatetimeConvertible
        );
    }

    #[test]
    fn all_null_string_column_is_categorical() {
        let day: Vec<Option<&str>> = vec![None, None];
        let df = df! { "day" => day }.unwrap();
        let classifier = ColumnClassifier::new();
        assert_eq!(classifier.classify(&df, "day"), ColumnKind::Categorical);
    }

    #[test]
    fn profiles_carry_null_counts_and_cardinality() {
        let df = df! {
            "region" => [Some("north"), Some("south"), None, Some("north")],
            "revenue" => [Some(1.0), Some(2.0), Some(3.0), None],
        }
        .unwrap();
        let classifier = ColumnClassifier::new();
        let profiles = classifier.profile_dataframe(&df).unwrap();
        let region = profiles.iter().find(|p| p.name == "region").unwrap();
        assert_eq!(region.kind, ColumnKind::Categorical);
        assert_eq!(region.null_count, 1);
        assert_eq!(region.cardinality, Some(3));
        assert!(region.has_missing_values());
        let revenue = profiles.iter().find(|p| p.name == "revenue").unwrap();
        assert_eq!(revenue.kind, ColumnKind::Numeric);
        assert!((revenue.null_percentage - 0.25).abs() < 1e-9);
    }

    #[test]
    fn permissive_formats_cover_common_layouts() {
        let config = ClassifyConfig::default();
        for value in [
            "2024-02-29",
            "2024-02-29 13:45:00",
            "2024-02-29T13:45:00",
            "2024-02-29T13:45:00Z",
            "02/29/2024",
            "29/02/2024",
            "20240229",
        ] {
            assert!(config.parse_datetime(value).is_some(), "{value}");
        }
        assert!(config.parse_datetime("yesterday").is_none());
    }
}
