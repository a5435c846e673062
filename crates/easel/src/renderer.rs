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
use crate::validator::Diagnostic;
use itertools::Itertools;
use log::warn;
use plotly::common::{Fill, Line, Marker, Mode, Title};
use plotly::{Bar, BoxPlot, Histogram, HeatMap, Plot, Scatter, ScatterPolar, Trace};
use polars::prelude::{DataFrame, DataType};
use serde::Serialize;
use std::collections::HashMap;

/// Label shown for null entries in a text axis.
const MISSING_LABEL: &str = "(missing)";

/// Builds a figure for an already-validated request. Construction
/// failures never escape as errors; they come back as a message and
/// no figure.
pub fn render(table: &DataFrame, request: &ChartRequest) -> (Option<Plot>, Option<Diagnostic>) {
    let built = match request.kind {
        ChartKind::Line => render_line(table, request),
        ChartKind::Bar => render_bar(table, request),
        ChartKind::Scatter => render_scatter(table, request),
        ChartKind::Area => render_area(table, request),
        ChartKind::Histogram => render_histogram(table, request),
        ChartKind::BoxPlot => render_box_plot(table, request),
        ChartKind::Violin => render_violin(table, request),
        ChartKind::Bubble => render_bubble(table, request),
        ChartKind::Radar => render_radar(table, request),
        ChartKind::Sunburst => render_sunburst(table, request),
        ChartKind::Pie => render_pie(table, request),
        ChartKind::Heatmap => render_heatmap(table, request),
    };
    match built {
        Ok(plot) => (Some(plot), None),
        Err(message) => {
            warn!("{} rendering failed: {message}", request.kind);
            (
                None,
                Some(Diagnostic::fatal(format!(
                    "failed to render {}: {message}",
                    request.kind.label().to_lowercase()
                ))),
            )
        }
    }
}

fn axis_title(request: &ChartRequest) -> String {
    match request.kind {
        ChartKind::Histogram => format!(
            "Histogram of {}",
            request.x.as_deref().unwrap_or_default()
        ),
        ChartKind::Heatmap => "Heatmap of Correlations".to_string(),
        ChartKind::Radar => "Radar Chart".to_string(),
        ChartKind::Sunburst => "Sunburst Chart".to_string(),
        _ => format!(
            "{}: {} vs {}",
            request.kind.label(),
            request.x.as_deref().unwrap_or_default(),
            request.y.iter().join(", ")
        ),
    }
}

fn themed_plot(request: &ChartRequest) -> Plot {
    let mut plot = Plot::new();
    let layout = request
        .theme()
        .base_layout()
        .title(Title::with_text(axis_title(request)));
    plot.set_layout(layout);
    plot
}

fn required_x(request: &ChartRequest) -> Result<&str, String> {
    request
        .x
        .as_deref()
        .ok_or_else(|| "no x-axis column".to_string())
}

fn string_values(table: &DataFrame, column: &str) -> Result<Vec<String>, String> {
    let col = table
        .column(column)
        .map_err(|_| format!("column '{column}' not found"))?;
    let casted = col
        .cast(&DataType::String)
        .map_err(|_| format!("column '{column}' cannot be rendered as text"))?;
    let series = casted
        .as_series()
        .ok_or_else(|| format!("column '{column}' cannot be rendered as text"))?
        .clone();
    let str_ca = series
        .str()
        .map_err(|_| format!("column '{column}' cannot be rendered as text"))?;
    Ok(str_ca
        .into_iter()
        .map(|opt| match opt {
            Some(value) => value.to_string(),
            None => MISSING_LABEL.to_string(),
        })
        .collect())
}

fn numeric_values(table: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, String> {
    let col = table
        .column(column)
        .map_err(|_| format!("column '{column}' not found"))?;
    let casted = col
        .cast(&DataType::Float64)
        .map_err(|_| format!("column '{column}' is not numeric"))?;
    let series = casted
        .as_series()
        .ok_or_else(|| format!("column '{column}' is not numeric"))?
        .clone();
    let f64_ca = series
        .f64()
        .map_err(|_| format!("column '{column}' is not numeric"))?;
    Ok(f64_ca.into_iter().collect())
}

fn render_line(table: &DataFrame, request: &ChartRequest) -> Result<Plot, String> {
    let x = string_values(table, required_x(request)?)?;
    let scale = request.color_scale();
    let mut plot = themed_plot(request);
    for (i, column) in request.y.iter().enumerate() {
        let y = numeric_values(table, column)?;
        plot.add_trace(
            Scatter::new(x.clone(), y)
                .mode(Mode::Lines)
                .name(column)
                .line(Line::new().color(scale.series_color(i))),
        );
    }
    Ok(plot)
}

fn render_bar(table: &DataFrame, request: &ChartRequest) -> Result<Plot, String> {
    let x = string_values(table, required_x(request)?)?;
    let scale = request.color_scale();
    let mut plot = themed_plot(request);
    for (i, column) in request.y.iter().enumerate() {
        let y = numeric_values(table, column)?;
        plot.add_trace(
            Bar::new(x.clone(), y)
                .name(column)
                .marker(Marker::new().color(scale.series_color(i))),
        );
    }
    Ok(plot)
}

fn render_scatter(table: &DataFrame, request: &ChartRequest) -> Result<Plot, String> {
    let x = string_values(table, required_x(request)?)?;
    let scale = request.color_scale();
    let mut plot = themed_plot(request);
    for (i, column) in request.y.iter().enumerate() {
        let y = numeric_values(table, column)?;
        plot.add_trace(
            Scatter::new(x.clone(), y)
                .mode(Mode::Markers)
                .name(column)
                .marker(Marker::new().color(scale.series_color(i))),
        );
    }
    Ok(plot)
}

fn render_area(table: &DataFrame, request: &ChartRequest) -> Result<Plot, String> {
    let x = string_values(table, required_x(request)?)?;
    let scale = request.color_scale();
    let mut plot = themed_plot(request);
    for (i, column) in request.y.iter().enumerate() {
        let y = numeric_values(table, column)?;
        plot.add_trace(
            Scatter::new(x.clone(), y)
                .mode(Mode::Lines)
                .fill(Fill::ToZeroY)
                .name(column)
                .line(Line::new().color(scale.series_color(i))),
        );
    }
    Ok(plot)
}

fn render_histogram(table: &DataFrame, request: &ChartRequest) -> Result<Plot, String> {
    let x_name = required_x(request)?;
    let values: Vec<f64> = numeric_values(table, x_name)?.into_iter().flatten().collect();
    if values.is_empty() {
        return Err(format!("column '{x_name}' has no values to bin"));
    }
    let scale = request.color_scale();
    let mut plot = themed_plot(request);
    plot.add_trace(
        Histogram::new(values)
            .name(x_name)
            .marker(Marker::new().color(scale.series_color(0))),
    );
    Ok(plot)
}

fn render_box_plot(table: &DataFrame, request: &ChartRequest) -> Result<Plot, String> {
    let x = string_values(table, required_x(request)?)?;
    let scale = request.color_scale();
    let mut plot = themed_plot(request);
    for (i, column) in request.y.iter().enumerate() {
        let y = numeric_values(table, column)?;
        plot.add_trace(
            BoxPlot::new_xy(x.clone(), y)
                .name(column)
                .marker(Marker::new().color(scale.series_color(i))),
        );
    }
    Ok(plot)
}

fn render_violin(table: &DataFrame, request: &ChartRequest) -> Result<Plot, String> {
    let x = string_values(table, required_x(request)?)?;
    let scale = request.color_scale();
    let mut plot = themed_plot(request);
    for (i, column) in request.y.iter().enumerate() {
        let y = numeric_values(table, column)?;
        plot.add_trace(ViolinTrace::new(
            x.clone(),
            y,
            column.clone(),
            scale.series_color(i),
        ));
    }
    Ok(plot)
}

fn render_bubble(table: &DataFrame, request: &ChartRequest) -> Result<Plot, String> {
    let x = string_values(table, required_x(request)?)?;
    let value_column = request
        .y
        .first()
        .ok_or_else(|| "no value column".to_string())?;
    let size_column = request
        .y
        .get(1)
        .ok_or_else(|| "no size column".to_string())?;
    let values = numeric_values(table, value_column)?;
    let sizes = numeric_values(table, size_column)?;
    let max_size = sizes
        .iter()
        .flatten()
        .fold(f64::NEG_INFINITY, |acc, v| acc.max(*v));
    if !max_size.is_finite() || max_size <= 0.0 {
        return Err(format!(
            "column '{size_column}' has no positive values to size markers"
        ));
    }
    let marker_sizes: Vec<usize> = sizes
        .iter()
        .map(|v| match v {
            Some(v) if *v > 0.0 => ((v / max_size) * 40.0).round() as usize + 5,
            _ => 0,
        })
        .collect();
    let scale = request.color_scale();
    let mut plot = themed_plot(request);
    plot.add_trace(
        Scatter::new(x, values)
            .mode(Mode::Markers)
            .name(value_column)
            .marker(
                Marker::new()
                    .color(scale.series_color(0))
                    .size_array(marker_sizes),
            ),
    );
    Ok(plot)
}

fn render_radar(table: &DataFrame, request: &ChartRequest) -> Result<Plot, String> {
    let theta = string_values(table, required_x(request)?)?;
    let scale = request.color_scale();
    let mut plot = themed_plot(request);
    for (i, column) in request.y.iter().enumerate() {
        let r = numeric_values(table, column)?;
        plot.add_trace(
            ScatterPolar::new(theta.clone(), r)
                .mode(Mode::Lines)
                .name(column)
                .line(Line::new().color(scale.series_color(i))),
        );
    }
    Ok(plot)
}

fn render_sunburst(table: &DataFrame, request: &ChartRequest) -> Result<Plot, String> {
    let mut path = vec![required_x(request)?.to_string()];
    path.extend(request.y.iter().cloned());
    let mut levels = Vec::with_capacity(path.len());
    for column in &path {
        let col = table
            .column(column)
            .map_err(|_| format!("column '{column}' not found"))?;
        let series = col
            .as_series()
            .ok_or_else(|| format!("column '{column}' cannot be read"))?
            .clone();
        let str_series = series
            .cast(&DataType::String)
            .map_err(|_| format!("column '{column}' cannot be rendered as text"))?;
        let values: Vec<Option<String>> = str_series
            .str()
            .map_err(|_| format!("column '{column}' cannot be rendered as text"))?
            .into_iter()
            .map(|opt| opt.map(String::from))
            .collect();
        levels.push(values);
    }
    let hierarchy = build_hierarchy(&levels, table.height());
    if hierarchy.ids.is_empty() {
        return Err("no complete rows to build the hierarchy from".to_string());
    }
    let mut plot = themed_plot(request);
    plot.add_trace(Box::new(hierarchy));
    Ok(plot)
}

fn build_hierarchy(levels: &[Vec<Option<String>>], rows: usize) -> SunburstTrace {
    let mut order: Vec<String> = Vec::new();
    let mut nodes: HashMap<String, (String, String, f64)> = HashMap::new();
    for row in 0..rows {
        let segments: Option<Vec<&String>> =
            levels.iter().map(|level| level[row].as_ref()).collect();
        // Rows with a null anywhere on the path are skipped.
        let segments = match segments {
            Some(segments) => segments,
            None => continue,
        };
        let mut parent_id = String::new();
        for segment in segments {
            let id = if parent_id.is_empty() {
                segment.clone()
            } else {
                format!("{parent_id}/{segment}")
            };
            let entry = nodes
                .entry(id.clone())
                .or_insert_with(|| (segment.clone(), parent_id.clone(), 0.0));
            entry.2 += 1.0;
            if !order.contains(&id) {
                order.push(id.clone());
            }
            parent_id = id;
        }
    }
    let mut trace = SunburstTrace::default();
    for id in order {
        if let Some((label, parent, value)) = nodes.get(&id) {
            trace.ids.push(id.clone());
            trace.labels.push(label.clone());
            trace.parents.push(parent.clone());
            trace.values.push(*value);
        }
    }
    trace
}

fn render_pie(table: &DataFrame, request: &ChartRequest) -> Result<Plot, String> {
    let x_name = required_x(request)?;
    let value_column = request
        .y
        .first()
        .ok_or_else(|| "no value column".to_string())?;
    let labels = string_values(table, x_name)?;
    let values = numeric_values(table, value_column)?;
    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, f64> = HashMap::new();
    for (label, value) in labels.into_iter().zip(values) {
        if let Some(value) = value {
            if !sums.contains_key(&label) {
                order.push(label.clone());
            }
            *sums.entry(label).or_insert(0.0) += value;
        }
    }
    if order.is_empty() {
        return Err(format!("column '{value_column}' has no values to aggregate"));
    }
    let values: Vec<f64> = order.iter().map(|label| sums[label]).collect();
    let scale = request.color_scale();
    let colors = (0..order.len())
        .map(|i| scale.series_color(i).to_string())
        .collect();
    let mut plot = themed_plot(request);
    plot.add_trace(PieTrace::new(order, values, colors));
    Ok(plot)
}

fn render_heatmap(table: &DataFrame, request: &ChartRequest) -> Result<Plot, String> {
    let columns = &request.y;
    if columns.len() < 2 {
        return Err("fewer than two numeric columns".to_string());
    }
    let mut series = Vec::with_capacity(columns.len());
    for column in columns {
        series.push(numeric_values(table, column)?);
    }
    let z: Vec<Vec<f64>> = series
        .iter()
        .map(|row| series.iter().map(|col| pearson(row, col)).collect())
        .collect();
    let names: Vec<String> = columns.clone();
    let mut plot = themed_plot(request);
    plot.add_trace(
        HeatMap::new(names.clone(), names, z).color_scale(request.color_scale().continuous()),
    );
    Ok(plot)
}

/// Pearson correlation over the rows where both columns hold a value.
fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| x.zip(*y))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    let denom = (var_x * var_y).sqrt();
    if denom < 1e-12 {
        return f64::NAN;
    }
    cov / denom
}

#[derive(Serialize, Clone, Debug)]
struct ViolinTrace {
    #[serde(rename = "type")]
    kind: &'static str,
    x: Vec<String>,
    y: Vec<Option<f64>>,
    name: String,
    line: TraceColor,
}
impl ViolinTrace {
    fn new(x: Vec<String>, y: Vec<Option<f64>>, name: String, color: &str) -> Box<Self> {
        Box::new(Self {
            kind: "violin",
            x,
            y,
            name,
            line: TraceColor {
                color: color.to_string(),
            },
        })
    }
}
impl Trace for ViolinTrace {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Serialize, Clone, Debug, Default)]
struct SunburstTrace {
    #[serde(rename = "type")]
    kind: SunburstKind,
    ids: Vec<String>,
    labels: Vec<String>,
    parents: Vec<String>,
    values: Vec<f64>,
    branchvalues: BranchValues,
}
impl Trace for SunburstTrace {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Serialize, Clone, Debug)]
struct PieTrace {
    #[serde(rename = "type")]
    kind: &'static str,
    labels: Vec<String>,
    values: Vec<f64>,
    marker: SliceColors,
}
impl PieTrace {
    fn new(labels: Vec<String>, values: Vec<f64>, colors: Vec<String>) -> Box<Self> {
        Box::new(Self {
            kind: "pie",
            labels,
            values,
            marker: SliceColors { colors },
        })
    }
}
impl Trace for PieTrace {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Serialize, Clone, Debug)]
struct TraceColor {
    color: String,
}

#[derive(Serialize, Clone, Debug)]
struct SliceColors {
    colors: Vec<String>,
}

#[derive(Clone, Debug, Default)]
struct SunburstKind;
impl Serialize for SunburstKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("sunburst")
    }
}

#[derive(Clone, Debug, Default)]
struct BranchValues;
impl Serialize for BranchValues {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("total")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_request::ColorScale;
    use polars::prelude::df;

    fn sales_frame() -> DataFrame {
        df! {
            "month" => ["jan", "feb", "mar", "apr"],
            "revenue" => [10.0, 20.0, 15.0, 30.0],
            "units" => [1.0, 2.0, 1.5, 3.0],
        }
        .unwrap()
    }

    #[test]
    fn bar_title_embeds_axis_names() {
        let request = ChartRequest::new(ChartKind::Bar)
            .with_x("month")
            .with_y(["revenue", "units"]);
        assert_eq!(axis_title(&request), "Bar Chart: month vs revenue, units");
    }

    #[test]
    fn histogram_title_names_the_column() {
        let request = ChartRequest::new(ChartKind::Histogram).with_x("revenue");
        assert_eq!(axis_title(&request), "Histogram of revenue");
    }

    #[test]
    fn every_kind_renders_or_reports() {
        let df = sales_frame();
        for kind in ChartKind::ALL {
            let request = ChartRequest::new(kind)
                .with_x("month")
                .with_y(["revenue", "units"]);
            let (figure, diagnostic) = render(&df, &request);
            assert!(
                figure.is_some() || diagnostic.is_some(),
                "{kind} produced neither a figure nor a message"
            );
        }
    }

    #[test]
    fn bar_produces_one_trace_per_y_column() {
        let df = sales_frame();
        let request = ChartRequest::new(ChartKind::Bar)
            .with_x("month")
            .with_y(["revenue", "units"]);
        let (figure, diagnostic) = render(&df, &request);
        assert!(diagnostic.is_none());
        let json = figure.unwrap().to_json();
        assert_eq!(json.matches("\"bar\"").count(), 2);
        assert!(json.contains("revenue"));
        assert!(json.contains("units"));
    }

    #[test]
    fn missing_column_becomes_message_not_panic() {
        let df = sales_frame();
        let request = ChartRequest::new(ChartKind::Line)
            .with_x("month")
            .with_y(["absent"]);
        let (figure, diagnostic) = render(&df, &request);
        assert!(figure.is_none());
        assert!(diagnostic.unwrap().message.contains("'absent'"));
    }

    #[test]
    fn null_category_entries_get_a_visible_label() {
        let df = df! {
            "month" => [Some("jan"), None, Some("mar")],
            "revenue" => [10.0, 20.0, 15.0],
        }
        .unwrap();
        let values = string_values(&df, "month").unwrap();
        assert_eq!(values, vec!["jan", MISSING_LABEL, "mar"]);
        let request = ChartRequest::new(ChartKind::Bar)
            .with_x("month")
            .with_y(["revenue"]);
        let (figure, diagnostic) = render(&df, &request);
        assert!(diagnostic.is_none());
        assert!(figure.unwrap().to_json().contains(MISSING_LABEL));
    }

    #[test]
    fn pie_slices_take_colours_from_the_requested_scale() {
        let df = sales_frame();
        let request = ChartRequest::new(ChartKind::Pie)
            .with_x("month")
            .with_y(["revenue"])
            .with_color_scale(ColorScale::Viridis);
        let (figure, diagnostic) = render(&df, &request);
        assert!(diagnostic.is_none());
        let json = figure.unwrap().to_json();
        assert!(json.contains("\"colors\""));
        for stop in &ColorScale::Viridis.stops()[..4] {
            assert!(json.contains(stop), "missing slice colour {stop}");
        }
    }

    #[test]
    fn perfectly_correlated_columns_score_one() {
        let a = vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let b = vec![Some(2.0), Some(4.0), Some(6.0), Some(8.0)];
        assert!((pearson(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn anticorrelated_columns_score_minus_one() {
        let a = vec![Some(1.0), Some(2.0), Some(3.0)];
        let b = vec![Some(3.0), Some(2.0), Some(1.0)];
        assert!((pearson(&a, &b) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn pearson_skips_rows_with_a_null_on_either_side() {
        let a = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let b = vec![Some(1.0), Some(100.0), Some(3.0), None];
        assert!((pearson(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_column_has_undefined_correlation() {
        let a = vec![Some(5.0), Some(5.0), Some(5.0)];
        let b = vec![Some(1.0), Some(2.0), Some(3.0)];
        assert!(pearson(&a, &b).is_nan());
    }

    #[test]
    fn hierarchy_counts_rows_per_node_and_skips_null_paths() {
        let levels = vec![
            vec![
                Some("fruit".to_string()),
                Some("fruit".to_string()),
                Some("veg".to_string()),
                None,
            ],
            vec![
                Some("apple".to_string()),
                Some("pear".to_string()),
                Some("leek".to_string()),
                Some("orphan".to_string()),
            ],
        ];
        let trace = build_hierarchy(&levels, 4);
        assert_eq!(trace.ids.len(), 5);
        let fruit = trace.ids.iter().position(|id| id == "fruit").unwrap();
        assert_eq!(trace.values[fruit], 2.0);
        assert_eq!(trace.parents[fruit], "");
        let apple = trace.ids.iter().position(|id| id == "fruit/apple").unwrap();
        assert_eq!(trace.labels[apple], "apple");
        assert_eq!(trace.parents[apple], "fruit");
        assert!(!trace.ids.iter().any(|id| id.contains("orphan")));
    }
}
