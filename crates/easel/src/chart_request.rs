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

use crate::error::RequestError;
use plotly::common::{ColorScale as PlotlyColorScale, ColorScaleElement, ColorScalePalette};
use plotly::Layout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ChartKind {
    Line,
    Bar,
    Scatter,
    Area,
    Histogram,
    BoxPlot,
    Violin,
    Bubble,
    Radar,
    Sunburst,
    Pie,
    Heatmap,
}
impl ChartKind {
    // Declaration order is the batch rendering order.
    pub const ALL: [ChartKind; 12] = [
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Scatter,
        ChartKind::Area,
        ChartKind::Histogram,
        ChartKind::BoxPlot,
        ChartKind::Violin,
        ChartKind::Bubble,
        ChartKind::Radar,
        ChartKind::Sunburst,
        ChartKind::Pie,
        ChartKind::Heatmap,
    ];
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Scatter => "scatter",
            ChartKind::Area => "area",
            ChartKind::Histogram => "histogram",
            ChartKind::BoxPlot => "boxplot",
            ChartKind::Violin => "violin",
            ChartKind::Bubble => "bubble",
            ChartKind::Radar => "radar",
            ChartKind::Sunburst => "sunburst",
            ChartKind::Pie => "pie",
            ChartKind::Heatmap => "heatmap",
        }
    }
    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Line => "Line Chart",
            ChartKind::Bar => "Bar Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Area => "Area Chart",
            ChartKind::Histogram => "Histogram",
            ChartKind::BoxPlot => "Box Plot",
            ChartKind::Violin => "Violin Plot",
            ChartKind::Bubble => "Bubble Chart",
            ChartKind::Radar => "Radar Chart",
            ChartKind::Sunburst => "Sunburst Chart",
            ChartKind::Pie => "Pie Chart",
            ChartKind::Heatmap => "Heatmap",
        }
    }
    pub fn requires_x(&self) -> bool {
        !matches!(self, ChartKind::Heatmap)
    }
    pub fn requires_y(&self) -> bool {
        !matches!(self, ChartKind::Histogram | ChartKind::Heatmap)
    }
}
impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for ChartKind {
    type Err = RequestError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" => Ok(ChartKind::Line),
            "bar" => Ok(ChartKind::Bar),
            "scatter" => Ok(ChartKind::Scatter),
            "area" => Ok(ChartKind::Area),
            "histogram" => Ok(ChartKind::Histogram),
            "boxplot" | "box" => Ok(ChartKind::BoxPlot),
            "violin" => Ok(ChartKind::Violin),
            "bubble" => Ok(ChartKind::Bubble),
            "radar" => Ok(ChartKind::Radar),
            "sunburst" => Ok(ChartKind::Sunburst),
            "pie" => Ok(ChartKind::Pie),
            "heatmap" => Ok(ChartKind::Heatmap),
            _ => Err(RequestError::UnknownChartKind {
                name: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Plotly,
    Ggplot2,
    Seaborn,
    SimpleWhite,
    None,
}
impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Plotly => "plotly",
            Theme::Ggplot2 => "ggplot2",
            Theme::Seaborn => "seaborn",
            Theme::SimpleWhite => "simple_white",
            Theme::None => "none",
        }
    }
    pub fn base_layout(&self) -> Layout {
        let layout = Layout::new();
        match self {
            Theme::Plotly => layout
                .plot_background_color("#e5ecf6")
                .paper_background_color("#ffffff"),
            Theme::Ggplot2 => layout
                .plot_background_color("#e5e5e5")
                .paper_background_color("#ffffff"),
            Theme::Seaborn => layout
                .plot_background_color("#eaeaf2")
                .paper_background_color("#ffffff"),
            Theme::SimpleWhite => layout
                .plot_background_color("#ffffff")
                .paper_background_color("#ffffff"),
            Theme::None => layout,
        }
    }
}
impl Default for Theme {
    fn default() -> Self {
        Theme::Plotly
    }
}
impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for Theme {
    type Err = RequestError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plotly" => Ok(Theme::Plotly),
            "ggplot2" => Ok(Theme::Ggplot2),
            "seaborn" => Ok(Theme::Seaborn),
            "simple_white" => Ok(Theme::SimpleWhite),
            "none" => Ok(Theme::None),
            _ => Err(RequestError::UnknownTheme {
                name: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorScale {
    Viridis,
    Cividis,
    Plasma,
    Inferno,
    Blues,
    RdBu,
    YlGnBu,
    YlOrRd,
    Jet,
}
impl ColorScale {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorScale::Viridis => "Viridis",
            ColorScale::Cividis => "Cividis",
            ColorScale::Plasma => "Plasma",
            ColorScale::Inferno => "Inferno",
            ColorScale::Blues => "Blues",
            ColorScale::RdBu => "RdBu",
            ColorScale::YlGnBu => "YlGnBu",
            ColorScale::YlOrRd => "YlOrRd",
            ColorScale::Jet => "Jet",
        }
    }
    pub fn stops(&self) -> &'static [&'static str] {
        match self {
            ColorScale::Viridis => &[
                "#440154", "#482878", "#3e4989", "#31688e", "#26828e", "#1f9e89", "#35b779",
                "#6ece58", "#b5de2b", "#fde725",
            ],
            ColorScale::Cividis => &[
                "#00224e", "#123570", "#3b496c", "#575d6d", "#707173", "#8a8678", "#a59c74",
                "#c3b369", "#e1cc55", "#fee838",
            ],
            ColorScale::Plasma => &[
                "#0d0887", "#46039f", "#7201a8", "#9c179e", "#bd3786", "#d8576b", "#ed7953",
                "#fb9f3a", "#fdca26", "#f0f921",
            ],
            ColorScale::Inferno => &[
                "#000004", "#1b0c41", "#4a0c6b", "#781c6d", "#a52c60", "#cf4446", "#ed6925",
                "#fb9b06", "#f7d03c", "#fcffa4",
            ],
            ColorScale::Blues => &[
                "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5",
                "#08519c", "#08306b",
            ],
            ColorScale::RdBu => &[
                "#67001f", "#b2182b", "#d6604d", "#f4a582", "#fddbc7", "#f7f7f7", "#d1e5f0",
                "#92c5de", "#4393c3", "#2166ac", "#053061",
            ],
            ColorScale::YlGnBu => &[
                "#ffffd9", "#edf8b1", "#c7e9b4", "#7fcdbb", "#41b6c4", "#1d91c0", "#225ea8",
                "#253494", "#081d58",
            ],
            ColorScale::YlOrRd => &[
                "#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c",
                "#bd0026", "#800026",
            ],
            ColorScale::Jet => &[
                "#00007f", "#0000ff", "#00ffff", "#ffff00", "#ff0000", "#7f0000",
            ],
        }
    }
    pub fn series_color(&self, index: usize) -> &'static str {
        let stops = self.stops();
        stops[index % stops.len()]
    }
    pub fn continuous(&self) -> PlotlyColorScale {
        match self {
            ColorScale::Viridis => PlotlyColorScale::Palette(ColorScalePalette::Viridis),
            ColorScale::Cividis => PlotlyColorScale::Palette(ColorScalePalette::Cividis),
            ColorScale::Blues => PlotlyColorScale::Palette(ColorScalePalette::Blues),
            ColorScale::RdBu => PlotlyColorScale::Palette(ColorScalePalette::RdBu),
            ColorScale::YlGnBu => PlotlyColorScale::Palette(ColorScalePalette::YlGnBu),
            ColorScale::YlOrRd => PlotlyColorScale::Palette(ColorScalePalette::YlOrRd),
            ColorScale::Jet => PlotlyColorScale::Palette(ColorScalePalette::Jet),
            // Plasma and Inferno have no builtin palette; expand the stop list.
            ColorScale::Plasma | ColorScale::Inferno => {
                let stops = self.stops();
                let last = (stops.len() - 1) as f64;
                PlotlyColorScale::Vector(
                    stops
                        .iter()
                        .enumerate()
                        .map(|(i, s)| ColorScaleElement(i as f64 / last, s.to_string()))
                        .collect(),
                )
            }
        }
    }
}
impl Default for ColorScale {
    fn default() -> Self {
        ColorScale::Viridis
    }
}
impl fmt::Display for ColorScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for ColorScale {
    type Err = RequestError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "viridis" => Ok(ColorScale::Viridis),
            "cividis" => Ok(ColorScale::Cividis),
            "plasma" => Ok(ColorScale::Plasma),
            "inferno" => Ok(ColorScale::Inferno),
            "blues" => Ok(ColorScale::Blues),
            "rdbu" => Ok(ColorScale::RdBu),
            "ylgnbu" => Ok(ColorScale::YlGnBu),
            "ylorrd" => Ok(ColorScale::YlOrRd),
            "jet" => Ok(ColorScale::Jet),
            _ => Err(RequestError::UnknownColorScale {
                name: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Vec<String>,
    pub theme: Option<Theme>,
    pub color_scale: Option<ColorScale>,
    pub is_batch: bool,
}
impl ChartRequest {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            x: None,
            y: Vec::new(),
            theme: None,
            color_scale: None,
            is_batch: false,
        }
    }
    pub fn with_x(mut self, x: impl Into<String>) -> Self {
        self.x = Some(x.into());
        self
    }
    pub fn with_y<I, S>(mut self, y: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.y = y.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }
    pub fn with_color_scale(mut self, color_scale: ColorScale) -> Self {
        self.color_scale = Some(color_scale);
        self
    }
    pub fn from_shared(kind: ChartKind, shared: &SharedAxes) -> Self {
        Self {
            kind,
            x: shared.x.clone(),
            y: shared.y.clone(),
            theme: shared.theme,
            color_scale: shared.color_scale,
            is_batch: true,
        }
    }
    pub fn theme(&self) -> Theme {
        self.theme.unwrap_or_default()
    }
    pub fn color_scale(&self) -> ColorScale {
        self.color_scale.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedAxes {
    pub x: Option<String>,
    pub y: Vec<String>,
    pub theme: Option<Theme>,
    pub color_scale: Option<ColorScale>,
}
impl SharedAxes {
    pub fn new(x: Option<String>, y: Vec<String>) -> Self {
        Self {
            x,
            y,
            theme: None,
            color_scale: None,
        }
    }
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }
    pub fn with_color_scale(mut self, color_scale: ColorScale) -> Self {
        self.color_scale = Some(color_scale);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn kind_order_is_stable() {
        assert_eq!(ChartKind::ALL.first(), Some(&ChartKind::Line));
        assert_eq!(ChartKind::ALL.last(), Some(&ChartKind::Heatmap));
        assert_eq!(ChartKind::ALL.len(), 12);
    }
    #[test]
    fn kinds_parse_back_from_names() {
        for kind in ChartKind::ALL {
            assert_eq!(kind.as_str().parse::<ChartKind>().unwrap(), kind);
        }
        assert!("spider".parse::<ChartKind>().is_err());
    }
    #[test]
    fn every_scale_has_stops() {
        for scale in [
            ColorScale::Viridis,
            ColorScale::Cividis,
            ColorScale::Plasma,
            ColorScale::Inferno,
            ColorScale::Blues,
            ColorScale::RdBu,
            ColorScale::YlGnBu,
            ColorScale::YlOrRd,
            ColorScale::Jet,
        ] {
            assert!(scale.stops().len() >= 2);
            assert_eq!(scale.series_color(0), scale.stops()[0]);
        }
    }
    #[test]
    fn theme_names_round_trip() {
        for theme in [
            Theme::Plotly,
            Theme::Ggplot2,
            Theme::Seaborn,
            Theme::SimpleWhite,
            Theme::None,
        ] {
            assert_eq!(theme.as_str().parse::<Theme>().unwrap(), theme);
        }
    }
}
