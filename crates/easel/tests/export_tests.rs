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

use easel::{ChartKind, ChartRequest, ChartWorkbench, ExportCollector, FIGURES_PER_PAGE};
use plotly::Plot;
use polars::prelude::*;
use proptest::prelude::*;

#[test]
fn five_figures_paginate_as_two_full_pages_and_a_half() {
    let mut collector = ExportCollector::new();
    for _ in 0..5 {
        collector.push(ChartKind::Line, Plot::new());
    }
    let pages: Vec<usize> = collector.pages().iter().map(|p| p.page).collect();
    let slots: Vec<usize> = collector.pages().iter().map(|p| p.slot).collect();
    assert_eq!(pages, vec![0, 0, 1, 1, 2]);
    assert_eq!(slots, vec![0, 1, 0, 1, 0]);
    assert_eq!(collector.page_count(), 3);
}

#[test]
fn export_writes_one_html_file_per_collected_figure() {
    let dir = tempfile::tempdir().unwrap();
    let mut workbench = ChartWorkbench::from_dataframe(
        df! {
            "month" => ["jan", "feb", "mar"],
            "revenue" => [10.0, 20.0, 15.0],
        }
        .unwrap(),
    )
    .unwrap();
    for request in [
        ChartRequest::new(ChartKind::Bar)
            .with_x("month")
            .with_y(["revenue"]),
        ChartRequest::new(ChartKind::Line)
            .with_x("month")
            .with_y(["revenue"]),
        ChartRequest::new(ChartKind::Histogram).with_x("revenue"),
    ] {
        assert!(workbench.chart(&request).figure_collected);
    }
    let written = workbench.export_html(dir.path()).unwrap();
    assert_eq!(written.len(), 3);
    assert!(dir.path().join("page0_slot0_bar.html").exists());
    assert!(dir.path().join("page0_slot1_line.html").exists());
    assert!(dir.path().join("page1_slot0_histogram.html").exists());
}

#[test]
fn empty_collector_refuses_to_export() {
    let workbench = ChartWorkbench::from_dataframe(
        df! { "a" => [1.0, 2.0] }.unwrap(),
    )
    .unwrap();
    assert!(workbench.export_html("/tmp/easel-empty-export").is_err());
}

proptest! {
    #[test]
    fn pagination_holds_for_any_figure_count(count in 0usize..50) {
        let mut collector = ExportCollector::new();
        for _ in 0..count {
            collector.push(ChartKind::Pie, Plot::new());
        }
        let pages = collector.pages();
        prop_assert_eq!(pages.len(), count);
        for (i, slot) in pages.iter().enumerate() {
            prop_assert_eq!(slot.figure_index, i);
            prop_assert_eq!(slot.page, i / FIGURES_PER_PAGE);
            prop_assert_eq!(slot.slot, i % FIGURES_PER_PAGE);
        }
        prop_assert_eq!(collector.page_count(), count.div_ceil(FIGURES_PER_PAGE));
    }
}
