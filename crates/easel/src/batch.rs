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

use crate::chart_request::{ChartKind, ChartRequest, SharedAxes};
use crate::renderer;
use crate::validator::{Diagnostic, ValidationOutcome, Validator};
use log::{debug, info};
use plotly::Plot;
use polars::prelude::DataFrame;

pub struct BatchEntry {
    pub kind: ChartKind,
    pub figure: Option<Plot>,
    pub diagnostics: Vec<Diagnostic>,
}
impl BatchEntry {
    pub fn succeeded(&self) -> bool {
        self.figure.is_some()
    }
}

/// Runs every enabled kind against the shared axis selection, in
/// `ChartKind::ALL` order. A failing member contributes its
/// diagnostics and the batch moves on.
pub fn render_batch(
    table: &mut DataFrame,
    validator: &Validator,
    shared: &SharedAxes,
    enabled: &[ChartKind],
) -> Vec<BatchEntry> {
    let mut entries = Vec::new();
    for kind in ChartKind::ALL {
        if !enabled.contains(&kind) {
            continue;
        }
        let request = ChartRequest::from_shared(kind, shared);
        entries.push(run_one(table, validator, &request));
    }
    info!(
        "batch finished: {}/{} charts rendered",
        entries.iter().filter(|e| e.succeeded()).count(),
        entries.len()
    );
    entries
}

pub(crate) fn run_one(
    table: &mut DataFrame,
    validator: &Validator,
    request: &ChartRequest,
) -> BatchEntry {
    match validator.validate(table, request) {
        ValidationOutcome::Accepted {
            request: accepted,
            warnings,
        } => {
            let (figure, failure) = renderer::render(table, &accepted);
            let mut diagnostics = warnings;
            diagnostics.extend(failure);
            debug!(
                "{}: rendered={} diagnostics={}",
                request.kind,
                figure.is_some(),
                diagnostics.len()
            );
            BatchEntry {
                kind: request.kind,
                figure,
                diagnostics,
            }
        }
        ValidationOutcome::Rejected(diagnostics) => {
            debug!("{}: rejected with {} diagnostics", request.kind, diagnostics.len());
            BatchEntry {
                kind: request.kind,
                figure: None,
                diagnostics,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::df;

    #[test]
    fn failing_member_does_not_block_the_rest() {
        let mut table = df! {
            "month" => ["jan", "feb", "mar"],
            "revenue" => [10.0, 20.0, 15.0],
        }
        .unwrap();
        let validator = Validator::new();
        let shared = SharedAxes::new(Some("month".to_string()), vec!["revenue".to_string()]);
        // Scatter fails (month is not datetime-coercible); Line and Bar succeed.
        let entries = render_batch(
            &mut table,
            &validator,
            &shared,
            &[ChartKind::Scatter, ChartKind::Line, ChartKind::Bar],
        );
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, ChartKind::Line);
        assert_eq!(entries[1].kind, ChartKind::Bar);
        assert_eq!(entries[2].kind, ChartKind::Scatter);
        assert!(entries[0].succeeded());
        assert!(entries[1].succeeded());
        assert!(!entries[2].succeeded());
        assert!(entries[2]
            .diagnostics
            .iter()
            .any(|d| d.message.contains("invalid dates")));
    }

    #[test]
    fn entries_follow_declaration_order_not_request_order() {
        let mut table = df! {
            "month" => ["jan", "feb"],
            "revenue" => [1.0, 2.0],
        }
        .unwrap();
        let validator = Validator::new();
        let shared = SharedAxes::new(Some("month".to_string()), vec!["revenue".to_string()]);
        let entries = render_batch(
            &mut table,
            &validator,
            &shared,
            &[ChartKind::Pie, ChartKind::Histogram, ChartKind::Area],
        );
        let kinds: Vec<ChartKind> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ChartKind::Area, ChartKind::Histogram, ChartKind::Pie]);
    }
}
