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

use anyhow::{bail, Context, Result};
use easel::{ChartKind, ChartWorkbench, ColorScale, SharedAxes, Theme};
use itertools::Itertools;
use log::info;

struct Args {
    csv_path: String,
    kinds: Vec<ChartKind>,
    x: Option<String>,
    y: Vec<String>,
    theme: Option<Theme>,
    color_scale: Option<ColorScale>,
    out_dir: String,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let csv_path = match args.next() {
        Some(path) => path,
        None => bail!(
            "usage: easel-dashboard-demo <data.csv> [--kinds line,bar,...] [--x col] \
             [--y col1,col2] [--theme plotly] [--scale viridis] [--out dir]"
        ),
    };
    let mut parsed = Args {
        csv_path,
        kinds: ChartKind::ALL.to_vec(),
        x: None,
        y: Vec::new(),
        theme: None,
        color_scale: None,
        out_dir: "easel-output".to_string(),
    };
    while let Some(flag) = args.next() {
        let value = args
            .next()
            .with_context(|| format!("flag '{flag}' needs a value"))?;
        match flag.as_str() {
            "--kinds" => {
                parsed.kinds = value
                    .split(',')
                    .map(|k| k.trim().parse::<ChartKind>())
                    .collect::<Result<Vec<_>, _>>()?;
            }
            "--x" => parsed.x = Some(value),
            "--y" => parsed.y = value.split(',').map(|c| c.trim().to_string()).collect(),
            "--theme" => parsed.theme = Some(value.parse()?),
            "--scale" => parsed.color_scale = Some(value.parse()?),
            "--out" => parsed.out_dir = value,
            _ => bail!("unknown flag '{flag}'"),
        }
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;
    let mut workbench = ChartWorkbench::from_csv(&args.csv_path)
        .with_context(|| format!("failed to load '{}'", args.csv_path))?;

    let profiles = workbench.profile()?;
    println!("Columns in {}:", args.csv_path);
    for profile in &profiles {
        println!("  {profile}");
    }

    // Fall back to the first categorical column for x and every numeric
    // column for y when the selection is not given on the command line.
    let x = args.x.or_else(|| {
        profiles
            .iter()
            .find(|p| p.kind.is_categorical())
            .map(|p| p.name.clone())
    });
    let y = if args.y.is_empty() {
        profiles
            .iter()
            .filter(|p| p.kind.is_numeric())
            .map(|p| p.name.clone())
            .collect()
    } else {
        args.y
    };
    if y.is_empty() {
        bail!("no numeric columns to chart; pass --y explicitly");
    }
    info!(
        "charting x={} y={}",
        x.as_deref().unwrap_or("<none>"),
        y.iter().join(", ")
    );

    let mut shared = SharedAxes::new(x, y);
    if let Some(theme) = args.theme {
        shared = shared.with_theme(theme);
    }
    if let Some(scale) = args.color_scale {
        shared = shared.with_color_scale(scale);
    }

    println!();
    let outcomes = workbench.chart_batch(&shared, &args.kinds);
    for outcome in &outcomes {
        let status = if outcome.figure_collected { "ok" } else { "failed" };
        println!("{:<10} {status}", outcome.kind.to_string());
        for diagnostic in &outcome.diagnostics {
            println!("           {diagnostic}");
        }
    }

    if workbench.collector().is_empty() {
        println!("\nNothing to export.");
        return Ok(());
    }
    let written = workbench.export_html(&args.out_dir)?;
    println!(
        "\nWrote {} figures across {} pages to {}:",
        written.len(),
        workbench.collector().page_count(),
        args.out_dir
    );
    for path in written {
        println!("  {}", path.display());
    }
    Ok(())
}
