//! SVG line plots of a single-variable expression.
//!
//! Charts are drawn without axis labels so no font backend is needed. The
//! grid and the dashed zero references are plain path elements.

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::info;

use crate::error::{MathError, MathResult};
use crate::expr::Expr;

const SAMPLES: usize = 1000;
const SIZE: (u32, u32) = (800, 600);
const GRID_DIVISIONS: usize = 10;
const DASHES: usize = 60;
const GRID_COLOR: RGBColor = RGBColor(211, 211, 211);

/// Sample `expr` at 1000 evenly spaced points over `range` and write
/// `plot_<expr>.svg` into `output_dir`. Returns the written path.
pub fn plot_function(expr: &Expr, range: (f64, f64), output_dir: &Path) -> MathResult<PathBuf> {
    let (x_min, x_max) = range;
    if !(x_min.is_finite() && x_max.is_finite() && x_min < x_max) {
        return Err(MathError::Plot(format!("invalid range [{x_min}, {x_max}]")));
    }

    let step = (x_max - x_min) / (SAMPLES - 1) as f64;
    let points = (0..SAMPLES)
        .map(|i| {
            let x = x_min + step * i as f64;
            expr.eval(x).map(|y| (x, y))
        })
        .collect::<MathResult<Vec<_>>>()?;

    let finite = points.iter().map(|&(_, y)| y).filter(|y| y.is_finite());
    let (y_min, y_max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
        (lo.min(y), hi.max(y))
    });
    if !y_min.is_finite() {
        return Err(MathError::Plot(format!("{expr} has no finite values on [{x_min}, {x_max}]")));
    }
    // keep a flat curve visible
    let (y_lo, y_hi) = if y_max - y_min < f64::EPSILON {
        (y_min - 1.0, y_max + 1.0)
    } else {
        (y_min, y_max)
    };

    std::fs::create_dir_all(output_dir)
        .map_err(|e| MathError::Plot(format!("cannot create {}: {e}", output_dir.display())))?;
    let path = output_dir.join(format!("plot_{}.svg", file_stem(&expr.to_string())));

    {
        let root = SVGBackend::new(&path, SIZE).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| MathError::Plot(format!("failed to fill background: {e}")))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .build_cartesian_2d(x_min..x_max, y_lo..y_hi)
            .map_err(|e| MathError::Plot(format!("failed to build chart: {e}")))?;

        let grid = (0..=GRID_DIVISIONS).flat_map(|i| {
            let t = i as f64 / GRID_DIVISIONS as f64;
            let gx = x_min + t * (x_max - x_min);
            let gy = y_lo + t * (y_hi - y_lo);
            [
                PathElement::new(vec![(gx, y_lo), (gx, y_hi)], GRID_COLOR),
                PathElement::new(vec![(x_min, gy), (x_max, gy)], GRID_COLOR),
            ]
        });
        chart
            .draw_series(grid)
            .map_err(|e| MathError::Plot(format!("failed to draw grid: {e}")))?;

        if y_lo <= 0.0 && 0.0 <= y_hi {
            chart
                .draw_series(dashed((x_min, 0.0), (x_max, 0.0)))
                .map_err(|e| MathError::Plot(format!("failed to draw x axis: {e}")))?;
        }
        if x_min <= 0.0 && 0.0 <= x_max {
            chart
                .draw_series(dashed((0.0, y_min), (0.0, y_max)))
                .map_err(|e| MathError::Plot(format!("failed to draw y axis: {e}")))?;
        }

        for segment in finite_segments(&points) {
            chart
                .draw_series(LineSeries::new(segment.iter().copied(), BLUE.stroke_width(2)))
                .map_err(|e| MathError::Plot(format!("failed to draw curve: {e}")))?;
        }

        root.present()
            .map_err(|e| MathError::Plot(format!("failed to write {}: {e}", path.display())))?;
    }

    info!(path = %path.display(), "plot written");
    Ok(path)
}

/// Short black dashes from `from` to `to`.
fn dashed(from: (f64, f64), to: (f64, f64)) -> impl Iterator<Item = PathElement<(f64, f64)>> {
    let at = move |t: f64| (from.0 + t * (to.0 - from.0), from.1 + t * (to.1 - from.1));
    (0..DASHES).map(move |i| {
        let start = i as f64 / DASHES as f64;
        let end = start + 0.5 / DASHES as f64;
        PathElement::new(vec![at(start), at(end)], BLACK)
    })
}

/// Runs of consecutive finite samples; a pole or a domain gap breaks the
/// curve instead of drawing a vertical spike.
fn finite_segments(points: &[(f64, f64)]) -> Vec<&[(f64, f64)]> {
    points
        .split(|(_, y)| !y.is_finite())
        .filter(|run| run.len() > 1)
        .collect()
}

/// File-name-safe spelling of an expression, one word per token:
/// `x**2 - 4` → `x_pow_2_minus_4`.
fn file_stem(text: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut word = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            continue;
        }
        if c == '.' {
            word.push('p');
            continue;
        }
        if !word.is_empty() {
            words.push(std::mem::take(&mut word));
        }
        let op = match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                "pow".to_string()
            }
            '*' => "times".to_string(),
            '^' => "pow".to_string(),
            '+' => "plus".to_string(),
            '-' => "minus".to_string(),
            '/' => "over".to_string(),
            '(' => "open".to_string(),
            ')' => "close".to_string(),
            c if c.is_whitespace() => continue,
            c => format!("u{:x}", c as u32),
        };
        words.push(op);
    }
    if !word.is_empty() {
        words.push(word);
    }
    words.join("_")
}
