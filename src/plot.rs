//! Chart rendering.
//!
//! The backend answers `/generate-chart` with a Plotly figure (`{data, layout}`).
//! [`PreparedChart::from_spec`] extracts drawable series from it once, and
//! [`show_chart`] draws them every frame with `egui_plot` (or as a coloured
//! grid for heatmaps).
//!
//! Supported trace types: `scatter`/`scattergl`, `bar`, `histogram`, `box`,
//! `pie` (drawn as labelled bars) and `heatmap`.

use crate::ChartSpec;

use base64::{Engine, engine::general_purpose::STANDARD};
use egui::{Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, Points};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

/// One element of a Plotly data array.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Null,
}

impl Cell {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    fn label(&self) -> String {
        match self {
            Cell::Number(n) => n.to_string(),
            Cell::Text(text) => text.clone(),
            Cell::Null => String::new(),
        }
    }
}

/// Five-number summary of one box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub position: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Value grid of a heatmap trace.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGrid {
    pub x: Vec<String>,
    pub y: Vec<String>,
    pub z: Vec<Vec<f64>>,
}

/// A drawable series extracted from one trace.
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Line { name: String, points: Vec<[f64; 2]> },
    Markers { name: String, points: Vec<[f64; 2]> },
    Bars { name: String, bars: Vec<[f64; 2]>, width: f64 },
    Boxes { name: String, boxes: Vec<BoxStats> },
    Heatmap(HeatmapGrid),
}

/// A figure ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedChart {
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    /// Labels of a categorical x axis, indexed by position. Empty for numeric axes.
    pub x_categories: Vec<String>,
    pub series: Vec<Series>,
    pub spec: ChartSpec,
}

impl PreparedChart {
    pub fn from_spec(spec: ChartSpec) -> Self {
        let mut axis = CategoryAxis::default();
        let series = spec
            .data
            .as_array()
            .map(|traces| {
                traces
                    .iter()
                    .filter_map(|trace| extract_series(trace, &mut axis))
                    .collect()
            })
            .unwrap_or_default();

        PreparedChart {
            title: title_text(&spec.layout["title"]),
            x_label: title_text(&spec.layout["xaxis"]["title"]),
            y_label: title_text(&spec.layout["yaxis"]["title"]),
            x_categories: axis.labels.into_iter().collect(),
            series,
            spec,
        }
    }

    pub fn heatmap(&self) -> Option<&HeatmapGrid> {
        self.series.iter().find_map(|series| match series {
            Series::Heatmap(grid) => Some(grid),
            _ => None,
        })
    }
}

/// Maps non-numeric x values to positions in first-appearance order.
#[derive(Debug, Default)]
struct CategoryAxis {
    labels: IndexSet<String>,
}

impl CategoryAxis {
    fn position(&mut self, cell: &Cell) -> Option<f64> {
        match cell {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(text) => Some(self.labels.insert_full(text.clone()).0 as f64),
            _ => None,
        }
    }
}

fn extract_series(trace: &Value, axis: &mut CategoryAxis) -> Option<Series> {
    let kind = trace["type"].as_str().unwrap_or("scatter");
    let name = trace["name"]
        .as_str()
        .filter(|name| !name.is_empty())
        .unwrap_or(kind)
        .to_string();

    match kind {
        "scatter" | "scattergl" => {
            let points = xy_points(trace, axis);
            let mode = trace["mode"].as_str().unwrap_or("markers");
            if mode.contains("lines") {
                Some(Series::Line { name, points })
            } else {
                Some(Series::Markers { name, points })
            }
        }
        "bar" => Some(Series::Bars {
            name,
            bars: xy_points(trace, axis),
            width: 0.8,
        }),
        "histogram" => {
            let cells = decode_array(&trace["x"]);
            let numbers: Option<Vec<f64>> = cells
                .iter()
                .filter(|cell| **cell != Cell::Null)
                .map(Cell::as_f64)
                .collect();

            match numbers {
                Some(values) => {
                    let (bars, width) = histogram_bins(&values);
                    Some(Series::Bars { name, bars, width })
                }
                None => Some(Series::Bars {
                    name,
                    bars: category_counts(&cells, axis),
                    width: 0.8,
                }),
            }
        }
        "box" => Some(Series::Boxes {
            name,
            boxes: box_groups(trace, axis),
        }),
        "pie" => {
            let labels = decode_array(&trace["labels"]);
            let values = decode_array(&trace["values"]);
            let bars = if values.is_empty() {
                category_counts(&labels, axis)
            } else {
                labels
                    .iter()
                    .zip(&values)
                    .filter_map(|(label, value)| {
                        Some([axis.position(&Cell::Text(label.label()))?, value.as_f64()?])
                    })
                    .collect()
            };
            Some(Series::Bars {
                name,
                bars,
                width: 0.8,
            })
        }
        "heatmap" => {
            let z = decode_matrix(&trace["z"]);
            let columns = z.iter().map(Vec::len).max().unwrap_or(0);
            Some(Series::Heatmap(HeatmapGrid {
                x: axis_labels(&trace["x"], columns),
                y: axis_labels(&trace["y"], z.len()),
                z,
            }))
        }
        other => {
            tracing::debug!("Skipping unsupported trace type '{other}'");
            None
        }
    }
}

/// Pairs `x` and `y`; a missing `x` means positions `0..n`.
fn xy_points(trace: &Value, axis: &mut CategoryAxis) -> Vec<[f64; 2]> {
    let ys = decode_array(&trace["y"]);
    let xs = decode_array(&trace["x"]);

    ys.iter()
        .enumerate()
        .filter_map(|(index, y)| {
            let x = match xs.get(index) {
                Some(cell) => axis.position(cell)?,
                None if xs.is_empty() => index as f64,
                None => return None,
            };
            Some([x, y.as_f64()?])
        })
        .collect()
}

fn category_counts(cells: &[Cell], axis: &mut CategoryAxis) -> Vec<[f64; 2]> {
    let mut counts: IndexMap<String, f64> = IndexMap::new();
    for cell in cells.iter().filter(|cell| **cell != Cell::Null) {
        *counts.entry(cell.label()).or_default() += 1.0;
    }

    counts
        .into_iter()
        .filter_map(|(label, count)| Some([axis.position(&Cell::Text(label))?, count]))
        .collect()
}

fn box_groups(trace: &Value, axis: &mut CategoryAxis) -> Vec<BoxStats> {
    let ys = decode_array(&trace["y"]);
    let xs = decode_array(&trace["x"]);

    let mut groups: Vec<(f64, Vec<f64>)> = Vec::new();
    for (index, y) in ys.iter().enumerate() {
        let Some(value) = y.as_f64() else { continue };
        let position = match xs.get(index) {
            Some(cell) => match axis.position(cell) {
                Some(position) => position,
                None => continue,
            },
            None => 0.0,
        };

        match groups.iter_mut().find(|(p, _)| *p == position) {
            Some((_, values)) => values.push(value),
            None => groups.push((position, vec![value])),
        }
    }

    groups
        .into_iter()
        .filter_map(|(position, mut values)| {
            values.sort_by(f64::total_cmp);
            Some(BoxStats {
                position,
                min: *values.first()?,
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: *values.last()?,
            })
        })
        .collect()
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty and sorted.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    sorted[low] + (sorted[high] - sorted[low]) * (rank - low as f64)
}

/// Equal-width bins (Sturges rule). Returns `[center, count]` bars and the bin width.
pub fn histogram_bins(values: &[f64]) -> (Vec<[f64; 2]>, f64) {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });

    if values.is_empty() {
        return (Vec::new(), 1.0);
    }
    if min == max {
        return (vec![[min, values.len() as f64]], 1.0);
    }

    let bins = (values.len() as f64).log2().ceil() as usize + 1;
    let width = (max - min) / bins as f64;
    let mut counts = vec![0.0; bins];
    for value in values {
        let index = (((value - min) / width) as usize).min(bins - 1);
        counts[index] += 1.0;
    }

    let bars = counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| [min + (index as f64 + 0.5) * width, count])
        .collect();
    (bars, width)
}

/// Decodes a Plotly data array: a plain JSON array or a typed array `{dtype, bdata}`.
pub fn decode_array(value: &Value) -> Vec<Cell> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Number(n) => n.as_f64().map_or(Cell::Null, Cell::Number),
                Value::String(text) => Cell::Text(text.clone()),
                Value::Bool(flag) => Cell::Number(f64::from(u8::from(*flag))),
                Value::Null => Cell::Null,
                other => Cell::Text(other.to_string()),
            })
            .collect(),
        Value::Object(_) => decode_typed(value)
            .unwrap_or_default()
            .into_iter()
            .map(Cell::Number)
            .collect(),
        _ => Vec::new(),
    }
}

/// Decodes a 2-D array: nested arrays, or a typed array with a `shape`.
pub fn decode_matrix(value: &Value) -> Vec<Vec<f64>> {
    let to_row = |cells: Vec<Cell>| -> Vec<f64> {
        cells
            .iter()
            .map(|cell| cell.as_f64().unwrap_or(f64::NAN))
            .collect()
    };

    match value {
        Value::Array(rows) if rows.iter().all(|row| row.is_array() || row.is_object()) => rows
            .iter()
            .map(|row| to_row(decode_array(row)))
            .collect(),
        Value::Object(_) => {
            let flat = decode_typed(value).unwrap_or_default();
            let columns = shape_columns(&value["shape"]).unwrap_or(flat.len()).max(1);
            flat.chunks(columns).map(<[f64]>::to_vec).collect()
        }
        Value::Array(_) => vec![to_row(decode_array(value))],
        _ => Vec::new(),
    }
}

/// Last dimension of a typed array `shape` (`"3, 4"` or `[3, 4]`).
fn shape_columns(shape: &Value) -> Option<usize> {
    match shape {
        Value::String(text) => text.split(',').next_back()?.trim().parse().ok(),
        Value::Array(dims) => dims.last()?.as_u64().map(|n| n as usize),
        _ => None,
    }
}

fn decode_typed(value: &Value) -> Option<Vec<f64>> {
    let dtype = value["dtype"].as_str()?;
    let bytes = STANDARD.decode(value["bdata"].as_str()?).ok()?;

    let values = match dtype {
        "f8" => le::<8>(&bytes).map(f64::from_le_bytes).collect(),
        "f4" => le::<4>(&bytes)
            .map(|b| f64::from(f32::from_le_bytes(b)))
            .collect(),
        "i1" => le::<1>(&bytes)
            .map(|b| f64::from(i8::from_le_bytes(b)))
            .collect(),
        "u1" => bytes.iter().map(|b| f64::from(*b)).collect(),
        "i2" => le::<2>(&bytes)
            .map(|b| f64::from(i16::from_le_bytes(b)))
            .collect(),
        "u2" => le::<2>(&bytes)
            .map(|b| f64::from(u16::from_le_bytes(b)))
            .collect(),
        "i4" => le::<4>(&bytes)
            .map(|b| f64::from(i32::from_le_bytes(b)))
            .collect(),
        "u4" => le::<4>(&bytes)
            .map(|b| f64::from(u32::from_le_bytes(b)))
            .collect(),
        "i8" => le::<8>(&bytes)
            .map(|b| i64::from_le_bytes(b) as f64)
            .collect(),
        "u8" => le::<8>(&bytes)
            .map(|b| u64::from_le_bytes(b) as f64)
            .collect(),
        other => {
            tracing::debug!("Unsupported typed array dtype '{other}'");
            return None;
        }
    };
    Some(values)
}

/// Little-endian chunks of `N` bytes.
fn le<const N: usize>(bytes: &[u8]) -> impl Iterator<Item = [u8; N]> + '_ {
    bytes
        .chunks_exact(N)
        .filter_map(|chunk| <[u8; N]>::try_from(chunk).ok())
}

fn axis_labels(value: &Value, len: usize) -> Vec<String> {
    let labels: Vec<String> = decode_array(value).iter().map(Cell::label).collect();
    if labels.len() >= len {
        labels
    } else {
        (0..len).map(|index| index.to_string()).collect()
    }
}

/// `title` may be `{"text": ...}` or a plain string.
fn title_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => map.get("text")?.as_str().map(str::to_string),
        _ => None,
    }
    .filter(|text| !text.is_empty())
}

/// Diverging blue-white-red palette; `t` in `[-1, 1]`.
pub fn diverging(t: f64) -> [u8; 3] {
    const BLUE: [f64; 3] = [33.0, 102.0, 172.0];
    const WHITE: [f64; 3] = [247.0, 247.0, 247.0];
    const RED: [f64; 3] = [178.0, 24.0, 43.0];

    let t = if t.is_nan() { 0.0 } else { t.clamp(-1.0, 1.0) };
    let (from, to, s) = if t < 0.0 {
        (WHITE, BLUE, -t)
    } else {
        (WHITE, RED, t)
    };
    std::array::from_fn(|i| (from[i] + (to[i] - from[i]) * s).round() as u8)
}

fn category_label(categories: &[String], value: f64) -> String {
    let index = value.round();
    if (value - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    categories.get(index as usize).cloned().unwrap_or_default()
}

/// Draws `chart` filling the available space.
pub fn show_chart(ui: &mut Ui, chart: &PreparedChart) {
    if let Some(title) = &chart.title {
        ui.heading(title);
    }

    if let Some(grid) = chart.heatmap() {
        show_heatmap(ui, grid);
        return;
    }

    let mut plot = Plot::new("chart_display").legend(Legend::default());
    if let Some(label) = &chart.x_label {
        plot = plot.x_axis_label(label.clone());
    }
    if let Some(label) = &chart.y_label {
        plot = plot.y_axis_label(label.clone());
    }
    if !chart.x_categories.is_empty() {
        let categories = chart.x_categories.clone();
        plot = plot.x_axis_formatter(move |mark, _range| category_label(&categories, mark.value));
    }

    plot.show(ui, |plot_ui| {
        for series in &chart.series {
            match series {
                Series::Line { name, points } => {
                    plot_ui.line(Line::new(name.clone(), PlotPoints::from(points.clone())));
                }
                Series::Markers { name, points } => {
                    plot_ui.points(
                        Points::new(name.clone(), PlotPoints::from(points.clone())).radius(2.5),
                    );
                }
                Series::Bars { name, bars, width } => {
                    let bars = bars
                        .iter()
                        .map(|[x, height]| {
                            let bar = Bar::new(*x, *height).width(*width);
                            match category_label(&chart.x_categories, *x) {
                                label if label.is_empty() => bar,
                                label => bar.name(label),
                            }
                        })
                        .collect();
                    plot_ui.bar_chart(BarChart::new(name.clone(), bars));
                }
                Series::Boxes { name, boxes } => {
                    let elems = boxes
                        .iter()
                        .map(|stats| {
                            BoxElem::new(
                                stats.position,
                                BoxSpread::new(
                                    stats.min,
                                    stats.q1,
                                    stats.median,
                                    stats.q3,
                                    stats.max,
                                ),
                            )
                            .box_width(0.5)
                        })
                        .collect();
                    plot_ui.box_plot(BoxPlot::new(name.clone(), elems));
                }
                Series::Heatmap(_) => {}
            }
        }
    });
}

fn show_heatmap(ui: &mut Ui, grid: &HeatmapGrid) {
    let limit = grid
        .z
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(f64::EPSILON);
    let row_height = ui.text_style_height(&egui::TextStyle::Body) + 8.0;

    TableBuilder::new(ui)
        .striped(false)
        .column(Column::auto())
        .columns(Column::remainder().at_least(48.0), grid.x.len())
        .header(row_height, |mut header| {
            header.col(|_ui| {});
            for label in &grid.x {
                header.col(|ui| {
                    ui.strong(label);
                });
            }
        })
        .body(|mut body| {
            for (label, row) in grid.y.iter().zip(&grid.z) {
                body.row(row_height, |mut table_row| {
                    table_row.col(|ui| {
                        ui.strong(label);
                    });
                    for value in row.iter().take(grid.x.len()) {
                        table_row.col(|ui| {
                            let [r, g, b] = diverging(value / limit);
                            ui.painter()
                                .rect_filled(ui.max_rect(), 0.0, Color32::from_rgb(r, g, b));
                            ui.label(RichText::new(format!("{value:.2}")).color(Color32::BLACK));
                        });
                    }
                });
            }
        });
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

#[cfg(test)]
mod tests_plot {
    use super::*;
    use serde_json::json;

    fn prepare(data: Value, layout: Value) -> PreparedChart {
        PreparedChart::from_spec(ChartSpec { data, layout })
    }

    #[test]
    fn line_trace_with_date_axis() {
        let chart = prepare(
            json!([{
                "type": "scatter", "mode": "lines", "name": "",
                "x": ["2024-01-01", "2024-01-02", "2024-01-03"],
                "y": [3, 5, 4]
            }]),
            json!({"title": {"text": "Trend of amount over date"}, "xaxis": {"title": {"text": "date"}}}),
        );

        assert_eq!(chart.title.as_deref(), Some("Trend of amount over date"));
        assert_eq!(chart.x_label.as_deref(), Some("date"));
        assert_eq!(chart.x_categories, ["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(
            chart.series,
            vec![Series::Line {
                name: "scatter".into(),
                points: vec![[0.0, 3.0], [1.0, 5.0], [2.0, 4.0]],
            }]
        );
    }

    #[test]
    fn markers_with_numeric_axis() {
        let chart = prepare(
            json!([{"type": "scattergl", "mode": "markers", "name": "pts", "x": [1.5, 2.5], "y": [10, null]}]),
            Value::Null,
        );
        assert!(chart.x_categories.is_empty());
        assert_eq!(
            chart.series,
            vec![Series::Markers {
                name: "pts".into(),
                points: vec![[1.5, 10.0]],
            }]
        );
    }

    #[test]
    fn typed_arrays_are_decoded() {
        // [1.0, 2.0] as little-endian f8 and [7, -1] as i2.
        let f8 = STANDARD.encode([1.0f64.to_le_bytes(), 2.0f64.to_le_bytes()].concat());
        let i2 = STANDARD.encode([7i16.to_le_bytes(), (-1i16).to_le_bytes()].concat());

        assert_eq!(
            decode_array(&json!({"dtype": "f8", "bdata": f8})),
            vec![Cell::Number(1.0), Cell::Number(2.0)]
        );
        assert_eq!(
            decode_array(&json!({"dtype": "i2", "bdata": i2})),
            vec![Cell::Number(7.0), Cell::Number(-1.0)]
        );
        assert!(decode_array(&json!({"dtype": "c16", "bdata": ""})).is_empty());
    }

    #[test]
    fn typed_matrix_uses_shape() {
        let values: Vec<u8> = [1.0f64, 0.5, 0.5, 1.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let z = json!({"dtype": "f8", "bdata": STANDARD.encode(values), "shape": "2, 2"});
        assert_eq!(decode_matrix(&z), vec![vec![1.0, 0.5], vec![0.5, 1.0]]);
    }

    #[test]
    fn heatmap_grid() {
        let chart = prepare(
            json!([{"type": "heatmap", "x": ["a", "b"], "y": ["a", "b"], "z": [[1, -0.2], [-0.2, 1]]}]),
            json!({"title": "Numeric Correlation Heatmap"}),
        );
        let grid = chart.heatmap().unwrap();
        assert_eq!(grid.x, ["a", "b"]);
        assert_eq!(grid.z, vec![vec![1.0, -0.2], vec![-0.2, 1.0]]);
        assert_eq!(chart.title.as_deref(), Some("Numeric Correlation Heatmap"));
    }

    #[test]
    fn pie_without_values_counts_labels() {
        let chart = prepare(
            json!([{"type": "pie", "labels": ["N", "S", "N", "E", "N"]}]),
            Value::Null,
        );
        assert_eq!(chart.x_categories, ["N", "S", "E"]);
        assert_eq!(
            chart.series,
            vec![Series::Bars {
                name: "pie".into(),
                bars: vec![[0.0, 3.0], [1.0, 1.0], [2.0, 1.0]],
                width: 0.8,
            }]
        );
    }

    #[test]
    fn histogram_bins_cover_all_values() {
        let values: Vec<f64> = (0..16).map(f64::from).collect();
        let (bars, width) = histogram_bins(&values);
        // 16 values -> log2(16) + 1 = 5 bins.
        assert_eq!(bars.len(), 5);
        assert!((width - 3.0).abs() < 1e-9);
        assert_eq!(bars.iter().map(|[_, c]| c).sum::<f64>(), 16.0);

        assert_eq!(histogram_bins(&[4.0, 4.0]).0, vec![[4.0, 2.0]]);
        assert!(histogram_bins(&[]).0.is_empty());
    }

    #[test]
    fn box_groups_by_category() {
        let chart = prepare(
            json!([{"type": "box", "name": "amount", "x": ["a", "a", "a", "a", "b"], "y": [1, 2, 3, 4, 10]}]),
            Value::Null,
        );
        match &chart.series[0] {
            Series::Boxes { boxes, .. } => {
                assert_eq!(boxes.len(), 2);
                assert_eq!(boxes[0].position, 0.0);
                assert_eq!(boxes[0].median, 2.5);
                assert_eq!(boxes[0].q1, 1.75);
                assert_eq!(boxes[1].min, 10.0);
                assert_eq!(boxes[1].max, 10.0);
            }
            other => panic!("unexpected series {other:?}"),
        }
    }

    #[test]
    fn palette_endpoints() {
        assert_eq!(diverging(0.0), [247, 247, 247]);
        assert_eq!(diverging(1.0), [178, 24, 43]);
        assert_eq!(diverging(-1.0), [33, 102, 172]);
        assert_eq!(diverging(f64::NAN), [247, 247, 247]);
    }

    #[test]
    fn category_labels_only_on_integer_marks() {
        let categories = vec!["x".to_string(), "y".to_string()];
        assert_eq!(category_label(&categories, 1.0), "y");
        assert_eq!(category_label(&categories, 0.5), "");
        assert_eq!(category_label(&categories, 7.0), "");
    }
}
