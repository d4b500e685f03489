//! Plotly figure descriptions
//!
//! The dashboard page draws charts with Plotly.js; the server only builds
//! the figure JSON. Dates are serialised as `YYYY-MM-DD`, missing values as
//! `null` so Plotly leaves a gap.

use crate::data::TimeSeriesData;
use crate::models::ForecastFrame;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const FORECAST_COLOR: &str = "#0072B2";
const BAND_COLOR: &str = "rgba(0, 114, 178, 0.2)";

/// A chart: traces plus layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

/// A single scatter trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<Option<f64>>,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub color: String,
    pub size: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autosize: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<Grid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    /// `xaxis`, `yaxis`, `xaxis2`, ... keyed by their Plotly names
    #[serde(flatten)]
    pub axes: BTreeMap<String, Axis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rangeslider: Option<RangeSlider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSlider {
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub rows: usize,
    pub columns: usize,
    pub pattern: String,
}

/// Dates rendered on a Plotly date axis
pub fn date_labels(dates: &[NaiveDate]) -> Vec<String> {
    dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
}

impl Trace {
    /// A line trace
    pub fn line(name: impl Into<String>, dates: &[NaiveDate], y: Vec<Option<f64>>) -> Self {
        Self {
            kind: "scatter".to_string(),
            name: name.into(),
            x: date_labels(dates),
            y,
            mode: "lines".to_string(),
            fill: None,
            fillcolor: None,
            line: None,
            marker: None,
            xaxis: None,
            yaxis: None,
            showlegend: None,
        }
    }

    /// A marker-only trace
    pub fn markers(name: impl Into<String>, dates: &[NaiveDate], y: Vec<Option<f64>>) -> Self {
        Self {
            mode: "markers".to_string(),
            ..Self::line(name, dates, y)
        }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        if self.mode == "markers" {
            self.marker = Some(Marker {
                color: color.to_string(),
                size: 4.0,
            });
        } else {
            self.line = Some(Line {
                color: Some(color.to_string()),
                width: None,
            });
        }
        self
    }

    /// Fill down to zero, turning the line into an area chart
    pub fn area(mut self) -> Self {
        self.fill = Some("tozeroy".to_string());
        self
    }

    /// Fill to the previous trace, forming a band
    pub fn band_to_previous(mut self, fillcolor: &str) -> Self {
        self.fill = Some("tonexty".to_string());
        self.fillcolor = Some(fillcolor.to_string());
        self
    }

    pub fn on_axes(mut self, xaxis: String, yaxis: String) -> Self {
        self.xaxis = Some(xaxis);
        self.yaxis = Some(yaxis);
        self
    }

    pub fn hidden_from_legend(mut self) -> Self {
        self.showlegend = Some(false);
        self
    }
}

impl Figure {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            data: Vec::new(),
            layout: Layout {
                title: Some(Title { text: title.into() }),
                ..Layout::default()
            },
        }
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.data.push(trace);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.layout.autosize = Some(false);
        self.layout.width = Some(width);
        self.layout.height = Some(height);
        self
    }

    pub fn with_rangeslider(mut self) -> Self {
        self.layout
            .axes
            .entry("xaxis".to_string())
            .or_default()
            .rangeslider = Some(RangeSlider { visible: true });
        self
    }

    pub fn with_axis(mut self, key: impl Into<String>, axis: Axis) -> Self {
        self.layout.axes.insert(key.into(), axis);
        self
    }

    pub fn trace(&self, name: &str) -> Option<&Trace> {
        self.data.iter().find(|trace| trace.name == name)
    }
}

/// Observed values, fitted line and uncertainty band
pub fn forecast_figure(history: &TimeSeriesData, frame: &ForecastFrame) -> Figure {
    let dates = frame.dates();
    let rows = frame.rows();

    Figure::new("")
        .with_size(900, 600)
        .with_rangeslider()
        .with_axis(
            "yaxis",
            Axis {
                title: Some(Title {
                    text: "y".to_string(),
                }),
                ..Axis::default()
            },
        )
        .with_trace(
            Trace::markers(
                "Actual",
                history.dates(),
                history.values().iter().copied().map(Some).collect(),
            )
            .with_color("black"),
        )
        .with_trace(
            Trace::line(
                "yhat_lower",
                &dates,
                rows.iter().map(|row| Some(row.yhat_lower)).collect(),
            )
            .with_color("rgba(0, 0, 0, 0)")
            .hidden_from_legend(),
        )
        .with_trace(
            Trace::line(
                "yhat_upper",
                &dates,
                rows.iter().map(|row| Some(row.yhat_upper)).collect(),
            )
            .with_color("rgba(0, 0, 0, 0)")
            .band_to_previous(BAND_COLOR)
            .hidden_from_legend(),
        )
        .with_trace(
            Trace::line(
                "Predicted",
                &dates,
                rows.iter().map(|row| Some(row.yhat)).collect(),
            )
            .with_color(FORECAST_COLOR),
        )
}

/// One stacked subplot per fitted component
pub fn components_figure(frame: &ForecastFrame) -> Figure {
    let dates = frame.dates();
    let rows = frame.rows();

    let mut components: Vec<(&str, Vec<Option<f64>>)> =
        vec![("trend", rows.iter().map(|row| Some(row.trend)).collect())];
    if frame.has_weekly() {
        components.push(("weekly", rows.iter().map(|row| row.weekly).collect()));
    }
    if frame.has_yearly() {
        components.push(("yearly", rows.iter().map(|row| row.yearly).collect()));
    }

    let mut figure = Figure::new("Component-wise forecast").with_size(900, 250 * components.len() as u32);
    figure.layout.showlegend = Some(false);
    figure.layout.grid = Some(Grid {
        rows: components.len(),
        columns: 1,
        pattern: "independent".to_string(),
    });

    for (index, (name, values)) in components.into_iter().enumerate() {
        let suffix = if index == 0 {
            String::new()
        } else {
            (index + 1).to_string()
        };
        figure = figure
            .with_axis(
                format!("yaxis{}", suffix),
                Axis {
                    title: Some(Title {
                        text: name.to_string(),
                    }),
                    ..Axis::default()
                },
            )
            .with_trace(
                Trace::line(name, &dates, values)
                    .with_color(FORECAST_COLOR)
                    .on_axes(format!("x{}", suffix), format!("y{}", suffix)),
            );
    }
    figure
}
