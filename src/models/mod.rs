//! Data models shared by the fetch, render and polling services

pub mod chart;

pub use chart::{
    parse_hex_color, AxisWindow, ChartConfig, ChartState, DatasetConfig, Interpolation,
    PlotPoint, Series,
};
