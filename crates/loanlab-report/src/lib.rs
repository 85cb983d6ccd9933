//! Terminal rendering for experiment results: aligned tables, bar
//! charts, histograms and threshold-curve plots.

pub mod charts;
pub mod table;

pub use charts::{
    bar_chart, category_counts_chart, histogram, importance_chart, missing_values_chart,
    numeric_histograms, print_chart, threshold_plot, zero_values_chart,
};
pub use table::{print_table, render_table};
