use std::collections::BTreeMap;
use std::io::Write;

use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use loanlab_core::{Frame, LabResult};

const BAR_WIDTH: usize = 40;

/// Horizontal bar chart: one labeled bar per value, scaled to the
/// largest value.
pub fn bar_chart(labels: &[String], values: &[f64]) -> String {
    let max = values.iter().copied().fold(0.0f64, f64::max);
    let label_width = labels.iter().map(String::len).max().unwrap_or(0);

    let mut out = String::new();
    for (label, &value) in labels.iter().zip(values) {
        let filled = if max > 0.0 {
            ((value / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{:<label_width$}  {}{}  {}\n",
            label,
            "█".repeat(filled),
            " ".repeat(BAR_WIDTH - filled),
            trim_float(value),
        ));
    }
    out
}

fn trim_float(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format!("{v:.4}")
    }
}

/// Missing cells per column, worst first.
pub fn missing_values_chart(frame: &Frame) -> String {
    let mut counts: Vec<(String, f64)> = frame
        .missing_counts()
        .into_iter()
        .map(|(name, count)| (name, count as f64))
        .collect();
    counts.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let (labels, values): (Vec<_>, Vec<_>) = counts.into_iter().unzip();
    bar_chart(&labels, &values)
}

/// Zero cells per numeric column, worst first. Zeros in loan fields
/// (income, balance) often stand in for unreported values.
pub fn zero_values_chart(frame: &Frame) -> String {
    let mut counts: Vec<(String, f64)> = frame
        .numeric_names()
        .into_iter()
        .filter_map(|name| {
            let column = frame.numeric(&name).ok()?;
            let zeros = column.iter().filter(|v| **v == 0.0).count();
            Some((name, zeros as f64))
        })
        .collect();
    counts.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let (labels, values): (Vec<_>, Vec<_>) = counts.into_iter().unzip();
    bar_chart(&labels, &values)
}

/// Category frequencies for one categorical column, most common first.
/// Missing values show up as their own bar.
pub fn category_counts_chart(frame: &Frame, column: &str) -> LabResult<String> {
    let values = frame.categorical(column)?;
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value.as_deref().unwrap_or("<missing>")).or_default() += 1;
    }
    let mut pairs: Vec<(String, f64)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v as f64))
        .collect();
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let (labels, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
    Ok(bar_chart(&labels, &values))
}

/// Text histogram of one numeric column. NaN cells are skipped.
pub fn histogram(values: &[f64], bins: usize) -> String {
    let observed: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if observed.is_empty() || bins == 0 {
        return String::new();
    }
    let min = observed.iter().copied().fold(f64::INFINITY, f64::min);
    let max = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };

    let mut counts = vec![0usize; bins];
    for &v in &observed {
        let bin = (((v - min) / span) * bins as f64) as usize;
        counts[bin.min(bins - 1)] += 1;
    }

    let labels: Vec<String> = (0..bins)
        .map(|i| {
            let lo = min + span * i as f64 / bins as f64;
            let hi = min + span * (i + 1) as f64 / bins as f64;
            format!("[{lo:.1}, {hi:.1})")
        })
        .collect();
    let values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
    bar_chart(&labels, &values)
}

/// One histogram per numeric column.
pub fn numeric_histograms(frame: &Frame, bins: usize) -> Vec<(String, String)> {
    frame
        .numeric_names()
        .into_iter()
        .filter_map(|name| {
            let column = frame.numeric(&name).ok()?;
            Some((name.clone(), histogram(column, bins)))
        })
        .collect()
}

/// Feature importances, largest first.
pub fn importance_chart(names: &[String], importances: &[f64]) -> String {
    let mut pairs: Vec<(String, f64)> = names
        .iter()
        .cloned()
        .zip(importances.iter().copied())
        .collect();
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let (labels, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
    bar_chart(&labels, &values)
}

/// Threshold curves for one estimator: F1, precision, recall and G-mean
/// per cutoff, with the F1 peak and the optimal (max G-mean) cutoff
/// marked in the margin.
pub fn threshold_plot(
    thresholds: &[f64],
    f1: &[f64],
    precision: &[f64],
    recall: &[f64],
    g_mean: &[f64],
    optimal: f64,
    max_f1_at: f64,
) -> String {
    let mut out = String::new();
    for (i, &t) in thresholds.iter().enumerate() {
        let mut marker = "";
        if t == optimal {
            marker = "  <- optimal (max G-mean)";
        } else if t == max_f1_at {
            marker = "  <- max F1";
        }
        out.push_str(&format!(
            "{:.2}  f1={:.3} prec={:.3} rec={:.3} gmean={:.3}{}\n",
            t, f1[i], precision[i], recall[i], g_mean[i], marker
        ));
    }
    out
}

/// Print a chart under a colored title line.
pub fn print_chart<W: Write>(out: &mut W, title: &str, chart: &str) -> LabResult<()> {
    execute!(
        out,
        SetForegroundColor(Color::Cyan),
        Print(format!("{title}\n")),
        ResetColor,
        Print(chart),
        Print("\n"),
    )?;
    Ok(())
}
