use eframe::egui::{Pos2, Rect, pos2, vec2};

use crate::bubbles::Metric;

pub fn deflate_rect(rect: Rect, dx: f32, dy: f32) -> Rect {
    Rect::from_min_size(
        pos2(rect.left() + dx, rect.top() + dy),
        vec2(
            (rect.width() - (2.0 * dx)).max(0.0),
            (rect.height() - (2.0 * dy)).max(0.0),
        ),
    )
}

pub fn point_in_circle(point: Pos2, center: Pos2, radius: f32) -> bool {
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    (dx * dx) + (dy * dy) <= radius * radius
}

pub fn format_number(value: f64, abbreviate: bool, digits: usize) -> String {
    if !value.is_finite() {
        return String::new();
    }

    if abbreviate {
        return if value >= 1e9 {
            format!("{:.digits$}B", value / 1e9)
        } else if value >= 1e6 {
            format!("{:.digits$}M", value / 1e6)
        } else if value >= 1e3 {
            format!("{:.digits$}K", value / 1e3)
        } else {
            format!("{value:.digits$}")
        };
    }

    let fixed = format!("{:.digits$}", value.abs());
    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(fixed.len() + (integer.len() / 3) + 1);
    if value < 0.0 && fixed.chars().any(|ch| ch.is_ascii_digit() && ch != '0') {
        grouped.push('-');
    }
    for (index, ch) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

pub fn format_percent(fraction: f64, signed: bool) -> String {
    if fraction == 0.0 || !fraction.is_finite() {
        return "0.00%".to_owned();
    }

    let percent = fraction * 100.0;
    if percent.abs() < 0.01 {
        return if fraction > 0.0 {
            "<0.01%".to_owned()
        } else {
            "<-0.01%".to_owned()
        };
    }

    if signed && fraction > 0.0 {
        format!("+{percent:.2}%")
    } else {
        format!("{percent:.2}%")
    }
}

pub fn format_label(value: f64, metric: Metric) -> String {
    match metric {
        Metric::DeltaTotal | Metric::DeltaApy => format_percent(value, true),
        Metric::Apy => format_percent(value, false),
    }
}
