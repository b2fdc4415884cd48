use chrono::DateTime;
use eframe::egui::{
    self, Color32, Context, Grid, Id, Key, RichText, Sense, Shape, Stroke, Ui, pos2, vec2,
};

use crate::analytics::{DeltaRecord, SeriesPoint};
use crate::bubbles::{Bubble, Metric};
use crate::util::{format_number, format_percent};

use super::super::BubblesApp;
use super::super::render_utils::{UP_COLOR, fit_size};

const CHART_HEIGHT: f32 = 160.0;

#[derive(Debug, PartialEq)]
struct ChartSeries {
    values: Vec<(i64, f64)>,
    min: f64,
    max: f64,
    last: f64,
}

fn display_value(value: f64, metric: Metric) -> f64 {
    match metric {
        Metric::DeltaTotal => value / DeltaRecord::AMOUNT_SCALE,
        Metric::DeltaApy | Metric::Apy => value * 100.0,
    }
}

fn chart_series(points: &[SeriesPoint], metric: Metric) -> Option<ChartSeries> {
    let values = points
        .iter()
        .filter(|point| point.value.is_finite())
        .map(|point| (point.timestamp, display_value(point.value, metric)))
        .collect::<Vec<_>>();
    let last = values.last()?.1;
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), (_, value)| {
            (min.min(*value), max.max(*value))
        });

    Some(ChartSeries {
        values,
        min,
        max,
        last,
    })
}

fn format_reading(value: f64, metric: Metric) -> String {
    match metric {
        Metric::DeltaTotal => format_number(value, true, 2),
        Metric::DeltaApy | Metric::Apy => format!("{value:.2}%"),
    }
}

fn format_timestamp(seconds: Option<i64>) -> String {
    seconds
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .map(|time| time.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_owned())
}

fn draw_chart(ui: &mut Ui, series: &ChartSeries, color: Color32) {
    let width = ui.available_width().max(320.0);
    let (rect, _) = ui.allocate_exact_size(vec2(width, CHART_HEIGHT), Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 4.0, Color32::from_gray(24));

    let plot = rect.shrink(8.0);
    let first = series.values.first().map_or(0, |(timestamp, _)| *timestamp);
    let last = series.values.last().map_or(0, |(timestamp, _)| *timestamp);
    let span = (last - first).max(1) as f64;
    let range = if series.max - series.min > f64::EPSILON {
        series.max - series.min
    } else {
        1.0
    };

    let points = series
        .values
        .iter()
        .map(|(timestamp, value)| {
            let x = ((timestamp - first) as f64 / span) as f32;
            let y = ((value - series.min) / range) as f32;
            pos2(plot.left() + (x * plot.width()), plot.bottom() - (y * plot.height()))
        })
        .collect::<Vec<_>>();

    if points.len() == 1 {
        painter.circle_filled(points[0], 2.5, color);
    } else {
        painter.add(Shape::line(points, Stroke::new(1.5, color)));
    }
}

fn show_details(ui: &mut Ui, bubble: &Bubble) {
    let asset = &bubble.data.asset;
    Grid::new("bubble_dialog_details")
        .num_columns(2)
        .spacing([16.0, 4.0])
        .show(ui, |ui| {
            ui.label("Code");
            ui.label(RichText::new(&asset.code).monospace());
            ui.end_row();

            ui.label("Issuer");
            if asset.issuer.is_empty() {
                ui.label("native");
            } else {
                ui.label(RichText::new(&asset.issuer).monospace().small());
            }
            ui.end_row();

            ui.label("Pool");
            ui.label(
                RichText::new(&bubble.data.pool_name)
                    .color(bubble.pool_color.unwrap_or(Color32::WHITE)),
            );
            ui.end_row();

            ui.label("Pool id");
            ui.label(RichText::new(&bubble.data.pool_id).monospace().small());
            ui.end_row();

            if let Some(domain) = bubble
                .asset_meta
                .as_ref()
                .and_then(|meta| meta.home_domain.as_deref())
            {
                ui.label("Home domain");
                ui.label(domain);
                ui.end_row();
            }

            ui.label("From");
            ui.label(format_timestamp(bubble.data.start_time));
            ui.end_row();

            ui.label("To");
            ui.label(format_timestamp(bubble.data.end_time));
            ui.end_row();

            ui.label("Current");
            ui.label(RichText::new(&bubble.display_label).strong());
            ui.end_row();
        });
}

impl BubblesApp {
    pub(in crate::app) fn show_dialog(&mut self, ctx: &Context) {
        let Some(key) = self.dialog.clone() else {
            return;
        };
        if ctx.input(|input| input.key_pressed(Key::Escape)) {
            self.dialog = None;
            return;
        }
        let Some(bubble) = self.registry.get(&key) else {
            self.dialog = None;
            return;
        };

        let derivation = self.derivation();
        let metric = derivation.metric();
        let field = derivation.series_field();
        let mut open = true;

        egui::Window::new(bubble.data.asset.display_symbol())
            .id(Id::new("bubble_dialog"))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .default_width(460.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if let Some(texture) = &bubble.icon_texture {
                        ui.image((texture.id(), fit_size(texture.size_vec2(), 32.0)));
                    }
                    if let Some(name) = &bubble.data.asset.name {
                        ui.heading(name);
                    }
                });
                ui.add_space(6.0);
                show_details(ui, bubble);
                ui.separator();

                ui.label(RichText::new(format!("{} ({})", field.query_key(), metric.label())).strong());
                let series = bubble
                    .series
                    .as_ref()
                    .and_then(|series| chart_series(series.points(field), metric));
                match series {
                    Some(series) => {
                        draw_chart(ui, &series, UP_COLOR);
                        ui.horizontal(|ui| {
                            ui.label(format!("min {}", format_reading(series.min, metric)));
                            ui.separator();
                            ui.label(format!("max {}", format_reading(series.max, metric)));
                            ui.separator();
                            ui.label(format!("last {}", format_reading(series.last, metric)));
                        });
                    }
                    None if bubble.series.is_none() => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("waiting for series");
                        });
                    }
                    None => {
                        ui.label("No data points in this window.");
                    }
                }

                let summary = bubble.data.summary();
                ui.add_space(4.0);
                ui.label(
                    RichText::new(format!(
                        "supply {} ({})  borrow {} ({})",
                        format_number(summary.supply, false, 2),
                        format_percent(summary.supply_change, true),
                        format_number(summary.borrow, false, 2),
                        format_percent(summary.borrow_change, true),
                    ))
                    .small(),
                );
            });

        if !open {
            self.dialog = None;
        }
    }
}
