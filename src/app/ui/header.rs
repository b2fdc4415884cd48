use eframe::egui::{self, Align, Color32, Context, Layout, RichText};

use crate::analytics::TimeWindow;
use crate::bubbles::{Metric, Mode};

use super::super::BubblesApp;
use super::super::render_utils::DOWN_COLOR;

impl BubblesApp {
    pub(in crate::app) fn show_header(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("header")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Blend Bubbles");
                    ui.separator();

                    for mode in Mode::ALL {
                        if ui.selectable_label(self.mode == mode, mode.label()).clicked() {
                            self.set_mode(mode);
                        }
                    }
                    ui.separator();

                    for metric in Metric::ALL {
                        if ui.selectable_label(self.metric == metric, metric.label()).clicked() {
                            self.set_metric(metric);
                        }
                    }
                    ui.separator();

                    let active_window = self.ingest.window();
                    for window in TimeWindow::ALL {
                        if ui
                            .selectable_label(active_window == window, window.label())
                            .clicked()
                        {
                            self.set_time(window);
                        }
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let loading = self.ingest.is_loading();
                        if ui.add_enabled(!loading, egui::Button::new("Reload")).clicked() {
                            self.reload();
                        }
                        ui.label(format!("bubbles: {}", self.registry.len()));
                        if loading {
                            ui.spinner();
                        }
                        if let Some(error) = self.ingest.last_error() {
                            ui.label(RichText::new("fetch failed").color(DOWN_COLOR))
                                .on_hover_text(error);
                        }
                        ui.label(
                            RichText::new("scroll to zoom, right-drag to pan")
                                .small()
                                .color(Color32::from_gray(140)),
                        );
                    });
                });
            });
    }
}
