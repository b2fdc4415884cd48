use eframe::egui::{self, Color32, Context, Grid, Id, Order, RichText, Ui};

use crate::util::{format_number, format_percent};

use super::super::BubblesApp;
use super::super::render_utils::sign_color;

fn amount_row(ui: &mut Ui, label: &str, amount: f64, change: f64) {
    ui.label(label);
    ui.label(RichText::new(format_number(amount, true, 2)).monospace());
    ui.label(RichText::new(format_percent(change, true)).color(sign_color(change >= 0.0)));
    ui.end_row();
}

fn apy_row(ui: &mut Ui, label: &str, apy: f64, change: f64) {
    ui.label(label);
    ui.label(RichText::new(format_percent(apy, false)).monospace());
    ui.label(RichText::new(format_percent(change, true)).color(sign_color(change >= 0.0)));
    ui.end_row();
}

impl BubblesApp {
    pub(in crate::app) fn show_tooltip(&self, ctx: &Context) {
        let Some(target) = self.gestures.tooltip() else {
            return;
        };
        let Some(bubble) = self.registry.get(&target.key) else {
            return;
        };
        let summary = bubble.data.summary();

        egui::Area::new(Id::new("bubble_tooltip"))
            .order(Order::Tooltip)
            .fixed_pos(target.screen_pos)
            .constrain(true)
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(RichText::new(bubble.data.asset.display_symbol()).strong().size(16.0));
                    ui.label(
                        RichText::new(&bubble.data.pool_name)
                            .color(bubble.pool_color.unwrap_or(Color32::WHITE)),
                    );
                    ui.add_space(4.0);

                    Grid::new("bubble_tooltip_grid")
                        .num_columns(3)
                        .spacing([12.0, 2.0])
                        .show(ui, |ui| {
                            amount_row(ui, "Supply", summary.supply, summary.supply_change);
                            amount_row(ui, "Borrow", summary.borrow, summary.borrow_change);
                            apy_row(ui, "Supply APY", summary.supply_apy, summary.supply_apy_change);
                            apy_row(ui, "Borrow APY", summary.borrow_apy, summary.borrow_apy_change);
                        });
                });
            });
    }
}
