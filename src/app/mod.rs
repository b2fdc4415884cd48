use std::sync::Arc;

use eframe::egui::{self, Context};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::analytics::{AnalyticsSource, IconResolver, TimeWindow};
use crate::bubbles::{BubbleKey, Derivation, Metric, Mode, Registry, Simulation, StalePolicy};
use crate::camera::CameraRig;

mod canvas;
mod ingest;
mod interaction;
mod render_utils;
mod ui;

use ingest::Ingest;
use interaction::Gestures;

#[derive(Clone, Copy, Debug)]
pub struct Settings {
    pub window: TimeWindow,
    pub polling_secs: f64,
    pub stale_policy: StalePolicy,
}

pub struct BubblesApp {
    registry: Registry,
    simulation: Simulation,
    rig: CameraRig,
    gestures: Gestures,
    ingest: Ingest,
    rng: StdRng,
    mode: Mode,
    metric: Metric,
    dialog: Option<BubbleKey>,
}

impl BubblesApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        source: Arc<dyn AnalyticsSource>,
        icons: Arc<dyn IconResolver>,
        settings: Settings,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let mut ingest = Ingest::new(source, icons, settings.window, settings.polling_secs);
        ingest.start();

        Self {
            registry: Registry::new(settings.stale_policy),
            simulation: Simulation::default(),
            rig: CameraRig::default(),
            gestures: Gestures::default(),
            ingest,
            rng: StdRng::from_entropy(),
            mode: Mode::default(),
            metric: Metric::default(),
            dialog: None,
        }
    }

    fn derivation(&self) -> Derivation {
        Derivation::select(self.mode, self.metric)
    }

    pub(in crate::app) fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            info!(mode = mode.label(), "mode changed");
            self.mode = mode;
        }
    }

    pub(in crate::app) fn set_metric(&mut self, metric: Metric) {
        if self.metric != metric {
            info!(metric = metric.label(), "metric changed");
            self.metric = metric;
        }
    }

    pub(in crate::app) fn set_time(&mut self, window: TimeWindow) {
        if self.ingest.window() != window {
            info!(window = window.label(), "time window changed");
            self.ingest.set_time(window);
        }
    }

    pub(in crate::app) fn reload(&mut self) {
        self.dialog = None;
        self.gestures.clear(&mut self.registry);
        self.ingest.force_reset(&mut self.registry);
        info!(epoch = self.registry.epoch(), "reloading all pools");
    }
}

impl eframe::App for BubblesApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|input| input.time);
        self.ingest.pump(&mut self.registry, now);

        self.show_header(ctx);
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_canvas(ui, now));
        self.show_tooltip(ctx);
        self.show_dialog(ctx);

        ctx.request_repaint();
    }
}
