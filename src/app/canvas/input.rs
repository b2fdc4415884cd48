use eframe::egui::{self, Pos2, Ui};
use tracing::{info, warn};

use crate::camera::Point;

use super::super::BubblesApp;

impl BubblesApp {
    pub(in crate::app) fn handle_canvas_zoom(&mut self, ui: &Ui, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| response.rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        if let Err(error) = self.rig.zoom_about(pointer, f64::from(zoom_factor)) {
            warn!(%error, "zoom ignored");
        }
    }

    pub(in crate::app) fn handle_canvas_pan(&mut self, response: &egui::Response) {
        if response.double_clicked_by(egui::PointerButton::Secondary) {
            self.rig.reset_view();
            return;
        }

        if (response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle))
            && let Err(error) = self.rig.pan_by(response.drag_delta())
        {
            warn!(%error, "pan ignored");
        }
    }

    fn pointer_to_hud(&self, pointer: Pos2) -> Option<Pos2> {
        let ratio = self.rig.ratio();
        let device = Point::new(f64::from(pointer.x) * ratio, f64::from(pointer.y) * ratio);
        match self.rig.screen_to_hud(device, true) {
            Ok(point) => Some(point.into()),
            Err(error) => {
                warn!(%error, "pointer could not be mapped");
                None
            }
        }
    }

    pub(in crate::app) fn handle_canvas_pointer(
        &mut self,
        ui: &Ui,
        response: &egui::Response,
        now: f64,
    ) {
        self.gestures.tick(&mut self.registry, now);

        let (pressed, released, pointer) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.hover_pos(),
            )
        });
        let over_canvas = pointer.filter(|_| response.contains_pointer());
        let hud_point = over_canvas.and_then(|pointer| self.pointer_to_hud(pointer));

        if pressed && let Some(point) = hud_point {
            self.gestures.touch_start(&mut self.registry, point, now);
        }

        match (hud_point, over_canvas) {
            (Some(point), Some(screen)) => {
                self.gestures.touch_move(&mut self.registry, point, screen);
            }
            _ if self.gestures.tooltip().is_some() => self.gestures.clear(&mut self.registry),
            _ => {}
        }

        if released && let Some(key) = self.gestures.touch_end(&self.registry, now) {
            info!(%key, "opening bubble details");
            self.dialog = Some(key);
        }

        if self.gestures.tooltip().is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }
    }
}
