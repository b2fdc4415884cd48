use eframe::egui::{
    self, Align2, Color32, Context, FontId, Painter, Pos2, Rect, Sense, Stroke, TextureOptions, Ui,
    pos2, vec2,
};

use crate::bubbles::{Bubble, StepInput, layout_rect, unit_for};

use super::super::BubblesApp;
use super::super::render_utils::{
    circle_visible, draw_background, fit_size, glow_ring, sign_color, with_alpha,
};

const MIN_FONT_SIZE: f32 = 4.0;

impl BubblesApp {
    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui, now: f64) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect);

        self.rig.apply_device(rect.min, ui.ctx().pixels_per_point());
        self.handle_canvas_zoom(ui, &response);
        self.handle_canvas_pan(&response);

        let viewport = Rect::from_min_size(Pos2::ZERO, rect.size());
        let unit = unit_for(viewport);
        let elapsed = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let step = StepInput {
            elapsed,
            rect: layout_rect(viewport, unit),
            unit,
            derivation: self.derivation(),
            now_secs: now,
        };
        self.simulation.step(&mut self.registry, step, &mut self.rng);

        self.handle_canvas_pointer(ui, &response, now);
        self.load_icon_textures(ui.ctx());
        self.paint_bubbles(&painter, rect);

        if self.registry.is_empty() {
            let message = match self.ingest.last_error() {
                Some(error) => format!("Could not load pools: {error}"),
                None => "Loading pools...".to_owned(),
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                message,
                FontId::proportional(16.0),
                Color32::from_gray(190),
            );
        }
    }

    fn load_icon_textures(&mut self, ctx: &Context) {
        for bubble in self.registry.iter_mut() {
            if bubble.icon_texture.is_some() {
                continue;
            }
            let Some(meta) = &bubble.asset_meta else {
                continue;
            };
            let texture = ctx.load_texture(
                format!("icon-{}", bubble.key),
                (*meta.image).clone(),
                TextureOptions::LINEAR,
            );
            bubble.icon_texture = Some(texture);
        }
    }

    fn paint_bubbles(&self, painter: &Painter, clip: Rect) {
        let zoom = self.rig.zoom_factor() as f32;

        for bubble in self.registry.iter() {
            if bubble.radius - bubble.border <= 0.0 {
                continue;
            }

            let center = self.rig.hud_to_pos(bubble.center());
            let radius = bubble.radius * zoom;
            if !circle_visible(clip, center, radius * 1.05) {
                continue;
            }

            paint_disc(painter, bubble, center, zoom);
            paint_labels(painter, bubble, center, radius);
        }
    }
}

fn paint_disc(painter: &Painter, bubble: &Bubble, center: Pos2, zoom: f32) {
    let radius = (bubble.radius - bubble.border) * zoom;
    let stroke_width = bubble.border * 0.4 * zoom;
    let color = sign_color(bubble.sign);

    painter.circle_filled(center, radius, Color32::from_white_alpha(51));
    painter.add(egui::Shape::mesh(glow_ring(center, radius * 0.75, radius, color)));
    painter.circle_stroke(center, radius, Stroke::new(stroke_width, color));

    if bubble.hover {
        painter.circle_stroke(
            center,
            radius * 1.02,
            Stroke::new(stroke_width * 1.5, with_alpha(Color32::WHITE, 242)),
        );
    }
}

fn paint_labels(painter: &Painter, bubble: &Bubble, center: Pos2, radius: f32) {
    let text_unit = 0.4 * radius;
    let line_height = radius * 0.25;

    if let Some(texture) = &bubble.icon_texture {
        let size = fit_size(texture.size_vec2(), radius * 0.4);
        let icon_rect = Rect::from_center_size(center - vec2(0.0, line_height * 2.1), size);
        painter.image(
            texture.id(),
            icon_rect,
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Color32::WHITE,
        );
    }

    if text_unit * 0.5 < MIN_FONT_SIZE {
        return;
    }

    let anchor = center + vec2(0.0, radius * 0.24);
    painter.text(
        anchor,
        Align2::CENTER_CENTER,
        bubble.data.asset.display_symbol(),
        FontId::proportional(text_unit * 0.9),
        Color32::WHITE,
    );
    painter.text(
        anchor - vec2(0.0, line_height),
        Align2::CENTER_BOTTOM,
        &bubble.data.pool_name,
        FontId::proportional(text_unit * 0.6),
        bubble.pool_color.unwrap_or(Color32::WHITE),
    );
    painter.text(
        anchor + vec2(0.0, line_height),
        Align2::CENTER_TOP,
        &bubble.display_label,
        FontId::proportional(text_unit * 0.5),
        Color32::WHITE,
    );
}
