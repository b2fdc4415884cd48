use std::f32::consts::TAU;

use eframe::egui::{Color32, Mesh, Painter, Pos2, Rect, Vec2, vec2};

pub(super) const BACKGROUND: Color32 = Color32::from_rgb(13, 15, 24);
pub(super) const UP_COLOR: Color32 = Color32::from_rgb(58, 242, 111);
pub(super) const DOWN_COLOR: Color32 = Color32::from_rgb(255, 37, 99);

const GLOW_ALPHA: u8 = 51;
const GLOW_SEGMENTS: u32 = 64;

pub(super) fn sign_color(sign: bool) -> Color32 {
    if sign { UP_COLOR } else { DOWN_COLOR }
}

pub(super) fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, BACKGROUND);
}

pub(super) fn glow_ring(center: Pos2, inner: f32, outer: f32, color: Color32) -> Mesh {
    let mut mesh = Mesh::default();
    let inner_color = Color32::TRANSPARENT;
    let outer_color = with_alpha(color, GLOW_ALPHA);

    for segment in 0..=GLOW_SEGMENTS {
        let angle = (segment as f32 / GLOW_SEGMENTS as f32) * TAU;
        let direction = vec2(angle.cos(), angle.sin());
        mesh.colored_vertex(center + (direction * inner), inner_color);
        mesh.colored_vertex(center + (direction * outer), outer_color);
    }

    for segment in 0..GLOW_SEGMENTS {
        let base = segment * 2;
        mesh.add_triangle(base, base + 1, base + 2);
        mesh.add_triangle(base + 1, base + 3, base + 2);
    }

    mesh
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn fit_size(image: Vec2, side: f32) -> Vec2 {
    if image.x <= 0.0 || image.y <= 0.0 {
        return Vec2::ZERO;
    }
    let ratio = image.x / image.y;
    if ratio >= 1.0 {
        vec2(side, side / ratio)
    } else {
        vec2(side * ratio, side)
    }
}
