use eframe::egui::{Pos2, Vec2, pos2};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Pos2> for Point {
    fn from(value: Pos2) -> Self {
        Self::new(f64::from(value.x), f64::from(value.y))
    }
}

impl From<Point> for Pos2 {
    fn from(value: Point) -> Self {
        pos2(value.x as f32, value.y as f32)
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("camera matrix is not invertible (determinant {determinant})")]
    NumericDegeneracy { determinant: f64 },
}

const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// [a, b, c, d, e, f] maps (x, y) to (a*x + c*y + e, b*x + d*y + f).
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub sx: f64,
    pub sy: f64,
    pub angle: f64,
    matrix: [f64; 6],
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            x: 0.0,
            y: 0.0,
            sx: 1.0,
            sy: 1.0,
            angle: 0.0,
            matrix: IDENTITY,
        };
        camera.update();
        camera
    }
}

impl Camera {
    pub fn reset(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
        self.sx = 1.0;
        self.sy = 1.0;
        self.angle = 0.0;
        self.matrix = IDENTITY;
    }

    pub fn update(&mut self) {
        self.matrix = IDENTITY;
        self.translate(self.x, self.y);
        self.scale(self.sx, self.sy);
        self.rotate(self.angle);
    }

    pub fn matrix(&self) -> [f64; 6] {
        self.matrix
    }

    pub fn determinant(&self) -> f64 {
        let [a, b, c, d, _, _] = self.matrix;
        (a * d) - (b * c)
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        let m = &mut self.matrix;
        m[4] += (m[0] * dx) + (m[2] * dy);
        m[5] += (m[1] * dx) + (m[3] * dy);
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        let m = &mut self.matrix;
        m[0] *= sx;
        m[1] *= sx;
        m[2] *= sy;
        m[3] *= sy;
    }

    pub fn rotate(&mut self, theta: f64) {
        let (sin, cos) = theta.sin_cos();
        let [a, b, c, d, _, _] = self.matrix;
        self.matrix[0] = (a * cos) + (c * sin);
        self.matrix[1] = (b * cos) + (d * sin);
        self.matrix[2] = (c * cos) - (a * sin);
        self.matrix[3] = (d * cos) - (b * sin);
    }

    pub fn screen_to_camera(&self, point: Point) -> Result<Point, TransformError> {
        let determinant = self.determinant();
        if determinant == 0.0 || !determinant.is_finite() {
            return Err(TransformError::NumericDegeneracy { determinant });
        }

        let [a, b, c, d, e, f] = self.matrix;
        let inv = 1.0 / determinant;
        Ok(Point::new(
            (point.x * d * inv) - (point.y * c * inv) + (((c * f) - (d * e)) * inv),
            (point.y * a * inv) - (point.x * b * inv) + (((b * e) - (a * f)) * inv),
        ))
    }

    pub fn camera_to_screen(&self, point: Point) -> Point {
        let [a, b, c, d, e, f] = self.matrix;
        Point::new(
            (point.x * a) + (point.y * c) + e,
            (point.x * b) + (point.y * d) + f,
        )
    }

    pub fn multiply(&mut self, other: &Camera) {
        let [a, b, c, d, e, f] = self.matrix;
        let [oa, ob, oc, od, oe, of] = other.matrix;
        self.matrix = [
            (a * oa) + (c * ob),
            (b * oa) + (d * ob),
            (a * oc) + (c * od),
            (b * oc) + (d * od),
            (a * oe) + (c * of) + e,
            (b * oe) + (d * of) + f,
        ];
    }
}

#[derive(Clone, Debug)]
pub struct CameraRig {
    pub unit: Camera,
    pub hud: Camera,
    ratio: f64,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            unit: Camera::default(),
            hud: Camera::default(),
            ratio: 1.0,
        }
    }
}

impl CameraRig {
    pub const MIN_ZOOM: f64 = 0.25;
    pub const MAX_ZOOM: f64 = 6.0;

    pub fn apply_device(&mut self, origin: Pos2, ratio: f32) {
        self.ratio = if ratio > 0.0 { f64::from(ratio) } else { 1.0 };
        self.unit.x = f64::from(origin.x);
        self.unit.y = f64::from(origin.y);
        self.unit.sx = 1.0;
        self.unit.sy = 1.0;
        self.update_cameras();
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn update_cameras(&mut self) {
        self.unit.update();
        self.hud.update();
    }

    pub fn combined(&self) -> Camera {
        let mut camera = Camera::default();
        camera.multiply(&self.unit);
        camera.multiply(&self.hud);
        camera
    }

    // With `use_ratio` the input is in device pixels, otherwise in points.
    pub fn screen_to_hud(&self, point: Point, use_ratio: bool) -> Result<Point, TransformError> {
        let ratio = if use_ratio { self.ratio } else { 1.0 };
        self.combined()
            .screen_to_camera(Point::new(point.x / ratio, point.y / ratio))
    }

    pub fn hud_to_screen(&self, point: Point, use_ratio: bool) -> Point {
        let ratio = if use_ratio { self.ratio } else { 1.0 };
        let screen = self.combined().camera_to_screen(point);
        Point::new(screen.x * ratio, screen.y * ratio)
    }

    pub fn hud_to_pos(&self, point: Pos2) -> Pos2 {
        self.hud_to_screen(point.into(), false).into()
    }

    pub fn zoom_factor(&self) -> f64 {
        self.combined().determinant().abs().sqrt()
    }

    pub fn zoom_about(&mut self, anchor: Pos2, factor: f64) -> Result<(), TransformError> {
        let anchor = Point::from(anchor);
        let hud_point = self.screen_to_hud(anchor, false)?;
        let local_anchor = self.unit.screen_to_camera(anchor)?;

        let next = (self.hud.sx * factor).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
        let uniform = next / self.hud.sx;
        self.hud.sx = next;
        self.hud.sy *= uniform;
        self.hud.x = 0.0;
        self.hud.y = 0.0;
        self.hud.update();

        let moved = self.hud.camera_to_screen(hud_point);
        self.hud.x = local_anchor.x - moved.x;
        self.hud.y = local_anchor.y - moved.y;
        self.hud.update();
        Ok(())
    }

    pub fn pan_by(&mut self, delta: Vec2) -> Result<(), TransformError> {
        let origin = self.unit.screen_to_camera(Point::default())?;
        let moved = self
            .unit
            .screen_to_camera(Point::new(f64::from(delta.x), f64::from(delta.y)))?;
        self.hud.x += moved.x - origin.x;
        self.hud.y += moved.y - origin.y;
        self.hud.update();
        Ok(())
    }

    pub fn reset_view(&mut self) {
        self.hud.reset();
        self.hud.update();
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    use super::*;

    fn posed(x: f64, y: f64, sx: f64, sy: f64, angle: f64) -> Camera {
        let mut camera = Camera::default();
        camera.x = x;
        camera.y = y;
        camera.sx = sx;
        camera.sy = sy;
        camera.angle = angle;
        camera.update();
        camera
    }

    #[test]
    fn update_applies_translate_scale_rotate_in_order() {
        let camera = posed(10.0, 20.0, 2.0, 2.0, std::f64::consts::FRAC_PI_2);

        let mapped = camera.camera_to_screen(Point::new(1.0, 0.0));

        // rotate (1,0) -> (0,1), scale -> (0,2), translate -> (10,22)
        assert_abs_diff_eq!(mapped.x, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mapped.y, 22.0, epsilon = 1e-12);
    }

    #[test]
    fn multiply_applies_other_first() {
        let a = posed(5.0, 0.0, 1.0, 1.0, 0.0);
        let b = posed(0.0, 0.0, 3.0, 3.0, 0.0);
        let point = Point::new(2.0, 1.0);

        let mut composed = a.clone();
        composed.multiply(&b);

        let expected = a.camera_to_screen(b.camera_to_screen(point));
        let actual = composed.camera_to_screen(point);
        assert_abs_diff_eq!(actual.x, expected.x, epsilon = 1e-12);
        assert_abs_diff_eq!(actual.y, expected.y, epsilon = 1e-12);
        assert_abs_diff_eq!(actual.x, 11.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_scale_is_reported_as_degenerate() {
        let camera = posed(1.0, 1.0, 0.0, 1.0, 0.0);

        let error = camera
            .screen_to_camera(Point::new(3.0, 4.0))
            .expect_err("singular matrix");

        assert!(matches!(error, TransformError::NumericDegeneracy { .. }));
    }

    #[test]
    fn reset_returns_to_identity() {
        let mut camera = posed(4.0, -2.0, 0.5, 3.0, 1.1);
        camera.reset();
        assert_eq!(camera.matrix(), IDENTITY);
    }

    #[test]
    fn zoom_about_keeps_anchor_fixed() {
        let mut rig = CameraRig::default();
        rig.apply_device(pos2(40.0, 60.0), 2.0);
        let anchor = pos2(300.0, 200.0);
        let before = rig.screen_to_hud(anchor.into(), false).expect("invertible");

        rig.zoom_about(anchor, 1.5).expect("invertible");

        let after = rig.hud_to_screen(before, false);
        assert_abs_diff_eq!(after.x, 300.0, epsilon = 1e-9);
        assert_abs_diff_eq!(after.y, 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rig.zoom_factor(), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn pan_moves_hud_content_by_screen_delta() {
        let mut rig = CameraRig::default();
        rig.apply_device(pos2(10.0, 10.0), 1.0);
        let origin = rig.hud_to_screen(Point::default(), false);

        rig.pan_by(Vec2::new(25.0, -5.0)).expect("invertible");

        let moved = rig.hud_to_screen(Point::default(), false);
        assert_abs_diff_eq!(moved.x - origin.x, 25.0, epsilon = 1e-9);
        assert_abs_diff_eq!(moved.y - origin.y, -5.0, epsilon = 1e-9);
    }

    proptest! {
        #[test]
        fn composition_matches_sequential_mapping(
            ax in -500.0f64..500.0, ay in -500.0f64..500.0,
            a_scale in 0.1f64..5.0, a_angle in -3.2f64..3.2,
            bx in -500.0f64..500.0, by in -500.0f64..500.0,
            b_scale in 0.1f64..5.0, b_angle in -3.2f64..3.2,
            px in -1000.0f64..1000.0, py in -1000.0f64..1000.0,
        ) {
            let a = posed(ax, ay, a_scale, a_scale * 0.7, a_angle);
            let b = posed(bx, by, b_scale, b_scale * 1.3, b_angle);
            let point = Point::new(px, py);

            let mut composed = a.clone();
            composed.multiply(&b);

            let expected = a.camera_to_screen(b.camera_to_screen(point));
            let actual = composed.camera_to_screen(point);
            prop_assert!((actual.x - expected.x).abs() < 1e-6);
            prop_assert!((actual.y - expected.y).abs() < 1e-6);
        }

        #[test]
        fn hud_round_trip_for_any_pose(
            origin_x in -200.0f32..200.0, origin_y in -200.0f32..200.0,
            ratio in 0.5f32..3.0,
            hx in -400.0f64..400.0, hy in -400.0f64..400.0,
            zoom in 0.25f64..6.0, angle in -3.2f64..3.2,
            px in -2000.0f64..2000.0, py in -2000.0f64..2000.0,
        ) {
            let mut rig = CameraRig::default();
            rig.hud.x = hx;
            rig.hud.y = hy;
            rig.hud.sx = zoom;
            rig.hud.sy = zoom;
            rig.hud.angle = angle;
            rig.apply_device(pos2(origin_x, origin_y), ratio);

            let point = Point::new(px, py);
            let hud = rig.screen_to_hud(point, true).expect("invertible");
            let back = rig.hud_to_screen(hud, true);

            prop_assert!((back.x - point.x).abs() < 1e-6);
            prop_assert!((back.y - point.y).abs() < 1e-6);
        }
    }
}
