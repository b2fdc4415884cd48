use std::f32::consts::{PI, TAU};

use eframe::egui::{Rect, Vec2, vec2};
use rand::Rng;

use super::{Bubble, Derivation, Registry};
use crate::util::{deflate_rect, format_label};

const JITTER_INTERVAL_SECS: f64 = 5.0;
const JITTER_IMPULSE: f32 = 1.5;
const SPAWN_SPEED: f32 = 5.0;
const TARGET_FILL: f32 = 0.8;
const WALL_DAMPING: f32 = 0.8;
const WALL_REST_SPEED: f32 = 0.05;
const BORDER_RATIO: f32 = 0.05;
const MIN_SCALE: f32 = 0.3;
const SCALE_RANGE: f32 = 0.7;

pub fn unit_for(viewport: Rect) -> f32 {
    viewport.width().min(viewport.height()).max(0.0) / 100.0
}

pub fn layout_rect(viewport: Rect, unit: f32) -> Rect {
    if viewport.width() >= viewport.height() {
        deflate_rect(viewport, unit, unit * 15.0)
    } else {
        deflate_rect(viewport, unit, unit * 30.0).translate(vec2(0.0, unit * 5.0))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StepInput {
    pub elapsed: f32,
    pub rect: Rect,
    pub unit: f32,
    pub derivation: Derivation,
    pub now_secs: f64,
}

#[derive(Debug, Default)]
pub struct Simulation {
    last_jitter_secs: Option<f64>,
}

fn visual_scale(value: f64, max_value: f64) -> f32 {
    if max_value <= 0.0 || !max_value.is_finite() || !value.is_finite() {
        return MIN_SCALE;
    }
    let ratio = (value.abs() / max_value).clamp(0.0, 1.0) as f32;
    MIN_SCALE + (SCALE_RANGE * ratio.powf(0.25))
}

fn shared_max_radius(rect: Rect, count: usize, total_scale: f32) -> f32 {
    if count == 0 || total_scale <= 0.0 {
        return 0.0;
    }
    let area = rect.width() * rect.height();
    let mean_scale = total_scale / count as f32;
    ((TARGET_FILL * area) / (PI * count as f32 * mean_scale * mean_scale)).sqrt()
}

fn easing_factor(unit: f32, elapsed: f32) -> f32 {
    (unit * elapsed).min(unit).clamp(0.0, 1.0)
}

fn bounce(velocity: f32) -> f32 {
    let reflected = -velocity * WALL_DAMPING;
    if reflected.abs() < WALL_REST_SPEED {
        0.0
    } else {
        reflected
    }
}

fn contain(bubble: &mut Bubble, rect: Rect) {
    let radius = bubble.radius;

    if bubble.position.x - radius < rect.left() {
        bubble.position.x = rect.left() + radius;
        bubble.velocity.x = bounce(bubble.velocity.x);
    } else if bubble.position.x + radius > rect.right() {
        bubble.position.x = rect.right() - radius;
        bubble.velocity.x = bounce(bubble.velocity.x);
    }

    if bubble.position.y - radius < rect.top() {
        bubble.position.y = rect.top() + radius;
        bubble.velocity.y = bounce(bubble.velocity.y);
    } else if bubble.position.y + radius > rect.bottom() {
        bubble.position.y = rect.bottom() - radius;
        bubble.velocity.y = bounce(bubble.velocity.y);
    }
}

fn collide(a: &mut Bubble, b: &mut Bubble, first: usize, second: usize) {
    let delta = b.position - a.position;
    let distance_sq = delta.length_sq();
    let reach = a.radius + b.radius;
    if distance_sq >= reach * reach {
        return;
    }

    let distance = distance_sq.sqrt();
    let normal = if distance > 0.0001 {
        delta / distance
    } else {
        let angle = ((first as f32) * 0.618_034 + (second as f32) * 0.414_214) * TAU;
        vec2(angle.cos(), angle.sin())
    };

    let overlap = (reach - distance) * 0.5;
    a.position -= normal * overlap;
    b.position += normal * overlap;

    let closing = (b.velocity - a.velocity).dot(normal);
    if closing > 0.0 {
        return;
    }
    a.velocity += normal * closing;
    b.velocity -= normal * closing;
}

fn resolve_collisions(bubbles: &mut [&mut Bubble]) {
    for first in 0..bubbles.len() {
        for second in (first + 1)..bubbles.len() {
            let (head, tail) = bubbles.split_at_mut(second);
            collide(&mut *head[first], &mut *tail[0], first, second);
        }
    }
}

fn random_impulse<R: Rng + ?Sized>(rng: &mut R, magnitude: f32) -> Vec2 {
    vec2(
        rng.gen_range(-magnitude..=magnitude),
        rng.gen_range(-magnitude..=magnitude),
    )
}

impl Simulation {
    pub fn step<R: Rng + ?Sized>(&mut self, registry: &mut Registry, input: StepInput, rng: &mut R) {
        let Registry {
            bubbles,
            pool_colors,
            ..
        } = registry;
        if bubbles.is_empty() {
            return;
        }

        let metric = input.derivation.metric();
        let mut max_value = 0.0_f64;
        for bubble in bubbles.values_mut() {
            let derived = input.derivation.derive(&bubble.data);
            bubble.value = derived.value;
            bubble.sign = derived.sign;
            bubble.display_label = format_label(derived.value, metric);
            if derived.value.is_finite() {
                max_value = max_value.max(derived.value.abs());
            }
        }

        let center = input.rect.center().to_vec2();
        let mut total_scale = 0.0;
        for bubble in bubbles.values_mut() {
            if !bubble.initialized {
                bubble.initialized = true;
                bubble.position = center;
                bubble.velocity = random_impulse(rng, SPAWN_SPEED);
                bubble.scale = 1.0;
                bubble.pool_color = pool_colors.get(&bubble.data.pool_id).copied();
            }
            bubble.scale = visual_scale(bubble.value, max_value);
            total_scale += bubble.scale;
        }

        let max_radius = shared_max_radius(input.rect, bubbles.len(), total_scale);
        let easing = easing_factor(input.unit, input.elapsed);
        let travel = input.elapsed * input.unit;
        for bubble in bubbles.values_mut() {
            bubble.target_radius = bubble.scale * max_radius;
            bubble.border = max_radius * BORDER_RATIO;
            bubble.radius =
                (bubble.radius + ((bubble.target_radius - bubble.radius) * easing)).max(0.0);

            bubble.position += bubble.velocity * travel;
            contain(bubble, input.rect);
        }

        let mut ordered = bubbles.values_mut().collect::<Vec<_>>();
        resolve_collisions(&mut ordered);

        let jitter_due = self
            .last_jitter_secs
            .is_none_or(|last| input.now_secs - last > JITTER_INTERVAL_SECS);
        if jitter_due {
            for bubble in ordered {
                bubble.velocity += random_impulse(rng, JITTER_IMPULSE);
            }
            self.last_jitter_secs = Some(input.now_secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use eframe::egui::pos2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::bubbles::tests::record;
    use crate::bubbles::{Mode, Metric};

    fn viewport() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0))
    }

    fn input(now_secs: f64) -> StepInput {
        StepInput {
            elapsed: 1.0 / 60.0,
            rect: viewport(),
            unit: unit_for(viewport()),
            derivation: Derivation::select(Mode::Supply, Metric::DeltaTotal),
            now_secs,
        }
    }

    fn registry_with(deltas: &[f64]) -> Registry {
        let mut registry = Registry::default();
        registry.reconcile(
            deltas
                .iter()
                .enumerate()
                .map(|(index, delta)| record("P1", &format!("A{index}"), 100.0, *delta))
                .collect(),
        );
        registry
    }

    fn bare_bubble(x: f32, y: f32, radius: f32) -> Bubble {
        let mut registry = registry_with(&[1.0]);
        let key = registry.iter().next().expect("bubble").key.clone();
        let mut bubble = registry.bubbles.shift_remove(&key).expect("bubble");
        bubble.position = vec2(x, y);
        bubble.radius = radius;
        bubble.initialized = true;
        bubble
    }

    #[test]
    fn layout_rect_reserves_header_space() {
        let landscape = layout_rect(viewport(), 6.0);
        assert_eq!(landscape.left(), 6.0);
        assert_eq!(landscape.top(), 90.0);
        assert_eq!(landscape.height(), 420.0);

        let portrait = Rect::from_min_size(pos2(0.0, 0.0), vec2(400.0, 800.0));
        let rect = layout_rect(portrait, 4.0);
        assert_eq!(rect.top(), 140.0);
        assert_eq!(rect.height(), 560.0);
    }

    #[test]
    fn first_tick_spawns_at_center() {
        let mut registry = registry_with(&[5.0, -3.0]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut step = input(0.0);
        step.elapsed = 0.0;

        Simulation::default().step(&mut registry, step, &mut rng);

        for bubble in registry.iter() {
            assert!(bubble.initialized);
            assert_eq!(bubble.position, viewport().center().to_vec2());
            assert!(bubble.velocity.x.abs() <= SPAWN_SPEED + JITTER_IMPULSE);
            assert!(bubble.velocity.y.abs() <= SPAWN_SPEED + JITTER_IMPULSE);
            assert!(bubble.pool_color.is_some());
        }
    }

    #[test]
    fn derivation_sets_value_sign_and_label() {
        let mut registry = registry_with(&[10.0, -20.0]);
        let mut rng = StdRng::seed_from_u64(1);

        Simulation::default().step(&mut registry, input(0.0), &mut rng);

        let bubbles = registry.iter().collect::<Vec<_>>();
        assert!((bubbles[0].value - 0.1).abs() < 1e-12);
        assert!(bubbles[0].sign);
        assert_eq!(bubbles[0].display_label, "+10.00%");
        assert!(!bubbles[1].sign);
        assert_relative_eq!(bubbles[1].scale, 1.0);
    }

    #[test]
    fn radius_approaches_target_monotonically() {
        let mut registry = registry_with(&[10.0, -20.0, 3.0, 0.5, 40.0]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut simulation = Simulation::default();
        simulation.step(&mut registry, input(0.0), &mut rng);

        for frame in 1..30 {
            let before = registry
                .iter()
                .map(|bubble| (bubble.target_radius - bubble.radius).abs())
                .collect::<Vec<_>>();

            simulation.step(&mut registry, input(f64::from(frame) / 60.0), &mut rng);

            for (bubble, gap_before) in registry.iter().zip(before) {
                let gap_after = (bubble.target_radius - bubble.radius).abs();
                assert!(bubble.radius >= 0.0);
                assert!(bubble.radius <= bubble.target_radius);
                assert!(gap_after < gap_before, "gap grew on frame {frame}");
            }
        }
    }

    #[test]
    fn equal_scales_fill_eighty_percent_of_area() {
        let mut registry = registry_with(&[5.0, 5.0, 5.0, 5.0]);
        let mut rng = StdRng::seed_from_u64(11);

        Simulation::default().step(&mut registry, input(0.0), &mut rng);

        let area = viewport().width() * viewport().height();
        let covered = registry
            .iter()
            .map(|bubble| PI * bubble.target_radius * bubble.target_radius)
            .sum::<f32>();
        assert_relative_eq!(covered, 0.8 * area, max_relative = 1e-4);
    }

    #[test]
    fn mixed_scales_fill_within_bound() {
        let mut registry = registry_with(&[100.0, 1.0, 0.0, -30.0, 0.01, 7.0]);
        let mut rng = StdRng::seed_from_u64(5);

        Simulation::default().step(&mut registry, input(0.0), &mut rng);

        let area = viewport().width() * viewport().height();
        let covered = registry
            .iter()
            .map(|bubble| PI * bubble.target_radius * bubble.target_radius)
            .sum::<f32>();
        let fill = covered / area;
        assert!(fill >= 0.8 - 1e-4, "fill {fill}");
        assert!(fill <= 0.8 * 1.41, "fill {fill}");
    }

    #[test]
    fn zero_values_use_minimum_scale() {
        let mut registry = registry_with(&[0.0, 0.0]);
        let mut rng = StdRng::seed_from_u64(2);

        Simulation::default().step(&mut registry, input(0.0), &mut rng);

        assert!(registry.iter().all(|bubble| bubble.scale == MIN_SCALE));
    }

    #[test]
    fn incomplete_data_simulates_without_nan() {
        let mut registry = Registry::default();
        registry.reconcile(vec![Default::default(), record("P2", "USDC", 0.0, 3.0)]);
        let mut rng = StdRng::seed_from_u64(9);
        let mut simulation = Simulation::default();

        for frame in 0..10 {
            simulation.step(&mut registry, input(f64::from(frame)), &mut rng);
        }

        for bubble in registry.iter() {
            assert!(bubble.position.x.is_finite() && bubble.position.y.is_finite());
            assert!(bubble.radius.is_finite());
        }
    }

    #[test]
    fn wall_contact_clamps_and_damps() {
        let rect = viewport();
        let mut bubble = bare_bubble(5.0, 300.0, 20.0);
        bubble.velocity = vec2(-2.0, 0.0);

        contain(&mut bubble, rect);

        assert_eq!(bubble.position.x, 20.0);
        assert!((bubble.velocity.x - 1.6).abs() < 1e-6);

        let mut slow = bare_bubble(300.0, 595.0, 10.0);
        slow.velocity = vec2(0.0, 0.05);
        contain(&mut slow, rect);
        assert_eq!(slow.position.y, 590.0);
        assert_eq!(slow.velocity.y, 0.0);
    }

    #[test]
    fn collision_separates_and_stops_closing_pair() {
        let mut a = bare_bubble(100.0, 100.0, 20.0);
        let mut b = bare_bubble(130.0, 100.0, 20.0);
        a.velocity = vec2(2.0, 0.0);
        b.velocity = vec2(-1.0, 0.0);
        let before = (b.position - a.position).length();

        collide(&mut a, &mut b, 0, 1);

        let after = (b.position - a.position).length();
        assert!(after >= before);
        assert!((after - 40.0).abs() < 1e-4);
        assert!((b.velocity - a.velocity).x >= 0.0);
    }

    #[test]
    fn separating_pair_keeps_velocities() {
        let mut a = bare_bubble(100.0, 100.0, 20.0);
        let mut b = bare_bubble(110.0, 100.0, 20.0);
        a.velocity = vec2(-1.0, 0.0);
        b.velocity = vec2(1.0, 0.0);

        collide(&mut a, &mut b, 0, 1);

        assert_eq!(a.velocity, vec2(-1.0, 0.0));
        assert_eq!(b.velocity, vec2(1.0, 0.0));
        assert!((b.position - a.position).length() > 10.0);
    }

    #[test]
    fn coincident_centers_are_pushed_apart() {
        let mut a = bare_bubble(50.0, 50.0, 10.0);
        let mut b = bare_bubble(50.0, 50.0, 10.0);

        collide(&mut a, &mut b, 0, 1);

        assert!((b.position - a.position).length() > 19.0);
    }

    #[test]
    fn collision_pass_never_shrinks_overlapping_distances() {
        let mut bubbles = vec![
            bare_bubble(100.0, 100.0, 30.0),
            bare_bubble(120.0, 110.0, 25.0),
            bare_bubble(90.0, 130.0, 20.0),
        ];
        bubbles[0].velocity = vec2(1.0, 1.0);
        bubbles[1].velocity = vec2(-1.0, 0.5);
        let before = (bubbles[1].position - bubbles[0].position).length();

        let (first, rest) = bubbles.split_at_mut(1);
        collide(&mut first[0], &mut rest[0], 0, 1);

        let after = (bubbles[1].position - bubbles[0].position).length();
        assert!(after >= before);

        let mut refs = bubbles.iter_mut().collect::<Vec<_>>();
        resolve_collisions(&mut refs);
        assert!(bubbles.iter().all(|bubble| bubble.position.x.is_finite()));
    }

    #[test]
    fn jitter_fires_on_interval() {
        let mut registry = registry_with(&[1.0]);
        let mut rng = StdRng::seed_from_u64(42);
        let mut simulation = Simulation::default();
        let mut frozen = input(0.0);
        frozen.elapsed = 0.0;

        simulation.step(&mut registry, frozen, &mut rng);
        for bubble in registry.iter_mut() {
            bubble.velocity = Vec2::ZERO;
        }

        frozen.now_secs = 4.0;
        simulation.step(&mut registry, frozen, &mut rng);
        assert!(registry.iter().all(|bubble| bubble.velocity == Vec2::ZERO));

        frozen.now_secs = 5.5;
        simulation.step(&mut registry, frozen, &mut rng);
        assert!(registry.iter().all(|bubble| {
            bubble.velocity != Vec2::ZERO
                && bubble.velocity.x.abs() <= JITTER_IMPULSE
                && bubble.velocity.y.abs() <= JITTER_IMPULSE
        }));
    }
}
