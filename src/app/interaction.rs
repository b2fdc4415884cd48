use eframe::egui::{Pos2, vec2};

use crate::bubbles::{BubbleKey, Registry};
use crate::util::point_in_circle;

const TAP_MAX_SECS: f64 = 0.3;
const CLEAR_DELAY_SECS: f64 = 0.1;
const TOOLTIP_OFFSET: f32 = 15.0;

#[derive(Clone, Debug, PartialEq)]
pub struct TooltipTarget {
    pub key: BubbleKey,
    pub screen_pos: Pos2,
}

#[derive(Debug, Default)]
pub struct Gestures {
    start_secs: Option<f64>,
    candidate: Option<BubbleKey>,
    tooltip: Option<TooltipTarget>,
    clear_at: Option<f64>,
}

fn hit(registry: &Registry, point: Pos2) -> Option<BubbleKey> {
    registry
        .iter()
        .find(|bubble| point_in_circle(point, bubble.center(), bubble.radius))
        .map(|bubble| bubble.key.clone())
}

impl Gestures {
    pub fn tooltip(&self) -> Option<&TooltipTarget> {
        self.tooltip.as_ref()
    }

    pub fn clear(&mut self, registry: &mut Registry) {
        for bubble in registry.iter_mut() {
            bubble.hover = false;
        }
        self.tooltip = None;
    }

    pub fn touch_start(&mut self, registry: &mut Registry, point: Pos2, now: f64) {
        self.clear_at = None;
        self.clear(registry);
        self.start_secs = Some(now);
        self.candidate = hit(registry, point);

        if let Some(bubble) = self
            .candidate
            .as_ref()
            .and_then(|key| registry.get_mut(key))
        {
            bubble.hover = true;
        }
    }

    pub fn touch_move(&mut self, registry: &mut Registry, point: Pos2, screen: Pos2) {
        let hovered = hit(registry, point);
        for bubble in registry.iter_mut() {
            bubble.hover = hovered.as_ref() == Some(&bubble.key);
        }

        self.tooltip = hovered.map(|key| TooltipTarget {
            key,
            screen_pos: screen + vec2(TOOLTIP_OFFSET, TOOLTIP_OFFSET),
        });
    }

    pub fn touch_end(&mut self, registry: &Registry, now: f64) -> Option<BubbleKey> {
        let started = self.start_secs.take();
        let candidate = self.candidate.take();
        self.clear_at = Some(now + CLEAR_DELAY_SECS);

        let quick = started.is_some_and(|start| now - start < TAP_MAX_SECS);
        candidate.filter(|key| {
            quick
                && !key.pool_id.is_empty()
                && registry.get(key).is_some_and(|bubble| bubble.hover)
        })
    }

    pub fn tick(&mut self, registry: &mut Registry, now: f64) {
        if self.clear_at.is_some_and(|at| now >= at) {
            self.clear_at = None;
            self.clear(registry);
        }
    }
}
