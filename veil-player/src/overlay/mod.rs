//! Overlay Compositor
//!
//! Stacks the synthetic layers above the embedded widget. Bottom to top:
//!
//! | z            | layer               | pointer     |
//! |--------------|---------------------|-------------|
//! | 0            | embedded widget     | (never hit) |
//! | 10           | branding blockers   | intercept   |
//! | 20           | interaction catcher | intercept   |
//! | 30           | watermark           | transparent |
//! | 40           | control surface     | intercept when visible |
//! | `i32::MAX`   | end screen          | intercept (only when active) |
//!
//! The interaction catcher spans the whole box, so the widget underneath
//! never receives pointer input. The compositor also owns the watermark
//! layout and the end-of-playback state machine.

pub mod end_screen;
pub mod watermark;

use serde::Serialize;
use veil_common::config::BlockerRect;

pub use end_screen::{EndScreen, EndScreenState, EndScreenView};
pub use watermark::{WatermarkMark, WatermarkScheduler};

/// Top edge of the control bar, percent of player height
pub const CONTROL_BAR_TOP_PERCENT: f64 = 84.0;

pub const Z_WIDGET: i32 = 0;
pub const Z_BLOCKER: i32 = 10;
pub const Z_INTERACTION: i32 = 20;
pub const Z_WATERMARK: i32 = 30;
pub const Z_CONTROLS: i32 = 40;
pub const Z_END_SCREEN: i32 = i32::MAX;

/// Axis-aligned rectangle in percent of the player box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const FULL: Rect = Rect {
        left: 0.0,
        top: 0.0,
        width: 100.0,
        height: 100.0,
    };

    /// Half-open on the far edges, except the box's own right/bottom edge
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let right = self.left + self.width;
        let bottom = self.top + self.height;
        let in_x = x >= self.left && (x < right || (right >= 100.0 && x <= 100.0));
        let in_y = y >= self.top && (y < bottom || (bottom >= 100.0 && y <= 100.0));
        in_x && in_y
    }
}

impl From<&BlockerRect> for Rect {
    fn from(b: &BlockerRect) -> Self {
        Rect {
            left: b.left_percent,
            top: b.top_percent,
            width: b.width_percent,
            height: b.height_percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Widget,
    Blocker,
    InteractionCatcher,
    Watermark,
    ControlSurface,
    EndScreen,
}

/// One entry of the rendered stack
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub kind: LayerKind,
    pub name: String,
    pub z_index: i32,
    pub rect: Rect,
    /// Receives pointer events (CSS `pointer-events: auto`)
    pub intercepts_pointer: bool,
    /// Fully hides what is beneath
    pub opaque: bool,
}

/// Owner of the layer stack, watermark layout and end screen
pub struct Compositor {
    blockers: Vec<BlockerRect>,
    watermark: WatermarkScheduler,
    end_screen: EndScreen,
}

impl Compositor {
    pub fn new(blockers: Vec<BlockerRect>, watermark: WatermarkScheduler, end_screen: EndScreen) -> Self {
        Self {
            blockers,
            watermark,
            end_screen,
        }
    }

    pub fn end_screen(&self) -> &EndScreen {
        &self.end_screen
    }

    pub fn end_screen_mut(&mut self) -> &mut EndScreen {
        &mut self.end_screen
    }

    pub fn watermark(&self) -> &WatermarkScheduler {
        &self.watermark
    }

    pub fn watermark_mut(&mut self) -> &mut WatermarkScheduler {
        &mut self.watermark
    }

    /// Layers bottom to top (z never decreases)
    pub fn layers(&self, controls_visible: bool) -> Vec<Layer> {
        let mut layers = Vec::with_capacity(self.blockers.len() + 5);

        layers.push(Layer {
            kind: LayerKind::Widget,
            name: "widget".to_string(),
            z_index: Z_WIDGET,
            rect: Rect::FULL,
            intercepts_pointer: false,
            opaque: true,
        });

        for blocker in &self.blockers {
            layers.push(Layer {
                kind: LayerKind::Blocker,
                name: blocker.name.clone(),
                z_index: Z_BLOCKER,
                rect: Rect::from(blocker),
                intercepts_pointer: true,
                opaque: true,
            });
        }

        layers.push(Layer {
            kind: LayerKind::InteractionCatcher,
            name: "interaction".to_string(),
            z_index: Z_INTERACTION,
            rect: Rect::FULL,
            intercepts_pointer: true,
            opaque: false,
        });

        layers.push(Layer {
            kind: LayerKind::Watermark,
            name: "watermark".to_string(),
            z_index: Z_WATERMARK,
            rect: Rect::FULL,
            intercepts_pointer: false,
            opaque: false,
        });

        layers.push(Layer {
            kind: LayerKind::ControlSurface,
            name: "controls".to_string(),
            z_index: Z_CONTROLS,
            rect: Rect {
                left: 0.0,
                top: CONTROL_BAR_TOP_PERCENT,
                width: 100.0,
                height: 100.0 - CONTROL_BAR_TOP_PERCENT,
            },
            intercepts_pointer: controls_visible,
            opaque: false,
        });

        if self.end_screen.is_active() {
            layers.push(Layer {
                kind: LayerKind::EndScreen,
                name: "end_screen".to_string(),
                z_index: Z_END_SCREEN,
                rect: Rect::FULL,
                intercepts_pointer: true,
                opaque: true,
            });
        }

        layers
    }

    /// Topmost layer that receives a pointer event at `(x, y)` percent
    pub fn hit_test(&self, x: f64, y: f64, controls_visible: bool) -> LayerKind {
        self.layers(controls_visible)
            .iter()
            .rev()
            .find(|l| l.intercepts_pointer && l.rect.contains(x, y))
            .map(|l| l.kind)
            .unwrap_or(LayerKind::InteractionCatcher)
    }
}
