//! Freehand sketch pad.
//!
//! The pad stores strokes as point lists. Rendering is left to the
//! front-end; the pad only tracks tool choice, stroke geometry, and whether
//! drawing is currently allowed.

use serde::{Deserialize, Serialize};

use examtimer_core::traits::Resettable;

/// Drawing tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
}

impl Tool {
    /// Stroke width in pixels.
    pub fn width(self) -> f32 {
        match self {
            Tool::Pen => 2.0,
            Tool::Eraser => 18.0,
        }
    }

    /// Stroke colour as a CSS hex string.
    pub fn color(self) -> &'static str {
        match self {
            Tool::Pen => "#1b1b1b",
            Tool::Eraser => "#ffffff",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub tool: Tool,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Default)]
pub struct SketchPad {
    tool: Tool,
    strokes: Vec<Stroke>,
    current: Option<Stroke>,
    locked: bool,
}

impl SketchPad {
    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.end_stroke();
        self.tool = tool;
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn is_blank(&self) -> bool {
        self.strokes.is_empty() && self.current.is_none()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Block or allow drawing. Locking finishes any stroke in progress.
    pub fn set_locked(&mut self, locked: bool) {
        if locked {
            self.end_stroke();
        }
        self.locked = locked;
    }

    /// Start a stroke at `at`. Returns `false` while the pad is locked.
    pub fn begin_stroke(&mut self, at: Point) -> bool {
        if self.locked {
            return false;
        }
        self.end_stroke();
        self.current = Some(Stroke {
            tool: self.tool,
            points: vec![at],
        });
        true
    }

    pub fn extend_stroke(&mut self, to: Point) {
        if self.locked {
            return;
        }
        if let Some(stroke) = self.current.as_mut() {
            stroke.points.push(to);
        }
    }

    pub fn end_stroke(&mut self) {
        if let Some(stroke) = self.current.take() {
            self.strokes.push(stroke);
        }
    }

    /// Draw a whole stroke through `points` in one call.
    pub fn draw(&mut self, points: &[Point]) -> bool {
        let Some((first, rest)) = points.split_first() else {
            return false;
        };
        if !self.begin_stroke(*first) {
            return false;
        }
        for p in rest {
            self.extend_stroke(*p);
        }
        self.end_stroke();
        true
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.current = None;
    }
}

impl Resettable for SketchPad {
    /// Blank canvas with the pen selected. The lock follows the session, so
    /// it is left as is.
    fn reset(&mut self) {
        self.clear();
        self.tool = Tool::Pen;
    }
}
