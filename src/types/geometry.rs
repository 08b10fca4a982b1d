use serde::{Deserialize, Serialize};

/// Size of the host window's client area in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A rectangle in logical pixels, relative to the host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// The zero-area rectangle used to keep inactive surfaces resident but hidden.
    pub const ZERO: Rect = Rect {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the rectangle covers a strictly positive area.
    pub fn is_visible(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Builds a rect from a DOMRect-like JSON object (`x`/`left`, `y`/`top`,
    /// `width`, `height`). Fractional values are rounded.
    pub fn from_json(value: &serde_json::Value) -> Option<Rect> {
        let num = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| value.get(*k).and_then(|v| v.as_f64()))
        };
        let x = num(&["x", "left"])?;
        let y = num(&["y", "top"])?;
        let width = num(&["width"])?;
        let height = num(&["height"])?;
        if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite()) {
            return None;
        }
        Some(Rect {
            x: x.round() as i32,
            y: y.round() as i32,
            width: width.max(0.0).round() as u32,
            height: height.max(0.0).round() as u32,
        })
    }

    /// Fallback content region: the full window minus a strip reserved for chrome.
    pub fn below_chrome(window: Size, top_offset: u32) -> Rect {
        Rect {
            x: 0,
            y: top_offset as i32,
            width: window.width,
            height: window.height.saturating_sub(top_offset),
        }
    }
}
