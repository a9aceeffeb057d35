use serde::{Deserialize, Serialize};

/// 8-bit RGBA color; alpha is coverage/opacity in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// One virtual display channel: the color contributed by a single tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LutChannel {
    color: Rgba,
}

impl LutChannel {
    pub fn new(color: Rgba) -> Self {
        Self { color }
    }

    pub fn color(&self) -> Rgba {
        self.color
    }
}
