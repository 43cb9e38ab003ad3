//! Fixed colour palettes used by the procedural effects.

use rand::Rng;

/// An ordered, non-empty list of RGB colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    name: &'static str,
    colors: &'static [[u8; 3]],
}

/// Lospec "Soda-Cap".
pub const SODA_CAP: Palette = Palette {
    name: "soda-cap",
    colors: &[[33, 118, 204], [255, 125, 110], [252, 166, 172], [232, 231, 203]],
};

/// Lospec "Moonlight GB".
pub const MOONLIGHT_GB: Palette = Palette {
    name: "moonlight-gb",
    colors: &[[15, 5, 45], [32, 54, 113], [54, 134, 143], [95, 199, 93]],
};

/// Lospec "Funky Future 8".
pub const FUNKY_FUTURE: Palette = Palette {
    name: "funky-future",
    colors: &[
        [43, 15, 84],
        [171, 31, 101],
        [255, 79, 105],
        [255, 247, 248],
        [255, 129, 66],
        [255, 218, 69],
        [51, 104, 220],
        [73, 231, 236],
    ],
};

impl Palette {
    /// Palette name for log fields.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of colours.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; palettes are declared non-empty.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colour at `index`; indices past the end return the last colour.
    pub fn color(&self, index: usize) -> [u8; 3] {
        self.colors[index.min(self.colors.len() - 1)]
    }

    /// A uniformly chosen colour.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> [u8; 3] {
        self.colors[rng.gen_range(0..self.colors.len())]
    }
}
