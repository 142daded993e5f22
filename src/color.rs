//! Color values used by light parameterization.

pub use rgb::Rgba;

/// The color type used throughout viewtree. RGBA with f32 components in [0.0, 1.0].
pub type Color = Rgba<f32>;

/// Black (0, 0, 0).
pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

/// White (255, 255, 255).
pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

/// Red (255, 0, 0).
pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);

/// Green (0, 255, 0).
pub const GREEN: Color = Color::new(0.0, 1.0, 0.0, 1.0);

/// Blue (0, 0, 255).
pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);

/// Gray (128, 128, 128).
pub const GRAY: Color = Color::new(0.5, 0.5, 0.5, 1.0);
