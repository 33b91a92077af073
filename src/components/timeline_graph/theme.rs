//! Visual theming for the timeline canvas.
//!
//! Provides colors and the per-variant visual style.

use super::types::Variant;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * f) as u8,
			g: (self.g as f64 * f) as u8,
			b: (self.b as f64 * f) as u8,
			a: self.a,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Background style configuration.
#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	pub color: Color,
	/// Centre color of the radial gradient
	pub color_secondary: Color,
	pub use_gradient: bool,
}

/// Edge visual style.
#[derive(Clone, Debug)]
pub struct EdgeStyle {
	pub color: Color,
	/// Milestone edges that open a segment
	pub segment_color: Color,
	pub width: f64,
	/// Dash pattern for page path edges
	pub dash: (f64, f64),
	pub label_color: Color,
}

/// Node visual style.
#[derive(Clone, Debug)]
pub struct NodeStyle {
	pub fill: Color,
	/// Ring drawn around the current node
	pub current_ring: Color,
	pub ring_width: f64,
	/// Fill of the previous/next section pills
	pub section_fill: Color,
	pub use_gradient: bool,
	pub label_color: Color,
	pub label_font: &'static str,
	/// Border drawn on draggable nodes while the layout is unlocked
	pub edit_border: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	pub name: &'static str,
	pub background: BackgroundStyle,
	pub edge: EdgeStyle,
	pub node: NodeStyle,
}

impl Theme {
	/// Slate blues (default)
	pub fn slate() -> Self {
		Self {
			name: "slate",
			background: BackgroundStyle {
				color: Color::rgb(22, 27, 34),
				color_secondary: Color::rgb(30, 35, 42),
				use_gradient: true,
			},
			edge: EdgeStyle {
				color: Color::rgba(140, 160, 180, 0.5),
				segment_color: Color::rgba(129, 161, 193, 0.8),
				width: 3.0,
				dash: (10.0, 6.0),
				label_color: Color::rgba(220, 225, 235, 0.85),
			},
			node: NodeStyle {
				fill: Color::rgb(94, 129, 172),
				current_ring: Color::rgb(235, 203, 139),
				ring_width: 5.0,
				section_fill: Color::rgb(67, 76, 94),
				use_gradient: true,
				label_color: Color::rgba(255, 255, 255, 0.9),
				label_font: "600 16px sans-serif",
				edit_border: Color::rgba(255, 255, 255, 0.6),
			},
		}
	}

	/// Warm tones for the decorated variant
	pub fn ember() -> Self {
		Self {
			name: "ember",
			background: BackgroundStyle {
				color: Color::rgb(28, 24, 22),
				color_secondary: Color::rgb(35, 30, 28),
				use_gradient: true,
			},
			edge: EdgeStyle {
				color: Color::rgba(160, 130, 110, 0.5),
				segment_color: Color::rgba(185, 145, 110, 0.85),
				width: 3.0,
				dash: (10.0, 6.0),
				label_color: Color::rgba(240, 225, 210, 0.85),
			},
			node: NodeStyle {
				fill: Color::rgb(180, 120, 100),
				current_ring: Color::rgb(250, 190, 80),
				ring_width: 5.0,
				section_fill: Color::rgb(90, 70, 60),
				use_gradient: true,
				label_color: Color::rgba(255, 250, 240, 0.9),
				label_font: "600 16px sans-serif",
				edit_border: Color::rgba(255, 240, 220, 0.6),
			},
		}
	}

	pub fn for_variant(variant: Variant) -> Self {
		match variant {
			Variant::Plain => Self::slate(),
			Variant::Decorated => Self::ember(),
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::slate()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn css_output_drops_alpha_when_opaque() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(
			Color::rgb(10, 20, 30).with_alpha(0.5).to_css(),
			"rgba(10, 20, 30, 0.5)"
		);
	}

	#[test]
	fn lighten_and_darken_hit_the_extremes() {
		let c = Color::rgb(100, 100, 100);
		assert_eq!(c.lighten(1.0), Color::rgb(255, 255, 255));
		assert_eq!(c.darken(1.0), Color::rgb(0, 0, 0));
		assert_eq!(c.lighten(0.0), c);
	}
}
