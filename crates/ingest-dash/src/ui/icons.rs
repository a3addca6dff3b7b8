//! Navigation glyphs.
//!
//! The set is closed: every screen maps to exactly one variant and every
//! variant has a glyph, so there is no lookup that can miss.

use crate::app::Screen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
  Home,
  Database,
  Play,
  Rows,
  Tree,
  Chart,
  /// Generic marker for anything without its own glyph.
  Dot,
}

impl Icon {
  pub fn glyph(self) -> &'static str {
    match self {
      Self::Home => "⌂",
      Self::Database => "≣",
      Self::Play => "▶",
      Self::Rows => "☰",
      Self::Tree => "⋔",
      Self::Chart => "▥",
      Self::Dot => "•",
    }
  }
}

impl From<Screen> for Icon {
  fn from(screen: Screen) -> Self {
    match screen {
      Screen::Dashboard => Self::Home,
      Screen::Sources => Self::Database,
      Screen::Demo => Self::Play,
      Screen::Records => Self::Rows,
      Screen::Schema => Self::Tree,
      Screen::Visualize => Self::Chart,
    }
  }
}
