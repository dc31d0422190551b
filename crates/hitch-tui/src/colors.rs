//! Dark terminal palette, teal accent

use ratatui::style::Color;

pub const BG: Color = Color::Rgb(0x10, 0x14, 0x16);
pub const SURFACE: Color = Color::Rgb(0x1a, 0x20, 0x23);

pub const ON_SURFACE: Color = Color::Rgb(0xdd, 0xe4, 0xe6);
pub const SUBTEXT: Color = Color::Rgb(0xb4, 0xc0, 0xc4);
pub const OUTLINE: Color = Color::Rgb(0x6f, 0x7d, 0x82);

pub const PRIMARY: Color = Color::Rgb(0x7f, 0xd6, 0xc8);
pub const PRIMARY_CONTAINER: Color = Color::Rgb(0x1f, 0x3a, 0x36);

pub const ERROR: Color = Color::Rgb(0xf2, 0x8b, 0x82);
