use ratatui::style::Color;

// Cinema palette: warm accent on a dark screen
pub const ACCENT: Color = Color::Rgb(229, 9, 20); // Marquee red
pub const ACCENT_SOFT: Color = Color::Rgb(255, 120, 110);
pub const GOLD: Color = Color::Rgb(255, 200, 80); // Quality badges, "see all"
pub const CYAN: Color = Color::Rgb(0, 200, 255);
pub const SUCCESS: Color = Color::Rgb(57, 220, 120);
pub const ERROR: Color = Color::Rgb(255, 80, 80);

pub const TEXT_PRIMARY: Color = Color::White;
pub const TEXT_SECONDARY: Color = Color::Rgb(200, 200, 200);
pub const TEXT_DIM: Color = Color::Rgb(120, 120, 120);
pub const BORDER: Color = Color::Rgb(90, 90, 90);
pub const HIGHLIGHT_BG: Color = Color::Rgb(60, 20, 20);
