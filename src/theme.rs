use image::Rgba;
use log::warn;
use ratatui::style::Color;

/// A 24-bit RGB value usable both by the terminal viewer and by the raster exporter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hex(pub u32);

impl Hex {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }

    pub fn color(self) -> Color {
        let (r, g, b) = self.rgb();
        Color::Rgb(r, g, b)
    }

    pub fn rgba(self) -> Rgba<u8> {
        let (r, g, b) = self.rgb();
        Rgba([r, g, b, 255])
    }
}

// Color palette structure
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Base16Palette {
    pub base_00: Hex, // Background
    pub base_01: Hex, // Lighter background
    pub base_02: Hex, // Selection background
    pub base_03: Hex, // Comments, invisibles
    pub base_04: Hex, // Dark foreground
    pub base_05: Hex, // Default foreground
    pub base_06: Hex, // Light foreground
    pub base_07: Hex, // Light background
    pub base_08: Hex, // Red
    pub base_09: Hex, // Orange
    pub base_0a: Hex, // Yellow
    pub base_0b: Hex, // Green
    pub base_0c: Hex, // Cyan
    pub base_0d: Hex, // Blue
    pub base_0e: Hex, // Purple
    pub base_0f: Hex, // Brown
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ThemeId {
    #[default]
    OceanicNext,
    CatppuccinMocha,
}

impl ThemeId {
    pub fn name(&self) -> &'static str {
        match self {
            ThemeId::OceanicNext => "Oceanic Next",
            ThemeId::CatppuccinMocha => "Catppuccin Mocha",
        }
    }

    pub fn all() -> &'static [ThemeId] {
        &[ThemeId::OceanicNext, ThemeId::CatppuccinMocha]
    }

    /// Resolve a configured theme name, case-insensitively.
    /// Unknown names fall back to Oceanic Next.
    pub fn from_name(name: &str) -> Self {
        let wanted = name.trim();
        Self::all()
            .iter()
            .copied()
            .find(|theme| theme.name().eq_ignore_ascii_case(wanted))
            .unwrap_or_else(|| {
                warn!("Unknown theme {wanted:?}, using {}", ThemeId::default().name());
                ThemeId::default()
            })
    }

    pub fn palette(&self) -> &'static Base16Palette {
        match self {
            ThemeId::OceanicNext => &OCEANIC_NEXT_PALETTE,
            ThemeId::CatppuccinMocha => &CATPPUCCIN_MOCHA_PALETTE,
        }
    }
}

// Oceanic Next theme
static OCEANIC_NEXT_PALETTE: Base16Palette = Base16Palette {
    base_00: Hex(0x1B2B34),
    base_01: Hex(0x343D46),
    base_02: Hex(0x4F5B66),
    base_03: Hex(0x65737E),
    base_04: Hex(0xA7ADBA),
    base_05: Hex(0xC0C5CE),
    base_06: Hex(0xCDD3DE),
    base_07: Hex(0xF0F4F8),
    base_08: Hex(0xEC5F67),
    base_09: Hex(0xF99157),
    base_0a: Hex(0xFAC863),
    base_0b: Hex(0x99C794),
    base_0c: Hex(0x5FB3B3),
    base_0d: Hex(0x6699CC),
    base_0e: Hex(0xC594C5),
    base_0f: Hex(0xAB7967),
};

// Catppuccin Mocha theme
// Mapped from: base=#1E1E2E, surface0=#313244, surface1=#45475A, overlay0=#6C7086
// overlay1=#7F849C, subtext0=#A6ADC8, text=#CDD6F4, rosewater=#F5E0DC
// red=#F38BA8, peach=#FAB387, yellow=#F9E2AF, green=#A6E3A1
// teal=#94E2D5, blue=#89B4FA, mauve=#CBA6F7, maroon=#EBA0AC
static CATPPUCCIN_MOCHA_PALETTE: Base16Palette = Base16Palette {
    base_00: Hex(0x1E1E2E),
    base_01: Hex(0x313244),
    base_02: Hex(0x45475A),
    base_03: Hex(0x6C7086),
    base_04: Hex(0x7F849C),
    base_05: Hex(0xA6ADC8),
    base_06: Hex(0xCDD6F4),
    base_07: Hex(0xF5E0DC),
    base_08: Hex(0xF38BA8),
    base_09: Hex(0xFAB387),
    base_0a: Hex(0xF9E2AF),
    base_0b: Hex(0xA6E3A1),
    base_0c: Hex(0x94E2D5),
    base_0d: Hex(0x89B4FA),
    base_0e: Hex(0xCBA6F7),
    base_0f: Hex(0xEBA0AC),
};

impl Base16Palette {
    /// Row background used for emphasized lines in the viewer.
    pub fn emphasis_background(&self) -> Color {
        self.base_01.color()
    }

    /// Marker and gutter color for emphasized lines.
    pub fn emphasis_marker(&self) -> Color {
        self.base_0a.color()
    }

    // Border color for focused/idle panels
    pub fn border_color(&self, is_busy: bool) -> Color {
        if is_busy {
            self.base_0d.color()
        } else {
            self.base_03.color()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_splits_into_channels() {
        assert_eq!(Hex(0x1B2B34).rgb(), (0x1B, 0x2B, 0x34));
        assert_eq!(Hex(0xFAC863).color(), Color::Rgb(0xFA, 0xC8, 0x63));
        assert_eq!(Hex(0x000000).rgba(), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn theme_names_resolve_case_insensitively() {
        assert_eq!(ThemeId::from_name("catppuccin mocha"), ThemeId::CatppuccinMocha);
        assert_eq!(ThemeId::from_name(" Oceanic Next "), ThemeId::OceanicNext);
        assert_eq!(ThemeId::from_name("solarized"), ThemeId::OceanicNext);
    }

    #[test]
    fn each_theme_has_its_own_palette() {
        assert_ne!(
            ThemeId::OceanicNext.palette(),
            ThemeId::CatppuccinMocha.palette()
        );
    }
}
