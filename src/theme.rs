//! Theme colors loaded from Omarchy/Hyprland system theme
//! Reads colors from ~/.config/omarchy/current/theme/kitty.conf

use ratatui::style::Color;
use std::collections::HashMap;
use std::fs;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,        // Focused borders, key hints
    pub track: Color,         // Track line between markers
    pub marker: Color,        // Handle markers at rest
    pub marker_active: Color, // Dragged/selected handle marker
    pub text: Color,          // Primary text (foreground)
    pub text_dim: Color,      // Dimmed text (color8/bright black)
    pub bg_selected: Color,   // Focused input field background
    pub inactive: Color,      // Inactive borders
    pub header: Color,        // Table header text
    pub warning: Color,       // Status messages
}

impl Default for Theme {
    fn default() -> Self {
        // Fallback to Catppuccin-inspired colors if theme can't be loaded
        Self {
            accent: Color::Rgb(250, 179, 135),
            track: Color::Rgb(88, 91, 112),
            marker: Color::Rgb(205, 214, 244),
            marker_active: Color::Rgb(245, 194, 231),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(243, 139, 168),
            warning: Color::Rgb(250, 179, 135),
        }
    }
}

impl Theme {
    /// Load theme from Omarchy system theme, falling back to defaults.
    pub fn load() -> Self {
        Self::load_omarchy_theme().unwrap_or_default()
    }

    /// Load colors from Omarchy kitty.conf theme file
    fn load_omarchy_theme() -> Option<Self> {
        let home = dirs::home_dir()?;
        let theme_path = home.join(".config/omarchy/current/theme/kitty.conf");

        let content = fs::read_to_string(&theme_path).ok()?;
        let colors = Self::parse_kitty_conf(&content);

        if colors.is_empty() {
            return None;
        }

        let accent = colors
            .get("color2")
            .or(colors.get("color10"))
            .copied()
            .unwrap_or(Color::Rgb(255, 193, 7));

        let marker_active = colors
            .get("color10")
            .or(colors.get("color2"))
            .copied()
            .unwrap_or(Color::Rgb(255, 193, 7));

        let warning = colors
            .get("color4")
            .or(colors.get("color12"))
            .copied()
            .unwrap_or(Color::Rgb(230, 142, 13));

        let text = colors
            .get("foreground")
            .copied()
            .unwrap_or(Color::Rgb(190, 190, 190));

        let text_dim = colors
            .get("color8")
            .copied()
            .unwrap_or(Color::Rgb(138, 138, 141));

        let bg_selected = colors
            .get("selection_background")
            .or(colors.get("color0"))
            .copied()
            .unwrap_or(Color::Rgb(51, 51, 51));

        let inactive = colors
            .get("inactive_border_color")
            .or(colors.get("color8"))
            .copied()
            .unwrap_or(Color::Rgb(89, 89, 89));

        let header = colors
            .get("color1")
            .copied()
            .unwrap_or(Color::Rgb(211, 95, 95));

        Some(Self {
            accent,
            track: inactive,
            marker: text,
            marker_active,
            text,
            text_dim,
            bg_selected,
            inactive,
            header,
            warning,
        })
    }

    /// Parse kitty.conf format: `key value` or `key #hexcolor`
    fn parse_kitty_conf(content: &str) -> HashMap<String, Color> {
        let mut colors = HashMap::new();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.splitn(2, char::is_whitespace).collect();
            if parts.len() == 2 {
                let key = parts[0].trim();
                let value = parts[1].trim();

                if let Some(color) = Self::parse_hex_color(value) {
                    colors.insert(key.to_string(), color);
                }
            }
        }

        colors
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}
