use crate::core::appearance::ThemeMode;
use crate::ui::builtin_themes::{find_builtin_theme, ThemeSpec};
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    // Overall background color to paint the full frame
    pub background_color: Color,
    // Sidebar, cards and dialogs sit on the surface color
    pub surface_color: Color,

    // Conversation
    pub text_style: Style,
    pub muted_style: Style,
    pub user_text_style: Style,
    pub assistant_text_style: Style,
    pub emphasis_style: Style,
    pub error_style: Style,

    // Chrome
    pub accent_style: Style,
    pub title_style: Style,
    pub border_style: Style,
    pub selection_style: Style,
    pub card_style: Style,

    // Input area
    pub input_text_style: Style,
    pub input_placeholder_style: Style,
    pub input_cursor_style: Style,
}

impl Theme {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark(),
        }
    }

    pub fn dark() -> Self {
        // Prefer the built-in theme for consistent RGB colors
        if let Some(spec) = find_builtin_theme("dark") {
            return Self::from_spec(&spec);
        }
        // Fallback palette-based theme
        Theme {
            background_color: Color::Black,
            surface_color: Color::Black,
            text_style: Style::default().fg(Color::White),
            muted_style: Style::default().fg(Color::DarkGray),
            user_text_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::White),
            emphasis_style: Style::default().add_modifier(Modifier::BOLD),
            error_style: Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),

            accent_style: Style::default().fg(Color::LightBlue),
            title_style: Style::default().fg(Color::Gray),
            border_style: Style::default().fg(Color::DarkGray),
            selection_style: Style::default().bg(Color::Blue),
            card_style: Style::default().fg(Color::Gray),

            input_text_style: Style::default().fg(Color::White),
            input_placeholder_style: Style::default().fg(Color::DarkGray),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    pub fn light() -> Self {
        if let Some(spec) = find_builtin_theme("light") {
            return Self::from_spec(&spec);
        }
        Theme {
            background_color: Color::White,
            surface_color: Color::White,
            text_style: Style::default().fg(Color::Black),
            muted_style: Style::default().fg(Color::DarkGray),
            user_text_style: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::Black),
            emphasis_style: Style::default().add_modifier(Modifier::BOLD),
            error_style: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),

            accent_style: Style::default().fg(Color::Blue),
            title_style: Style::default().fg(Color::DarkGray),
            border_style: Style::default().fg(Color::Gray),
            selection_style: Style::default().bg(Color::LightBlue),
            card_style: Style::default().fg(Color::DarkGray),

            input_text_style: Style::default().fg(Color::Black),
            input_placeholder_style: Style::default().fg(Color::Gray),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    pub fn from_spec(spec: &ThemeSpec) -> Self {
        let background_color = spec
            .background
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(Color::Reset);
        let surface_color = spec
            .surface
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(background_color);
        let selection_style = match spec.selection.as_deref().and_then(parse_color) {
            Some(color) => Style::default().bg(color),
            None => Style::default().add_modifier(Modifier::REVERSED),
        };

        Theme {
            background_color,
            surface_color,
            text_style: parse_style(&spec.text),
            muted_style: parse_style(&spec.muted),
            user_text_style: parse_style(&spec.user_text),
            assistant_text_style: parse_style(&spec.assistant_text),
            emphasis_style: parse_style(&spec.emphasis),
            error_style: parse_style(&spec.error),

            accent_style: parse_style(&spec.accent),
            title_style: parse_style(&spec.title),
            border_style: parse_style(&spec.border),
            selection_style,
            card_style: parse_style(&spec.card),

            input_text_style: parse_style(&spec.input_text),
            input_placeholder_style: parse_style(&spec.input_placeholder),
            input_cursor_style: parse_modifiers(spec.input_cursor_modifiers.as_deref()),
        }
    }
}

fn parse_color(s: &str) -> Option<Color> {
    let lower = s.trim().to_ascii_lowercase();
    // Hex: #rgb or #rrggbb
    if let Some(c) = parse_hex_color(&lower) {
        return Some(c);
    }
    // rgb(r,g,b)
    if let Some(c) = parse_rgb_func(&lower) {
        return Some(c);
    }
    match lower.as_str() {
        "black" => Some(Color::Black),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "dark_gray" | "dark-grey" | "darkgray" => Some(Color::DarkGray),
        "red" => Some(Color::Red),
        "light_red" | "light-red" => Some(Color::LightRed),
        "green" => Some(Color::Green),
        "blue" => Some(Color::Blue),
        "light_blue" | "light-blue" => Some(Color::LightBlue),
        "cyan" => Some(Color::Cyan),
        "magenta" => Some(Color::Magenta),
        "yellow" => Some(Color::Yellow),
        "reset" => Some(Color::Reset),
        _ => None,
    }
}

fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

fn parse_rgb_func(s: &str) -> Option<Color> {
    let content = s.strip_prefix("rgb(")?.strip_suffix(')')?;
    let parts: Vec<_> = content
        .split([',', ' '])
        .filter(|t| !t.is_empty())
        .collect();
    if parts.len() != 3 {
        return None;
    }
    let r = parts[0].parse::<u16>().ok()?;
    let g = parts[1].parse::<u16>().ok()?;
    let b = parts[2].parse::<u16>().ok()?;
    Some(Color::Rgb(
        r.min(255) as u8,
        g.min(255) as u8,
        b.min(255) as u8,
    ))
}

fn parse_style(s: &Option<String>) -> Style {
    let mut style = Style::default();
    if let Some(ref spec) = s {
        for tok in spec.split(',').map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if let Some(color) = parse_color(tok) {
                style = style.fg(color);
            } else {
                style = style.patch(parse_modifiers(Some(tok)));
            }
        }
    }
    style
}

fn parse_modifiers(s: Option<&str>) -> Style {
    let mut style = Style::default();
    for tok in s.unwrap_or_default().split(',').map(|t| t.trim()) {
        match tok.to_ascii_lowercase().as_str() {
            "bold" => style = style.add_modifier(Modifier::BOLD),
            "reversed" => style = style.add_modifier(Modifier::REVERSED),
            "italic" => style = style.add_modifier(Modifier::ITALIC),
            _ => {}
        }
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_color_formats() {
        assert_eq!(parse_color("#fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_color("#0B57D0"), Some(Color::Rgb(0x0b, 0x57, 0xd0)));
        assert_eq!(parse_color("rgb(300, 10, 0)"), Some(Color::Rgb(255, 10, 0)));
        assert_eq!(parse_color("dark-grey"), Some(Color::DarkGray));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("chartreuse"), None);
    }

    #[test]
    fn style_tokens_combine_color_and_modifiers() {
        let style = parse_style(&Some("#a8c7fa, bold, italic".to_string()));
        assert_eq!(style.fg, Some(Color::Rgb(0xa8, 0xc7, 0xfa)));
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert!(style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn builtin_modes_have_distinct_backgrounds() {
        let light = Theme::for_mode(ThemeMode::Light);
        let dark = Theme::for_mode(ThemeMode::Dark);
        assert_eq!(light.background_color, Color::Rgb(0xff, 0xff, 0xff));
        assert_eq!(dark.background_color, Color::Rgb(0x13, 0x13, 0x14));
        assert!(dark.input_cursor_style.add_modifier.contains(Modifier::REVERSED));
    }
}
