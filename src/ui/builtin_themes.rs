use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ThemeSpec {
    pub id: String,
    pub display_name: String,
    pub background: Option<String>,
    pub surface: Option<String>,
    pub text: Option<String>,
    pub muted: Option<String>,
    pub accent: Option<String>,
    pub user_text: Option<String>,
    pub assistant_text: Option<String>,
    pub emphasis: Option<String>,
    pub error: Option<String>,
    pub border: Option<String>,
    pub title: Option<String>,
    pub selection: Option<String>,
    pub card: Option<String>,
    pub input_text: Option<String>,
    pub input_placeholder: Option<String>,
    pub input_cursor_modifiers: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BuiltinThemesConfig {
    themes: Vec<ThemeSpec>,
}

pub fn load_builtin_themes() -> Vec<ThemeSpec> {
    const CONFIG_CONTENT: &str = include_str!("../builtin_themes.toml");
    match toml::from_str::<BuiltinThemesConfig>(CONFIG_CONTENT) {
        Ok(config) => config.themes,
        Err(e) => {
            tracing::error!("failed to parse builtin_themes.toml: {e}");
            Vec::new()
        }
    }
}

pub fn find_builtin_theme(id: &str) -> Option<ThemeSpec> {
    load_builtin_themes()
        .into_iter()
        .find(|t| t.id.eq_ignore_ascii_case(id))
}
