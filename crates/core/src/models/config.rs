use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Hello! I'm your AI financial assistant. How can I help you today?";
pub const DEFAULT_PRIMARY_COLOR: &str = "#2563EB";
pub const DEFAULT_COMPANY_NAME: &str = "Financial AI";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    BottomRight,
    BottomLeft,
}

impl std::str::FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bottom-right" => Ok(Position::BottomRight),
            "bottom-left" => Ok(Position::BottomLeft),
            other => Err(format!("unknown position '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetSize {
    Compact,
    #[default]
    Standard,
    Large,
    /// Use the custom width/height/min/max fields.
    Custom,
}

impl std::str::FromStr for WidgetSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "compact" => Ok(WidgetSize::Compact),
            "standard" => Ok(WidgetSize::Standard),
            "large" => Ok(WidgetSize::Large),
            "custom" => Ok(WidgetSize::Custom),
            other => Err(format!("unknown size '{other}'")),
        }
    }
}

/// Embedding and display configuration of one widget instance.
///
/// Persisted together with the chat state. Missing fields take their
/// values from [`WidgetConfig::default`]; the welcome text, color and company
/// name are always written so an explicit `null` survives a reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub size: WidgetSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<String>,
    /// Text of the synthetic first assistant message. `None` disables it.
    pub welcome_message: Option<String>,
    pub primary_color: Option<String>,
    pub company_name: Option<String>,
    pub enable_smart_prompting: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_suggestions: Option<Vec<String>>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            theme: Theme::Light,
            position: Position::BottomRight,
            size: WidgetSize::Standard,
            custom_width: None,
            custom_height: None,
            min_width: None,
            min_height: None,
            max_width: None,
            max_height: None,
            welcome_message: Some(DEFAULT_WELCOME_MESSAGE.to_string()),
            primary_color: Some(DEFAULT_PRIMARY_COLOR.to_string()),
            company_name: Some(DEFAULT_COMPANY_NAME.to_string()),
            enable_smart_prompting: true,
            prompt_suggestions: None,
        }
    }
}

impl WidgetConfig {
    /// Default configuration with the script-tag data attributes applied.
    pub fn from_data_attributes<'a, I>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = Self::default();
        config.apply(ConfigPatch::from_data_attributes(attributes));
        config
    }

    /// Merge `patch` into this configuration. Absent fields are kept.
    pub fn apply(&mut self, patch: ConfigPatch) {
        let ConfigPatch {
            api_key,
            theme,
            position,
            size,
            custom_width,
            custom_height,
            min_width,
            min_height,
            max_width,
            max_height,
            welcome_message,
            primary_color,
            company_name,
            enable_smart_prompting,
            prompt_suggestions,
        } = patch;

        merge(&mut self.api_key, api_key);
        if let Some(v) = theme {
            self.theme = v;
        }
        if let Some(v) = position {
            self.position = v;
        }
        if let Some(v) = size {
            self.size = v;
        }
        merge(&mut self.custom_width, custom_width);
        merge(&mut self.custom_height, custom_height);
        merge(&mut self.min_width, min_width);
        merge(&mut self.min_height, min_height);
        merge(&mut self.max_width, max_width);
        merge(&mut self.max_height, max_height);
        merge(&mut self.welcome_message, welcome_message);
        merge(&mut self.primary_color, primary_color);
        merge(&mut self.company_name, company_name);
        if let Some(v) = enable_smart_prompting {
            self.enable_smart_prompting = v;
        }
        merge(&mut self.prompt_suggestions, prompt_suggestions);
    }
}

fn merge<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Partial configuration, as handed to the initializer or `update_config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigPatch {
    pub api_key: Option<String>,
    pub theme: Option<Theme>,
    pub position: Option<Position>,
    pub size: Option<WidgetSize>,
    pub custom_width: Option<String>,
    pub custom_height: Option<String>,
    pub min_width: Option<String>,
    pub min_height: Option<String>,
    pub max_width: Option<String>,
    pub max_height: Option<String>,
    pub welcome_message: Option<String>,
    pub primary_color: Option<String>,
    pub company_name: Option<String>,
    pub enable_smart_prompting: Option<bool>,
    pub prompt_suggestions: Option<Vec<String>>,
}

impl ConfigPatch {
    /// Map script-tag `data-*` attributes onto configuration keys.
    ///
    /// Recognized: `data-api-key`, `data-theme`, `data-position`, `data-size`,
    /// `data-custom-width`, `data-custom-height`, `data-welcome-message`,
    /// `data-company-name`. Empty values and unrecognized enum spellings are
    /// skipped; unknown attributes are ignored.
    pub fn from_data_attributes<'a, I>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut patch = Self::default();
        for (name, value) in attributes {
            if value.is_empty() {
                continue;
            }
            match name {
                "data-api-key" => patch.api_key = Some(value.to_string()),
                "data-theme" => patch.theme = parse_attribute(name, value),
                "data-position" => patch.position = parse_attribute(name, value),
                "data-size" => patch.size = parse_attribute(name, value),
                "data-custom-width" => patch.custom_width = Some(value.to_string()),
                "data-custom-height" => patch.custom_height = Some(value.to_string()),
                "data-welcome-message" => patch.welcome_message = Some(value.to_string()),
                "data-company-name" => patch.company_name = Some(value.to_string()),
                _ => {}
            }
        }
        patch
    }
}

fn parse_attribute<T>(name: &str, value: &str) -> Option<T>
where
    T: std::str::FromStr<Err = String>,
{
    match value.parse() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(attribute = name, error = %e, "ignoring data attribute");
            None
        }
    }
}
