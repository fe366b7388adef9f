use std::{env, fmt, path::Path};

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_PAGE_URL: &str =
    "https://www.studierendenwerk-mainz.de/speiseplan/frontend/index.php";
pub const DEFAULT_ICON_BASE_URL: &str =
    "http://www.studierendenwerk-mainz.de/fileadmin/templates/images/speiseplan/";
pub const DEFAULT_TRIGGERS: [&str; 8] = [
    "mensa", "f[o]{2,}d", "essen", "hunger", "hungry", "starving", "lunch", "eat",
];

/// The cafeteria building a meal plan is requested for.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Building {
    #[default]
    Mensa,
    Mensaria,
}

impl Building {
    pub const fn id(self) -> u8 {
        match self {
            Self::Mensa => 1,
            Self::Mensaria => 7,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Mensa => "Mensa",
            Self::Mensaria => "Mensaria",
        }
    }
}

impl fmt::Display for Building {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DisplayType {
    #[default]
    Today,
    Week,
    NextWeek,
}

impl DisplayType {
    pub const fn id(self) -> u8 {
        match self {
            Self::Today => 1,
            Self::Week => 2,
            Self::NextWeek => 3,
        }
    }

    pub const fn is_week(self) -> bool {
        !matches!(self, Self::Today)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "aktueller Tag",
            Self::Week => "aktuelle Woche",
            Self::NextWeek => "nächste Woche",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub page_url: String,
    pub icon_base_url: String,
    pub triggers: Vec<String>,
    pub markdown_images: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.to_owned(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_owned(),
            triggers: DEFAULT_TRIGGERS.iter().map(|&t| t.to_owned()).collect(),
            markdown_images: true,
        }
    }
}

impl Config {
    /// Defaults, then the JSON file named by `MENSA_CONFIG`, then `MENSA_*` overrides.
    pub async fn load() -> Result<Self> {
        let mut config = match env::var("MENSA_CONFIG") {
            Ok(p) => Self::from_file(p).await?,
            Err(_) => {
                log::info!("env var MENSA_CONFIG not set, using built-in defaults.");
                Self::default()
            }
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub async fn from_file(p: impl AsRef<Path>) -> Result<Self> {
        let text = tokio::fs::read_to_string(p.as_ref()).await?;
        serde_json::from_str(&text).map_err(From::from)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("MENSA_PAGE_URL") {
            self.page_url = url;
        }
        if let Some(url) = lookup("MENSA_ICON_BASE_URL") {
            self.icon_base_url = url;
        }
        if let Some(triggers) = lookup("MENSA_TRIGGERS") {
            self.triggers = triggers
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(flag) = lookup("MENSA_MARKDOWN_IMAGES") {
            self.markdown_images = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(Error::Config(format!(
                        "MENSA_MARKDOWN_IMAGES should be true or false, got {other:?}"
                    )))
                }
            };
        }
        if self.triggers.is_empty() {
            return Err(Error::config_error("at least one trigger is required"));
        }
        Ok(())
    }

    /// The meal-plan URL with `building_id` and `display_type` appended.
    pub fn page_url(&self, building: Building, display_type: DisplayType) -> Result<Url> {
        let mut url = Url::parse(&self.page_url)?;
        url.query_pairs_mut()
            .append_pair("building_id", &building.id().to_string())
            .append_pair("display_type", &display_type.id().to_string());
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_page_url() {
        let url = Config::default()
            .page_url(Building::Mensa, DisplayType::Today)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.studierendenwerk-mainz.de/speiseplan/frontend/index.php?building_id=1&display_type=1"
        );
    }

    #[test]
    fn test_mensaria_next_week_url() {
        let url = Config::default()
            .page_url(Building::Mensaria, DisplayType::NextWeek)
            .unwrap();
        assert_eq!(url.query(), Some("building_id=7&display_type=3"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MENSA_PAGE_URL", "http://127.0.0.1:1234/plan.php"),
            ("MENSA_TRIGGERS", "mittag, kantine ,"),
            ("MENSA_MARKDOWN_IMAGES", "false"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.page_url, "http://127.0.0.1:1234/plan.php");
        assert_eq!(config.triggers, vec!["mittag", "kantine"]);
        assert!(!config.markdown_images);
        assert_eq!(config.icon_base_url, DEFAULT_ICON_BASE_URL);
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let mut config = Config::default();
        let res = config.apply_overrides(|k| {
            (k == "MENSA_MARKDOWN_IMAGES").then(|| "sometimes".to_string())
        });
        assert!(matches!(res, Err(Error::Config(_))));
    }

    #[test]
    fn test_partial_json() {
        let config: Config = serde_json::from_str(r#"{ "markdown_images": false }"#).unwrap();
        assert!(!config.markdown_images);
        assert_eq!(config.triggers.len(), DEFAULT_TRIGGERS.len());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let res = Config::from_file("./does/not/exist.json").await;
        assert!(matches!(res, Err(Error::Io(_))));
    }
}
