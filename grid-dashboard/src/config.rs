use serde::Deserialize;
use std::{fs, path::PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub path: PathBuf,
    /// Field delimiter; `|` for `.dat` exports.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Expose `/metrics` on the dashboard listener.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Language-model assistant endpoint. The API key is read from the
/// environment variable named here, never from this file.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_url")]
    pub base_url: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_assistant_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_assistant_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    #[serde(default = "default_news_url")]
    pub base_url: String,
    #[serde(default = "default_news_query")]
    pub query: String,
    #[serde(default = "default_news_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,
    #[serde(default = "default_news_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_path")]
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub http: HttpConfig,
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

fn default_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}

fn default_assistant_url() -> String {
    "https://api.cohere.ai".to_string()
}

fn default_assistant_key_env() -> String {
    "COHERE_API_KEY".to_string()
}

fn default_assistant_timeout() -> u64 {
    30
}

fn default_news_url() -> String {
    "https://newsapi.org".to_string()
}

fn default_news_query() -> String {
    "renewable energy".to_string()
}

fn default_news_key_env() -> String {
    "NEWS_API_KEY".to_string()
}

fn default_max_articles() -> usize {
    5
}

fn default_news_timeout() -> u64 {
    10
}

fn default_report_path() -> PathBuf {
    PathBuf::from("forecast_report.pdf")
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_assistant_url(),
            model: None,
            api_key_env: default_assistant_key_env(),
            timeout_secs: default_assistant_timeout(),
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: default_news_url(),
            query: default_news_query(),
            api_key_env: default_news_key_env(),
            max_articles: default_max_articles(),
            timeout_secs: default_news_timeout(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_path: default_report_path(),
        }
    }
}

/// Look up a credential by environment variable name; blank counts as unset.
pub fn secret_from_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("GRID_DASHBOARD_CONFIG").unwrap_or_else(|_| "grid-dashboard.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config '{path}': {e}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        if !cfg.dataset.delimiter.is_ascii() {
            anyhow::bail!("dataset.delimiter must be a single ASCII character");
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [dataset]
            path = "cleaned_smart_grid_dataset.csv"

            [http]
            bind_addr = "127.0.0.1:8080"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.dataset.delimiter, ',');
        assert!(cfg.metrics.is_none());
        assert_eq!(cfg.assistant.api_key_env, "COHERE_API_KEY");
        assert_eq!(cfg.news.query, "renewable energy");
        assert_eq!(cfg.news.max_articles, 5);
        assert_eq!(cfg.report.output_path, PathBuf::from("forecast_report.pdf"));
    }

    #[test]
    fn full_config_overrides_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [dataset]
            path = "readings.dat"
            delimiter = "|"

            [http]
            bind_addr = "0.0.0.0:9000"

            [metrics]

            [assistant]
            base_url = "http://localhost:4000"
            model = "command-r"
            api_key_env = "ASSISTANT_TOKEN"
            timeout_secs = 5

            [news]
            query = "grid storage"
            max_articles = 3

            [report]
            output_path = "/tmp/report.pdf"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.dataset.delimiter, '|');
        assert!(cfg.metrics.unwrap().enabled);
        assert_eq!(cfg.assistant.model.as_deref(), Some("command-r"));
        assert_eq!(cfg.assistant.timeout_secs, 5);
        assert_eq!(cfg.news.base_url, "https://newsapi.org");
        assert_eq!(cfg.news.max_articles, 3);
    }

    #[test]
    fn rejects_non_ascii_delimiter() {
        let res = AppConfig::from_toml(
            r#"
            [dataset]
            path = "x.csv"
            delimiter = "§"

            [http]
            bind_addr = "127.0.0.1:8080"
            "#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn blank_secret_counts_as_unset() {
        assert_eq!(secret_from_env("GRID_DASHBOARD_TEST_SURELY_UNSET_VAR"), None);
    }
}
