//! Server configuration, read from the environment.

/// Settings for the reports service.
///
/// Tokens are `None` when unset or blank. An absent admin token means the
/// read endpoints always refuse; an absent ingest token means `POST
/// /reports` is open.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub table_name: String,
    pub connection_string: Option<String>,
    pub admin_token: Option<String>,
    pub ingest_token: Option<String>,
    pub debug: bool,
    pub page_default: usize,
    pub page_max: usize,
    pub truncate_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            table_name: "reports".to_string(),
            connection_string: None,
            admin_token: None,
            ingest_token: None,
            debug: false,
            page_default: 50,
            page_max: 200,
            truncate_limit: 60_000,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(name) = non_empty_env("REPORTS_TABLE_NAME") {
            config.table_name = name;
        }
        config.connection_string = non_empty_env("REPORTS_STORAGE_CONNECTION_STRING")
            .or_else(|| non_empty_env("AzureWebJobsStorage"));
        config.admin_token = non_empty_env("REPORTS_ADMIN_TOKEN");
        config.ingest_token = non_empty_env("REPORTS_INGEST_TOKEN");
        config.debug = non_empty_env("REPORTS_DEBUG")
            .map(|value| is_truthy(&value))
            .unwrap_or(false);
        config
    }

    /// Clamp a requested page size to the configured bounds.
    pub fn clamp_page_size(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.page_default).clamp(1, self.page_max)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
