pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,
    pub debug: bool,
    pub port: u16,
    pub database_url: String,
    /// Required by `serve`, `ask` and `seed` unless the hashing embedder is
    /// selected and no generation is performed.
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub gemini_temperature: f32,
    /// `gemini` (default) or `hashing` (offline, deterministic).
    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    /// Number of neighbours fetched per prompt. Set via RETRIEVAL_TOP_K. Default: 3.
    pub retrieval_top_k: usize,
    /// Reported on `GET /`; retrieval does not filter on it.
    pub similarity_threshold: f64,
    pub confidence_threshold: f64,
    pub enable_policy_check: bool,
    /// Optional YAML rule table replacing the built-in policy rules.
    pub policy_rules_path: Option<String>,
    pub default_language: String,
    /// How many of the most recent audit logs feed `/analytics/stats`.
    pub analytics_window: i64,
    pub seed_sample_documents: bool,
    /// When set, `DELETE /audit/{id}` requires this key.
    pub admin_key: Option<String>,
    /// Comma-separated list of allowed CORS origins. Empty = any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn gemini_api_key(&self) -> anyhow::Result<&str> {
        self.gemini_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY is not set"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Cloud-Native RAG Platform".into(),
            app_version: "1.0.0".into(),
            debug: false,
            port: 8000,
            database_url: "postgres://localhost/govrag".into(),
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.into(),
            gemini_model: "gemini-2.5-flash".into(),
            gemini_temperature: 0.7,
            embedding_provider: "gemini".into(),
            embedding_model: "text-embedding-004".into(),
            embedding_dimensions: 768,
            retrieval_top_k: 3,
            similarity_threshold: 0.7,
            confidence_threshold: 0.6,
            enable_policy_check: true,
            policy_rules_path: None,
            default_language: "id".into(),
            analytics_window: 1000,
            seed_sample_documents: true,
            admin_key: None,
            cors_allowed_origins: Vec::new(),
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Builds a config from an arbitrary variable source. `load()` feeds it the
/// process environment.
pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let parse_or = |key: &str, default: f64| -> anyhow::Result<f64> {
        match lookup(key) {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("{} must be a number, got '{}'", key, v)),
            None => Ok(default),
        }
    };
    let flag = |key: &str, default: bool| -> bool {
        lookup(key)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(default)
    };

    let retrieval_top_k: usize = lookup("RETRIEVAL_TOP_K")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(defaults.retrieval_top_k);
    if retrieval_top_k == 0 {
        anyhow::bail!("RETRIEVAL_TOP_K must be at least 1");
    }

    let embedding_provider = lookup("EMBEDDING_PROVIDER")
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or(defaults.embedding_provider);
    if embedding_provider != "gemini" && embedding_provider != "hashing" {
        anyhow::bail!(
            "invalid EMBEDDING_PROVIDER: {}. Must be 'gemini' or 'hashing'",
            embedding_provider
        );
    }

    Ok(Config {
        app_name: lookup("APP_NAME").unwrap_or(defaults.app_name),
        app_version: lookup("APP_VERSION").unwrap_or(defaults.app_version),
        debug: flag("DEBUG", defaults.debug),
        port: lookup("PORT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.port),
        database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
        gemini_api_key: lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_GEMINI_API_KEY")),
        gemini_base_url: lookup("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
        gemini_model: lookup("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
        gemini_temperature: parse_or("GEMINI_TEMPERATURE", defaults.gemini_temperature as f64)?
            as f32,
        embedding_provider,
        embedding_model: lookup("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
        embedding_dimensions: lookup("EMBEDDING_DIMENSIONS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.embedding_dimensions),
        retrieval_top_k,
        similarity_threshold: parse_or("SIMILARITY_THRESHOLD", defaults.similarity_threshold)?,
        confidence_threshold: parse_or("CONFIDENCE_THRESHOLD", defaults.confidence_threshold)?,
        enable_policy_check: flag("ENABLE_POLICY_CHECK", defaults.enable_policy_check),
        policy_rules_path: lookup("POLICY_RULES_PATH").filter(|p| !p.trim().is_empty()),
        default_language: lookup("DEFAULT_LANGUAGE").unwrap_or(defaults.default_language),
        analytics_window: lookup("ANALYTICS_WINDOW")
            .and_then(|v| v.trim().parse().ok())
            .filter(|n: &i64| *n > 0)
            .unwrap_or(defaults.analytics_window),
        seed_sample_documents: flag("SEED_SAMPLE_DOCUMENTS", defaults.seed_sample_documents),
        admin_key: lookup("ADMIN_KEY").filter(|k| !k.trim().is_empty()),
        cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "*")
            .map(String::from)
            .collect(),
    })
}
