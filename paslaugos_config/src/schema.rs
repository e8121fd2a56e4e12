use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub parsing: ParsingConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InputConfig {
    #[serde(default = "InputConfig::default_csv_path")]
    pub csv_path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            csv_path: Self::default_csv_path(),
        }
    }
}

impl InputConfig {
    fn default_csv_path() -> PathBuf {
        PathBuf::from("CC_QUICKSTART_CORTEX_DOCS_DATA_SERVICES.csv")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EnrichmentConfig {
    #[serde(default = "EnrichmentConfig::default_model")]
    pub model: String,
    #[serde(default = "EnrichmentConfig::default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "EnrichmentConfig::default_output_language")]
    pub output_language: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            model: Self::default_model(),
            system_prompt: Self::default_system_prompt(),
            output_language: Self::default_output_language(),
        }
    }
}

impl EnrichmentConfig {
    fn default_model() -> String {
        "gpt-4-1106-preview".to_string()
    }

    fn default_system_prompt() -> String {
        "You are a helpful assistant that specializes in describing Lithuanian public services."
            .to_string()
    }

    fn default_output_language() -> String {
        "Lithuanian".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BatchConfig {
    #[serde(default = "BatchConfig::default_output_dir")]
    pub output_dir: PathBuf,
    /// Counter file the CLI keeps so a batch can resume after a restart.
    #[serde(default = "BatchConfig::default_checkpoint_path")]
    pub checkpoint_path: PathBuf,
    /// Flush the checkpoint file every N written records.
    #[serde(default = "BatchConfig::default_checkpoint_every")]
    pub checkpoint_every: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_dir: Self::default_output_dir(),
            checkpoint_path: Self::default_checkpoint_path(),
            checkpoint_every: Self::default_checkpoint_every(),
        }
    }
}

impl BatchConfig {
    fn default_output_dir() -> PathBuf {
        PathBuf::from("enriched")
    }

    fn default_checkpoint_path() -> PathBuf {
        PathBuf::from("enriched.checkpoint.json")
    }

    const fn default_checkpoint_every() -> usize {
        10
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ParsingConfig {
    #[serde(default = "ParsingConfig::default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// `null` polls until the job reaches a terminal state.
    #[serde(default = "ParsingConfig::default_max_attempts")]
    pub max_attempts: Option<u32>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: Self::default_poll_interval_secs(),
            max_attempts: Self::default_max_attempts(),
        }
    }
}

impl ParsingConfig {
    const fn default_poll_interval_secs() -> u64 {
        5
    }

    #[allow(clippy::unnecessary_wraps)]
    const fn default_max_attempts() -> Option<u32> {
        Some(120)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub weaviate: WeaviateConfig,
    #[serde(default)]
    pub llama_parse: LlamaParseConfig,
    #[serde(default)]
    pub gcp: GcpConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "OpenAiConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl OpenAiConfig {
    fn default_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WeaviateConfig {
    #[serde(default = "WeaviateConfig::default_url")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "WeaviateConfig::default_collection")]
    pub collection: String,
    #[serde(default = "WeaviateConfig::default_vectorizer")]
    pub vectorizer: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WeaviateConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            api_key: None,
            collection: Self::default_collection(),
            vectorizer: Self::default_vectorizer(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl WeaviateConfig {
    fn default_url() -> String {
        "http://localhost:8080".to_string()
    }

    fn default_collection() -> String {
        "Service".to_string()
    }

    fn default_vectorizer() -> String {
        "text2vec-openai".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlamaParseConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "LlamaParseConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "LlamaParseConfig::default_language")]
    pub language: String,
    #[serde(default = "LlamaParseConfig::default_parsing_instruction")]
    pub parsing_instruction: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlamaParseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::default_base_url(),
            language: Self::default_language(),
            parsing_instruction: Self::default_parsing_instruction(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlamaParseConfig {
    fn default_base_url() -> String {
        "https://api.cloud.llamaindex.ai/api/v1/parsing".to_string()
    }

    fn default_language() -> String {
        "lt".to_string()
    }

    fn default_parsing_instruction() -> String {
        "File is an invoice. Parse invoice number, date, sender and receiver name, addresses, \
         vat number, sum. Return only json with parsed key value pairs"
            .to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GcpConfig {
    /// Service account key file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            project_id: String::new(),
            bucket: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    120
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("paslaugos"))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load `~/paslaugos/config.json` and apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'paslaugos init' to create config.",
                config_path.display()
            );
        }

        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        debug!("Parsed config from {}", path.display());
        Ok(config)
    }

    /// Secrets from the environment win over the file.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.providers.openai.api_key = key;
        }
        if let Some(key) = non_empty("WEAVIATE_API_KEY") {
            self.providers.weaviate.api_key = Some(key);
        }
        if let Some(key) = non_empty("LLAMA_CLOUD_API_KEY") {
            self.providers.llama_parse.api_key = key;
        }
        if let Some(path) = non_empty("GOOGLE_APPLICATION_CREDENTIALS") {
            self.providers.gcp.credentials_path = Some(PathBuf::from(path));
        }
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, Self::template()?)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Add your OpenAI API key (or export OPENAI_API_KEY)");
        println!("   2. Point input.csv_path at the service catalogue CSV");
        println!("   3. Run 'paslaugos view' to check the data, then 'paslaugos batch'");
        println!();
        println!("🔧 Configuration options:");
        println!("   - batch.output_dir: where enriched JSON files are written");
        println!("   - batch.checkpoint_every: how often the resume point is saved");
        println!("   - providers.weaviate: target for 'paslaugos upload'");
        println!("   - providers.llama_parse / providers.gcp: used by 'parse' and 'mask'");
        println!();
        Ok(())
    }

    /// Default configuration with placeholder secrets.
    pub fn template() -> anyhow::Result<String> {
        let mut config = Self::default();
        config.providers.openai.api_key = "your-openai-api-key-here".to_string();
        config.providers.llama_parse.api_key = "your-llama-cloud-api-key-here".to_string();
        Ok(serde_json::to_string_pretty(&config)?)
    }
}
