mod schema;

pub use schema::{
    BatchConfig, Config, EnrichmentConfig, GcpConfig, InputConfig, LlamaParseConfig,
    OpenAiConfig, ParsingConfig, ProvidersConfig, WeaviateConfig,
};
