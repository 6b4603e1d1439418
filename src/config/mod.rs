use anyhow::Error;
use confique::Config;
use std::sync::{Arc, OnceLock};

#[derive(Debug, Config)]
pub struct FluxTidyConfig {
    /// Measurements with fewer points than this are "low data".
    #[config(env = "FLUXTIDY_MIN_POINTS", default = 10)]
    pub min_points: u64,

    /// Number of measurements inspected concurrently.
    #[config(env = "FLUXTIDY_CONCURRENCY", default = 4)]
    pub concurrency: usize,

    /// Columns starting with this prefix are tags, everything else is a field.
    #[config(env = "FLUXTIDY_TAG_PREFIX", default = "tag_")]
    pub tag_prefix: String,

    #[config(env = "FLUXTIDY_FAST_TAG_KEY_LIMIT", default = 5)]
    pub fast_tag_key_limit: usize,

    #[config(env = "FLUXTIDY_THOROUGH_SAMPLE_LIMIT", default = 10)]
    pub thorough_sample_limit: usize,

    #[config(env = "FLUXTIDY_FAST_SAMPLE_LIMIT", default = 5)]
    pub fast_sample_limit: usize,

    #[config(env = "FLUXTIDY_SAMPLE_KEEP", default = 5)]
    pub sample_keep: usize,

    #[config(env = "FLUXTIDY_MIXED_TOPIC_MIN_TAG_KEYS", default = 3)]
    pub mixed_topic_min_tag_keys: usize,

    #[config(env = "FLUXTIDY_MIXED_TOPIC_MIN_POINTS", default = 100)]
    pub mixed_topic_min_points: u64,

    #[config(env = "FLUXTIDY_SIMILARITY_THRESHOLD", default = 0.7)]
    pub similarity_threshold: f64,
}

impl FluxTidyConfig {
    pub fn load() -> Result<FluxTidyConfig, Error> {
        let c = FluxTidyConfig::builder()
            .env()
            .file("fluxtidy.toml")
            .load()?;

        c.validate()?;
        Ok(c)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.concurrency == 0 {
            anyhow::bail!("Concurrency must be at least 1");
        }
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            anyhow::bail!(
                "Similarity threshold must be in (0, 1], got {}",
                self.similarity_threshold
            );
        }
        Ok(())
    }
}

static FLUXTIDY_CONFIG: OnceLock<Arc<FluxTidyConfig>> = OnceLock::new();

pub fn get() -> Result<Arc<FluxTidyConfig>, Error> {
    FLUXTIDY_CONFIG.get().cloned().ok_or_else(|| {
        Error::msg(
            "Configuration not loaded. Please call load_configuration() before using the configuration",
        )
    })
}

pub fn load_configuration() -> Result<(), Error> {
    // Check if the configuration has already been loaded
    if FLUXTIDY_CONFIG.get().is_some() {
        return Ok(());
    }

    let config = FluxTidyConfig::load()?;
    FLUXTIDY_CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}
