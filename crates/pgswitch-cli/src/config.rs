use pgswitch::{ConflictKeyStyle, CopyOptions, ScanOptions};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_path: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: PathBuf) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;

        let file = ConfigFile::parse(&raw).map_err(|e| {
            anyhow::anyhow!(
                "failed to load config file {}: {e:#}",
                config_path.display()
            )
        })?;

        Ok(Self { config_path, file })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,

    pub source: DatabaseConfig,

    pub target: Option<DatabaseConfig>,

    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_schema")]
    pub schema: String,
}

fn default_schema() -> String {
    "public".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub skip_tables: Vec<String>,
    #[serde(default)]
    pub upsert: bool,
    #[serde(default)]
    pub conflict_key: ConflictKeyStyle,
}

impl SyncConfig {
    pub fn scan_options(&self, schema: &str) -> ScanOptions {
        ScanOptions {
            schema: schema.to_string(),
            skip_tables: self.skip_tables.clone(),
        }
    }

    pub fn copy_options(&self) -> CopyOptions {
        CopyOptions {
            upsert: self.upsert,
            conflict_key: self.conflict_key,
        }
    }
}

impl ConfigFile {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut file: ConfigFile = toml::from_str(raw)?;
        file.expand_env()?;
        file.validate()?;
        Ok(file)
    }

    fn expand_env(&mut self) -> anyhow::Result<()> {
        self.source.url = expand_env_vars(&self.source.url)?;
        self.source.schema = expand_env_vars(&self.source.schema)?;

        if let Some(target) = self.target.as_mut() {
            target.url = expand_env_vars(&target.url)?;
            target.schema = expand_env_vars(&target.schema)?;
        }

        for t in &mut self.sync.skip_tables {
            *t = expand_env_vars(t)?;
        }

        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }

        if self.source.url.trim().is_empty() {
            anyhow::bail!("source.url must not be empty");
        }
        if self.source.schema.trim().is_empty() {
            anyhow::bail!("source.schema must not be empty");
        }

        if let Some(target) = &self.target {
            if target.url.trim().is_empty() {
                anyhow::bail!("target.url must not be empty");
            }
        }

        if self.sync.skip_tables.iter().any(|t| t.trim().is_empty()) {
            anyhow::bail!("sync.skip_tables must not contain empty names");
        }

        Ok(())
    }
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = std::env::var(&key)
                .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}
