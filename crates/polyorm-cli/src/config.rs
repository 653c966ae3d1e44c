use polyorm::{DialectKind, DialectSettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let raw = std::fs::read_to_string(config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;

        Ok(Self {
            config_dir,
            file: ConfigFile::parse(&raw)
                .map_err(|e| anyhow::anyhow!("invalid config {}: {e:#}", config_path.display()))?,
        })
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Schema file with the model definitions, relative to the config file.
    pub schema: PathBuf,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub dialect: DialectKind,
    pub output: PathBuf,
    /// Overrides applied on top of the schema file's `[dialect]` section.
    #[serde(default)]
    pub settings: Option<DialectSettings>,
}

impl ConfigFile {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let file: Self = toml::from_str(raw)?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.targets.is_empty() {
            anyhow::bail!("at least one [[targets]] entry is required");
        }
        for (i, target) in self.targets.iter().enumerate() {
            if self.targets[..i].iter().any(|t| t.output == target.output) {
                anyhow::bail!("output {} is used by more than one target", target.output.display());
            }
            if let Some(settings) = &target.settings {
                settings.validate()?;
                if settings.kind.is_some_and(|k| k != target.dialect) {
                    anyhow::bail!(
                        "target {} sets a different settings.kind",
                        target.output.display()
                    );
                }
            }
        }
        Ok(())
    }
}

pub const STARTER_CONFIG: &str = r#"schema = "models.toml"

[[targets]]
dialect = "sqlite"
output = "sql/sqlite.sql"

[[targets]]
dialect = "postgres"
output = "sql/postgres.sql"
settings = { naming = "snake_case" }
"#;

pub const STARTER_SCHEMA: &str = r#"[[models]]
name = "Person"

[[models.fields]]
name = "Id"
type = "int32"
auto_increment = true

[[models.fields]]
name = "Name"
type = "string"
length = 100
nullable = false
indexed = true
"#;
