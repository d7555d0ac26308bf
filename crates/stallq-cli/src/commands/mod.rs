//! Command handler modules for stallq-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod db;
pub mod order;
pub mod queue;
pub mod seed;

use anyhow::{Context, Result};
use sqlx::PgPool;
use stallq_config::{report_unused_keys, ConfigConsumer, StallqConfig, UnusedKeyPolicy};
use stallq_schemas::{Caller, Role, UserId};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Effective settings for one CLI invocation.
pub struct CliConfig {
    pub settings: StallqConfig,
    pub config_hash: String,
}

impl CliConfig {
    pub fn load(paths: &[String]) -> Result<Self> {
        let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
        let loaded = stallq_config::load_layered_yaml(&path_refs)?;

        let report = report_unused_keys(
            ConfigConsumer::Cli,
            &loaded.config_json,
            UnusedKeyPolicy::Warn,
        )?;
        if !report.is_clean() {
            eprintln!(
                "WARN: CONFIG_UNUSED_KEYS consumer={} unused_leaf_keys={}",
                report.consumer,
                report.unused_leaf_pointers.len()
            );
            for p in report.unused_leaf_pointers.iter().take(20) {
                eprintln!("  unused={}", p);
            }
        }

        Ok(Self {
            settings: loaded.settings()?,
            config_hash: loaded.config_hash,
        })
    }

    pub async fn pool(&self) -> Result<PgPool> {
        stallq_db::connect_from_env(self.settings.db.max_connections).await
    }
}

/// Build the acting identity from a CLI id flag. Validated before any DB work.
pub fn caller(user_id: UserId, role: Role) -> Result<Caller> {
    Caller::new(user_id, role).with_context(|| format!("invalid --{role}-id"))
}

pub fn opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}
