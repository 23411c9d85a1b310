//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use log::warn;
use rustc_hash::FxHashSet;
use serde::Deserialize;

use poolbook::rebalance::{DEFAULT_COOLDOWN_BLOCKS, DEFAULT_THRESHOLD_BPS};
use poolbook::{
    AccountId, BPS_SCALE, BlockHeight, Bps, HoldingId, MAX_HOLDINGS, Pool, PoolConfig,
    RebalancePolicy,
};

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pool: PoolSection,
    #[serde(default)]
    pub holdings: Vec<HoldingConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolSection {
    pub admin: u64,
    #[serde(default = "default_cooldown")]
    pub cooldown_blocks: BlockHeight,
    #[serde(default = "default_threshold")]
    pub threshold_bps: Bps,
}

fn default_cooldown() -> BlockHeight {
    DEFAULT_COOLDOWN_BLOCKS
}
fn default_threshold() -> Bps {
    DEFAULT_THRESHOLD_BPS
}

/// A holding registered when the pool is built.
#[derive(Debug, Clone, Deserialize)]
pub struct HoldingConfig {
    pub id: u8,
    pub asset: String,
    pub target_bps: Bps,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        if let Some(msg) = config.allocation_warning() {
            warn!("{msg}");
        }
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.pool.admin == 0 {
            return Err(Error::Config("admin must be a non-zero account id".into()));
        }
        if self.pool.threshold_bps > BPS_SCALE {
            return Err(Error::Config(format!(
                "threshold_bps must be <= {BPS_SCALE}"
            )));
        }
        if self.holdings.len() > MAX_HOLDINGS {
            return Err(Error::Config(format!(
                "at most {MAX_HOLDINGS} holdings, got {}",
                self.holdings.len()
            )));
        }

        let mut seen = FxHashSet::default();
        for h in &self.holdings {
            if !seen.insert(h.id) {
                return Err(Error::Config(format!("duplicate holding id: {}", h.id)));
            }
            if h.id as usize >= MAX_HOLDINGS {
                return Err(Error::Config(format!(
                    "holding id {} out of range (0..{MAX_HOLDINGS})",
                    h.id
                )));
            }
            if h.target_bps > BPS_SCALE {
                return Err(Error::Config(format!(
                    "target_bps for holding {} ({}) exceeds {BPS_SCALE}",
                    h.id, h.target_bps
                )));
            }
            if h.asset.is_empty() {
                return Err(Error::Config(format!("holding {} has an empty asset", h.id)));
            }
        }
        Ok(())
    }

    /// Sum of configured target allocations.
    pub fn total_target_bps(&self) -> u64 {
        self.holdings.iter().map(|h| h.target_bps as u64).sum()
    }

    /// A message when the targets do not add up to 100%. Allowed, but
    /// leaves part of the pool permanently unallocated (or over-allocated).
    pub fn allocation_warning(&self) -> Option<String> {
        let total = self.total_target_bps();
        (!self.holdings.is_empty() && total != BPS_SCALE as u64)
            .then(|| format!("holding targets sum to {total} bp, not {BPS_SCALE}"))
    }

    pub fn admin(&self) -> AccountId {
        AccountId(self.pool.admin)
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.admin()).with_policy(RebalancePolicy {
            cooldown_blocks: self.pool.cooldown_blocks,
            threshold_bps: self.pool.threshold_bps,
        })
    }

    /// Build a pool with every configured holding registered.
    ///
    /// Holdings are added through the admin, so they are part of the
    /// pool's event log and replay reproduces them.
    pub fn build_pool(&self) -> Result<Pool> {
        let admin = self.admin();
        let mut pool = Pool::new(self.pool_config());
        for h in &self.holdings {
            pool.add_holding(admin, HoldingId(h.id), h.asset.as_str(), h.target_bps)?;
        }
        Ok(pool)
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}
