//! Operation script (script.json) loading and validation.
//!
//! A script is an ordered list of pool operations in the same JSON form the
//! event log uses:
//!
//! ```json
//! {
//!   "description": "seed and rebalance",
//!   "steps": [
//!     { "deposit": { "caller": 2, "amount": 10000 } },
//!     { "rebalance": { "caller": 9, "block": 144 } }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use poolbook::PoolEvent;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub description: Option<String>,
    pub steps: Vec<PoolEvent>,
}

impl Script {
    /// Load and validate a script file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ScriptRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(Error::Script("steps list is empty".into()));
        }
        // Rebalance blocks must not go backwards within one script
        let blocks = self.steps.iter().filter_map(|s| match s {
            PoolEvent::Rebalance { block, .. } => Some(*block),
            _ => None,
        });
        let mut last = 0;
        for block in blocks {
            if block < last {
                return Err(Error::Script(format!(
                    "rebalance block {block} is before earlier block {last}"
                )));
            }
            last = block;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poolbook::{AccountId, HoldingId};

    #[test]
    fn parse_all_step_kinds() {
        let json = r#"{
            "steps": [
                { "add_holding": { "caller": 1, "id": 2, "asset": "SOL", "target_bps": 500 } },
                { "set_target_allocation": { "caller": 1, "id": 2, "target_bps": 700 } },
                { "deactivate_holding": { "caller": 1, "id": 2 } },
                { "set_paused": { "caller": 1, "paused": false } },
                { "deposit": { "caller": 2, "amount": 340282366920938463463374607431768211455 } },
                { "withdraw": { "caller": 2, "shares": 10 } },
                { "rebalance": { "caller": 3, "block": 144 } }
            ]
        }"#;
        let script = Script::from_json(json).unwrap();
        assert_eq!(script.len(), 7);
        assert!(script.description.is_none());
        assert_eq!(
            script.steps[2],
            PoolEvent::DeactivateHolding {
                caller: AccountId(1),
                id: HoldingId(2)
            }
        );
        assert_eq!(script.steps[4], PoolEvent::deposit(AccountId(2), u128::MAX));
    }

    #[test]
    fn empty_steps_rejected() {
        assert!(matches!(
            Script::from_json(r#"{ "steps": [] }"#),
            Err(Error::Script(_))
        ));
    }

    #[test]
    fn backwards_blocks_rejected() {
        let json = r#"{ "steps": [
            { "rebalance": { "caller": 3, "block": 300 } },
            { "rebalance": { "caller": 3, "block": 200 } }
        ] }"#;
        assert!(matches!(Script::from_json(json), Err(Error::Script(_))));
    }

    #[test]
    fn unknown_operation_rejected() {
        let json = r#"{ "steps": [ { "mint": { "caller": 1 } } ] }"#;
        assert!(matches!(Script::from_json(json), Err(Error::ScriptParse(_))));
    }
}
