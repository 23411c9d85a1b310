//! Session orchestrator: config → pool → script → audit → event log.

use std::path::{Path, PathBuf};

use log::{error, info, warn};

use poolbook::{ApplyOutcome, Pool, PoolEvent, PoolSnapshot};

use crate::audit::{self, AuditLog};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::script::Script;

/// Options for a scripted run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Apply to an in-memory pool only: no audit entries, no event log
    pub dry_run: bool,
    /// Skip the confirmation prompt
    pub force: bool,
    pub script_file: String,
    /// Where to save the pool's event log after the run
    pub events_out: Option<PathBuf>,
}

/// What a run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub applied: usize,
    pub rejected: usize,
    pub snapshot: PoolSnapshot,
}

/// Apply every step of a script to a freshly built pool.
///
/// Rejected steps do not stop the run; each outcome is printed and audited.
pub fn run(config: &Config, script: &Script, opts: &RunOptions) -> Result<RunSummary> {
    let mut pool = config.build_pool()?;

    if let Some(desc) = &script.description {
        println!("Script: {desc}");
    }
    display_plan(script);

    if opts.dry_run {
        let (applied, rejected) = apply_steps(&mut pool, script, None)?;
        println!("\n[DRY RUN] {applied} would apply, {rejected} would be rejected.");
        display_pool(&pool.snapshot());
        return Ok(RunSummary {
            applied,
            rejected,
            snapshot: pool.snapshot(),
        });
    }

    if !opts.force {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Apply {} steps?", script.len()))
            .default(false)
            .interact()
            .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))?;

        if !confirmed {
            return Err(Error::Aborted("not confirmed".into()));
        }
    }

    let mut audit = AuditLog::open(&config.audit_path())?;
    audit::log_run_started(&mut audit, &opts.script_file, config.pool.admin, script.len())?;

    let (applied, rejected) = apply_steps(&mut pool, script, Some(&mut audit))?;

    let snapshot = pool.snapshot();
    audit::log_run_completed(&mut audit, applied, rejected, &snapshot.state)?;
    println!(
        "\n{applied} applied, {rejected} rejected. Audit logged to {}",
        config.audit_path().display()
    );

    if let Some(path) = &opts.events_out {
        pool.save(path).map_err(|source| Error::Events {
            path: path.clone(),
            source,
        })?;
        info!("saved {} events to {}", pool.events().len(), path.display());
    }

    display_pool(&snapshot);
    Ok(RunSummary {
        applied,
        rejected,
        snapshot,
    })
}

fn apply_steps(
    pool: &mut Pool,
    script: &Script,
    mut audit: Option<&mut AuditLog>,
) -> Result<(usize, usize)> {
    let mut applied = 0;
    let mut rejected = 0;

    for (i, step) in script.steps.iter().enumerate() {
        print!("[{}/{}] {} ... ", i + 1, script.len(), describe(step));
        let result = pool.apply(step);
        match &result {
            Ok(outcome) => {
                println!("{}", describe_outcome(outcome));
                applied += 1;
            }
            Err(e) => {
                println!("REJECTED ({e})");
                warn!("step {} ({}) rejected: {e}", i + 1, step.name());
                rejected += 1;
            }
        }
        if let Some(audit) = audit.as_deref_mut() {
            audit::log_step(audit, i, step, &result)?;
        }
    }

    Ok((applied, rejected))
}

/// Print the configured holdings and their allocation sum.
pub fn holdings(config: &Config) -> Result<()> {
    println!(
        "Pool admin {} (cooldown {} blocks, threshold {} bp)",
        config.admin(),
        config.pool.cooldown_blocks,
        config.pool.threshold_bps
    );
    if config.holdings.is_empty() {
        println!("  (no holdings configured)");
        return Ok(());
    }

    println!("  {:>4}  {:<10}  {:>7}", "ID", "Asset", "Target");
    for h in &config.holdings {
        println!("  {:>4}  {:<10}  {:>7}", h.id, h.asset, h.target_bps);
    }
    println!("  total: {} bp", config.total_target_bps());
    if let Some(msg) = config.allocation_warning() {
        println!("  warning: {msg}");
    }
    Ok(())
}

/// Rebuild a pool from a saved event log and print its state.
pub fn replay(config: &Config, events: &Path) -> Result<Pool> {
    let pool = Pool::load(config.pool_config(), events).map_err(|source| {
        error!("replay of {} failed: {source}", events.display());
        Error::Events {
            path: events.to_path_buf(),
            source,
        }
    })?;
    println!(
        "Replayed {} events from {}",
        pool.events().len(),
        events.display()
    );
    display_pool(&pool.snapshot());
    Ok(pool)
}

fn describe(step: &PoolEvent) -> String {
    match step {
        PoolEvent::AddHolding {
            id,
            asset,
            target_bps,
            ..
        } => format!("add {id} {asset} @ {target_bps} bp"),
        PoolEvent::SetTargetAllocation { id, target_bps, .. } => {
            format!("target {id} → {target_bps} bp")
        }
        PoolEvent::DeactivateHolding { id, .. } => format!("deactivate {id}"),
        PoolEvent::SetPaused { paused, .. } => {
            if *paused { "pause".into() } else { "resume".into() }
        }
        PoolEvent::Deposit { caller, amount } => format!("{caller} deposit {amount}"),
        PoolEvent::Withdraw { caller, shares } => format!("{caller} withdraw {shares} shares"),
        PoolEvent::Rebalance { caller, block } => format!("{caller} rebalance @{block}"),
    }
}

fn describe_outcome(outcome: &ApplyOutcome) -> String {
    match outcome {
        ApplyOutcome::Done => "OK".into(),
        ApplyOutcome::Issued(shares) => format!("issued {shares} shares"),
        ApplyOutcome::Paid(amount) => format!("paid {amount}"),
        ApplyOutcome::Rebalanced(r) => format!(
            "snapped {} holdings, total {} → {}",
            r.snapped.len(),
            r.previous_total_value,
            r.total_value
        ),
    }
}

fn display_plan(script: &Script) {
    println!("\nPlan ({} steps):", script.len());
    for (i, step) in script.steps.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, describe(step));
    }
    println!();
}

fn display_pool(snap: &PoolSnapshot) {
    println!(
        "\nPool: value {}  shares {}  accounts {}  last rebalance @{}{}",
        snap.state.total_value,
        snap.state.total_shares,
        snap.accounts,
        snap.state.last_rebalance_block,
        if snap.state.paused { "  PAUSED" } else { "" }
    );
    for h in snap.active() {
        println!(
            "  {:>4}  {:<10}  target {:>5}  actual {:>5}  dev {:>5}  balance {}",
            h.id.to_string(),
            h.asset.as_str(),
            h.target_bps,
            h.current_bps,
            h.deviation_bps,
            h.recorded_balance
        );
    }
}
