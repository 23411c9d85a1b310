//! Interactive pool CLI.
//!
//! A REPL for experimenting with share accounting and rebalancing.
//! The session runs as the admin account unless `as <id>` switches caller.
//!
//! Usage:
//!   cargo run --bin poolctl
//!   RUST_LOG=debug poolctl  (to see every accepted and rejected operation)

use poolbook::{AccountId, BlockHeight, HoldingId, Pool, PoolConfig};
use std::io::{self, BufRead, Write};

const ADMIN: AccountId = AccountId(1);

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let mut pool = Pool::new(PoolConfig::new(ADMIN));
    let mut caller = ADMIN;
    let mut block: BlockHeight = 0;

    println!("Pool CLI v0.3.0");
    println!("Type 'help' for commands, 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("pool[{caller} @{block}]> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts.first().map(|s| s.to_lowercase());

        match cmd.as_deref() {
            Some("help" | "h" | "?") => print_help(),
            Some("quit" | "exit" | "q") => break,
            Some("pool" | "p") => print_pool(&pool),
            Some("as") => match parse_account(&parts[1..]) {
                Some(account) => caller = account,
                None => println!("Usage: as <account_id>"),
            },
            Some("block" | "b") => match parts.get(1).and_then(|s| s.parse().ok()) {
                Some(b) => block = b,
                None => println!("Usage: block <height>"),
            },
            Some("add") => handle_add(&mut pool, caller, &parts[1..]),
            Some("target") => handle_target(&mut pool, caller, &parts[1..]),
            Some("deactivate") => match parse_holding(&parts[1..]) {
                Some(id) => report(pool.deactivate_holding(caller, id), |()| {
                    format!("Holding {id} deactivated")
                }),
                None => println!("Usage: deactivate <holding_id>"),
            },
            Some("pause") => report(pool.set_paused(caller, true), |()| "Pool paused".into()),
            Some("resume") => report(pool.set_paused(caller, false), |()| "Pool resumed".into()),
            Some("deposit" | "d") => match parse_u128(&parts[1..]) {
                Some(amount) => report(pool.deposit(caller, amount), |issued| {
                    format!("Deposited {amount}, issued {issued} shares")
                }),
                None => println!("Usage: deposit <amount>"),
            },
            Some("withdraw" | "w") => match parse_u128(&parts[1..]) {
                Some(shares) => report(pool.withdraw(caller, shares), |paid| {
                    format!("Redeemed {shares} shares for {paid}")
                }),
                None => println!("Usage: withdraw <shares>"),
            },
            Some("rebalance" | "r") => handle_rebalance(&mut pool, caller, block),
            Some("shares" | "s") => {
                let account = parse_account(&parts[1..]).unwrap_or(caller);
                println!("{account}: {} shares", pool.shares_of(account));
            }
            Some("holding") => match parse_holding(&parts[1..]) {
                Some(id) => match pool.holding(id) {
                    Some(h) => {
                        println!("Holding {id}:");
                        println!("  Asset:     {}", h.asset);
                        println!("  Target:    {} bp", h.target_bps);
                        println!("  Balance:   {}", h.recorded_balance);
                        println!("  Active:    {}", h.active);
                        if let Some(dev) = pool.deviation(id) {
                            println!("  Deviation: {dev} bp");
                        }
                    }
                    None => println!("Holding {id} not found"),
                },
                None => println!("Usage: holding <holding_id>"),
            },
            Some("reset") => {
                pool = Pool::new(PoolConfig::new(ADMIN));
                block = 0;
                println!("Pool reset.");
            }
            Some(cmd) => println!("Unknown command: '{cmd}'. Type 'help' for commands."),
            None => {}
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_help() {
    println!(
        r#"
Commands:
  add <id> <asset> <target_bp>  Register a holding (admin)
  target <id> <target_bp>       Change a holding's target (admin)
  deactivate <id>               Deactivate a holding (admin)
  pause | resume                Toggle the pause gate (admin)
  deposit <amount>              Deposit value, receive shares
  withdraw <shares>             Redeem shares for value
  rebalance                     Trigger a rebalance at the current block
  block <height>                Set the current block height
  as <account_id>               Switch caller (admin is A1)
  shares [account_id]           Show a share balance
  holding <id>                  Show a holding record
  pool                          Show pool summary
  reset                         Start over with an empty pool
  help                          Show this help
  quit                          Exit

Examples:
  add 0 BTC 6000                BTC holding targeting 60%
  deposit 10000                 Deposit 10,000 units
  block 144                     Advance past the default cooldown
  rebalance                     Snap drifted holdings to target
"#
    );
}

fn print_pool(pool: &Pool) {
    let snap = pool.snapshot();

    println!();
    println!("                 POOL");
    println!("  ─────────────────────────────────────────────");
    println!(
        "  value {}  shares {}  accounts {}  {}",
        snap.state.total_value,
        snap.state.total_shares,
        snap.accounts,
        if snap.state.paused { "PAUSED" } else { "live" }
    );
    match snap.state.nav_per_share() {
        Some(nav) => println!("  NAV/share {nav:.6}"),
        None => println!("  NAV/share (empty)"),
    }
    println!(
        "  last rebalance @{}  max deviation {} bp",
        snap.state.last_rebalance_block, snap.max_deviation_bps
    );
    println!("  ─────────────────────────────────────────────");

    if snap.holdings.is_empty() {
        println!("  (no holdings)");
        println!();
        return;
    }

    println!(
        "  {:>4}  {:<8}  {:>7}  {:>7}  {:>7}  {:>12}",
        "ID", "Asset", "Target", "Actual", "Dev", "Balance"
    );
    for h in &snap.holdings {
        println!(
            "  {:>4}  {:<8}  {:>7}  {:>7}  {:>7}  {:>12}{}",
            h.id.to_string(),
            h.asset.as_str(),
            h.target_bps,
            h.current_bps,
            h.deviation_bps,
            h.recorded_balance,
            if h.active { "" } else { "  (inactive)" }
        );
    }

    if !snap.fully_allocated() {
        println!("  targets sum to {} bp (not 10000)", snap.total_target_bps);
    }
    println!("  unallocated value: {}", snap.unallocated_value());
    println!();
}

fn handle_add(pool: &mut Pool, caller: AccountId, args: &[&str]) {
    if args.len() < 3 {
        println!("Usage: add <id> <asset> <target_bp>");
        return;
    }
    let Some(id) = parse_holding(args) else {
        println!("Invalid holding id: '{}'", args[0]);
        return;
    };
    let Ok(target) = args[2].parse() else {
        println!("Invalid target: '{}'", args[2]);
        return;
    };
    report(pool.add_holding(caller, id, args[1], target), |()| {
        format!("Holding {id} ({}) added at {target} bp", args[1])
    });
}

fn handle_target(pool: &mut Pool, caller: AccountId, args: &[&str]) {
    if args.len() < 2 {
        println!("Usage: target <id> <target_bp>");
        return;
    }
    let Some(id) = parse_holding(args) else {
        println!("Invalid holding id: '{}'", args[0]);
        return;
    };
    let Ok(target) = args[1].parse() else {
        println!("Invalid target: '{}'", args[1]);
        return;
    };
    report(pool.set_target_allocation(caller, id, target), |()| {
        format!("Holding {id} now targets {target} bp")
    });
}

fn handle_rebalance(pool: &mut Pool, caller: AccountId, block: BlockHeight) {
    match pool.rebalance(caller, block) {
        Ok(result) => {
            println!(
                "Rebalanced at block {} (max deviation {} bp)",
                result.block, result.max_deviation_bps
            );
            for snap in &result.snapped {
                println!(
                    "  {} {:>12} → {:<12} ({} bp off)",
                    snap.id, snap.previous_balance, snap.new_balance, snap.deviation_bps
                );
            }
            println!(
                "  total value {} → {}",
                result.previous_total_value, result.total_value
            );
        }
        Err(e) => println!("Rejected: {e}"),
    }
}

fn report<T>(result: poolbook::Result<T>, ok: impl FnOnce(T) -> String) {
    match result {
        Ok(v) => println!("{}", ok(v)),
        Err(e) => println!("Rejected: {e}"),
    }
}

fn parse_holding(args: &[&str]) -> Option<HoldingId> {
    args.first()?.parse().ok().map(HoldingId)
}

fn parse_account(args: &[&str]) -> Option<AccountId> {
    args.first()?.parse().ok().map(AccountId)
}

fn parse_u128(args: &[&str]) -> Option<u128> {
    args.first()?.parse().ok()
}
