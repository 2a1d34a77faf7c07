//! Poll lifecycle commands: open, rehearse, results, close, reset.

use std::io::{self, Write};
use std::sync::Arc;
use zkballot::config::PollConfig;
use zkballot::hasher::Sha256FieldHasher;
use zkballot::ledger::{JsonFileStore, LedgerState, MemoryLedgerStore, VotingLedger};
use zkballot::oracle::MockProofOracle;
use zkballot::poll::{build_tree, Poll, VoteReceipt};
use zkballot::registry::VoterRegistry;
use zkballot::types::{Vote, VotingId};
use zkballot::verification::{MockVerificationService, MockVerifierMode};

async fn load_ledger(config: &PollConfig) -> Result<VotingLedger, Box<dyn std::error::Error>> {
    let store = JsonFileStore::new(&config.poll.ledger_path);
    Ok(VotingLedger::load(Arc::new(store)).await?)
}

/// Build the tree over the registry and bind the ledger to its root.
pub async fn open(config: &PollConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = VoterRegistry::load(&config.poll.registry_path)?;
    let tree = build_tree(&mut registry, config.padding(), &Sha256FieldHasher)?;
    let voting_id = VotingId(tree.root());

    let ledger = load_ledger(config).await?;
    ledger.open_poll(voting_id).await?;

    println!("Poll open");
    println!("  Voting ID: {}", voting_id);
    println!("  Voters:    {}", registry.len());
    println!("  Leaves:    {} (depth {})", tree.leaf_count(), tree.depth());
    println!("  Choices:   {}", config.poll.choices.join(", "));
    Ok(())
}

/// Cast one vote end to end with the built-in mock prover and verifier.
///
/// Runs against an in-memory copy of the ledger file, which is left
/// untouched. Proving and verification follow the `[proving]` and
/// `[verification]` config sections.
pub async fn rehearse(
    config: &PollConfig,
    voter: &str,
    vote: u64,
) -> Result<VoteReceipt, Box<dyn std::error::Error>> {
    let registry = VoterRegistry::load(&config.poll.registry_path)?;
    let snapshot = load_ledger(config).await?.snapshot().await;
    let ledger = VotingLedger::load(Arc::new(MemoryLedgerStore::with_snapshot(snapshot))).await?;

    let poll = Poll::open(
        config.settings(),
        registry,
        Arc::new(Sha256FieldHasher),
        Arc::new(ledger),
        Arc::new(MockProofOracle::new()),
        Arc::new(MockVerificationService::new(MockVerifierMode::Accept)),
    )
    .await?;
    let (receipt, secret) = poll.cast(voter, Vote(vote)).await?;

    println!("Rehearsal vote recorded (ledger file unchanged)");
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    println!("Opening: {}", serde_json::to_string(&secret)?);
    Ok(receipt)
}

/// Print the tally by choice label.
pub async fn results(config: &PollConfig) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = load_ledger(config).await?;
    let snapshot = ledger.snapshot().await;

    match snapshot.voting_id {
        Some(voting_id) => println!("Voting ID: {}", voting_id),
        None => println!("Voting ID: (no poll open)"),
    }
    let state = match snapshot.state() {
        LedgerState::Open => "open",
        LedgerState::Closed => "closed",
    };
    println!("State:     {}", state);
    println!();

    for (i, label) in config.poll.choices.iter().enumerate() {
        let count = snapshot.tally.get(&Vote(i as u64)).copied().unwrap_or(0);
        println!("  {:>3}  {:<20} {}", i, label, count);
    }
    println!();
    println!("Total votes: {}", snapshot.total_votes());
    Ok(())
}

pub async fn close(config: &PollConfig) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = load_ledger(config).await?;
    ledger.close().await?;
    println!("Poll closed with {} votes", ledger.total_votes().await);
    Ok(())
}

pub async fn reset(config: &PollConfig, yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !yes {
        print!(
            "This clears the tally and spent nullifiers in '{}'. Continue? [y/N] ",
            config.poll.ledger_path.display()
        );
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("Aborted");
            return Ok(());
        }
    }

    let ledger = load_ledger(config).await?;
    ledger.reset().await?;
    println!("Ledger reset");
    Ok(())
}
