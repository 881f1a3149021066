use anyhow::Result;
use clap::{Parser, Subcommand};
use minledger_core::chain::Chain;
use minledger_core::constants::DEFAULT_DIFFICULTY;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "minledger-cli")]
#[command(about = "Demo driver for the minimal proof-of-work ledger")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine a two-block chain, dump it, then show tamper detection
    Demo {
        /// Leading zero hex digits required of each block hash
        #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
        difficulty: u32,
    },
    /// Mine a single block carrying the given payload items and print it
    Mine {
        /// Leading zero hex digits required of the block hash
        #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
        difficulty: u32,
        /// Payload items, in order
        payload: Vec<String>,
    },
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Demo { difficulty } => demo(difficulty),
        Command::Mine {
            difficulty,
            payload,
        } => {
            let mut chain = Chain::with_difficulty(difficulty);
            let block = chain.append(payload)?;
            println!("{}", serde_json::to_string_pretty(block)?);
            Ok(())
        }
    }
}

fn demo(difficulty: u32) -> Result<()> {
    let mut chain = Chain::with_difficulty(difficulty);

    println!("Mining block 1...");
    chain.append(vec!["Transaction 1: Alice -> Bob: 50 coins".into()])?;

    println!("Mining block 2...");
    chain.append(vec!["Transaction 2: Bob -> Charlie: 30 coins".into()])?;

    println!("\nBlockchain:");
    println!("{}", serde_json::to_string_pretty(chain.blocks())?);

    println!("\nIs blockchain valid? {}", chain.verify());

    println!("\nTampering with block 1...");
    chain.tamper_with(
        1,
        vec!["Tampered Transaction: Alice -> Bob: 1000000 coins".into()],
    );
    println!("Is blockchain valid after tampering? {}", chain.verify());

    Ok(())
}
