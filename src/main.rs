use std::io::Write;

use anyhow::Result;
use multichain_wallet::{SessionMode, SessionSnapshot, WalletCommand, WalletConfig, WalletSession};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  generate              create a new wallet
  import <phrase>       restore from a mnemonic phrase
  watch <address>       track an address without keys
  add                   derive the next account
  refresh               reload all balances
  chain <solana|ethereum>
  logout                discard everything (asks first)
  show                  print the current wallet
  quit";

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let config = WalletConfig::load()?;
    let mut session = WalletSession::new(&config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    loop {
        print!("[{}] > ", session.active_chain().display_name);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));

        let command = match verb {
            "" => continue,
            "help" => {
                println!("{HELP}");
                continue;
            }
            "quit" | "exit" => break,
            "show" => {
                render(&session.apply_pending(), false);
                continue;
            }
            "generate" => WalletCommand::Generate,
            "import" => WalletCommand::Import(rest.to_string()),
            "watch" => WalletCommand::Watch(rest.to_string()),
            "add" => WalletCommand::AddAccount,
            "refresh" => WalletCommand::Refresh,
            "chain" => match rest.parse() {
                Ok(id) => WalletCommand::SwitchChain(id),
                Err(e) => {
                    println!("{e}");
                    continue;
                }
            },
            "logout" => {
                print!("Reset everything? [y/N] ");
                std::io::stdout().flush()?;
                let answer = lines.next_line().await?.unwrap_or_default();
                WalletCommand::Logout {
                    confirmed: answer.trim().eq_ignore_ascii_case("y"),
                }
            }
            other => {
                println!("unknown command '{other}', try 'help'");
                continue;
            }
        };

        let show_seed = command == WalletCommand::Generate;
        match session.dispatch(command) {
            Ok(_) => render(&session.settle().await, show_seed),
            Err(e) => println!("error: {e}"),
        }
    }

    Ok(())
}

fn render(snapshot: &SessionSnapshot, show_seed: bool) {
    println!("{} ({:?})", snapshot.chain.display_name, snapshot.mode);

    if show_seed {
        if let Some(words) = &snapshot.seed_words {
            println!("write these words down, they are not stored anywhere:");
            for (i, word) in words.iter().enumerate() {
                println!("  {:>2}. {word}", i + 1);
            }
        }
    }

    if snapshot.mode == SessionMode::Empty {
        println!("  no wallet; generate, import or watch one");
        return;
    }
    for account in &snapshot.accounts {
        let watched = if account.is_watched { " (Watched)" } else { "" };
        println!(
            "  {}{watched}  {}  {} {}",
            account.label,
            account.public_key,
            account.display_balance(),
            snapshot.chain.native_symbol
        );
    }
}
