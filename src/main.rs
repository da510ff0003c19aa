use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use tweetdump::client::TwitterClient;
use tweetdump::clock::SystemClock;
use tweetdump::collector::{CancelFlag, Collector, CollectorConfig, EndReason};
use tweetdump::output;

#[derive(Parser)]
#[command(name = "tweetdump")]
#[command(about = "Download a Twitter/X user's tweets to a timestamped JSON file")]
struct Args {
    /// Handle to fetch (prompted for interactively when omitted)
    handle: Option<String>,

    /// Tweets requested per page
    #[arg(long, default_value_t = 100)]
    page_size: u32,

    /// Directory the output file is written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

// Exit codes: 2 for lookup/usage failures, 1 for a failed write, 3 when the
// retry budget ran out (partial results are still written first).
#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let token = match std::env::var("TWITTER_BEARER_TOKEN") {
        Ok(token) if !token.trim().is_empty() => token,
        _ => {
            eprintln!("Set TWITTER_BEARER_TOKEN to an API bearer token");
            return ExitCode::from(2);
        }
    };

    let handle = match args.handle {
        Some(handle) => handle,
        None => match prompt_handle() {
            Ok(handle) => handle,
            Err(err) => {
                eprintln!("Could not read handle: {}", err);
                return ExitCode::from(2);
            }
        },
    };
    let handle = handle.trim().trim_start_matches('@').to_string();
    if handle.is_empty() {
        eprintln!("No handle given");
        return ExitCode::from(2);
    }

    let client = TwitterClient::new(token, Duration::from_secs(args.timeout));

    let user_id = match client.resolve_user(&handle).await {
        Ok(id) => id,
        Err(err) => {
            eprintln!("Could not resolve @{}: {}", handle, err);
            return ExitCode::from(2);
        }
    };
    println!("Resolved @{} to user id {}", handle, user_id);

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Interrupt received, stopping after the current wait");
                cancel.cancel();
            }
        });
    }

    let clock = SystemClock;
    let config = CollectorConfig {
        page_size: args.page_size,
        ..CollectorConfig::default()
    };
    let collection = Collector::new(&client, &clock, config)
        .with_cancel_flag(cancel)
        .collect(&user_id)
        .await;

    if collection.tweets.is_empty() {
        println!("Nothing to write");
    } else {
        let filename = output::output_filename(&handle, chrono::Local::now());
        let path = args.output_dir.join(filename);
        if let Err(err) = output::write_tweets(&collection.tweets, &path) {
            eprintln!("Failed to save tweets: {:#}", err);
            return ExitCode::from(1);
        }
        println!("Saved {} tweets to {}", collection.tweets.len(), path.display());
    }

    ExitCode::from(completion_code(collection.end))
}

/// A run that burned through the retry budget is an unrecoverable
/// collection failure and gets its own code, whether or not any tweets
/// were collected (and written) before it.
fn completion_code(end: EndReason) -> u8 {
    match end {
        EndReason::RetryBudgetExhausted => 3,
        _ => 0,
    }
}

fn prompt_handle() -> io::Result<String> {
    print!("Twitter handle: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_exhaustion_is_nonzero_even_when_nothing_was_collected() {
        // Five failures on the very first page leave an empty collection;
        // the run must still exit 3, not 0.
        assert_eq!(completion_code(EndReason::RetryBudgetExhausted), 3);
    }

    #[test]
    fn test_normal_endings_exit_zero() {
        assert_eq!(completion_code(EndReason::EndOfTimeline), 0);
        assert_eq!(completion_code(EndReason::MissingMeta), 0);
        assert_eq!(completion_code(EndReason::Cancelled), 0);
    }
}
