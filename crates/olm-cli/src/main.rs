mod resolve;
mod state;

use clap::Parser;
use console::style;
use env_logger::Env;
use log::debug;
use tokio_util::sync::CancellationToken;

/// Resolve operator subscriptions against catalog sources
#[derive(Parser, Debug)]
#[command(name = "olm-resolve", version, about)]
struct Cli {
    #[command(flatten)]
    resolve: resolve::ResolveArgs,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let code = match resolve::execute(cli.resolve, cancel).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            1
        }
    };

    std::process::exit(code);
}
