use clap::Parser;
use log::{error, info};
use server::network::Server;
use server::questions::QuestionSet;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on (0 picks a free port)
    #[clap(short, long, default_value = "0")]
    port: u16,
    /// Path to the question file
    #[clap(short, long, default_value = "questions.json")]
    questions: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let questions = match QuestionSet::load(&args.questions) {
        Ok(set) => Arc::new(set),
        Err(err) => {
            error!("Failed to load questions from {}: {}", args.questions, err);
            std::process::exit(1);
        }
    };

    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, questions).await?;
    let local_addr = server.local_addr()?;

    info!("Game is live on ws://{}", local_addr);
    info!(
        "Join with: client --server {} --name YourName (type `stop` to shut down)",
        local_addr
    );

    let (stop_sender, mut stop_receiver) = mpsc::channel::<()>(1);
    spawn_stop_listener(stop_sender);

    tokio::select! {
        result = server.run() => {
            if let Err(err) = result {
                error!("Server error: {}", err);
            }
        }
        _ = stop_receiver.recv() => {
            info!("Stopping the game...");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}

/// Watches stdin for the operator `stop` command.
fn spawn_stop_listener(stop_sender: mpsc::Sender<()>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().eq_ignore_ascii_case("stop") {
                let _ = stop_sender.send(()).await;
                break;
            }
        }
    });
}
