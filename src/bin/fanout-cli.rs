use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};

use api_fanout::games::{find_game_index, select_game};
use api_fanout::upstream::GamesPayload;

#[derive(Parser)]
#[command(name = "fanout-cli")]
#[command(about = "Query the aggregation endpoint and exercise game selection offline", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call the running endpoint and print the aggregated response
    Fetch {
        /// Game number: positive for listed games, negative for hidden ones
        #[arg(long, allow_negative_numbers = true)]
        play: Option<i64>,
        /// Game name to look up
        #[arg(long)]
        game: Option<String>,
        /// Referer header to send
        #[arg(long)]
        referer: Option<String>,
    },
    /// Pick a game by number from a games JSON file (0 picks at random)
    Select {
        #[arg(allow_negative_numbers = true)]
        selection: i64,
        #[arg(long)]
        games: PathBuf,
    },
    /// Find the signed position of a game in a games JSON file
    Find {
        name: String,
        #[arg(long)]
        games: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch { play, game, referer } => {
            let client = reqwest::Client::new();
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(play) = play {
                query.push(("play", play.to_string()));
            }
            if let Some(game) = game {
                query.push(("game", game));
            }

            let mut request = client.get(&cli.url).query(&query);
            if let Some(referer) = referer {
                request = request.header(reqwest::header::REFERER, referer);
            }
            print_response(request.send().await?).await?;
        }
        Commands::Select { selection, games } => {
            let games = read_games(&games)?;
            match select_game(selection, &games.gamechoices, &games.hiddengames) {
                Some(game) => println!("{}", game),
                None => eprintln!("No game at position {}", selection),
            }
        }
        Commands::Find { name, games } => {
            let games = read_games(&games)?;
            println!("{}", find_game_index(&name, &games.gamechoices, &games.hiddengames));
        }
    }

    Ok(())
}

fn read_games(path: &Path) -> Result<GamesPayload, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    Ok(GamesPayload::from_value(&value)?)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(exec_ms) = res.headers().get("x-exec-ms").and_then(|v| v.to_str().ok()) {
        eprintln!("Status {} in {} ms", status, exec_ms);
    }

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }

    if !status.is_success() {
        eprintln!("Error: endpoint returned status {}", status);
    }
    Ok(())
}
