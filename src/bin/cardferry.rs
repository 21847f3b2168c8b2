use cardferry::config::Config;
use cardferry::{export, greeting, loader, GreetingPolicy};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "Usage: cardferry <card.png|card.json> [options]

Options:
  --user NAME        Substitute NAME for {{user}} placeholders
  --random           Pick the greeting at random
  --greeting N       Pick alternate greeting N (1-based)
  --avatar PATH      Override the card's avatar reference
  --out-json PATH    Re-export the card as a JSON document
  --out-png PATH     Re-embed the card into a PNG
  --base-image PATH  Base image for --out-png";

fn require_value(args: &mut impl Iterator<Item = String>, flag: &str) -> String {
    match args.next() {
        Some(value) => value,
        None => {
            eprintln!("{} requires a value\n{}", flag, USAGE);
            std::process::exit(2);
        }
    }
}

fn main() {
    let config = Config::from_env();
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_directive())),
        )
        .init();

    let mut card_path: Option<String> = None;
    let mut user_name = String::new();
    let mut policy = GreetingPolicy::Fixed;
    let mut avatar: Option<String> = None;
    let mut out_json: Option<PathBuf> = None;
    let mut out_png: Option<PathBuf> = None;
    let mut base_image: Option<PathBuf> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--user" => user_name = require_value(&mut args, "--user"),
            "--random" => policy = GreetingPolicy::Random,
            "--greeting" => {
                let raw = require_value(&mut args, "--greeting");
                match raw.parse::<usize>() {
                    Ok(n) => policy = GreetingPolicy::Indexed(n),
                    Err(_) => {
                        eprintln!("--greeting expects a number, got '{}'", raw);
                        std::process::exit(2);
                    }
                }
            }
            "--avatar" => avatar = Some(require_value(&mut args, "--avatar")),
            "--out-json" => out_json = Some(require_value(&mut args, "--out-json").into()),
            "--out-png" => out_png = Some(require_value(&mut args, "--out-png").into()),
            "--base-image" => base_image = Some(require_value(&mut args, "--base-image").into()),
            "--help" | "-h" => {
                println!("{}", USAGE);
                return;
            }
            _ if card_path.is_none() => card_path = Some(arg),
            _ => {
                eprintln!("Unexpected argument '{}'\n{}", arg, USAGE);
                std::process::exit(2);
            }
        }
    }

    let card_path = match card_path {
        Some(p) => p,
        None => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    let mut card = match loader::load_card(&card_path, avatar.as_deref()) {
        Ok(card) => card,
        Err(e) => {
            eprintln!("Failed to load character: {}", e);
            std::process::exit(1);
        }
    };
    info!("Character loaded: {}", card);

    let (context, greeting_text) = greeting::initial_message(&card, &user_name, policy);
    print!("{}", context);
    println!("{}", greeting_text);

    if let Some(path) = out_json {
        if let Err(e) = export::save_json(&mut card, &path) {
            eprintln!("Failed to save JSON card: {}", e);
            std::process::exit(1);
        }
    }
    if let Some(path) = out_png {
        if let Err(e) = export::save_png(&mut card, &path, base_image.as_deref().map(Path::new)) {
            eprintln!("Failed to save card PNG: {}", e);
            std::process::exit(1);
        }
    }
}
