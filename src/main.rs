use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::prelude::*;

use parrot::bot::{Command, Engine};
use parrot::config::Config;

/// What a console line asks for.
enum Input<'a> {
    Command(Command),
    Shutdown,
    Unknown(&'a str),
    Message(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let Some(name) = line.trim().strip_prefix('!') else {
        return Input::Message(line);
    };
    if name.eq_ignore_ascii_case("shutdown") {
        return Input::Shutdown;
    }
    match Command::parse(name) {
        Some(command) => Input::Command(command),
        None => Input::Unknown(name),
    }
}

fn print_reply(name: &str, text: &str) {
    let timestamp = chrono::Local::now().format("%H:%M");
    for line in text.lines() {
        println!("[{timestamp}] {name}: {line}");
    }
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "parrot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("parrot.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting parrot...");
    info!("Loaded config from {config_path}");

    let mut engine = Engine::initialize(
        &config.main_corpus_path,
        &config.supplementary_corpus_path,
        config.engine.clone(),
    );
    engine.start_scheduler();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read stdin: {e}");
                break;
            }
        };

        match parse_input(&line) {
            Input::Command(command) => print_reply(&config.bot_name, &engine.run_command(command)),
            Input::Shutdown => break,
            Input::Unknown(name) => {
                let known: Vec<&str> = Command::ALL.iter().map(|c| c.name()).collect();
                println!("Unknown command '{name}'. Known: {}, shutdown", known.join(", "));
            }
            Input::Message(text) => {
                if let Some(reply) = engine.respond(text, &config.bot_name, true) {
                    print_reply(&config.bot_name, &reply);
                }
            }
        }
    }

    engine.shutdown().await;
}
