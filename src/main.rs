use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use food_scan::{analyzer, cli, config, error, report};
use food_scan_common::{Analysis, ImageLocator, ScanSession, SYSTEM_PROMPT};
use analyzer::Analyzer;
use cli::{Cli, Commands};
use config::Config;
use error::FoodScanError;

/// 画像を受け取れなかったときのメッセージ
const CAPTURE_ERROR_MESSAGE: &str = "Could not take picture. Please try again!";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load().context("設定の読み込みに失敗しました")?;

    match cli.command {
        Commands::Scan { image, json, endpoint, interactive } => {
            scan_command(config, image, json, endpoint, interactive).await?;
        }

        Commands::Config { set_endpoint, set_timeout, show } => {
            let mut config = config;
            let mut changed = false;

            if let Some(endpoint) = set_endpoint {
                config.set_endpoint(endpoint)?;
                changed = true;
                println!("✔ エンドポイントを設定しました");
            }

            if let Some(seconds) = set_timeout {
                config.timeout_seconds = seconds;
                changed = true;
                println!("✔ タイムアウトを設定しました");
            }

            if changed {
                config.save()?;
            }

            if show || !changed {
                println!("設定:");
                println!("  エンドポイント: {}", config.endpoint);
                match config.timeout() {
                    Some(timeout) => println!("  タイムアウト: {}秒", timeout.as_secs()),
                    None => println!("  タイムアウト: なし"),
                }
                if let Ok(path) = Config::config_path() {
                    println!("  設定ファイル: {}", path.display());
                }
            }
        }

        Commands::Prompt => {
            println!("{}", SYSTEM_PROMPT);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn scan_command(
    config: Config,
    image: String,
    json: bool,
    endpoint: Option<String>,
    interactive: bool,
) -> error::Result<()> {
    let mut config = config.with_env_overrides();
    if let Some(endpoint) = endpoint {
        config.set_endpoint(endpoint)?;
    }

    let pipeline = Analyzer::new(&config)?;
    let mut session: ScanSession<Analysis> = ScanSession::new();
    let mut next = Some(image);

    while let Some(input) = next.take() {
        match ImageLocator::parse(&input) {
            Ok(locator) => run_scan(&pipeline, &mut session, locator).await,
            Err(e) => {
                tracing::error!("invalid image locator: {}", e);
                session.reset();
                session.set_error(Some(CAPTURE_ERROR_MESSAGE.to_string()));
            }
        }

        print_session(&session, json)?;

        if interactive {
            next = ask_next_image()?;
            if next.is_some() {
                session.reset();
            }
        }
    }

    Ok(())
}

async fn run_scan(pipeline: &Analyzer, session: &mut ScanSession<Analysis>, locator: ImageLocator) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(report::LOADING_TEXT);
    spinner.enable_steady_tick(Duration::from_millis(100));

    analyzer::scan(pipeline, session, locator).await;

    spinner.finish_and_clear();
}

fn print_session(session: &ScanSession<Analysis>, json: bool) -> error::Result<()> {
    if json {
        println!("{}", report::render_json(session)?);
    } else {
        print!("{}", report::render(session));
    }
    Ok(())
}

fn ask_next_image() -> error::Result<Option<String>> {
    let again = Confirm::new()
        .with_prompt("Scan another food?")
        .default(true)
        .interact()
        .map_err(|e| FoodScanError::Cli(e.to_string()))?;

    if !again {
        return Ok(None);
    }

    let input: String = Input::new()
        .with_prompt("Image")
        .interact_text()
        .map_err(|e| FoodScanError::Cli(e.to_string()))?;

    Ok(Some(input))
}
