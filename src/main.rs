mod args;

use args::{Mode, Parsed};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use trade_clicker::config::resolve_config_path;
use trade_clicker::{AutomationController, AutomationEngine, AutomationResult, ConfigLoader};

const SCREENSHOT_FILE: &str = "cli-screenshot.png";
const WATCHDOG_PERIOD: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> ExitCode {
    let args = match args::parse_from(std::env::args().skip(1)) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Help) => {
            args::print_help();
            return ExitCode::SUCCESS;
        }
        Ok(Parsed::Version) => {
            println!(
                "Trade Clicker v{} (built {})",
                env!("APP_VERSION_DISPLAY"),
                env!("APP_BUILD_YEAR")
            );
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("❌ {msg}");
            args::print_help();
            return ExitCode::from(2);
        }
    };

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = args.level_override() {
        logger.filter_level(level);
    }
    logger.format_timestamp_millis().init();

    let config_path = resolve_config_path(&args.config_path);
    let result = match args.mode {
        Mode::Screenshot => screenshot(&config_path).await,
        Mode::Run => run(&config_path, args.timeout_secs).await,
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            log::error!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

async fn screenshot(config_path: &Path) -> AutomationResult<ExitCode> {
    let config = ConfigLoader::new(config_path).load()?;
    log::info!("📸 Capturing monitor {:?}", config.monitor);
    let engine = AutomationEngine::from_config(config.into());
    let started = Instant::now();
    let frame = engine.capture_monitor().await?;
    if let Err(e) = frame.save(SCREENSHOT_FILE) {
        log::error!("❌ Write failed: {e}");
        return Ok(ExitCode::FAILURE);
    }
    log::info!(
        "✅ Screenshot {}x{} ({}ms) saved to {SCREENSHOT_FILE}",
        frame.width(),
        frame.height(),
        started.elapsed().as_millis()
    );
    Ok(ExitCode::SUCCESS)
}

async fn run(config_path: &Path, timeout_secs: Option<u64>) -> AutomationResult<ExitCode> {
    let mut controller = AutomationController::load(config_path)?;
    controller.start().await;
    log::info!("Press Ctrl-C to stop");

    let deadline = timeout_secs.map(|secs| Instant::now() + Duration::from_secs(secs));
    let timeout = async {
        match deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(timeout);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut watchdog = tokio::time::interval(WATCHDOG_PERIOD);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                log::info!("🛑 Ctrl-C received; shutting down");
                break;
            }
            _ = &mut timeout => {
                log::info!("⏰ Timeout reached; shutting down");
                break;
            }
            _ = watchdog.tick() => {
                if !controller.engine().is_running() {
                    log::warn!("Automation stopped on its own");
                    break;
                }
            }
        }
    }

    let failure = controller.engine().last_error();
    controller.shutdown().await;
    match failure {
        Some(message) => {
            log::error!("❌ Automation halted: {message}");
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}
