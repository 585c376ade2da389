use clap::Parser;
use std::process::ExitCode;
use tab_ingest::core::ConfigProvider;
use tab_ingest::utils::error::ErrorSeverity;
use tab_ingest::utils::{logger, validation::Validate};
use tab_ingest::{CliConfig, EtlEngine, EtlError, IngestPipeline, LocalStorage, TomlConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting tab-ingest CLI");
    tracing::debug!("CLI config: {:?}", cli);

    let monitor_enabled = cli.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let outcome = match cli.config.clone() {
        Some(path) => match TomlConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!("Loaded pipeline '{}' from {}", config.name(), path.display());
                run(config, monitor_enabled).await
            }
            Err(e) => Err(e),
        },
        None => run(cli, monitor_enabled).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_failure(&e),
    }
}

async fn run<C: ConfigProvider + Validate>(config: C, monitor_enabled: bool) -> Result<(), EtlError> {
    config.validate()?;

    let pipeline = IngestPipeline::new(LocalStorage::default(), config)?;
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);
    let summary = engine.run().await?;

    let report = &summary.cleaning;
    tracing::info!("✅ ETL process completed successfully!");
    println!("✅ ETL process completed successfully!");
    println!(
        "🧹 {} rows in, {} duplicates removed, {} rows dropped, {} values filled, {} rows out",
        summary.rows_extracted,
        report.duplicates_removed,
        report.rows_dropped,
        report.values_filled,
        report.rows_after
    );
    println!("📁 CSV saved to: {}", summary.load.csv_path.display());
    println!(
        "🗄️  Table '{}' saved to: {}",
        summary.load.table, summary.load.database
    );
    Ok(())
}

fn report_failure(e: &EtlError) -> ExitCode {
    tracing::error!(
        "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    ExitCode::from(exit_code)
}
