use clap::Parser;
use tokio_util::sync::CancellationToken;
use trade_swarm::utils::error::ErrorSeverity;
use trade_swarm::utils::{logger, validation::Validate};
use trade_swarm::{AttackEngine, CliConfig, TaskCatalog};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(config.verbose, config.json_logs);

    tracing::info!("Starting trade-swarm");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let engine = AttackEngine::new(config);

    if engine.config().list {
        let catalog = engine.catalog()?;
        print_catalog(&catalog);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("🛑 Ctrl+C received, stopping users after their current request");
            ctrl_c.cancel();
        }
    });

    match engine.run(shutdown).await {
        Ok(report) => {
            for file in &report.report_files {
                println!("📁 Report saved to: {}", file);
            }
            let code = report.exit_code();
            if code != 0 {
                tracing::warn!(
                    "{} of {} requests failed",
                    report.snapshot.aggregated.failures,
                    report.snapshot.aggregated.requests
                );
                std::process::exit(code);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Load test failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn print_catalog(catalog: &TaskCatalog) {
    println!("Available operations:");
    for op in catalog.operations() {
        println!(
            "  {:<24} {:<5} {:<40} weight={}",
            op.name,
            op.method.as_str(),
            op.path,
            op.weight
        );
    }
}
