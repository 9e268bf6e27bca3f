use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use trade_swarm::domain::ports::ConfigProvider;
use trade_swarm::utils::{logger, validation::Validate};
use trade_swarm::{AttackEngine, LoadProfile};

#[derive(Parser)]
#[command(name = "profile-swarm")]
#[command(about = "Run a load test described by a TOML profile")]
struct Args {
    /// Path to TOML load profile
    #[arg(short, long, default_value = "swarm.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override target.host
    #[arg(long)]
    host: Option<String>,

    /// Override users.count
    #[arg(short = 'u', long)]
    users: Option<usize>,

    /// Override users.run_time (e.g. 30s, 5m)
    #[arg(short = 't', long)]
    run_time: Option<String>,

    #[arg(long, help = "Emit logs as JSON lines")]
    json_logs: bool,

    /// Show the resolved plan without sending any request
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 先載入設定檔，日誌等級可能由 [monitoring] log_level 決定
    let mut profile = LoadProfile::from_file(&args.config)
        .with_context(|| format!("failed to load profile '{}'", args.config))?;

    logger::init_logger_with_default(profile.log_level(), args.verbose, args.json_logs);

    tracing::info!("🚀 Starting profile-driven swarm");
    tracing::info!("📁 Loaded profile from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(host) = args.host {
        tracing::info!("🔧 Host overridden to: {}", host);
        profile.target.host = host;
    }
    if let Some(users) = args.users {
        tracing::info!("🔧 Users overridden to: {}", users);
        profile.users.count = users;
    }
    if let Some(run_time) = args.run_time {
        tracing::info!("🔧 Run time overridden to: {}", run_time);
        profile
            .set_run_time(Some(run_time))
            .context("invalid --run-time override")?;
    }

    if let Err(e) = profile.validate() {
        tracing::error!("❌ Profile validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let engine = AttackEngine::new(profile);
    let catalog = engine.catalog().context("invalid catalog section")?;

    display_plan(engine.config(), catalog.operations().len());

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no requests will be sent");
        for op in catalog.operations() {
            println!("  {:<24} {} {} (weight {})", op.name, op.method, op.path, op.weight);
        }
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

    let report = engine.run(shutdown).await.context("load test failed")?;
    for file in &report.report_files {
        println!("📁 Report saved to: {}", file);
    }

    let code = report.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn display_plan(profile: &LoadProfile, operations: usize) {
    tracing::info!("📋 Plan:");
    tracing::info!("  Host: {}", profile.host());
    tracing::info!(
        "  Users: {} (spawn rate {:.2}/s)",
        profile.users(),
        profile.spawn_rate()
    );
    match profile.run_time() {
        Some(run_time) => tracing::info!("  Run time: {:?}", run_time),
        None => tracing::info!("  Run time: until Ctrl+C"),
    }
    tracing::info!(
        "  Think time: {:?}..{:?}",
        profile.min_wait(),
        profile.max_wait()
    );
    tracing::info!("  Operations: {}", operations);
    tracing::info!("  Authenticate: {}", profile.authenticate());
}
