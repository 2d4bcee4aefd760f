mod cli;
mod error;
mod resolver;

use colored::Colorize;
use error::AppError;
use fleetpush_build::{DockerCli, Orchestrator, PublishKind};
use fleetpush_core::BuildPlan;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // stdout はビルド進捗と dry-run 出力に使うので、ログは stderr へ
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Vec<String>) -> Result<(), AppError> {
    let invocation = cli::parse_invocation(args)?;
    let catalog = resolver::load_catalog(&invocation.cli)?;
    let plan = resolver::resolve_plan(&invocation, &catalog)?;

    print_plan(&plan);

    if plan.is_empty() {
        println!("{}", "公開対象のエントリがありません".yellow());
        return Ok(());
    }

    let engine = DockerCli::new(invocation.cli.engine.as_str()).with_dry_run(invocation.cli.dry_run);
    let orchestrator = Orchestrator::new(engine);
    let report = orchestrator.execute(&plan).await?;

    println!();
    println!(
        "{}",
        format!(
            "✓ すべてのイメージを {} に公開しました！",
            report.registry
        )
        .green()
        .bold()
    );

    println!();
    println!("{}", "結果サマリー:".bold());
    for image in &report.published {
        let kind = match image.kind {
            PublishKind::Built => "build",
            PublishKind::Republished => "mirror",
        };
        println!(
            "  {} {} ({}): {}",
            "✓".green(),
            image.name,
            kind.dimmed(),
            image.reference.cyan()
        );
    }

    Ok(())
}

fn print_plan(plan: &BuildPlan) {
    println!("{}", "イメージをビルド・公開します".green());
    println!("レジストリ: {}", plan.registry.address().cyan());
    match plan.platform {
        Some(platform) => println!("プラットフォーム: {}", platform.to_string().cyan()),
        None => println!("プラットフォーム: {}", "native".cyan()),
    }

    println!();
    println!(
        "{}",
        format!(
            "対象 ({} サービス, {} リモートイメージ):",
            plan.services.len(),
            plan.remote_images.len()
        )
        .bold()
    );
    for service in &plan.services {
        println!("  • {}", service.name.cyan());
    }
    for remote in &plan.remote_images {
        println!(
            "  • {} {}",
            remote.name.cyan(),
            format!("({})", remote.source_image).dimmed()
        );
    }
}
