use clap::Parser;
use mdt_eval::config::{AppConfig, Cli, Command, RunArgs};
use mdt_eval::pipeline::EvaluationPipeline;
use mdt_eval::report::ConsoleReporter;
use mdt_eval::session::run_evaluation;
use mdt_eval::EvalError;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Missing .env is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mdt_eval=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => match run(args).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(args: RunArgs) -> Result<(), EvalError> {
    let Some(pdf) = args.pdf.clone() else {
        eprintln!("Usage: mdt-eval run <path_to_pdf>");
        return Err(EvalError::Config("no PDF path given".to_string()));
    };

    let config = AppConfig::from_args(&args)?;
    let pipeline = EvaluationPipeline::new(config.load_prompts()?);
    let provider = config.build_provider();
    tracing::info!("Using provider: {}", provider.name());

    let mut reporter = ConsoleReporter::stdout();
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let report = run_evaluation(provider.as_ref(), &pipeline, &pdf, &mut reporter, shutdown).await?;
    tracing::info!(
        "Evaluation finished: transcript {} chars, {} tasks recorded",
        report.transcript.len(),
        report.tasks.len()
    );
    Ok(())
}
