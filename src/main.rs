use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use credit_dash::config::UnclassifiedSeniority;
use credit_dash::report::DEFAULT_BINS;
use credit_dash::utils::logging::{create_spinner, finish_and_clear, finish_spinner};
use credit_dash::{
    DashboardConfig, Decision, Distribution, ScoreBand, ScoringClient, Session, client_position,
};

/// Credit decision dashboard for a single loan applicant
#[derive(Debug, Parser)]
#[command(name = "credit-dash", version, about)]
struct Cli {
    /// Loan application file (.parquet or .csv)
    #[arg(long)]
    data: PathBuf,

    /// Applicant identifier (SK_ID_CURR) to score
    #[arg(long)]
    client: Option<i64>,

    /// First feature to chart against all applicants
    #[arg(long, default_value = "CLIENT_AGE")]
    feature1: String,

    /// Second feature to chart against all applicants
    #[arg(long, default_value = "ANNUAL_PAYMENT_RATE")]
    feature2: String,

    /// Number of histogram bins for numeric features
    #[arg(long, default_value_t = DEFAULT_BINS)]
    bins: usize,

    /// Scoring endpoint, overrides CREDIT_DASH_SCORING_URL
    #[arg(long)]
    scoring_url: Option<String>,

    /// Scoring timeout in seconds, overrides CREDIT_DASH_SCORING_TIMEOUT_SECS
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Fail when an applicant matches no job seniority band
    #[arg(long)]
    strict_seniority: bool,

    /// Print every applicant identifier and exit
    #[arg(long)]
    list_clients: bool,

    /// Write the fitted encoder as JSON to this file
    #[arg(long)]
    export_encoder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = DashboardConfig::from_env()?;
    if let Some(url) = cli.scoring_url {
        config.scoring.endpoint = url;
    }
    if let Some(secs) = cli.timeout_secs {
        config.scoring.timeout = Duration::from_secs(secs);
    }
    if cli.strict_seniority {
        config.pipeline.unclassified_seniority = UnclassifiedSeniority::Reject;
    }

    let spinner = create_spinner("Building the applicant pipeline...");
    let built = Session::build(&cli.data, &config.loader, &config.pipeline);
    match &built {
        Ok(_) => finish_spinner(&spinner, "Applicant pipeline ready"),
        Err(_) => finish_and_clear(&spinner),
    }
    let session = built.with_context(|| format!("failed to prepare {}", cli.data.display()))?;

    info!(
        "{} applicants, {} encoded features",
        session.client_ids().len(),
        session.vector_names().len()
    );

    if let Some(path) = &cli.export_encoder {
        std::fs::write(path, session.encoder().to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Fitted encoder written to {}", path.display());
    }

    if cli.list_clients {
        for id in session.client_ids() {
            println!("{id}");
        }
        return Ok(());
    }

    let Some(client) = cli.client.or_else(|| session.client_ids().first().copied()) else {
        warn!("The data source holds no applicants");
        return Ok(());
    };
    println!("Applicant {client}");

    let scoring = ScoringClient::new(&config.scoring)?;
    match score(&session, &scoring, client).await {
        Ok(()) => {}
        Err(e) if e.is_recoverable() => {
            warn!("{e}");
            println!("prediction unavailable");
        }
        Err(e) => return Err(e.into()),
    }

    for feature in [&cli.feature1, &cli.feature2] {
        match chart(&session, client, feature, cli.bins) {
            Ok(text) => println!("\n{text}"),
            Err(e) if e.is_recoverable() => warn!("{e}"),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

async fn score(session: &Session, scoring: &ScoringClient, client: i64) -> credit_dash::Result<()> {
    let vector = session.client_vector(client)?;
    let prediction = scoring.predict(&vector).await?;

    println!("{}", Decision::from_prediction(&prediction));
    println!(
        "Repayment score: {:.3} ({})",
        prediction.repayment_score,
        ScoreBand::from_score(prediction.repayment_score)
    );
    Ok(())
}

fn chart(session: &Session, client: i64, feature: &str, bins: usize) -> credit_dash::Result<String> {
    let distribution = Distribution::from_column(session.derived(), feature, bins)?;
    let value = session.client_feature_value(client, feature)?;
    let position = client_position(&distribution, &value);

    let mut text = distribution.render(40, position);
    text.push_str(&format!("  client value: {value}\n"));
    Ok(text)
}
