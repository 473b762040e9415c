use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use studyreel::config::Config;
use studyreel::models::HttpModelProvider;
use studyreel::pipeline::Pipeline;
use studyreel::story::Style;

#[derive(Parser, Debug)]
#[command(name = "studyreel")]
#[command(about = "Generate a narrated learning video from a topic", long_about = None)]
struct Args {
    /// Learning topic to generate content for
    #[arg(short, long)]
    topic: String,

    /// Tone of the generated storyline
    #[arg(short, long, value_enum, default_value_t = Style::Study)]
    style: Style,

    /// Output video file path
    #[arg(short, long, default_value = "final_video_no_subtitles.mp4")]
    output: PathBuf,

    /// Base URL of the model inference gateway
    #[arg(long, default_value = "http://localhost:8000")]
    gateway: String,

    /// Model gateway API key
    #[arg(long)]
    api_key: Option<String>,

    /// Retry attempts per outbound model call
    #[arg(long, default_value_t = 3)]
    retries: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();

    let api_key = if let Some(key) = args.api_key {
        key
    } else if let Ok(key) = std::env::var("MODEL_GATEWAY_API_KEY") {
        key
    } else {
        eprintln!("Error: MODEL_GATEWAY_API_KEY not found. Please set it via --api-key or MODEL_GATEWAY_API_KEY environment variable");
        std::process::exit(1);
    };

    let mut config = Config::default();
    config.retry.attempts = args.retries;

    info!("Starting video generation for topic: {}", args.topic);
    let provider = HttpModelProvider::new(api_key, &args.gateway, &config);
    let pipeline = Pipeline::new(&provider, &provider, &provider, &config);

    match pipeline.run(&args.topic, args.style, &args.output).await {
        Ok(video) => {
            info!(
                "Video generation completed: {} ({:.2}s)",
                video.path.display(),
                video.duration
            );
            Ok(())
        }
        Err(e) => {
            error!("Video generation failed: {}", e);
            std::process::exit(1);
        }
    }
}
