use anyhow::Context as _;
use ffmpeg_session::Settings;

mod config;

fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .filter_module("ffmpeg_session", log::LevelFilter::Debug)
        .parse_default_env()
        .init();
}

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    let Some(settings) = config::config().settings_from_args(&args) else {
        let program = args.first().map(String::as_str).unwrap_or("testcard");
        eprintln!("Usage: {} <output file> <codec name>", program);
        std::process::exit(2);
    };

    if let Err(e) = run(settings) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Encodes the configured number of pattern frames into `settings.path`.
fn run(settings: Settings) -> anyhow::Result<()> {
    ffmpeg_session::init()?;

    let path = settings.path.clone();
    let frames = config::config().frames();

    let mut session = ffmpeg_session::open(settings).context("create video file")?;
    for index in 0..frames {
        session
            .submit_frame()
            .with_context(|| format!("write frame at index {}", index))?;
    }
    session.close().context("finish video file")?;

    match ffmpeg_session::probe(&path) {
        Ok(info) => log::info!("wrote {}\n{}", path, info),
        Err(e) => log::warn!("could not probe {}: {}", path, e),
    }
    Ok(())
}
