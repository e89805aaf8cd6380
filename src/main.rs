use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::ValueEnum;
use eyre::{Result, bail, eyre};
use log::{debug, info};

mod cli;

use cli::{Cli, OutputFormat};
use ytsum::completion::HttpCompletion;
use ytsum::config::{Config, config_path};
use ytsum::output::{Report, render_json, render_text};
use ytsum::proxy::{ProxyDirectory, PublicProxyList};
use ytsum::session::{Session, Workflow};
use ytsum::youtube::YouTubeCaptions;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytsum")
        .join("logs")
}

fn build_after_help() -> String {
    format!(
        "\nCREDENTIALS:\n  GROQ_API_KEY (default), OPENAI_API_KEY (gpt-*/o*), ANTHROPIC_API_KEY (claude-*)\n\n\
         Config is read from: {}\nLogs are written to: {}",
        config_path().display(),
        log_dir().join("ytsum.log").display()
    )
}

/// First non-empty line of stdin
fn read_url_from_stdin() -> Result<String> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        if !line.trim().is_empty() {
            return Ok(line.trim().to_string());
        }
    }
    bail!("no URL or video ID provided\n\nUsage: ytsum <URL>\n       echo <URL> | ytsum");
}

/// Attach the error's guidance, if any, below its message
fn report(e: ytsum::Error) -> eyre::Report {
    match e.hint() {
        Some(hint) => eyre!("{e}\n\n{hint}"),
        None => eyre!(e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cmd = <Cli as clap::CommandFactory>::command().after_help(build_after_help());
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_default();
    let catalog = config.language_catalog();

    if cli.list_languages {
        for language in catalog.languages() {
            println!("{language}");
        }
        return Ok(());
    }

    if cli.verbose {
        let path = config_path();
        if path.exists() {
            eprintln!("Config: {}", path.display());
        }
    }

    let settings = config
        .settings(cli.lang.as_deref(), cli.model.as_deref())
        .map_err(report)?;
    debug!("Settings: {settings:?}");

    let format = cli
        .format
        .or_else(|| {
            config
                .default_format
                .as_deref()
                .and_then(|f| OutputFormat::from_str(f, true).ok())
        })
        .unwrap_or(OutputFormat::Text);

    let target = cli
        .translate
        .as_deref()
        .map(|query| {
            catalog
                .find(query)
                .cloned()
                .ok_or_else(|| ytsum::Error::UnknownLanguage(query.to_string()))
        })
        .transpose()
        .map_err(report)?;

    let url = match cli.url {
        Some(ref url) => url.clone(),
        None => read_url_from_stdin()?,
    };

    let mut session = Session::new();
    if let Some(ref key) = cli.api_key {
        session.set_api_key(key);
    }

    let client = reqwest::Client::new();

    // Credentials are checked before any network traffic
    let completion =
        HttpCompletion::new(client.clone(), &settings.generation.model, session.api_key()).map_err(report)?;
    let captions = YouTubeCaptions::new(client.clone());
    let proxies = PublicProxyList::new(client.clone(), config.proxy_sources());
    let proxies: Option<&dyn ProxyDirectory> = if cli.no_proxy { None } else { Some(&proxies) };

    let workflow = Workflow::new(&captions, proxies, &completion, settings);

    session.submit_url(&url).map_err(report)?;

    let tracks = workflow.load_captions(&mut session).await.map_err(report)?;
    eprintln!("Available languages for this video:");
    for track in tracks {
        eprintln!("  - {track}");
    }

    let fetched = workflow.fetch_transcript(&mut session).await.map_err(report)?;
    if fetched.choice.is_substitution() {
        eprintln!(
            "Requested language '{}' not available. Using {} instead.",
            fetched.choice.requested, fetched.choice.track
        );
    }
    if cli.verbose {
        eprintln!(
            "Video: {} ({})\nLanguage: {}\nSegments: {}",
            fetched.transcript.title,
            fetched.transcript.video_id,
            fetched.transcript.language,
            fetched.transcript.segments.len(),
        );
    }

    let summary = workflow.summarize(&mut session).await.map_err(report)?;
    if cli.verbose {
        eprintln!("Summarized {} chunk(s)", summary.chunks);
    }

    if let Some(ref target) = target {
        workflow.translate(&mut session, target).await.map_err(report)?;
    }

    let (Some(video_id), Some(fetched), Some(summary)) = (session.video_id(), session.transcript(), session.summary())
    else {
        bail!("summary was not produced");
    };
    let result = Report {
        url: session.url(),
        video_id,
        title: &fetched.transcript.title,
        caption_language: &fetched.choice,
        summary,
        translation: session.translation(),
    };

    let rendered = match format {
        OutputFormat::Text => render_text(&result),
        OutputFormat::Json => render_json(&result),
    };

    if let Some(ref path) = cli.output {
        std::fs::write(path, &rendered)?;
        if cli.verbose {
            eprintln!("Output written to: {}", path.display());
        }
    } else {
        println!("{rendered}");
    }

    Ok(())
}
