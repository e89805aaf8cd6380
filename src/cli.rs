use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "Summarize a YouTube video from its captions",
    version
)]
pub struct Cli {
    /// YouTube video URL or video ID (reads the first line of stdin if omitted)
    pub url: Option<String>,

    /// Preferred caption language [default: en]
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Translate the summary into this language (name or code)
    #[arg(short, long)]
    pub translate: Option<String>,

    /// LLM model for summarization and translation [default: llama-3.1-8b-instant]
    #[arg(long)]
    pub model: Option<String>,

    /// API key for the completion backend (overrides the environment)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Output format: text (default), json
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Don't route caption requests through public proxies when direct access fails
    #[arg(long)]
    pub no_proxy: bool,

    /// List translation target languages and exit
    #[arg(long)]
    pub list_languages: bool,

    /// Show caption tracks, language choice and chunk counts
    #[arg(short, long)]
    pub verbose: bool,
}
