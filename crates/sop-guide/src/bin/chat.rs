//! Terminal chat over the persisted index
//!
//! Run with: cargo run -p sop-guide --bin sop-guide-chat

use clap::Parser;
use console::style;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sop_guide::{
    config::{config_path, RagConfig},
    AnalysisReport, ChatOutcome, Conversation, ImageKind, QueryPipeline,
};

#[derive(Parser)]
#[command(name = "sop-guide-chat", about = "Chat with the SOP guide in the terminal", version)]
struct Cli {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

const HELP: &str = "\
Commands:
  /image <kind> <path>  Analyze a PNG or JPEG (kind: lab, cycle, ultrasound, general)
  /reports              List image analyses from this session
  /help                 Show this help
  /exit                 Quit";

/// Commands recognised at the prompt
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Ask(&'a str),
    Image { kind: &'a str, path: &'a str },
    Reports,
    Help,
    Exit,
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Ask(line);
    };

    let mut parts = command.splitn(3, char::is_whitespace);
    match parts.next().unwrap_or("") {
        "exit" | "quit" | "salir" => Input::Exit,
        "help" | "ayuda" => Input::Help,
        "reports" => Input::Reports,
        "image" | "imagen" => match (parts.next(), parts.next()) {
            (Some(kind), Some(path)) => Input::Image {
                kind,
                path: path.trim(),
            },
            (Some(path), None) => Input::Image { kind: "", path },
            _ => Input::Help,
        },
        _ => Input::Help,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sop_guide=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = RagConfig::load(config_path(cli.config))?;
    let api_key = config.api_key()?;
    let pipeline = QueryPipeline::load(&config, &api_key)?;

    let mut conversation = Conversation::with_greeting(config.conversation.max_stored_turns);
    let mut reports: Vec<AnalysisReport> = Vec::new();

    if let Some(greeting) = conversation.turns().first() {
        println!("\n{}\n", style(&greeting.content).magenta());
    }
    println!("{}", style("Type /help for commands").dim());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style("tú>").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Exit => break,
            Input::Help => println!("{}", HELP),
            Input::Reports => print_reports(&reports),
            Input::Ask(query) => {
                let answer = pipeline.answer(query, conversation.turns()).await;
                conversation.push_user(query);
                conversation.push_assistant(answer.clone());
                println!("\n{}\n", answer);
            }
            Input::Image { kind, path } => {
                let kind: ImageKind = match kind.parse() {
                    Ok(kind) => kind,
                    Err(e) => {
                        println!("{} {}", style("!").yellow(), e);
                        continue;
                    }
                };
                match analyze_file(&pipeline, Path::new(path), kind).await {
                    Ok(report) => {
                        print_report(&report);
                        reports.push(report);
                    }
                    Err(message) => println!("{} {}", style("!").yellow(), message),
                }
            }
        }
    }

    println!("{}", style("¡Hasta pronto! 💜").magenta());
    Ok(())
}

async fn analyze_file(
    pipeline: &QueryPipeline,
    path: &Path,
    kind: ImageKind,
) -> std::result::Result<AnalysisReport, String> {
    if let Some(mime) = mime_guess::from_path(path).first() {
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(format!("{} is not an image ({})", path.display(), mime.essence_str()));
        }
    }
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;

    Ok(pipeline.analyze_image_detailed(data.into(), kind).await)
}

fn print_report(report: &AnalysisReport) {
    println!("\n{}\n", style(&report.label).bold().underlined());
    println!("{}\n", report.analysis);

    if report.outcome != ChatOutcome::Answered {
        return;
    }
    if !report.doctor_questions.is_empty() {
        println!("{}", style("Preguntas para tu médico:").bold());
        for question in &report.doctor_questions {
            println!("  • {}", question);
        }
        println!();
    }
    if let Some(tip) = &report.doctor_tip {
        println!("{}\n", style(tip).italic());
    }
    if let Some(disclaimer) = &report.disclaimer {
        println!("{}\n", style(disclaimer).dim());
    }
}

fn print_reports(reports: &[AnalysisReport]) {
    if reports.is_empty() {
        println!("No image analyses yet");
        return;
    }
    for (i, report) in reports.iter().enumerate() {
        println!(
            "{:>2}. {} {} ({:?})",
            i + 1,
            report.timestamp.format("%H:%M:%S"),
            report.label,
            report.outcome
        );
    }
}
