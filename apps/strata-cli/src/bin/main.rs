use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};
use tracing::info;

use strata_cli::{init_tracing, ux, App};
use strata_core::config::Config;
use strata_core::types::Layer;

#[derive(Parser)]
#[command(name = "strata", about = "Layered RAW/SYNTH/META question answering over a local corpus")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a single question and exit
    Ask {
        question: Vec<String>,
    },
    /// Interactive loop; `exit` or `quit` ends it
    Chat,
    /// Print the topic catalogue
    Topics,
    /// Explain the evidence layers
    Layers,
    /// Example questions for each layer
    Examples {
        #[arg(long)]
        layer: Option<Layer>,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Topics => println!("{}", ux::TOPICS),
        Command::Layers => println!("{}", ux::LAYERS),
        Command::Examples { layer: Some(layer) } => {
            for q in ux::example_questions(layer) {
                println!("{q}");
            }
        }
        Command::Examples { layer: None } => println!("{}", ux::render_examples()),
        Command::Ask { question } => {
            let app = load_app()?;
            let question = question.join(" ");
            if let Some(note) = ux::precheck(&question) {
                eprintln!("{note}");
            }
            println!("{}", app.ask(&question));
        }
        Command::Chat => chat(&load_app()?)?,
    }
    Ok(())
}

fn load_app() -> anyhow::Result<App> {
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    App::load(&config)
}

fn chat(app: &App) -> anyhow::Result<()> {
    println!("Epistemický bot: napiš otázku (help = nápověda, exit = konec)");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("\nOtázka: ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let q = line.trim();
        match q.to_lowercase().as_str() {
            "exit" | "quit" => break,
            "help" => {
                println!("\n{}", ux::HELP);
                continue;
            }
            _ => {}
        }
        if let Some(note) = ux::precheck(q) {
            println!("\n{note}");
        }
        println!("\nOdpověď:\n\n{}", app.ask(q));
    }
    let cache = &app.ctx.embedder;
    info!(hits = cache.hits(), misses = cache.misses(), cached = cache.len(), "chat session ended");
    Ok(())
}
