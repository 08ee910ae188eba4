//! depmatch CLI - Command-line interface
//!
//! Usage:
//!   depmatch relative [SENTENCE]...
//!   depmatch biodata [SENTENCE]... [--json]
//!   depmatch demo
//!
//! Sentences come from the arguments, else one per stdin line. With
//! `--conllu <FILE>` and no sentences, every sentence of the file is used.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use depmatch_core::{Annotator, AnnotatorBackend, AppConfig, LoggingConfig};
use depmatch_extractor::{ClauseOutcome, Runner};
use depmatch_parser::{annotator_from_config, ConlluAnnotator};

const RELATIVE_DEMO: [&str; 5] = [
    "La comida que preparó mi madre ya está servida.",
    "La comida que mi madre preparó ya está servida.",
    "La comida que mi madre con tanto amor preparó ya está servida.",
    "Estoy muy contenta. Hoy voy a comer la comida que preparó mi madre.",
    "Me presentó al periodista que había escrito el reportaje.",
];

const BIODATA_DEMO: [&str; 6] = [
    "Lionel Andrés Messi Cuccittini (Rosario, 24 de junio de 1987), conocido como Leo Messi, es un futbolista argentino que juega como delantero o centrocampista.",
    "María Elena Walsh (Villa Sarmiento, 1 de febrero de 1930 - Buenos Aires, 10 de enero de 2011) fue una poetisa, escritora, cantautora, dramaturga y compositora argentina, considerada como «mito viviente, prócer cultural y blasón de casi todas las infancias».",
    "Rosa María Juana Martínez Suárez (Villa Cañás, Santa Fe; 23 de febrero de 1927), más conocida por su seudónimo Mirtha Legrand o por su apodo la Chiqui, es una actriz y conductora de televisión argentina.",
    "Shigeru Miyamoto (宮本 茂 Miyamoto Shigeru?) (Kioto, 16 de noviembre de 1952) es un diseñador y productor de videojuegos japonés que trabaja para Nintendo desde 1977.",
    "Britney Jean Spears (McComb, Misisipi, 2 de diciembre de 1981) es una cantante, bailarina, compositora, modelo, actriz, diseñadora de moda, autora y empresaria estadounidense.",
    "Michael Joseph Jackson (Gary, Indiana, 29 de agosto de 1958 - Los Ángeles, 25 de junio de 2009) fue un cantante, compositor, productor y bailarín estadounidense.",
];

#[derive(Parser)]
#[command(name = "depmatch")]
#[command(about = "Relative clause reconstruction and biodata extraction for Spanish")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Serve annotations from a CoNLL-U file instead of UDPipe
    #[arg(long, global = true)]
    conllu: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild relative clauses in subject-verb-object order
    Relative {
        /// Sentences to process
        sentences: Vec<String>,
    },
    /// Extract name, birth and death data from lead sentences
    Biodata {
        /// Sentences to process
        sentences: Vec<String>,

        /// Print each record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the built-in example sentences
    Demo,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.as_str().into());

    if logging.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path.clone())?.with_env_override()?,
        None => AppConfig::from_env()?,
    };

    if let Some(path) = &cli.conllu {
        config.annotator.backend = AnnotatorBackend::Conllu;
        config.annotator.conllu_path = Some(path.clone());
    }

    config.annotator.validate()?;
    Ok(config)
}

/// Build the annotator and, for a CoNLL-U corpus, the texts it can serve
fn build_annotator(config: &AppConfig) -> anyhow::Result<(Arc<dyn Annotator>, Vec<String>)> {
    match (&config.annotator.backend, &config.annotator.conllu_path) {
        (AnnotatorBackend::Conllu, Some(path)) => {
            let corpus = ConlluAnnotator::from_file(path)
                .with_context(|| format!("loading CoNLL-U corpus {}", path.display()))?;
            info!("Loaded {} annotated documents from {}", corpus.len(), path.display());
            let texts = corpus.texts().map(str::to_string).collect();
            Ok((Arc::new(corpus), texts))
        }
        _ => Ok((annotator_from_config(&config.annotator)?, Vec::new())),
    }
}

/// Arguments first, then the whole CoNLL-U corpus, then stdin lines
fn collect_sentences(args: Vec<String>, corpus: Vec<String>) -> anyhow::Result<Vec<String>> {
    if !args.is_empty() {
        return Ok(args);
    }
    if !corpus.is_empty() {
        return Ok(corpus);
    }

    let mut sentences = Vec::new();
    for line in std::io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        if !line.trim().is_empty() {
            sentences.push(line);
        }
    }
    Ok(sentences)
}

async fn print_relative(runner: &Runner, sentence: &str) -> bool {
    println!("TEXT: {}", sentence);
    let ok = match runner.reconstruct_clause(sentence).await {
        Ok(ClauseOutcome::Reconstructed(clause)) => {
            println!("RECONSTRUCTED CLAUSE: {}", clause);
            println!("{}", clause.explanation());
            true
        }
        Ok(ClauseOutcome::NoClause) => {
            println!("No relative clause detected.");
            true
        }
        Err(e) => {
            warn!("Failed to process sentence: {}", e);
            println!("ERROR: {}", e);
            false
        }
    };
    println!();
    ok
}

async fn print_biodata(runner: &Runner, sentence: &str, json: bool) -> anyhow::Result<bool> {
    let record = match runner.extract_biodata(sentence).await {
        Ok(record) => record,
        Err(e) => {
            warn!("Failed to process sentence: {}", e);
            if json {
                let line = serde_json::json!({ "text": sentence, "error": e.to_string() });
                println!("{}", serde_json::to_string(&line)?);
            } else {
                println!("TEXT: {}", sentence);
                println!("ERROR: {}", e);
                println!();
            }
            return Ok(false);
        }
    };

    if json {
        let line = serde_json::json!({ "text": sentence, "biodata": record });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!("TEXT: {}", sentence);
        print!("{}", record);
        println!();
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.logging);

    let (annotator, corpus) = build_annotator(&config)?;
    let runner = Runner::new(annotator)?;
    info!("Using {} annotator", runner.annotator_name());

    let mut failures = 0usize;

    match cli.command {
        Commands::Relative { sentences } => {
            for sentence in collect_sentences(sentences, corpus)? {
                if !print_relative(&runner, &sentence).await {
                    failures += 1;
                }
            }
        }
        Commands::Biodata { sentences, json } => {
            for sentence in collect_sentences(sentences, corpus)? {
                if !print_biodata(&runner, &sentence, json).await? {
                    failures += 1;
                }
            }
        }
        Commands::Demo => {
            for sentence in RELATIVE_DEMO {
                if !print_relative(&runner, sentence).await {
                    failures += 1;
                }
            }
            for sentence in BIODATA_DEMO {
                if !print_biodata(&runner, sentence, false).await? {
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} sentence(s) could not be processed", failures);
    }

    Ok(())
}
