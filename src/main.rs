use medibot::bot::Medibot;
use medibot::cli::{Cli, Commands, ConfigAction};
use medibot::config::Config;
use medibot::embedding::{EmbeddingProvider, FastEmbedProvider};
use medibot::error::{MedibotError, Result};
use medibot::generate::{AnswerGenerator, GeneratorOptions, OpenRouterClient};
use medibot::ingest::{load_documents, RecursiveChunker};
use medibot::retrieval::Retriever;
use medibot::store::VectorStore;

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Handle commands
    match cli.command {
        Commands::Ingest { dir } => {
            cmd_ingest(cli.config, dir)?;
        }
        Commands::Ask {
            question,
            no_retrieval,
        } => {
            cmd_ask(cli.config, &question, no_retrieval).await?;
        }
        Commands::Chat => {
            cmd_chat(cli.config).await?;
        }
        Commands::Status => {
            cmd_status(cli.config)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("medibot=info"));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_ingest(
    config_path: Option<std::path::PathBuf>,
    dir: Option<std::path::PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;

    let documents_dir = match dir {
        Some(dir) => dir,
        None => expand_path(&config.storage.documents_dir)?,
    };

    tracing::info!("Ingesting documents from {:?}", documents_dir);
    let documents = load_documents(&documents_dir)?;
    if documents.is_empty() {
        println!("No documents found in {}", documents_dir.display());
        return Ok(());
    }

    let chunker = RecursiveChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap);
    let chunks = chunker.split(&documents);
    println!(
        "Loaded {} documents, produced {} chunks",
        documents.len(),
        chunks.len()
    );

    let embedder = FastEmbedProvider::new(&config.embedding.model)?;
    let store = open_store(&config)?;

    // Embed in configured batches so memory stays bounded on large corpora
    for batch in chunks.chunks(config.embedding.batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed_batch(&texts)?;
        store.add(batch, &vectors)?;
    }

    println!("✓ Ingested {} chunks ({} total)", chunks.len(), store.len());
    Ok(())
}

async fn cmd_ask(
    config_path: Option<std::path::PathBuf>,
    question: &str,
    no_retrieval: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let bot = build_bot(&config, no_retrieval)?;

    let answer = bot.ask(question).await;
    println!("{}", answer);
    Ok(())
}

async fn cmd_chat(config_path: Option<std::path::PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let bot = build_bot(&config, false)?;

    println!("MediBot ready. Type a question, or 'quit' to exit.");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush().map_err(|e| MedibotError::Io {
            source: e,
            context: "Failed to flush stdout".to_string(),
        })?;

        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).map_err(|e| MedibotError::Io {
            source: e,
            context: "Failed to read from stdin".to_string(),
        })?;
        if read == 0 {
            break;
        }

        let question = line.trim();
        if question.eq_ignore_ascii_case("quit") || question.eq_ignore_ascii_case("exit") {
            break;
        }

        let answer = bot.ask(question).await;
        println!("{}\n", answer);
    }

    println!("Goodbye!");
    Ok(())
}

fn cmd_status(config_path: Option<std::path::PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let store_dir = expand_path(&config.vector_store_dir())?;

    println!("Medibot Status");
    println!("  Vector store: {}", store_dir.display());

    if !store_dir.exists() {
        println!("  Records: 0 (store not initialized, run 'medibot ingest')");
        return Ok(());
    }

    let store = open_store(&config)?;
    println!("  Records: {}", store.len());
    println!("  Embedding model: {}", config.embedding.model);
    println!("  Models in ladder: {}", config.generation.models.len());
    Ok(())
}

fn cmd_config(config_path: Option<std::path::PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| MedibotError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| MedibotError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            // Save default config
            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// Build the full answering pipeline from configuration.
///
/// A missing API credential or an unopenable vector store is fatal here;
/// once construction succeeds, `ask` never surfaces an error.
fn build_bot(config: &Config, no_retrieval: bool) -> Result<Medibot> {
    let provider = OpenRouterClient::from_env(
        &config.generation.endpoint,
        &config.generation.api_key_env,
        config.generation.temperature,
        Duration::from_secs(config.generation.request_timeout_secs),
    )
    .map_err(|e| match e {
        medibot::generate::ProviderError::MissingCredential { env_var } => {
            MedibotError::MissingCredential { env_var }
        }
        other => MedibotError::Config(other.to_string()),
    })?;
    let provider = Arc::new(provider);

    let options = GeneratorOptions {
        max_tokens: config.generation.max_tokens,
        similarity_threshold: config.generation.similarity_threshold,
    };

    if no_retrieval {
        let generator =
            AnswerGenerator::new(provider, None, config.generation.models.clone(), options);
        return Ok(Medibot::without_retriever(generator));
    }

    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(FastEmbedProvider::new(&config.embedding.model)?);
    let store = Arc::new(open_store(config)?);

    let retriever = Retriever::new(embedder.clone(), store, config.retrieval.top_k);
    let generator = AnswerGenerator::new(
        provider,
        Some(embedder),
        config.generation.models.clone(),
        options,
    );

    Ok(Medibot::new(retriever, generator))
}

fn open_store(config: &Config) -> Result<VectorStore> {
    let store_dir = expand_path(&config.vector_store_dir())?;
    let store = VectorStore::open(
        &store_dir,
        config.embedding.dimension,
        config.retrieval.hnsw_ef_construction,
        config.retrieval.hnsw_m,
        config.retrieval.hnsw_ef_search,
    )?;
    Ok(store)
}

fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'medibot config init' to create one."
        );
        return Ok(Config::default());
    }

    Config::load(&path)
}

fn expand_path(path: &std::path::Path) -> Result<std::path::PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| MedibotError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| MedibotError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
