use std::{
    io::{self, BufRead, IsTerminal, Read, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use spam_inference::{Classification, Classifier, Error, LinearClassifier, SpamDetector};
use spam_pre_processing::{
    ArtifactError, ArtifactKind, Normalizer, TfidfVectorizer, VectorizerParams,
    DEFAULT_MAX_FEATURES,
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const EMPTY_INPUT_PROMPT: &str = "Please enter a message.";

#[derive(Parser)]
#[command(name = "spam-cli", version)]
#[command(about = "Classify SMS or email messages as spam or ham", long_about = None)]
struct Cli {
    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode (debug logging and timings)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify messages with a fitted vectorizer and a trained classifier
    Classify(ClassifyArgs),
    /// Fit a TF-IDF vectorizer on a corpus (one message per line) and save it
    FitVectorizer(FitArgs),
    /// Print a JSON summary of a vectorizer or classifier artifact
    Inspect(InspectArgs),
}

#[derive(Args)]
struct ClassifyArgs {
    /// Message to classify (if not provided, reads from stdin or prompts)
    #[arg(value_name = "TEXT")]
    text: Option<String>,

    /// Read one message from a file
    #[arg(short, long, value_name = "PATH", conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Batch process messages (one per line, blank lines skipped)
    #[arg(short, long, value_name = "PATH", conflicts_with_all = ["text", "file"])]
    batch: Option<PathBuf>,

    /// Batch process messages from a JSON array of strings
    #[arg(long, value_name = "PATH", conflicts_with_all = ["text", "file", "batch"])]
    batch_json: Option<PathBuf>,

    /// Keep prompting for messages until end of input
    #[arg(short, long, conflicts_with_all = ["text", "file", "batch", "batch_json"])]
    interactive: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Fitted vectorizer artifact
    #[arg(long, value_name = "PATH", env = "SPAM_VECTORIZER_PATH")]
    vectorizer: PathBuf,

    /// Trained classifier artifact
    #[arg(long, value_name = "PATH", env = "SPAM_MODEL_PATH")]
    model: PathBuf,
}

#[derive(Args)]
struct FitArgs {
    /// Training corpus, one raw message per line
    #[arg(value_name = "CORPUS")]
    corpus: PathBuf,

    /// Where to write the fitted vectorizer
    #[arg(short, long, value_name = "PATH", env = "SPAM_VECTORIZER_PATH")]
    output: PathBuf,

    /// Keep only the most frequent n-grams (0 keeps all)
    #[arg(long, default_value_t = DEFAULT_MAX_FEATURES)]
    max_features: usize,

    /// Inclusive n-gram sizes as `MIN,MAX`
    #[arg(long, value_parser = parse_ngram_range, default_value = "1,2")]
    ngram_range: (usize, usize),

    /// Minimum document frequency (proportion below 1.0, otherwise a count)
    #[arg(long, default_value_t = 1.0)]
    min_df: f64,

    /// Maximum document frequency (proportion up to 1.0, otherwise a count)
    #[arg(long, default_value_t = 1.0)]
    max_df: f64,

    /// Replace term counts with `1 + ln(count)`
    #[arg(long)]
    sublinear_tf: bool,

    /// Ignore tokens shorter than this many characters
    #[arg(long, default_value_t = 1)]
    min_token_len: usize,
}

#[derive(Args)]
struct InspectArgs {
    /// Vectorizer or classifier artifact
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Number of vocabulary terms to include for a vectorizer
    #[arg(long, default_value_t = 20)]
    terms: usize,
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    /// Verdict and score to two decimals (default)
    Human,
    /// Just the label, `spam` or `ham`
    Label,
    /// Just the decision score
    Score,
    /// Output as JSON
    Json,
}

enum InputSource {
    Single(String),
    Batch(Vec<String>),
    Interactive,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        Command::Classify(args) => classify(&args),
        Command::FitVectorizer(args) => fit_vectorizer(&args),
        Command::Inspect(args) => inspect(&args),
    }
}

fn init_logging(cli: &Cli) {
    let default_filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, true) => "spam_cli=debug,spam_inference=debug,spam_pre_processing=debug",
        _ => "warn",
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn parse_ngram_range(value: &str) -> Result<(usize, usize), String> {
    let (min, max) = value
        .split_once(',')
        .ok_or_else(|| format!("expected MIN,MAX but got {value:?}"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|err| format!("invalid n-gram size {part:?}: {err}"))
    };
    Ok((parse(min)?, parse(max)?))
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect())
}

/// Priority: text arg > file > batch > batch json > piped stdin > interactive prompt
fn determine_input_source(args: &ClassifyArgs) -> Result<InputSource> {
    if args.interactive {
        return Ok(InputSource::Interactive);
    }
    if let Some(text) = &args.text {
        return Ok(InputSource::Single(text.clone()));
    }
    if let Some(path) = &args.file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        return Ok(InputSource::Single(text));
    }
    if let Some(path) = &args.batch {
        return Ok(InputSource::Batch(read_lines(path)?));
    }
    if let Some(path) = &args.batch_json {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON batch file: {}", path.display()))?;
        let texts: Vec<String> =
            serde_json::from_str(&contents).context("Failed to parse JSON array of strings")?;
        return Ok(InputSource::Batch(texts));
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(InputSource::Interactive);
    }
    let mut buffer = String::new();
    stdin
        .lock()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(InputSource::Single(buffer))
}

fn load_detector(args: &ClassifyArgs) -> Result<SpamDetector> {
    let start = Instant::now();
    let detector = SpamDetector::from_files(&args.vectorizer, &args.model).with_context(|| {
        format!(
            "Failed to load artifacts (vectorizer: {}, model: {})",
            args.vectorizer.display(),
            args.model.display()
        )
    })?;
    debug!(elapsed = ?start.elapsed(), "Loaded spam detector");
    Ok(detector)
}

fn classify(args: &ClassifyArgs) -> Result<()> {
    let input_source = determine_input_source(args)?;
    let detector = load_detector(args)?;

    match input_source {
        InputSource::Single(text) => {
            let start = Instant::now();
            let result = match detector.classify(&text) {
                Err(Error::EmptyInput) => bail!(EMPTY_INPUT_PROMPT),
                other => other.context("Failed to classify message")?,
            };
            debug!(elapsed = ?start.elapsed(), "Inference time");
            output_result(&result, args.format)?;
        }
        InputSource::Batch(texts) => {
            let start = Instant::now();
            let results = detector
                .classify_batch(&texts)
                .context("Failed to classify batch")?;
            debug!(num_texts = texts.len(), elapsed = ?start.elapsed(), "Inference time");
            output_batch_results(&results, args.format)?;
        }
        InputSource::Interactive => run_interactive(&detector, args.format)?,
    }
    Ok(())
}

fn run_interactive(detector: &SpamDetector, format: OutputFormat) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        eprint!("Enter a message (Ctrl-D to quit): ");
        io::stderr().flush().context("Failed to write prompt")?;
        let Some(line) = lines.next() else {
            eprintln!();
            return Ok(());
        };
        let line = line.context("Failed to read from stdin")?;
        match detector.classify(&line) {
            Ok(result) => output_result(&result, format)?,
            Err(Error::EmptyInput) => eprintln!("{EMPTY_INPUT_PROMPT}"),
            Err(err) => return Err(err).context("Failed to classify message"),
        }
    }
}

fn format_result(result: &Classification, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Human => {
            let verdict = if result.is_spam() {
                "Spam Detected"
            } else {
                "Not Spam"
            };
            format!("{verdict}\nModel Score: {:.2}", result.score())
        }
        OutputFormat::Label => result.label().to_string(),
        OutputFormat::Score => format!("{:.2}", result.score()),
        OutputFormat::Json => serde_json::to_string(result)?,
    })
}

fn output_result(result: &Classification, format: OutputFormat) -> Result<()> {
    println!("{}", format_result(result, format)?);
    Ok(())
}

fn output_batch_results(results: &[Classification], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(results)?),
        _ => {
            for result in results {
                output_result(result, format)?;
            }
        }
    }
    Ok(())
}

fn fit_vectorizer(args: &FitArgs) -> Result<()> {
    let params = VectorizerParams::default()
        .with_max_features((args.max_features > 0).then_some(args.max_features))
        .with_ngram_range(args.ngram_range.0..=args.ngram_range.1)
        .with_min_df(args.min_df)
        .with_max_df(args.max_df)
        .with_sublinear_tf(args.sublinear_tf)
        .with_min_token_len(args.min_token_len);
    params.validate().context("Invalid vectorizer parameters")?;

    let messages = read_lines(&args.corpus)?;
    info!(num_messages = messages.len(), corpus = %args.corpus.display(), "Read corpus");

    let start = Instant::now();
    let corpus = Normalizer::english().normalize_batch(&messages);
    let vectorizer = TfidfVectorizer::fit(&corpus, params).context("Failed to fit vectorizer")?;
    debug!(elapsed = ?start.elapsed(), "Fitted vectorizer");

    vectorizer
        .save(&args.output)
        .with_context(|| format!("Failed to save vectorizer to {}", args.output.display()))?;

    let summary = serde_json::json!({
        "path": args.output.display().to_string(),
        "num_documents": corpus.len(),
        "num_features": vectorizer.num_features(),
        "params": vectorizer.params(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn inspect(args: &InspectArgs) -> Result<()> {
    let bytes = std::fs::read(&args.path)
        .with_context(|| format!("Failed to read artifact: {}", args.path.display()))?;

    let summary = artifact_summary(&bytes, args.terms)
        .with_context(|| format!("Invalid artifact: {}", args.path.display()))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Reads the bytes as a vectorizer first and falls back to a classifier
/// when the header names one.
fn artifact_summary(bytes: &[u8], num_terms: usize) -> Result<serde_json::Value> {
    match TfidfVectorizer::from_bytes(bytes) {
        Ok(vectorizer) => Ok(vectorizer_summary(&vectorizer, num_terms)),
        Err(spam_pre_processing::Error::Artifact(ArtifactError::WrongKind {
            found: ArtifactKind::Classifier,
            ..
        })) => {
            let classifier = LinearClassifier::from_bytes(bytes)?;
            Ok(classifier_summary(&classifier))
        }
        Err(err) => Err(err.into()),
    }
}

fn vectorizer_summary(vectorizer: &TfidfVectorizer, num_terms: usize) -> serde_json::Value {
    let idf = vectorizer.idf().unwrap_or_default();
    let terms = vectorizer
        .vocabulary()
        .map(|vocabulary| {
            vocabulary
                .iter()
                .take(num_terms)
                .map(|(term, idx)| serde_json::json!({ "term": term, "idf": idf[idx] }))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    serde_json::json!({
        "kind": ArtifactKind::Vectorizer.to_string(),
        "format_version": ArtifactKind::Vectorizer.format_version(),
        "num_features": vectorizer.num_features(),
        "params": vectorizer.params(),
        "terms": terms,
    })
}

fn classifier_summary(classifier: &LinearClassifier) -> serde_json::Value {
    let weights = classifier.weights();
    let nonzero = weights.iter().filter(|w| **w != 0.0).count();
    let (min, max) = weights
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &w| (lo.min(w), hi.max(w)));
    serde_json::json!({
        "kind": ArtifactKind::Classifier.to_string(),
        "format_version": ArtifactKind::Classifier.format_version(),
        "num_features": classifier.num_features(),
        "positive_label": classifier.positive_label(),
        "bias": classifier.bias(),
        "nonzero_weights": nonzero,
        "min_weight": min,
        "max_weight": max,
    })
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use spam_inference::Label;

    use super::*;

    const CORPUS: &str = "Congratulations! You won a free ticket.

URGENT! Call now to claim your prize
Let's meet for lunch tomorrow at noon.
";

    /// A detector whose every score is `bias`: all weights are zero.
    fn constant_detector(bias: f64) -> SpamDetector {
        let vectorizer =
            TfidfVectorizer::fit(&["free prize", "lunch later"], VectorizerParams::default())
                .expect("fit should succeed");
        let weights = vec![0.0; vectorizer.num_features()];
        let classifier =
            LinearClassifier::new(weights, bias, Label::Spam).expect("weights are valid");
        SpamDetector::new(Normalizer::english(), vectorizer, classifier)
            .expect("artifacts are compatible")
    }

    fn small_vectorizer() -> TfidfVectorizer {
        let params = VectorizerParams::default().with_ngram_range(1..=1);
        TfidfVectorizer::fit(&["free prize", "free lunch", "lunch later"], params)
            .expect("fit should succeed")
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ngram_range() {
        assert_eq!(parse_ngram_range("1,2"), Ok((1, 2)));
        assert_eq!(parse_ngram_range(" 1 , 3 "), Ok((1, 3)));
        assert!(parse_ngram_range("2").is_err());
        assert!(parse_ngram_range("a,b").is_err());
    }

    #[test]
    fn test_classify_args() {
        let cli = Cli::try_parse_from([
            "spam-cli",
            "classify",
            "--vectorizer",
            "v.bin",
            "--model",
            "m.bin",
            "-o",
            "json",
            "free prize",
        ])
        .expect("arguments are valid");
        let Command::Classify(args) = cli.command else {
            panic!("expected the classify subcommand");
        };
        assert_eq!(args.text.as_deref(), Some("free prize"));
        assert!(matches!(args.format, OutputFormat::Json));
        assert_eq!(args.model, PathBuf::from("m.bin"));
    }

    #[test]
    fn test_fit_args() {
        let cli = Cli::try_parse_from([
            "spam-cli",
            "fit-vectorizer",
            "corpus.txt",
            "--output",
            "v.bin",
            "--ngram-range",
            "1,3",
            "--max-features",
            "0",
            "--sublinear-tf",
        ])
        .expect("arguments are valid");
        let Command::FitVectorizer(args) = cli.command else {
            panic!("expected the fit-vectorizer subcommand");
        };
        assert_eq!(args.ngram_range, (1, 3));
        assert_eq!(args.max_features, 0);
        assert!(args.sublinear_tf);
        assert_eq!(args.min_df, 1.0);
    }

    #[test]
    fn test_output_formats() {
        let spam = constant_detector(1.23)
            .classify("qwerty")
            .expect("classification should succeed");
        assert_eq!(
            format_result(&spam, OutputFormat::Human).expect("formatting should succeed"),
            "Spam Detected\nModel Score: 1.23"
        );
        assert_eq!(
            format_result(&spam, OutputFormat::Label).expect("formatting should succeed"),
            "spam"
        );
        assert_eq!(
            format_result(&spam, OutputFormat::Score).expect("formatting should succeed"),
            "1.23"
        );
        let json = format_result(&spam, OutputFormat::Json).expect("formatting should succeed");
        let json: serde_json::Value = serde_json::from_str(&json).expect("output is JSON");
        assert_eq!(json, serde_json::json!({ "label": "spam", "score": 1.23 }));

        let ham = constant_detector(-0.5)
            .classify("qwerty")
            .expect("classification should succeed");
        let human = format_result(&ham, OutputFormat::Human).expect("formatting should succeed");
        assert!(human.starts_with("Not Spam\n"));
        assert!(human.contains("Model Score: -0.50"));
    }

    #[test]
    fn test_fit_vectorizer_writes_loadable_artifact() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let corpus = dir.path().join("corpus.txt");
        std::fs::write(&corpus, CORPUS).expect("corpus should be written");
        let output = dir.path().join("tfidf_vectorizer.bin");
        let args = FitArgs {
            corpus,
            output: output.clone(),
            max_features: 0,
            ngram_range: (1, 1),
            min_df: 1.0,
            max_df: 1.0,
            sublinear_tf: true,
            min_token_len: 1,
        };
        fit_vectorizer(&args).expect("fit should succeed");

        let loaded = TfidfVectorizer::load(&output).expect("artifact should load");
        let vocabulary = loaded.vocabulary().expect("vectorizer is fitted");
        for term in ["congratulation", "win", "claim", "lunch", "noon"] {
            assert!(vocabulary.get(term).is_some(), "missing {term}");
        }
        assert!(vocabulary.iter().all(|(term, _)| !term.contains(' ')));
        assert_eq!(loaded.params().max_features(), None);
        assert!(loaded.params().sublinear_tf());
        assert_eq!(loaded.idf().map(<[f64]>::len), Some(loaded.num_features()));
    }

    #[test]
    fn test_fit_vectorizer_rejects_empty_corpus() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let corpus = dir.path().join("corpus.txt");
        std::fs::write(&corpus, "\n   \n").expect("corpus should be written");
        let output = dir.path().join("tfidf_vectorizer.bin");
        let args = FitArgs {
            corpus,
            output: output.clone(),
            max_features: DEFAULT_MAX_FEATURES,
            ngram_range: (1, 2),
            min_df: 1.0,
            max_df: 1.0,
            sublinear_tf: false,
            min_token_len: 1,
        };
        assert!(fit_vectorizer(&args).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_vectorizer_summary() {
        let summary = vectorizer_summary(&small_vectorizer(), 2);
        assert_eq!(summary["kind"], "vectorizer");
        assert_eq!(summary["format_version"], 1);
        assert_eq!(summary["num_features"], 4);
        assert_eq!(summary["params"]["ngram_range"], serde_json::json!([1, 1]));
        let terms = summary["terms"].as_array().expect("terms is an array");
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0]["term"], "free");
        assert_eq!(terms[1]["term"], "later");
        let idf = |df: f64| (4.0_f64 / (1.0 + df)).ln() + 1.0;
        assert_eq!(terms[0]["idf"].as_f64(), Some(idf(2.0)));
        assert_eq!(terms[1]["idf"].as_f64(), Some(idf(1.0)));
    }

    #[test]
    fn test_classifier_summary() {
        let classifier = LinearClassifier::new(vec![0.5, 0.0, -1.5], 0.25, Label::Ham)
            .expect("weights are valid");
        let summary = classifier_summary(&classifier);
        assert_eq!(
            summary,
            serde_json::json!({
                "kind": "classifier",
                "format_version": 1,
                "num_features": 3,
                "positive_label": "ham",
                "bias": 0.25,
                "nonzero_weights": 2,
                "min_weight": -1.5,
                "max_weight": 0.5,
            })
        );
    }

    #[test]
    fn test_artifact_summary_dispatches_on_kind() {
        let vectorizer_bytes = small_vectorizer()
            .to_bytes()
            .expect("vectorizer serializes");
        let summary = artifact_summary(&vectorizer_bytes, 20).expect("vectorizer artifact");
        assert_eq!(summary["kind"], "vectorizer");
        assert_eq!(summary["terms"].as_array().map(Vec::len), Some(4));

        let classifier_bytes = LinearClassifier::new(vec![1.0, -1.0], 0.0, Label::Spam)
            .expect("weights are valid")
            .to_bytes()
            .expect("classifier serializes");
        let summary = artifact_summary(&classifier_bytes, 20).expect("classifier artifact");
        assert_eq!(summary["kind"], "classifier");
        assert_eq!(summary["num_features"], 2);

        let err = artifact_summary(b"not an artifact", 20).expect_err("garbage must fail");
        assert!(matches!(
            err.downcast_ref::<spam_pre_processing::Error>(),
            Some(spam_pre_processing::Error::Artifact(ArtifactError::BadMagic))
        ));
    }

    #[test]
    fn test_inspect_reads_artifact_files() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("classifier.bin");
        LinearClassifier::new(vec![1.0, -1.0], 0.0, Label::Spam)
            .expect("weights are valid")
            .save(&path)
            .expect("classifier saves");
        inspect(&InspectArgs { path, terms: 5 }).expect("inspect should succeed");

        let missing = InspectArgs {
            path: dir.path().join("missing.bin"),
            terms: 5,
        };
        assert!(inspect(&missing).is_err());
    }
}
