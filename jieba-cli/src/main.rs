use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use jieba::Jieba;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Mix-cut into words, one line of space-separated words per input line.
    Cut,
    /// Mix-cut and tag each word with its dictionary part of speech.
    Tag,
    /// Extract top-N TF-IDF keywords.
    Extract,
}

/// Segments UTF-8 text into words, tags it, or extracts keywords.
#[derive(Debug, Parser)]
#[command(name = "jieba", version, about)]
struct Cli {
    /// Path to the main dictionary file (`word freq tag` per line).
    #[arg(short, long, value_name = "DICTIONARY")]
    dictionary: PathBuf,

    /// Path to a user dictionary file. May be repeated.
    #[arg(short, long = "userdict", value_name = "USER_DICTIONARY")]
    user_dictionaries: Vec<PathBuf>,

    /// Path to the HMM model file.
    #[arg(short = 'm', long, value_name = "HMM_MODEL")]
    hmm_model: PathBuf,

    /// Path to the IDF dictionary file, required by `--mode extract`.
    #[arg(long, value_name = "IDF_DICTIONARY")]
    idf_dictionary: Option<PathBuf>,

    /// Path to the stop-word list, required by `--mode extract`.
    #[arg(long, value_name = "STOP_WORDS")]
    stop_words: Option<PathBuf>,

    /// What to do with each input line.
    #[arg(long, value_enum, default_value = "cut")]
    mode: Mode,

    /// Disable the HMM fallback for out-of-vocabulary spans (`--mode cut` only).
    #[arg(long)]
    no_hmm: bool,

    /// Number of keywords to report (`--mode extract` only).
    #[arg(long, default_value_t = 20)]
    top_n: usize,

    /// Read from this file instead of stdin.
    #[arg(value_name = "INPUT_FILE")]
    input_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut jieba = Jieba::new(&cli.dictionary, &cli.user_dictionaries, &cli.hmm_model)?;
    let mode = cli.mode;

    if matches!(mode, Mode::Extract) {
        let idf = cli
            .idf_dictionary
            .ok_or_else(|| anyhow::anyhow!("--mode extract requires --idf-dictionary"))?;
        let stop_words = cli
            .stop_words
            .ok_or_else(|| anyhow::anyhow!("--mode extract requires --stop-words"))?;
        jieba = jieba.with_keyword_extractor(&idf, &stop_words)?;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let lines: Box<dyn Iterator<Item = io::Result<String>>> = match &cli.input_file {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Box::new(content.lines().map(|l| Ok(l.to_string())).collect::<Vec<_>>().into_iter())
        }
        None => Box::new(BufReader::new(io::stdin()).lines()),
    };

    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match mode {
            Mode::Cut => {
                let words = jieba.cut(line, !cli.no_hmm);
                writeln!(out, "{}", words.join(" / "))?;
            }
            Mode::Tag => {
                let tagged = jieba.tag(line);
                let rendered: Vec<String> = tagged.into_iter().map(|(w, t)| format!("{w}/{t}")).collect();
                writeln!(out, "{}", rendered.join(" "))?;
            }
            Mode::Extract => {
                let keywords = jieba.extract(line, cli.top_n);
                let rendered: Vec<String> = keywords
                    .into_iter()
                    .map(|(word, weight)| format!("{word}:{weight:.4}"))
                    .collect();
                writeln!(out, "{}", rendered.join(" "))?;
            }
        }
    }

    Ok(())
}
