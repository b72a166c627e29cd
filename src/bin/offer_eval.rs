use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use offer_match::{OfferCode, PlayerAttributes, RuleSet};

#[derive(Parser)]
#[command(name = "offer-eval", about = "Pick an offer for every player in a file")]
struct Cli {
    /// Rule file: `.json` for the JSON config, anything else for the text format
    #[arg(long)]
    rules: PathBuf,

    /// Players: `.csv` with a header row, anything else as JSON lines
    #[arg(long)]
    players: PathBuf,

    /// Output file for the decisions, CSV when it ends in `.csv`; stdout when
    /// omitted, in the same format as the players file
    #[arg(long)]
    out: Option<PathBuf>,

    /// CSV file for the player count, rule count and evaluation duration
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Evaluation time in Unix seconds; defaults to now
    #[arg(long, conflicts_with = "no_window")]
    at: Option<i64>,

    /// Ignore rule validity windows
    #[arg(long)]
    no_window: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    JsonLines,
}

impl Format {
    fn of(path: &Path) -> Self {
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
            Self::Csv
        } else {
            Self::JsonLines
        }
    }
}

/// `has_spent_money` arrives either as a bool or as a 0/1 flag.
#[derive(Deserialize)]
#[serde(untagged)]
enum SpentFlag {
    Bool(bool),
    Int(i64),
}

#[derive(Deserialize)]
struct PlayerRecord {
    player_id: u64,
    level: i64,
    days_since_last_purchase: i64,
    matches_lost: i64,
    has_spent_money: SpentFlag,
}

impl PlayerRecord {
    fn into_player(self) -> anyhow::Result<(u64, PlayerAttributes)> {
        let has_spent_money = match self.has_spent_money {
            SpentFlag::Bool(b) => b,
            SpentFlag::Int(0) => false,
            SpentFlag::Int(1) => true,
            SpentFlag::Int(other) => bail!("has_spent_money must be 0 or 1, got {other}"),
        };
        Ok((
            self.player_id,
            PlayerAttributes::new(
                self.level,
                self.days_since_last_purchase,
                self.matches_lost,
                has_spent_money,
            ),
        ))
    }
}

#[derive(Debug, Default, PartialEq)]
struct Players {
    ids: Vec<u64>,
    attributes: Vec<PlayerAttributes>,
}

impl Players {
    fn push(&mut self, record: PlayerRecord) -> anyhow::Result<()> {
        let (id, player) = record.into_player()?;
        self.ids.push(id);
        self.attributes.push(player);
        Ok(())
    }
}

#[derive(Serialize)]
struct Decision<'a> {
    player_id: u64,
    offer: &'a str,
}

#[derive(Serialize)]
struct Metrics {
    num_players: usize,
    num_rules: usize,
    duration_seconds: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let ruleset = load_rules(&cli.rules)?;
    let players = load_players(&cli.players)?;
    tracing::info!(
        rules = ruleset.len(),
        players = players.ids.len(),
        "inputs loaded"
    );

    let now = if cli.no_window {
        None
    } else {
        Some(match cli.at {
            Some(at) => at,
            None => unix_now()?,
        })
    };

    let started = Instant::now();
    let codes = match now {
        Some(now) => ruleset.offer_codes_at(&players.attributes, now),
        None => ruleset.offer_codes(&players.attributes),
    };
    let elapsed = started.elapsed();
    tracing::info!(
        players = players.ids.len(),
        duration_ms = elapsed.as_secs_f64() * 1e3,
        "evaluation finished"
    );

    let out_format = cli
        .out
        .as_deref()
        .map_or_else(|| Format::of(&cli.players), Format::of);
    save_decisions(&ruleset, &players.ids, &codes, cli.out.as_deref(), out_format)?;

    if let Some(path) = &cli.metrics {
        let metrics = Metrics {
            num_players: players.ids.len(),
            num_rules: ruleset.len(),
            duration_seconds: elapsed.as_secs_f64(),
        };
        save_metrics(path, &metrics)?;
    }

    log_distribution(&ruleset, &codes);
    Ok(())
}

fn load_rules(path: &Path) -> anyhow::Result<RuleSet> {
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let ruleset = if is_json {
        RuleSet::from_json_file(path)
    } else {
        RuleSet::from_file(path)
    };
    ruleset.with_context(|| format!("loading rules from {}", path.display()))
}

fn load_players(path: &Path) -> anyhow::Result<Players> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let source = path.display().to_string();
    match Format::of(path) {
        Format::Csv => read_csv_players(file, &source),
        Format::JsonLines => read_jsonl_players(BufReader::new(file), &source),
    }
}

/// One JSON object per line; blank lines are skipped.
fn read_jsonl_players(reader: impl BufRead, source: &str) -> anyhow::Result<Players> {
    let mut players = Players::default();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading {source}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: PlayerRecord = serde_json::from_str(&line)
            .with_context(|| format!("{source}:{}: invalid player record", lineno + 1))?;
        players
            .push(record)
            .with_context(|| format!("{source}:{}", lineno + 1))?;
    }
    Ok(players)
}

/// CSV with a `player_id,level,days_since_last_purchase,matches_lost,has_spent_money`
/// header row.
fn read_csv_players(reader: impl Read, source: &str) -> anyhow::Result<Players> {
    let mut players = Players::default();
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    for (row, record) in csv.deserialize::<PlayerRecord>().enumerate() {
        // Row 1 is the header.
        let line = row + 2;
        let record =
            record.with_context(|| format!("{source}:{line}: invalid player record"))?;
        players
            .push(record)
            .with_context(|| format!("{source}:{line}"))?;
    }
    Ok(players)
}

fn save_decisions(
    ruleset: &RuleSet,
    ids: &[u64],
    codes: &[OfferCode],
    out: Option<&Path>,
    format: Format,
) -> anyhow::Result<()> {
    let sink: Box<dyn Write> = match out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    write_decisions(ruleset, ids, codes, sink, format).context("writing decisions")?;

    if let Some(path) = out {
        tracing::info!(path = %path.display(), decisions = codes.len(), "decisions saved");
    }
    Ok(())
}

fn write_decisions(
    ruleset: &RuleSet,
    ids: &[u64],
    codes: &[OfferCode],
    sink: impl Write,
    format: Format,
) -> anyhow::Result<()> {
    let decisions = ids.iter().zip(codes).map(|(&player_id, &code)| Decision {
        player_id,
        offer: ruleset.label(code),
    });

    match format {
        Format::Csv => {
            let mut writer = csv::Writer::from_writer(sink);
            for decision in decisions {
                writer.serialize(decision)?;
            }
            writer.flush()?;
        }
        Format::JsonLines => {
            let mut writer = BufWriter::new(sink);
            for decision in decisions {
                serde_json::to_writer(&mut writer, &decision)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn save_metrics(path: &Path, metrics: &Metrics) -> anyhow::Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.serialize(metrics)?;
    writer.flush()?;
    tracing::info!(path = %path.display(), "metrics saved");
    Ok(())
}

fn log_distribution(ruleset: &RuleSet, codes: &[OfferCode]) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for &code in codes {
        *counts.entry(ruleset.label(code)).or_default() += 1;
    }
    for (offer, players) in counts {
        tracing::info!(offer, players, "offer distribution");
    }
}

fn unix_now() -> anyhow::Result<i64> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the Unix epoch")?
        .as_secs();
    i64::try_from(secs).context("system clock out of range")
}
