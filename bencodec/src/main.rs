use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use bencodec_proto::bencode::{
    self, ByteString, DEFAULT_MAX_DEPTH, Decoder, DecoderConfig, Element, Value,
};
use clap::{Parser, Subcommand, builder::RangedU64ValueParser};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Largest `--max-depth` accepted on the command line.
const MAX_DEPTH_LIMIT: u64 = 1 << 20;

#[derive(Debug, Parser)]
#[command(version, about = "Decode, inspect and verify bencoded files")]
struct Cli {
    /// Maximum number of nested lists/dictionaries (at most 1048576).
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_MAX_DEPTH,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_DEPTH_LIMIT),
    )]
    max_depth: usize,

    /// Reject dictionaries whose keys are not strictly ascending.
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode a file and print a summary of its root elements.
    Check { file: PathBuf },
    /// Check that re-encoding a file reproduces it byte for byte.
    Roundtrip { file: PathBuf },
    /// Print the element tree of a file.
    Dump { file: PathBuf },
}

impl Cli {
    fn decoder(&self) -> Decoder {
        Decoder::new(DecoderConfig {
            max_depth: self.max_depth,
            strict_key_order: self.strict,
        })
    }
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    let input = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    info!(path = %path.display(), len = input.len(), "read input");
    Ok(input)
}

fn decode<'a>(decoder: &Decoder, path: &Path, input: &'a [u8]) -> anyhow::Result<Vec<Element<'a>>> {
    decoder
        .decode(input)
        .with_context(|| format!("failed to decode {}", path.display()))
}

fn check(decoder: &Decoder, path: &Path) -> anyhow::Result<()> {
    let input = read_input(path)?;
    let elements = decode(decoder, path, &input)?;
    let depth = elements.iter().map(Element::depth).max().unwrap_or(0);
    println!(
        "{}: {} bytes, {} root element(s), max depth {}",
        path.display(),
        input.len(),
        elements.len(),
        depth,
    );
    Ok(())
}

fn roundtrip(decoder: &Decoder, path: &Path) -> anyhow::Result<()> {
    let input = read_input(path)?;
    let elements = decode(decoder, path, &input)?;
    let output = bencode::encode(&elements);
    if output != input {
        let position = output
            .iter()
            .zip(&input)
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| output.len().min(input.len()));
        bail!(
            "{}: re-encoded output differs from input at byte {} ({} bytes in, {} bytes out)",
            path.display(),
            position,
            input.len(),
            output.len(),
        );
    }
    println!("{}: round-trip ok ({} bytes)", path.display(), input.len());
    Ok(())
}

fn offset_of(input: &[u8], raw: &[u8]) -> usize {
    raw.as_ptr() as usize - input.as_ptr() as usize
}

/// What precedes an element on its line of the dump.
enum Label<'e> {
    Root,
    Item,
    Key(&'e ByteString),
}

fn dump_element<W: Write>(out: &mut W, input: &[u8], root: &Element) -> io::Result<()> {
    let mut pending = vec![(root, 0, Label::Root)];
    while let Some((element, indent, label)) = pending.pop() {
        let pad = indent * 2;
        match label {
            Label::Root => {}
            Label::Item => write!(out, "{:pad$}- ", "")?,
            Label::Key(key) => write!(out, "{:pad$}\"{}\": ", "", key.0.escape_ascii())?,
        }

        let start = offset_of(input, element.raw());
        let span = format!("[{}..{}]", start, start + element.raw().len());
        match element.value() {
            Value::Null => writeln!(out, "null")?,
            Value::Int(int) => writeln!(out, "int {span} {int}")?,
            Value::String(string) => writeln!(
                out,
                "string {span} \"{}\"",
                string.0.escape_ascii()
            )?,
            Value::List(list) => {
                writeln!(out, "list {span} ({} items)", list.len())?;
                pending.extend(list.iter().rev().map(|item| (item, indent + 1, Label::Item)));
            }
            Value::Dict(dict) => {
                writeln!(out, "dict {span} ({} entries)", dict.len())?;
                pending.extend(
                    dict.iter()
                        .rev()
                        .map(|(key, value)| (value, indent + 1, Label::Key(key))),
                );
            }
        }
    }
    Ok(())
}

fn dump(decoder: &Decoder, path: &Path) -> anyhow::Result<()> {
    let input = read_input(path)?;
    let elements = decode(decoder, path, &input)?;
    let mut out = io::stdout().lock();
    for element in &elements {
        dump_element(&mut out, &input, element)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let decoder = cli.decoder();
    match &cli.command {
        Command::Check { file } => check(&decoder, file),
        Command::Roundtrip { file } => roundtrip(&decoder, file),
        Command::Dump { file } => dump(&decoder, file),
    }
}
