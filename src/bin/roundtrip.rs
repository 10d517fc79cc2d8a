//! nsdom-roundtrip: parse an XML file into a tree and write it back out.
//!
//! Useful for checking that a document survives the reader, the tree and
//! the writer unchanged, and for seeing which prefixes the writer picks.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nsdom::encoding;
use nsdom::reader::ReaderOptions;
use nsdom::writer::{WriterOptions, XmlWriter};
use nsdom::{Document, XmlError};

/// Parse an XML document into a namespace-aware tree and serialize it again.
#[derive(Parser, Debug)]
#[command(name = "nsdom-roundtrip", version, about, long_about = None)]
struct Cli {
    /// XML file to read (use `-` for stdin).
    file: String,

    /// Report prefixed names verbatim instead of resolving namespaces.
    #[arg(long)]
    no_namespaces: bool,

    /// Start the output with an XML declaration.
    #[arg(long)]
    declaration: bool,

    /// Write the result to FILE instead of stdout.
    #[arg(long, short, value_name = "FILE")]
    output: Option<String>,

    /// Log parse and write progress to stderr.
    #[arg(long, short)]
    verbose: bool,
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;
const EXIT_IO_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let input = match read_input(&cli.file) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{}: failed to read: {e}", cli.file);
            return ExitCode::from(EXIT_IO_ERROR);
        }
    };

    let start = Instant::now();
    let doc = match parse(&cli, &input) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{}: {e}", cli.file);
            return ExitCode::from(EXIT_PARSE_ERROR);
        }
    };
    tracing::debug!(elapsed = ?start.elapsed(), nodes = doc.node_count(), "parsed");

    match write(&cli, &doc) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("{}: failed to write: {e}", cli.output.as_deref().unwrap_or("stdout"));
            ExitCode::from(EXIT_IO_ERROR)
        }
    }
}

fn read_input(filename: &str) -> io::Result<Vec<u8>> {
    if filename == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(filename)
    }
}

fn parse(cli: &Cli, input: &[u8]) -> Result<Document, XmlError> {
    let decoded = encoding::decode(input)?;
    let options = ReaderOptions::default().process_namespaces(!cli.no_namespaces);
    let mut doc = Document::parse_with_options(&decoded.text, options)?;
    if doc.encoding.is_none() {
        doc.encoding = Some(decoded.encoding.to_string());
    }
    Ok(doc)
}

fn write(cli: &Cli, doc: &Document) -> Result<(), XmlError> {
    let sink: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let options = WriterOptions::default().xml_declaration(cli.declaration);
    let mut writer = XmlWriter::with_options(BufWriter::new(sink), options);
    doc.write(&mut writer)?;
    let mut out = writer.into_inner();
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
