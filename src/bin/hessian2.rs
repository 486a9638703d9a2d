//! hessian2 CLI: Hessian 2.0 <-> JSON conversion.

use clap::{Args, Parser, Subcommand};
use hessian2::decoder::Decoder;
use hessian2::encoder::Encoder;
use hessian2::json::{from_json, to_json_array};
use hessian2::{tag, Value};
use std::io::{IsTerminal, Read, Write};
use std::process;

#[derive(Parser)]
#[command(name = "hessian2", about = "Hessian 2.0 <-> JSON conversion")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode Hessian to JSON
    Decode(DecodeArgs),
    /// Encode JSON to Hessian
    Encode(EncodeArgs),
    /// List the top-level values of a Hessian stream
    Inspect(InspectArgs),
}

#[derive(Args)]
struct DecodeArgs {
    /// Input file (- for stdin)
    #[arg(short, long)]
    input: String,

    /// Output file (optional; without -o auto-derived, -o - = stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Input is a sequence of packets
    #[arg(long)]
    packets: bool,
}

#[derive(Args)]
struct EncodeArgs {
    /// Input file (- for stdin)
    #[arg(short, long)]
    input: String,

    /// Output file (optional; without -o auto-derived, -o - = stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Write each array element as its own packet
    #[arg(long)]
    packets: bool,
}

#[derive(Args)]
struct InspectArgs {
    /// Input file (- for stdin)
    #[arg(short, long)]
    input: String,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Fehler: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Decode(args) => run_decode(args),
        Command::Encode(args) => run_encode(args),
        Command::Inspect(args) => run_inspect(args),
    }
}

fn run_decode(args: DecodeArgs) -> Result<(), String> {
    let data = read_input(&args.input)?;
    let values = if args.packets {
        hessian2::decode_packets(&data)
    } else {
        hessian2::decode_all(&data)
    }
    .map_err(|e| e.to_string())?;
    log::debug!("{} value(s) decoded from {} bytes", values.len(), data.len());
    let json = to_json_array(&values);
    let output = resolve_output_path(args.output.as_deref(), &args.input, "json")?;
    write_to_output(&output, |mut w| {
        let text = if args.pretty {
            serde_json::to_string_pretty(&json)
        } else {
            serde_json::to_string(&json)
        }
        .map_err(|e| format!("JSON-Fehler: {e}"))?;
        writeln!(w, "{text}").map_err(|e| format!("Schreibfehler: {e}"))?;
        w.flush().map_err(|e| format!("Schreibfehler: {e}"))
    })
}

fn run_encode(args: EncodeArgs) -> Result<(), String> {
    let data = read_input(&args.input)?;
    let json: serde_json::Value =
        serde_json::from_slice(&data).map_err(|e| format!("JSON parse error: {e}"))?;
    let items = json
        .as_array()
        .ok_or_else(|| "Eingabe muss ein JSON-Array von Werten sein".to_string())?;
    let values: Vec<Value> = items
        .iter()
        .map(from_json)
        .collect::<Result<_, _>>()
        .map_err(|e| e.to_string())?;

    let output = resolve_output_path(args.output.as_deref(), &args.input, "hessian")?;
    write_to_output(&output, |w| {
        let mut enc = Encoder::new(w);
        for value in &values {
            if args.packets {
                enc.write_streaming_value(value)
            } else {
                enc.write_value(value)
            }
            .map_err(|e| e.to_string())?;
        }
        let mut w = enc.into_inner().map_err(|e| e.to_string())?;
        w.flush().map_err(|e| format!("Schreibfehler: {e}"))
    })
}

fn run_inspect(args: InspectArgs) -> Result<(), String> {
    let data = read_input(&args.input)?;
    let mut dec = Decoder::new(&data[..]);
    let mut index = 0usize;
    loop {
        let offset = dec.position();
        let first = usize::try_from(offset).ok().and_then(|o| data.get(o).copied());
        let value = match dec.read_next() {
            Ok(Some(v)) => v,
            Ok(None) => break,
            Err(e) => return Err(format!("Wert #{index} bei Offset {offset}: {e}")),
        };
        let tag_text = first.map_or("-", tag::describe);
        println!(
            "#{index} @{offset}: {} [{tag_text}] -> {}",
            tag::code_name(first),
            value.kind()
        );
        index += 1;
    }
    println!("{index} value(s), {} bytes", data.len());
    Ok(())
}

// ============================================================================
// Ein-/Ausgabe
// ============================================================================

fn read_input(path: &str) -> Result<Vec<u8>, String> {
    if path == "-" {
        if std::io::stdin().is_terminal() {
            eprintln!("Lese von stdin (Ctrl+D zum Beenden)...");
        }
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| format!("Lesefehler (stdin): {e}"))?;
        Ok(buf)
    } else {
        std::fs::read(path).map_err(|e| format!("Lesefehler '{}': {e}", path))
    }
}

fn create_buf_writer(path: &str) -> Result<std::io::BufWriter<Box<dyn Write>>, String> {
    let sink: Box<dyn Write> = if path == "-" {
        Box::new(std::io::stdout().lock())
    } else {
        Box::new(std::fs::File::create(path).map_err(|e| format!("Schreibfehler '{path}': {e}"))?)
    };
    Ok(std::io::BufWriter::new(sink))
}

/// Schreibt über eine tmp-Datei und benennt erst bei Erfolg um.
fn write_to_output(
    output_path: &str,
    write_fn: impl FnOnce(std::io::BufWriter<Box<dyn Write>>) -> Result<(), String>,
) -> Result<(), String> {
    if output_path == "-" {
        return write_fn(create_buf_writer("-")?);
    }

    let tmp_path = format!("{output_path}.tmp");
    let writer = create_buf_writer(&tmp_path)?;
    if let Err(e) = write_fn(writer) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    std::fs::rename(&tmp_path, output_path).map_err(|e| format!("Rename-Fehler: {e}"))
}

fn resolve_output_path(explicit: Option<&str>, input: &str, ext: &str) -> Result<String, String> {
    if let Some(path) = explicit {
        return Ok(path.to_string());
    }
    if input == "-" {
        return Err("ohne -o braucht es eine Eingabedatei (nicht stdin)".into());
    }
    let path = std::path::Path::new(input);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| "ungueltiger Eingabepfad".to_string())?;
    let parent = path.parent().unwrap_or_else(|| std::path::Path::new(""));
    Ok(parent.join(format!("{stem}.{ext}")).to_string_lossy().to_string())
}
