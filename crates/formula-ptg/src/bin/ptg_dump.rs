use std::env;
use std::io::{self, Write};

use formula_ptg::{decode_ptgs, DecodeOptions, PtgClass, ReservedClassPolicy};
use serde::Serialize;

#[derive(Debug)]
struct Args {
    rgce: Vec<u8>,
    rgcb: Vec<u8>,
    opts: DecodeOptions,
}

impl Args {
    fn parse() -> Result<Self, io::Error> {
        let mut rgce: Option<Vec<u8>> = None;
        let mut rgcb: Vec<u8> = Vec::new();
        let mut opts = DecodeOptions::default();

        let mut it = env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "-h" | "--help" => {
                    print_usage();
                    std::process::exit(0);
                }
                "--strict" => opts.strict_function_arity = true,
                "--rgcb" => {
                    let value = it.next().ok_or_else(|| invalid_input("--rgcb expects <hex>"))?;
                    rgcb = parse_hex(&value)?;
                }
                "--normalize-class" => {
                    let value = it
                        .next()
                        .ok_or_else(|| invalid_input("--normalize-class expects <R|V|A>"))?;
                    opts.reserved_class = parse_class(&value)?;
                }
                _ if arg.starts_with("--rgcb=") => {
                    rgcb = parse_hex(&arg["--rgcb=".len()..])?;
                }
                _ if arg.starts_with("--normalize-class=") => {
                    opts.reserved_class = parse_class(&arg["--normalize-class=".len()..])?;
                }
                _ if arg.starts_with('-') => {
                    return Err(invalid_input(&format!("unknown option: {arg}")));
                }
                _ => {
                    if rgce.is_some() {
                        return Err(invalid_input(&format!("unexpected argument: {arg}")));
                    }
                    rgce = Some(parse_hex(&arg)?);
                }
            }
        }

        let rgce = rgce.ok_or_else(|| invalid_input("missing <rgce-hex>"))?;
        Ok(Self { rgce, rgcb, opts })
    }
}

fn invalid_input(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg.to_string())
}

fn parse_hex(value: &str) -> Result<Vec<u8>, io::Error> {
    let compact: String = value.chars().filter(|ch| !ch.is_whitespace()).collect();
    hex::decode(&compact).map_err(|err| invalid_input(&format!("invalid hex `{value}`: {err}")))
}

fn parse_class(value: &str) -> Result<ReservedClassPolicy, io::Error> {
    let mut chars = value.chars();
    match (chars.next().and_then(PtgClass::from_suffix), chars.next()) {
        (Some(class), None) => Ok(ReservedClassPolicy::Normalize(class)),
        _ => Err(invalid_input(&format!("invalid class: {value} (expected R, V or A)"))),
    }
}

fn print_usage() {
    println!(
        "\
ptg_dump: decode a BIFF8 formula token stream and emit one JSON line per token

Usage:
  ptg_dump <rgce-hex> [--rgcb <hex>] [--strict] [--normalize-class <R|V|A>]

Options:
  --rgcb <hex>                 Trailing data (array constants, PtgMemArea ranges)
  --strict                     Reject function calls whose argument count disagrees with the table
  --normalize-class <R|V|A>    Accept reserved class selectors, decoding them as this class
"
    );
}

#[derive(Debug, Serialize)]
struct TokenLine {
    index: usize,
    offset: usize,
    opcode: String,
    family: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    class: Option<String>,
    payload_size: usize,
    #[serde(skip_serializing_if = "is_zero")]
    trailing_size: usize,
    debug: String,
}

#[derive(Debug, Serialize)]
struct SummaryLine {
    kind: &'static str,
    tokens: usize,
    rgce_len: usize,
    rgcb_len: usize,
}

#[derive(Debug, Serialize)]
struct ErrorLine {
    kind: &'static str,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ptg: Option<String>,
    offset: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("ptg_dump: {err}");
            std::process::exit(2);
        }
    }
}

/// Returns `Ok(false)` when the stream failed to decode.
fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let args = Args::parse()?;
    let mut stdout = io::BufWriter::new(io::stdout());

    let mut buf = args.rgce.clone();
    buf.extend_from_slice(&args.rgcb);

    let decoded = match decode_ptgs(&buf, 0, args.rgce.len(), &args.opts) {
        Ok(decoded) => decoded,
        Err(err) => {
            let line = ErrorLine {
                kind: "error",
                error: err.to_string(),
                ptg: err.ptg().map(|b| format!("0x{b:02X}")),
                offset: err.offset(),
            };
            serde_json::to_writer(&mut stdout, &line)?;
            writeln!(&mut stdout)?;
            stdout.flush()?;
            return Ok(false);
        }
    };

    let mut offset = 0usize;
    for (index, ptg) in decoded.ptgs.iter().enumerate() {
        let line = TokenLine {
            index,
            offset,
            opcode: format!("0x{:02X}", ptg.opcode_byte()),
            family: ptg.kind().name(),
            class: ptg.class().map(|class| class.to_string()),
            payload_size: ptg.payload_size(),
            trailing_size: ptg.trailing_size(),
            debug: format!("{ptg:?}"),
        };
        serde_json::to_writer(&mut stdout, &line)?;
        writeln!(&mut stdout)?;
        offset += ptg.encoded_len();
    }

    let summary = SummaryLine {
        kind: "summary",
        tokens: decoded.ptgs.len(),
        rgce_len: decoded.rgce_len,
        rgcb_len: decoded.rgcb_len,
    };
    serde_json::to_writer(&mut stdout, &summary)?;
    writeln!(&mut stdout)?;
    stdout.flush()?;
    Ok(true)
}
