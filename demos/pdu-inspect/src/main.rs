//! PDU inspector
//!
//! Decodes a captured server certificate or license packet and prints its
//! field tree.
//!
//! USAGE:
//!   pdu-inspect [OPTIONS] <FILE>
//!
//! EXAMPLES:
//!   pdu-inspect --kind certificate cert.bin
//!   pdu-inspect --kind license --log-level debug alert.bin

use clap::{Parser, ValueEnum};
use rdp_pdu::{CertificateData, CodecConfig, LogLevel, PduCodec, DEFAULT_MAX_PDU_SIZE};
use std::path::PathBuf;
use std::process::ExitCode;

/// Kind of PDU held by the input file
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    /// Server certificate (proprietary or X.509 chain)
    Certificate,
    /// License packet with preamble
    License,
}

#[derive(Parser, Debug)]
#[command(name = "pdu-inspect")]
#[command(version)]
#[command(about = "Decode an RDP certificate or license PDU and print its fields")]
struct Args {
    /// PDU kind
    #[arg(short, long, value_enum, default_value = "license")]
    kind: Kind,

    /// Diagnostic level (debug, info, warn, error)
    #[arg(long, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Reject inputs larger than this many bytes
    #[arg(long, default_value_t = DEFAULT_MAX_PDU_SIZE)]
    max_size: usize,

    /// File holding the raw PDU bytes
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(&args.input)?;
    let config = CodecConfig::default()
        .with_log_level(args.log_level)
        .with_max_pdu_size(args.max_size);
    let codec = PduCodec::new(config);

    match args.kind {
        Kind::Certificate => {
            let cert = codec.decode_certificate(&data)?;
            println!(
                "certificate: {:?}{}",
                cert.certificate_type()?,
                if cert.is_temporary()? { " (temporary)" } else { "" }
            );
            if let CertificateData::X509Chain(chain) = cert.data()? {
                for (i, der) in chain.certificates()?.iter().enumerate() {
                    println!("  cert[{}]: {} bytes", i, der.len());
                }
            }
            print!("{}", cert);
        }
        Kind::License => {
            let packet = codec.decode_license_packet(&data)?;
            println!(
                "license packet: {:?}, {} bytes",
                packet.message_type()?,
                packet.msg_size()?
            );
            print!("{}", packet);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
