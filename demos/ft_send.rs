//! Companion file-transfer sender: pushes a file to a waiting `ft_recv`
//! over a reliable connection, preceded by a `"<filename>:<size>"` control
//! frame the receiver uses to know how much to expect.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rdt_transport::{NetworkConfig, ProtocolVariant, RdtSocket};

#[derive(Parser, Debug)]
#[command(about = "Send a file over an RDT-3/RDT-4 connection")]
struct Args {
    /// Destination host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Destination port.
    #[arg(long)]
    port: u16,

    /// File to send.
    #[arg(long)]
    file: PathBuf,

    /// Protocol variant: "rdt3" or "rdt4".
    #[arg(long, default_value = "rdt4")]
    variant: String,

    /// RDT-4 window size in frames. Ignored for rdt3.
    #[arg(long, default_value_t = 8)]
    window: usize,

    /// Simulated packet loss rate, in [0.0, 1.0].
    #[arg(long, default_value_t = 0.0)]
    loss_rate: f64,

    /// Simulated packet corruption rate, in [0.0, 1.0].
    #[arg(long, default_value_t = 0.0)]
    err_rate: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let variant = match args.variant.as_str() {
        "rdt3" => ProtocolVariant::Rdt3,
        "rdt4" => ProtocolVariant::Rdt4,
        other => return Err(format!("unknown variant {other:?}, expected rdt3 or rdt4").into()),
    };
    let config = NetworkConfig::new(args.loss_rate, args.err_rate, args.window)?;

    let contents = fs::read(&args.file)?;
    let filename = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or("file path has no valid filename")?;

    let mut sock = RdtSocket::new(variant, config)?;
    sock.set_peer((args.host.as_str(), args.port))?;

    let control = format!("{filename}:{}", contents.len());
    sock.send(control.as_bytes())?;
    tracing::info!(filename, size = contents.len(), "ft_send: sent control frame");

    let chunk_len = match variant {
        ProtocolVariant::Rdt3 => rdt_transport::frame::PAYLOAD,
        ProtocolVariant::Rdt4 => rdt_transport::frame::PAYLOAD * args.window,
    };
    let mut sent = 0usize;
    for chunk in contents.chunks(chunk_len) {
        sent += sock.send(chunk)?;
        tracing::debug!(sent, total = contents.len(), "ft_send: progress");
    }

    sock.close()?;
    tracing::info!(sent, "ft_send: transfer complete");
    Ok(())
}
