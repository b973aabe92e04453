//! Companion file-transfer receiver: waits for a `"<filename>:<size>"`
//! control frame from `ft_send`, then reassembles the following chunks into
//! a file on disk.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rdt_transport::{NetworkConfig, ProtocolVariant, RdtSocket};

#[derive(Parser, Debug)]
#[command(about = "Receive a file over an RDT-3/RDT-4 connection")]
struct Args {
    /// Local port to listen on.
    #[arg(long)]
    port: u16,

    /// Peer host the transfer will arrive from.
    #[arg(long, default_value = "127.0.0.1")]
    peer_host: String,

    /// Peer port the transfer will arrive from.
    #[arg(long)]
    peer_port: u16,

    /// Directory to write the received file into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

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

    let mut sock = RdtSocket::new(variant, config)?;
    sock.bind(args.port)?;
    sock.set_peer((args.peer_host.as_str(), args.peer_port))?;

    let control = sock.recv(256)?;
    let control = String::from_utf8(control).map_err(|_| "control frame was not valid UTF-8")?;
    let (filename, size_str) = control
        .rsplit_once(':')
        .ok_or("control frame did not match '<filename>:<size>'")?;
    let size: usize = size_str.parse()?;
    tracing::info!(filename, size, "ft_recv: got control frame");

    let mut buf = Vec::with_capacity(size);
    while buf.len() < size {
        let chunk = sock.recv(rdt_transport::frame::PAYLOAD)?;
        buf.extend_from_slice(&chunk);
        tracing::debug!(received = buf.len(), size, "ft_recv: progress");
    }
    buf.truncate(size);

    let out_path = args.out_dir.join(filename);
    fs::write(&out_path, &buf)?;
    sock.close()?;
    tracing::info!(path = %out_path.display(), "ft_recv: transfer complete");
    Ok(())
}
