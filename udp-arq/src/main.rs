//! Entry point for `udp-arq`.
//!
//! Parses CLI arguments and dispatches into either **send** or **recv** mode.
//! All protocol work is delegated to the library; `main.rs` owns only
//! process setup (logging, argument parsing, file I/O).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use udp_arq::simulator::{Simulator, SimulatorConfig};
use udp_arq::{Config, Connection, Datagram, Socket};

/// Reliable byte stream over UDP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Send a file (or stdin) to the peer.
    Send {
        #[command(flatten)]
        link: LinkArgs,
        /// File to send; reads stdin when omitted.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Receive a fixed number of bytes from the peer.
    Recv {
        #[command(flatten)]
        link: LinkArgs,
        /// Number of bytes to wait for.
        #[arg(short = 'n', long)]
        bytes: usize,
        /// Output file; writes stdout when omitted.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct LinkArgs {
    /// Local address to bind (e.g. 0.0.0.0:9000).
    #[arg(short, long, default_value = "0.0.0.0:9000")]
    bind: SocketAddr,
    /// Remote peer address (e.g. 127.0.0.1:9001).
    #[arg(short, long)]
    peer: SocketAddr,
    /// Send window in segments.
    #[arg(long, default_value_t = udp_arq::config::SEND_WINDOW)]
    window: usize,
    /// Receive attempts per batch.
    #[arg(long, default_value_t = udp_arq::config::RECV_WINDOW)]
    recv_window: usize,
    /// Receive attempts per send round.
    #[arg(long, default_value_t = udp_arq::config::RETRIES)]
    retries: u32,
    /// Per-receive timeout in milliseconds.
    #[arg(long, default_value_t = 1.5)]
    timeout_ms: f64,
    /// Simulated outbound loss probability.
    #[arg(long, default_value_t = 0.0)]
    loss: f64,
    /// Simulated outbound duplication probability.
    #[arg(long, default_value_t = 0.0)]
    duplicate: f64,
    /// Simulated outbound reorder probability.
    #[arg(long, default_value_t = 0.0)]
    reorder: f64,
    /// Simulator RNG seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

impl LinkArgs {
    fn config(&self) -> Result<Config> {
        if !(self.timeout_ms.is_finite() && self.timeout_ms > 0.0) {
            bail!("--timeout-ms must be a positive number");
        }
        let config = Config {
            send_window: self.window,
            recv_window: self.recv_window,
            retries: self.retries,
            recv_timeout: Duration::from_secs_f64(self.timeout_ms / 1000.0),
            ..Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    fn simulator(&self) -> Result<SimulatorConfig> {
        for (name, p) in [("--loss", self.loss), ("--duplicate", self.duplicate), ("--reorder", self.reorder)] {
            if !(0.0..=1.0).contains(&p) {
                bail!("{name} must be within [0, 1], got {p}");
            }
        }
        Ok(SimulatorConfig {
            loss_rate: self.loss,
            duplicate_rate: self.duplicate,
            reorder_rate: self.reorder,
            seed: self.seed,
        })
    }

    async fn connect(&self) -> Result<Connection<Simulator<Socket>>> {
        let config = self.config()?;
        let faults = self.simulator()?;
        let socket = Socket::bind(self.bind, self.peer)
            .await
            .with_context(|| format!("binding {}", self.bind))?;
        Ok(Connection::new(Simulator::new(socket, faults), config)?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    match cli.mode {
        Mode::Send { link, file } => {
            let data = match &file {
                Some(path) => tokio::fs::read(path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = Vec::new();
                    tokio::io::stdin().read_to_end(&mut buf).await?;
                    buf
                }
            };
            let mut conn = link.connect().await?;
            log::info!("Sending {} bytes to {}", data.len(), link.peer);
            let sent = conn.send(&data).await?;
            log::info!("Delivered {sent} bytes");
            report(&conn);
            conn.close();
        }
        Mode::Recv { link, bytes, out } => {
            let mut conn = link.connect().await?;
            log::info!("Waiting for {bytes} bytes from {}", link.peer);
            let data = conn.recv(bytes).await?;
            match &out {
                Some(path) => tokio::fs::write(path, &data)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?,
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&data).await?;
                    stdout.flush().await?;
                }
            }
            report(&conn);
            conn.close();
        }
    }
    Ok(())
}

fn report<C: Datagram>(conn: &Connection<Simulator<C>>) {
    use std::sync::atomic::Ordering::Relaxed;
    let stats = &conn.channel().stats;
    log::debug!(
        "simulator: offered={} dropped={} duplicated={} reordered={}",
        stats.offered.load(Relaxed),
        stats.dropped.load(Relaxed),
        stats.duplicated.load(Relaxed),
        stats.reordered.load(Relaxed)
    );
}
