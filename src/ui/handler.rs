//! Stdio bridge to the renderer: JSON lines in on stdin, JSON lines out on stdout

use std::io::BufRead;
use std::thread;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::protocol::{ClientMsg, ServerMsg};

/// Read renderer input on a dedicated thread. Blocking stdin reads would
/// otherwise hold up runtime shutdown.
pub fn spawn_stdin_reader(
    input_tx: mpsc::Sender<ClientMsg>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            forward_input(stdin.lock(), &input_tx);
        })
}

/// Parse one message per line and forward it to the session. End of input
/// counts as a quit.
pub fn forward_input<R: BufRead>(reader: R, input_tx: &mpsc::Sender<ClientMsg>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to read renderer input");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<ClientMsg>(line) {
            Ok(msg) => {
                let quit = msg == ClientMsg::Quit;
                if input_tx.blocking_send(msg).is_err() {
                    debug!("Input channel closed");
                    return;
                }
                if quit {
                    return;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse renderer message");
            }
        }
    }

    info!("Renderer input closed");
    let _ = input_tx.blocking_send(ClientMsg::Quit);
}

/// Write every broadcast message as a JSON line until the channel closes
pub async fn forward_snapshots<W>(mut writer: W, mut snapshot_rx: broadcast::Receiver<ServerMsg>)
where
    W: AsyncWrite + Unpin,
{
    loop {
        match snapshot_rx.recv().await {
            Ok(msg) => {
                if let Err(e) = send_msg(&mut writer, &msg).await {
                    debug!(error = %e, "Renderer write failed");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(lagged_count = n, "Renderer lagged, skipping {} messages", n);
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Snapshot channel closed");
                break;
            }
        }
    }
}

async fn send_msg<W>(writer: &mut W, msg: &ServerMsg) -> Result<(), String>
where
    W: AsyncWrite + Unpin,
{
    let mut json = serde_json::to_vec(msg).map_err(|e| e.to_string())?;
    json.push(b'\n');
    writer.write_all(&json).await.map_err(|e| e.to_string())?;
    writer.flush().await.map_err(|e| e.to_string())
}
