use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::EventsOutConfig;

const STDOUT_PATH: &str = "stdout:";

#[derive(Clone)]
pub struct EventsOutTx {
    tx: mpsc::Sender<String>,
    dropped: Arc<AtomicU64>,
    drop_when_full: bool,
}

impl EventsOutTx {
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub async fn send_line(&self, line: String) {
        if self.drop_when_full {
            if self.tx.try_send(line).is_err() {
                let count = self.dropped.fetch_add(1, Ordering::Relaxed);
                // one warning per hundred drops
                if count % 100 == 0 {
                    tracing::warn!(
                        target: "docstream.events_out",
                        dropped_total = count + 1,
                        "events_out channel full, audit lines are being dropped"
                    );
                }
            }
        } else if self.tx.send(line).await.is_err() {
            tracing::debug!(target: "docstream.events_out", "events_out writer closed");
        }
    }
}

/// Owner of the spawned writer task.
pub struct EventsOutWriter {
    stop: CancellationToken,
    task: JoinHandle<()>,
}

impl EventsOutWriter {
    /// Writes out every queued line, flushes, and waits for the task to end.
    /// Senders still held elsewhere are ignored from this point on.
    pub async fn shutdown(self) {
        self.stop.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(target: "docstream.events_out", error = %e, "events_out writer task failed");
        }
    }
}

type BoxWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Spawns the writer task. Returns `None` when auditing is disabled.
pub async fn start_events_out(
    cfg: &EventsOutConfig,
) -> Result<Option<(EventsOutTx, EventsOutWriter)>, String> {
    if !cfg.enabled {
        tracing::debug!(target: "docstream.events_out", "events_out disabled");
        return Ok(None);
    }
    if cfg.path.trim().is_empty() {
        tracing::warn!(
            target: "docstream.events_out",
            "events_out enabled but path is empty, audit trail disabled"
        );
        return Ok(None);
    }

    let path = cfg.path.clone();
    let writer: BoxWriter = if path == STDOUT_PATH {
        Box::new(tokio::io::stdout())
    } else {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| format!("failed to open events_out file {path}: {e}"))?;
        Box::new(file)
    };

    tracing::info!(
        target: "docstream.events_out",
        path = %path,
        channel_capacity = cfg.channel_capacity,
        drop_when_full = cfg.drop_when_full,
        "events_out writer started"
    );

    let (tx, rx) = mpsc::channel::<String>(cfg.channel_capacity.max(1));
    let stop = CancellationToken::new();
    let task = tokio::spawn(run_writer(writer, rx, stop.clone(), path == STDOUT_PATH));

    let out = EventsOutTx {
        tx,
        dropped: Arc::new(AtomicU64::new(0)),
        drop_when_full: cfg.drop_when_full,
    };
    Ok(Some((out, EventsOutWriter { stop, task })))
}

async fn run_writer(
    mut writer: BoxWriter,
    mut rx: mpsc::Receiver<String>,
    stop: CancellationToken,
    flush_each: bool,
) {
    let mut written = 0usize;
    loop {
        let line = tokio::select! {
            biased;
            line = rx.recv() => line,
            _ = stop.cancelled() => break,
        };
        let Some(line) = line else { break };
        if write_line(&mut writer, line).await.is_err() {
            tracing::error!(
                target: "docstream.events_out",
                "failed to write audit line, writer task exiting"
            );
            return;
        }
        written += 1;
        if (flush_each || written % 10 == 0) && writer.flush().await.is_err() {
            tracing::error!(target: "docstream.events_out", "failed to flush audit output");
            return;
        }
    }

    // Stopped while senders may still be alive: take what is already queued.
    rx.close();
    while let Ok(line) = rx.try_recv() {
        if write_line(&mut writer, line).await.is_err() {
            break;
        }
    }
    if writer.flush().await.is_err() {
        tracing::error!(target: "docstream.events_out", "failed to flush audit output");
    }
}

async fn write_line(writer: &mut BoxWriter, mut line: String) -> std::io::Result<()> {
    if !line.ends_with('\n') {
        line.push('\n');
    }
    writer.write_all(line.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events_out::{write_audit_event, AuditEvent};

    #[tokio::test]
    async fn disabled_config_yields_none() {
        let out = start_events_out(&EventsOutConfig::default()).await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn writes_jsonl_lines_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let cfg = EventsOutConfig {
            enabled: true,
            path: path.to_string_lossy().to_string(),
            channel_capacity: 16,
            drop_when_full: false,
        };
        let (out, writer) = start_events_out(&cfg).await.unwrap().unwrap();

        let ev = AuditEvent::new("document.persisted", "doc-1")
            .with_data(serde_json::json!({ "bytes": 11 }));
        write_audit_event(Some(&out), &ev).await;
        drop(out);
        writer.shutdown().await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let line: serde_json::Value = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(line["type"], "document.persisted");
        assert_eq!(line["document_id"], "doc-1");
        assert_eq!(line["data"]["bytes"], 11);
    }

    #[tokio::test]
    async fn shutdown_drains_lines_queued_by_live_senders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let cfg = EventsOutConfig {
            enabled: true,
            path: path.to_string_lossy().to_string(),
            channel_capacity: 64,
            drop_when_full: false,
        };
        let (out, writer) = start_events_out(&cfg).await.unwrap().unwrap();
        let held_elsewhere = out.clone();

        for i in 0..3 {
            let ev = AuditEvent::new("document.persisted", &format!("doc-{i}"));
            write_audit_event(Some(&out), &ev).await;
        }
        writer.shutdown().await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let ids: Vec<String> = contents
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
            .map(|v| v["document_id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["doc-0", "doc-1", "doc-2"]);

        // Late writes after shutdown are discarded without error.
        held_elsewhere.send_line("late".into()).await;
    }
}
