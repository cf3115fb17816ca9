//! One-shot document commands. Ctrl+C cancels the running operation; a
//! cancelled operation persists nothing.

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use docstream_core::api::{
    AppContext, CancellationToken, CliError, CreateDocument, Document, DocumentKind, LiveChannel,
    StreamDelta, UpdateDocument,
};

use crate::commands::cli::{CreateArgs, OutputFormat, ShowArgs, UpdateArgs};

pub async fn handle_create(args: CreateArgs, ctx: &AppContext) -> Result<(), CliError> {
    let kind: DocumentKind = args
        .kind
        .parse()
        .map_err(|e: docstream_core::api::UnknownKind| CliError::Command(e.to_string()))?;
    let services = ctx.build_services()?;

    let request = CreateDocument {
        kind,
        title: args.title,
        owner_id: args.owner,
    };
    let doc = stream_operation(ctx, args.format, |channel, cancel| async move {
        services
            .coordinator
            .create_document(request, &channel, &cancel)
            .await
    })
    .await?;

    tracing::info!(target: "docstream.cli", document_id = %doc.id, "document created");
    Ok(())
}

pub async fn handle_update(args: UpdateArgs, ctx: &AppContext) -> Result<(), CliError> {
    let services = ctx.build_services()?;

    let request = UpdateDocument {
        id: args.id,
        description: args.description,
    };
    let doc = stream_operation(ctx, args.format, |channel, cancel| async move {
        services
            .coordinator
            .update_document(request, &channel, &cancel)
            .await
    })
    .await?;

    tracing::info!(target: "docstream.cli", document_id = %doc.id, "document updated");
    Ok(())
}

pub async fn handle_show(args: ShowArgs, ctx: &AppContext) -> Result<(), CliError> {
    let services = ctx.build_services()?;
    let coordinator = &services.coordinator;

    let rendered = if args.versions {
        let versions = coordinator.versions(&args.id).await?;
        serde_json::to_string_pretty(&versions)
    } else {
        let doc = coordinator.document(&args.id).await?;
        serde_json::to_string_pretty(&doc)
    }
    .map_err(|e| CliError::Command(format!("failed to render document: {e}")))?;

    println!("{rendered}");
    Ok(())
}

/// Runs one coordinator operation with a live channel printed to stdout and
/// Ctrl+C wired to its cancellation token.
async fn stream_operation<F, Fut>(
    ctx: &AppContext,
    format: OutputFormat,
    op: F,
) -> Result<Document, CliError>
where
    F: FnOnce(LiveChannel, CancellationToken) -> Fut,
    Fut: std::future::Future<Output = Result<Document, docstream_core::api::DocumentError>>,
{
    let stream_cfg = &ctx.cfg().stream;
    let (channel, rx) = LiveChannel::bounded(stream_cfg.channel_capacity, stream_cfg.drop_when_full);
    let printer = spawn_printer(rx, format);

    let cancel = CancellationToken::new();
    let watcher = spawn_interrupt_watcher(cancel.clone());

    // The channel moves into `op` and is dropped when it returns, which ends
    // the printer.
    let result = op(channel, cancel).await;
    watcher.abort();
    if printer.await.is_err() {
        tracing::warn!(target: "docstream.cli", "delta printer task failed");
    }

    Ok(result?)
}

fn spawn_interrupt_watcher(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(target: "docstream.cli", "interrupted, cancelling operation");
            cancel.cancel();
        }
    })
}

fn spawn_printer(mut rx: mpsc::Receiver<StreamDelta>, format: OutputFormat) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut out = tokio::io::stdout();
        while let Some(delta) = rx.recv().await {
            let Some(chunk) = render_delta(&delta, format) else {
                continue;
            };
            if out.write_all(chunk.as_bytes()).await.is_err() {
                break;
            }
            let _ = out.flush().await;
        }
    })
}

/// Text mode prints only the document body plus a trailing newline on
/// `finish`; failures are reported through logging and the exit status.
fn render_delta(delta: &StreamDelta, format: OutputFormat) -> Option<String> {
    match format {
        OutputFormat::Jsonl => serde_json::to_string(delta).ok().map(|mut s| {
            s.push('\n');
            s
        }),
        OutputFormat::Text => match delta {
            StreamDelta::TextDelta(t) => Some(t.clone()),
            StreamDelta::Finish => Some("\n".to_string()),
            _ => None,
        },
    }
}
