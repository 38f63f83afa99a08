//! JSON-lines command channel.
//!
//! The UI writes one [`HostRequest`](paperlink_core::HostRequest) per line on
//! the host's stdin and reads one `{"ok": ..}` / `{"err": ..}` line back on
//! stdout for each, in order.

use std::io::{self, BufRead, Write};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bootstrap::HostContext;
use crate::commands::CommandDispatcher;

/// Lines buffered between the stdin reader and the dispatcher.
const LINE_QUEUE: usize = 64;

/// Answer every request line until `lines` ends or `cancel` fires.
pub async fn serve_commands(
    dispatcher: &CommandDispatcher,
    mut lines: mpsc::Receiver<String>,
    out: &mut impl Write,
    cancel: &CancellationToken,
) -> io::Result<()> {
    loop {
        let line = tokio::select! {
            () = cancel.cancelled() => break,
            line = lines.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };
        let request = line.trim();
        if request.is_empty() {
            continue;
        }

        let reply = dispatcher.handle_json(request).await;
        writeln!(out, "{reply}")?;
        out.flush()?;
    }
    debug!("Command channel stopped");
    Ok(())
}

/// Read stdin on a dedicated thread.
///
/// A blocked read on Tokio's stdin cannot be cancelled and would hold up
/// runtime shutdown; a plain thread just dies with the process.
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(LINE_QUEUE);
    let spawned = std::thread::Builder::new()
        .name("paperlink-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read command from stdin");
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "Failed to start stdin reader, host commands disabled");
    }
    rx
}

/// Serve host commands over stdin/stdout until shutdown.
pub fn spawn_command_channel(ctx: &HostContext) -> JoinHandle<()> {
    let dispatcher = ctx.dispatcher.clone();
    let cancel = ctx.cancel.child_token();
    let lines = stdin_lines();
    info!("Accepting host commands on stdin");
    tokio::spawn(async move {
        let mut out = io::stdout();
        if let Err(e) = serve_commands(&dispatcher, lines, &mut out, &cancel).await {
            warn!(error = %e, "Command channel closed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::HeadlessDialogs;
    use paperlink_core::LogModule;
    use paperlink_runtime::LogStore;
    use std::sync::Arc;

    fn dispatcher(store: &Arc<LogStore>) -> CommandDispatcher {
        CommandDispatcher::new(
            Arc::new(HeadlessDialogs),
            Arc::clone(store),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_each_line_gets_one_reply_in_order() {
        let store = Arc::new(LogStore::default());
        store.append(LogModule::Analyze, "a");
        store.append(LogModule::Config, "cfg");
        let (tx, rx) = mpsc::channel(8);
        for line in [
            r#"{"command":"clearLogs","module":"analyze"}"#,
            "",
            r#"{"command":"getLogs","module":"config"}"#,
            "not json",
        ] {
            tx.send(line.to_string()).await.unwrap();
        }
        drop(tx);

        let mut out = Vec::new();
        serve_commands(&dispatcher(&store), rx, &mut out, &CancellationToken::new())
            .await
            .unwrap();

        let replies: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["ok"]["type"], "done");
        assert_eq!(replies[1]["ok"]["value"], serde_json::json!(["cfg"]));
        assert_eq!(replies[2]["err"]["type"], "InvalidInput");
        assert!(store.is_empty(LogModule::Analyze));
    }

    #[tokio::test]
    async fn test_cancel_stops_serving() {
        let store = Arc::new(LogStore::default());
        let (_tx, rx) = mpsc::channel::<String>(8);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut out = Vec::new();
        serve_commands(&dispatcher(&store), rx, &mut out, &cancel)
            .await
            .unwrap();
        assert!(out.is_empty());
    }
}
