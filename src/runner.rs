use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::errors::RunError;
use crate::parser::parse_line;
use crate::service::DispatchService;
use crate::sink::ReplySink;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Commands applied to the registry.
    pub commands: usize,
    /// Lines that did not parse.
    pub skipped: usize,
    /// `true` if a duplicate ride stopped the stream early.
    pub halted: bool,
}

/// Applies every command read from `reader` and writes the results to `sink`.
///
/// The `shutdown` future is checked before each line is read; once it
/// completes no further commands are applied. Output written so far is
/// always flushed, including when a duplicate ride halts the stream.
pub async fn run<R, S>(
    reader: R,
    sink: &mut S,
    service: &mut DispatchService,
    shutdown: impl Future,
) -> Result<RunSummary, RunError>
where
    R: AsyncBufRead + Unpin,
    S: ReplySink,
{
    info!("processing command log");

    let mut summary = RunSummary::default();
    let mut lines = reader.lines();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                warn!(cause = %err, "skipping line");
                summary.skipped += 1;
                continue;
            }
        };

        summary.commands += 1;
        match service.process_cmd(command) {
            Ok(Some(reply)) => sink.write_line(&reply.to_string()).await?,
            Ok(None) => {}
            Err(err) => {
                warn!(cause = ?err, "halting command stream");
                sink.write_line(&err.to_string()).await?;
                summary.halted = true;
                break;
            }
        }
    }

    sink.flush().await?;
    debug!(pending = service.registry().len(), "rides left undispatched");
    info!(
        commands = summary.commands,
        skipped = summary.skipped,
        halted = summary.halted,
        "command log processed"
    );
    Ok(summary)
}
