use std::io::{BufRead, Write};

use crate::server::McpServer;

/// Serve newline-delimited JSON-RPC until `reader` is exhausted.
pub fn serve_stdio<R: BufRead, W: Write>(
    server: &mut McpServer,
    reader: R,
    mut writer: W,
) -> std::io::Result<()> {
    tracing::info!("serving on stdio");

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        for message in server.handle_request(&line) {
            writeln!(writer, "{}", message)?;
        }
        writer.flush()?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}
