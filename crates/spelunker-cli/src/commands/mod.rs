pub mod args;
pub mod listing;
pub mod record;

pub use listing::{
    alternate_placetypes, concordances, placetypes, tags, ConcordanceCommand,
    DescendantsCommand, ListCommand, NamedListCommand, RecentCommand, SearchCommand,
};
pub use record::{RecordCommand, RecordFormat};

use serde::Serialize;
use std::io::Write;

/// Pretty-print a result to stdout
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Pretty-print a JSON document held as bytes, or write it as is when it
/// does not parse
pub fn print_document(body: &[u8]) -> anyhow::Result<()> {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(doc) => print_json(&doc),
        Err(_) => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(body)?;
            writeln!(stdout)?;
            Ok(())
        }
    }
}
