use super::{print_document, print_json};
use clap::Args;
use spelunker::{AnySpelunker, Spelunker};
use spelunker_query::parse_record_uri;
use tracing::debug;

#[derive(Args)]
pub struct RecordCommand {
    /// Record id, optionally as an alternate geometry (101736545-alt-quattroshapes)
    pub uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Record,
    Spr,
    Feature,
    Count,
}

impl RecordCommand {
    pub async fn execute(
        self,
        spelunker: &AnySpelunker,
        format: RecordFormat,
    ) -> anyhow::Result<()> {
        let (id, args) = parse_record_uri(&self.uri)?;
        debug!("Fetching {:?} for {}", format, self.uri);

        match format {
            RecordFormat::Record => {
                let body = spelunker.get_record_for_id(id, &args).await?;
                print_document(&body)
            }
            RecordFormat::Spr => {
                let spr = spelunker.get_spr_for_id(id, &args).await?;
                print_json(&spr)
            }
            RecordFormat::Feature => {
                let body = spelunker.get_feature_for_id(id, &args).await?;
                print_document(&body)
            }
            RecordFormat::Count => {
                let count = spelunker.count_descendants(id).await?;
                print_json(&serde_json::json!({ "id": id, "descendants": count }))
            }
        }
    }
}
