//! Ingestion report for a small in-code manual.
//!
//! Builds the knowledge base offline (paragraph-heuristic segmentation,
//! hash-fallback embeddings), pretty-prints the stats as JSON, then lists
//! every chunk with its id, kind, role, and topic.
//!
//! ```bash
//! cargo run --example ingest_report
//! ```

use groundsmith::{
    ChunkEmbedder, EngineConfig, KnowledgeBaseBuilder, PageRecord, SemanticSegmenter,
    SourceDocument, TableRecord,
};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,groundsmith=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn amplifier_manual() -> SourceDocument {
    let overview = "The TAS2781 is a digital input mono Class-D audio amplifier. Thermal \
         foldback refers to the automatic gain reduction applied when the die temperature \
         crosses the configured limit.\n\n\
         To enable playback you must set the PWR_CTL register to active mode and clear the \
         MUTE bit. Follow these steps in order after every reset.\n\n\
         The I2C interface meets the fast-mode timing specification at 400kHz. The bus \
         pull-up resistors are sized per the electrical characteristics table.";

    SourceDocument::new("amp_manual", overview).with_pages(vec![
        PageRecord::new(
            1,
            "Power control lives at address 0x02. Writing 0x00 powers the device down and \
             writing 0x01 enters active mode.",
        )
        .with_tables(vec![
            TableRecord::new(vec![
                vec!["1".into(), "SDZ".into(), "Shutdown, active low".into()],
                vec!["2".into(), "SCL".into(), "I2C clock".into()],
                vec!["3".into(), "SDA".into(), "I2C data".into()],
            ])
            .with_caption("Pin configuration")
            .with_headers(vec!["Pin".into(), "Name".into(), "Function".into()]),
        ])
        .with_images(vec!["figures/block-diagram.png".into()]),
        PageRecord::new(
            2,
            "A typical bring-up writes PAGE, then PWR_CTL, then unmutes the output stage.",
        ),
    ])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let builder = KnowledgeBaseBuilder::new(
        SemanticSegmenter::new(None),
        ChunkEmbedder::new(None),
        EngineConfig::default(),
    );
    let base = builder.build(&amplifier_manual()).await?;

    println!("{}\n", serde_json::to_string_pretty(&base.stats())?);

    println!(
        "{:<30} {:<6} {:<14} {:<12} terms",
        "id", "kind", "role", "topic"
    );
    for chunk in base.chunks() {
        println!(
            "{:<30} {:<6} {:<14} {:<12} {}",
            chunk.id,
            chunk.metadata.kind.label(),
            chunk
                .metadata
                .semantic_role
                .map(|role| role.label())
                .unwrap_or("-"),
            chunk.metadata.topic.as_deref().unwrap_or("-"),
            chunk.metadata.key_terms.join(", "),
        );
    }

    Ok(())
}
