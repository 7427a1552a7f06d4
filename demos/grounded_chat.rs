//! Offline grounded chat over a small in-code manual.
//!
//! Everything in this demo is deterministic and needs no running daemons:
//! - segmentation falls back to the paragraph heuristics,
//! - retrieval runs lexically (there is no embedding capability wired),
//! - answers come from a scripted mock generation provider.
//!
//! For each question it prints the retrieved context with scores, then the
//! grounded answer.
//!
//! ```bash
//! cargo run --example grounded_chat
//! ```

use std::sync::Arc;

use groundsmith::providers::MockGenerationProvider;
use groundsmith::{
    ChatService, ChunkEmbedder, EngineConfig, KnowledgeBaseBuilder, PageRecord, Retriever,
    SemanticSegmenter, SourceDocument, TableRecord,
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
        ]),
        PageRecord::new(
            2,
            "A typical bring-up writes PAGE, then PWR_CTL, then unmutes the output stage.",
        ),
    ])
}

#[tokio::main]
async fn main() -> Result<(), groundsmith::EngineError> {
    init_tracing();

    let document = amplifier_manual();
    let config = EngineConfig::default().with_top_k(3);

    // Scripted generation: the first reply answers the segmentation prompt
    // (unusable, so the paragraph heuristics run), the rest answer the chat
    // questions in order.
    let generation = Arc::new(MockGenerationProvider::with_replies([
        "[]",
        "Thermal foldback is the automatic gain reduction applied when the die overheats.",
        "Set PWR_CTL at address 0x02 to 0x01 for active mode, then clear the MUTE bit.",
        "Pin 1 is SDZ, the active-low shutdown; pins 2 and 3 carry the I2C clock and data.",
    ]));
    let service = ChatService::builder()
        .with_generation_provider(generation)
        .with_config(config.clone())
        .build();
    service.build_knowledge_base(&document).await?;

    let stats = service.stats();
    println!(
        "indexed {} chunks ({} text, {} table, {} image), {} fallback embeddings\n",
        stats.total_chunks,
        stats.text_chunks,
        stats.table_chunks,
        stats.image_chunks,
        stats.fallback_embeddings,
    );

    // A side-door view of retrieval so the scores are visible; the service
    // runs the same search internally before each answer.
    let base = KnowledgeBaseBuilder::new(
        SemanticSegmenter::new(None),
        ChunkEmbedder::new(None),
        config.clone(),
    )
    .build(&document)
    .await?;
    let retriever = Retriever::new(ChunkEmbedder::new(None));

    for question in [
        "what is thermal foldback",
        "how to enable playback",
        "pin configuration",
    ] {
        println!("Q: {question}");
        for hit in retriever.search(&base, question, config.retrieval_top_k).await? {
            let role = hit
                .chunk
                .metadata
                .semantic_role
                .map(|role| role.label())
                .unwrap_or("-");
            println!("   [{:.2}] {:30} {}", hit.score, hit.chunk.id, role);
        }
        let answer = service.chat(question).await;
        println!("A: {answer}\n");
    }

    Ok(())
}
