use groundsmith::{DocumentMetadata, PageRecord, SourceDocument, TableRecord};

/// A small amplifier manual with every ingestion surface: multi-paragraph
/// document text, per-page text, a table, and an image reference.
pub fn amplifier_manual() -> SourceDocument {
    SourceDocument::new("amp_manual", overview_text())
        .with_pages(vec![
            PageRecord::new(
                1,
                "Power control lives at address 0x02. Writing 0x00 powers the device \
                 down and writing 0x01 enters active mode.",
            )
            .with_tables(vec![pin_configuration_table()])
            .with_images(vec!["figures/block-diagram.png".to_string()]),
            PageRecord::new(
                2,
                "A typical bring-up writes PAGE, then PWR_CTL, then unmutes the output stage.",
            ),
        ])
        .with_metadata(DocumentMetadata {
            title: Some("TAS2781 Reference".to_string()),
            author: None,
            page_count: Some(2),
        })
}

/// Three paragraphs that hit the definition, instruction, and specification
/// role cues, long enough in total to bypass the small-text shortcut.
pub fn overview_text() -> String {
    "The TAS2781 is a digital input mono Class-D audio amplifier. Thermal foldback \
     refers to the automatic gain reduction applied when the die temperature crosses \
     the configured limit.\n\n\
     To enable playback you must set the PWR_CTL register to active mode and clear \
     the MUTE bit. Follow these steps in order after every reset.\n\n\
     The I2C interface meets the fast-mode timing specification at 400kHz. The bus \
     pull-up resistors are sized per the electrical characteristics table."
        .to_string()
}

pub fn pin_configuration_table() -> TableRecord {
    TableRecord::new(vec![
        vec!["1".to_string(), "SDZ".to_string(), "Shutdown, active low".to_string()],
        vec!["2".to_string(), "SCL".to_string(), "I2C clock".to_string()],
        vec!["3".to_string(), "SDA".to_string(), "I2C data".to_string()],
    ])
    .with_caption("Pin configuration")
    .with_headers(vec!["Pin".to_string(), "Name".to_string(), "Function".to_string()])
}

/// A one-line manual, below the small-text threshold.
#[allow(dead_code)]
pub fn tiny_manual() -> SourceDocument {
    SourceDocument::new("note", "Thermal foldback reduces gain when the die heats up.")
}
