//! `philovoid ask` — one-shot turn against the persisted conversation.

use anyhow::Context;
use philovoid_config::AppConfig;
use philovoid_core::ids::UuidGenerator;
use philovoid_core::storage::FileStorage;
use philovoid_gateway::GenerativeClient;
use philovoid_session::{ChatSession, ConversationStore};
use std::io::Write;
use std::sync::Arc;

pub async fn run(message: &str, deep: bool) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let gateway = Arc::new(GenerativeClient::from_config(&config));
    let store = ConversationStore::new(
        Arc::new(FileStorage::new(config.conversation_path())),
        Arc::new(UuidGenerator),
    );

    let mut session = ChatSession::new(store, gateway);
    if deep && !session.deep_thought() {
        session.toggle_deep_thought();
    }

    let outcome = session
        .send_message(message, &[], |fragment| {
            print!("{fragment}");
            let _ = std::io::stdout().flush();
        })
        .await;
    println!();

    if outcome.is_err() {
        // The failure text has already been written into the log slot.
        if let Some(last) = session.messages().last() {
            eprintln!("{}", last.content);
        }
        std::process::exit(1);
    }

    Ok(())
}
