//! `philovoid chat` — the interactive session.
//!
//! Plain lines are conversation turns. Slash commands drive the knowledge
//! library, the synthesis desk, and the ritual cycle. Reads from stdin,
//! writes to stdout.

use anyhow::Context;
use philovoid_config::AppConfig;
use philovoid_core::ids::{IdGenerator, UuidGenerator};
use philovoid_core::knowledge::KnowledgeDocument;
use philovoid_core::message::Sender;
use philovoid_core::persona;
use philovoid_core::storage::FileStorage;
use philovoid_gateway::GenerativeClient;
use philovoid_session::knowledge::Upload;
use philovoid_session::{
    ChatSession, ConversationStore, KnowledgeStore, SortKey, StageMotor, SynthesisDesk,
    TokioScheduler,
};
use rand::Rng;
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};

const HELP: &str = "\
  /upload <paths…>         add plain-text/markdown documents to the library
  /library                 show the library, grouped by folder
  /enable <name|id>        toggle a document's retrieval eligibility
  /select <name|id>        toggle a document's synthesis selection
  /sort <name|date|status> cycle the library sort order
  /remove <name|id>        delete one document
  /clear-library           delete every document
  /synthesize              deep-synthesize the selected documents
  /refine <focus>          re-synthesize around a new focus
  /ask <question>          ask a follow-up about the synthesis
  /koan                    draw a koan from the void
  /ritual                  start or stop the ritual cycle
  /deep                    toggle extended reasoning
  /clear                   reset the conversation
  /quit                    leave";

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Upload(Vec<String>),
    Library,
    Enable(String),
    Select(String),
    Sort(SortKey),
    Remove(String),
    ClearLibrary,
    Synthesize,
    Refine(String),
    FollowUp(String),
    Koan,
    Ritual,
    Deep,
    Clear,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or("").trim();

    let needs_arg = |name: &str| format!("{name} needs an argument — see /help");

    match head {
        "/upload" => {
            let paths: Vec<String> = rest.split_whitespace().map(String::from).collect();
            if paths.is_empty() {
                Err(needs_arg("/upload"))
            } else {
                Ok(Command::Upload(paths))
            }
        }
        "/library" => Ok(Command::Library),
        "/enable" if !rest.is_empty() => Ok(Command::Enable(rest.to_string())),
        "/enable" => Err(needs_arg("/enable")),
        "/select" if !rest.is_empty() => Ok(Command::Select(rest.to_string())),
        "/select" => Err(needs_arg("/select")),
        "/sort" => match rest {
            "name" => Ok(Command::Sort(SortKey::Name)),
            "date" => Ok(Command::Sort(SortKey::CreatedAt)),
            "status" => Ok(Command::Sort(SortKey::Enabled)),
            _ => Err("Sort by one of: name, date, status".into()),
        },
        "/remove" if !rest.is_empty() => Ok(Command::Remove(rest.to_string())),
        "/remove" => Err(needs_arg("/remove")),
        "/clear-library" => Ok(Command::ClearLibrary),
        "/synthesize" => Ok(Command::Synthesize),
        "/refine" if !rest.is_empty() => Ok(Command::Refine(rest.to_string())),
        "/refine" => Err(needs_arg("/refine")),
        "/ask" if !rest.is_empty() => Ok(Command::FollowUp(rest.to_string())),
        "/ask" => Err(needs_arg("/ask")),
        "/koan" => Ok(Command::Koan),
        "/ritual" => Ok(Command::Ritual),
        "/deep" => Ok(Command::Deep),
        "/clear" => Ok(Command::Clear),
        "/help" => Ok(Command::Help),
        "/quit" | "/exit" => Ok(Command::Quit),
        other => Err(format!("Unknown command {other} — see /help")),
    }
}

/// Only plain-text and markdown uploads are accepted.
fn is_supported_upload(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("txt") | Some("md")
    )
}

fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "[you]",
        Sender::Ai => "[void]",
        Sender::System => "[sys]",
    }
}

struct ChatApp {
    session: ChatSession,
    knowledge: KnowledgeStore,
    desk: SynthesisDesk,
    motor: StageMotor,
    gateway: Arc<GenerativeClient>,
}

impl ChatApp {
    /// Resolve a document by exact name, falling back to id prefix.
    fn resolve_document(&self, needle: &str) -> Option<String> {
        let docs = self.knowledge.documents();
        docs.iter()
            .find(|d| d.name == needle)
            .or_else(|| docs.iter().find(|d| d.id.starts_with(needle)))
            .map(|d| d.id.clone())
    }

    async fn turn(&mut self, prompt: &str) {
        print!("[void] ");
        let _ = std::io::stdout().flush();
        let outcome = self
            .session
            .send_message(prompt, self.knowledge.documents(), |fragment| {
                print!("{fragment}");
                let _ = std::io::stdout().flush();
            })
            .await;
        println!();
        if outcome.is_err() {
            if let Some(last) = self.session.messages().last() {
                println!("{} {}", sender_label(last.sender), last.content);
            }
        }
    }

    async fn upload(&mut self, paths: Vec<String>) {
        let mut uploads = Vec::new();
        for raw in paths {
            let path = Path::new(&raw);
            if !is_supported_upload(path) {
                println!("Skipping {raw}: only .txt and .md files are accepted");
                continue;
            }
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    let name = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or(&raw)
                        .to_string();
                    uploads.push(Upload { name, content });
                }
                Err(e) => println!("Skipping {raw}: {e}"),
            }
        }
        if uploads.is_empty() {
            return;
        }

        println!("Analyzing {} file(s)…", uploads.len());
        let ids = self.knowledge.ingest(uploads, self.gateway.as_ref()).await;
        for id in ids {
            if let Some(doc) = self.knowledge.documents().iter().find(|d| d.id == id) {
                println!("  {} → {} {:?}", doc.name, doc.folder, doc.tags);
            }
        }
    }

    fn print_library(&self) {
        if self.knowledge.is_empty() {
            println!("Upload documents to build your knowledge base.");
            return;
        }
        for (folder, docs) in self.knowledge.grouped() {
            println!("{folder} ({})", docs.len());
            for doc in docs {
                println!(
                    "  [{}]{} {}  {}  {:?}",
                    if doc.enabled { "x" } else { " " },
                    if self.knowledge.is_selected(&doc.id) {
                        "*"
                    } else {
                        " "
                    },
                    &doc.id[..8.min(doc.id.len())],
                    doc.name,
                    doc.tags,
                );
            }
        }
        println!(
            "{} / {} docs active, {} selected",
            self.knowledge.enabled_count(),
            self.knowledge.len(),
            self.knowledge.selection_count()
        );
    }

    async fn synthesize(&mut self) {
        let selected: Vec<&KnowledgeDocument> = self.knowledge.selected_documents();
        if selected.is_empty() {
            println!("Select documents first (/select), then synthesize.");
            return;
        }
        println!("Synthesizing {} document(s)…", selected.len());
        let outcome = self
            .desk
            .run(&selected, |fragment| {
                print!("{fragment}");
                let _ = std::io::stdout().flush();
            })
            .await;
        println!();
        if outcome.is_err() {
            println!("{}", self.desk.summary());
        }
    }

    async fn refine(&mut self, focus: &str) {
        let selected: Vec<&KnowledgeDocument> = self.knowledge.selected_documents();
        if selected.is_empty() || self.desk.summary().is_empty() {
            println!("Run /synthesize first.");
            return;
        }
        println!("Refocusing…");
        let outcome = self
            .desk
            .refine(&selected, focus, |fragment| {
                print!("{fragment}");
                let _ = std::io::stdout().flush();
            })
            .await;
        println!();
        if outcome.is_err() {
            println!("{}", self.desk.summary());
        }
    }

    async fn follow_up(&mut self, question: &str) {
        if self.desk.summary().is_empty() {
            println!("Run /synthesize first.");
            return;
        }
        print!("[void] ");
        let _ = std::io::stdout().flush();
        let outcome = self
            .desk
            .follow_up(question, |fragment| {
                print!("{fragment}");
                let _ = std::io::stdout().flush();
            })
            .await;
        println!();
        if outcome.is_err() {
            if let Some(last) = self.desk.follow_up_messages().last() {
                println!("{}", last.content);
            }
        }
    }

    fn toggle_ritual(&mut self) {
        if self.motor.is_running() {
            self.motor.stop();
            println!("The ritual falls silent.");
        } else {
            self.motor.start();
        }
    }

    fn draw_koan(&mut self) {
        let index = rand::rng().random_range(0..persona::KOANS.len());
        self.session.add_koan(index);
        if let Some(last) = self.session.messages().last() {
            println!("{} {}", sender_label(last.sender), last.content);
        }
    }

    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Upload(paths) => self.upload(paths).await,
            Command::Library => self.print_library(),
            Command::Enable(needle) => match self.resolve_document(&needle) {
                Some(id) => {
                    self.knowledge.toggle_enabled(&id);
                    self.print_library();
                }
                None => println!("No document matches '{needle}'"),
            },
            Command::Select(needle) => match self.resolve_document(&needle) {
                Some(id) => {
                    self.knowledge.toggle_selected(&id);
                    self.print_library();
                }
                None => println!("No document matches '{needle}'"),
            },
            Command::Sort(key) => {
                self.knowledge.toggle_sort(key);
                self.print_library();
            }
            Command::Remove(needle) => match self.resolve_document(&needle) {
                Some(id) => {
                    self.knowledge.remove(&id);
                    self.print_library();
                }
                None => println!("No document matches '{needle}'"),
            },
            Command::ClearLibrary => {
                self.knowledge.clear();
                println!("The library is empty.");
            }
            Command::Synthesize => self.synthesize().await,
            Command::Refine(focus) => self.refine(&focus).await,
            Command::FollowUp(question) => self.follow_up(&question).await,
            Command::Koan => self.draw_koan(),
            Command::Ritual => self.toggle_ritual(),
            Command::Deep => {
                let on = self.session.toggle_deep_thought();
                println!("Deep thought {}", if on { "on" } else { "off" });
            }
            Command::Clear => {
                self.session.clear();
                println!("The loop resets.");
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return false,
        }
        true
    }
}

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let gateway = Arc::new(GenerativeClient::from_config(&config));
    let ids: Arc<dyn IdGenerator> = Arc::new(UuidGenerator);
    let store = ConversationStore::new(
        Arc::new(FileStorage::new(config.conversation_path())),
        ids.clone(),
    );

    let motor = StageMotor::new(Arc::new(TokioScheduler::new())).with_observer(Arc::new(
        |stage| {
            println!("\n── {} ──", stage.name);
            println!("   {}", stage.description);
        },
    ));

    let mut app = ChatApp {
        session: ChatSession::new(store, gateway.clone()),
        knowledge: KnowledgeStore::new(ids.clone()),
        desk: SynthesisDesk::new(gateway.clone(), ids),
        motor,
        gateway,
    };

    // Replay the restored conversation.
    for message in app.session.messages() {
        println!("{} {}", sender_label(message.sender), message.content);
    }
    println!("(/help for commands)");

    let stdin = io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let Some(line) = lines.next_line().await? else {
            break; // EOF (Ctrl+D)
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('/') {
            match parse_command(&line) {
                Ok(command) => {
                    if !app.handle(command).await {
                        break;
                    }
                }
                Err(message) => println!("{message}"),
            }
        } else {
            app.turn(&line).await;
        }
    }

    Ok(())
}
