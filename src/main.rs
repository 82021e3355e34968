//! Terminal chat front-end.
//!
//! Drives a [`ConversationSession`] from stdin: plain lines are submitted,
//! a trailing `\` continues the prompt on the next line, and `/`-commands
//! trigger the auxiliary actions. A leading `//` sends the rest of the line
//! as a prompt that starts with `/`.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mychatgpt::AppContext;
use mychatgpt::config::{AppConfig, Cli};
use mychatgpt::conversation::ConversationId;
use mychatgpt::registry::{ConversationRegistry, RegistryAction};
use mychatgpt::render::render;
use mychatgpt::session::{ConversationSession, Effect, Intent, NoticeLevel, ScrollTarget};

use clap::Parser;

/// Lines shown for a scroll request.
const VIEWPORT_LINES: usize = 24;

const HELP: &str = "\
Type a prompt and press Enter to send it. End a line with \\ to continue on the next line.
Start a line with // to send a prompt that begins with /.
Commands:
  /top            show the start of the conversation
  /bottom         show the end of the conversation
  /export         copy the conversation to the clipboard
  /new            start a new conversation
  /open ID        open a stored conversation
  /list           list known conversations
  /temp VALUE     set the sampling temperature
  /help           show this help
  /quit           exit";

/// A complete input, after line continuations are joined.
#[derive(Debug, PartialEq)]
enum Line {
    Command(Command),
    Prompt(String),
}

fn classify(input: String) -> Line {
    if let Some(text) = input.strip_prefix("//") {
        Line::Prompt(format!("/{text}"))
    } else if input.starts_with('/') {
        Line::Command(parse_command(input.trim()))
    } else {
        Line::Prompt(input)
    }
}

/// A parsed command line.
#[derive(Debug, PartialEq)]
enum Command {
    Intent(Intent),
    Open(String),
    List,
    Temperature(String),
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let mut parts = line.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default().to_string();
    match head {
        "/top" => Command::Intent(Intent::ScrollToTop),
        "/bottom" => Command::Intent(Intent::ScrollToBottom),
        "/export" => Command::Intent(Intent::Export),
        "/new" => Command::Intent(Intent::NewConversation),
        "/open" => Command::Open(arg),
        "/list" => Command::List,
        "/temp" => Command::Temperature(arg),
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (M-LOG-STRUCTURED); stderr keeps the transcript clean.
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // Load .env (if present)
    let _ = dotenv();

    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli).context("failed to load configuration")?;

    info!(
        name: "config.loaded",
        base_url = %config.api.base_url,
        temperature = config.chat.temperature,
        storage = ?config.storage.provider,
        "Configuration loaded"
    );

    let context = AppContext::from_config(&config)
        .await
        .context("failed to initialize application context")?;

    let id = cli
        .chat
        .map_or_else(ConversationId::generate, ConversationId::new);
    context.registry.apply(RegistryAction::Create {
        chat_id: id.clone(),
    });

    let registry = context.registry.clone();
    let session = ConversationSession::open(context, id).await;
    println!("{HELP}\n");
    show(&session, ScrollTarget::Bottom).await;

    run(session, registry, BufReader::new(tokio::io::stdin())).await
}

/// Read input until EOF or `/quit`, then wait for any reply still in flight.
async fn run<R>(
    session: ConversationSession,
    registry: ConversationRegistry,
    reader: R,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let (effects_tx, mut effects_rx) = mpsc::unbounded_channel::<Vec<Effect>>();
    let mut buffer = String::new();
    let mut awaiting_reply = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };

                if let Some(continued) = line.strip_suffix('\\') {
                    buffer.push_str(continued);
                    buffer.push('\n');
                    continue;
                }
                buffer.push_str(&line);
                let input = match classify(std::mem::take(&mut buffer)) {
                    Line::Prompt(input) => input,
                    Line::Command(command) => {
                        match command {
                            Command::Intent(intent) => {
                                let effects = session.dispatch(intent).await;
                                apply_effects(&session, effects).await;
                            }
                            Command::Open(arg) if !arg.is_empty() => {
                                apply_effects(&session, vec![Effect::Navigate(ConversationId::new(arg).route())]).await;
                            }
                            Command::Open(_) => eprintln!("usage: /open ID"),
                            Command::List => {
                                let current = session.snapshot().await.id;
                                for entry in registry.list() {
                                    let marker = if entry.id == current { '*' } else { ' ' };
                                    println!("{marker} {} ({})", entry.id, entry.created_at.format("%Y-%m-%d %H:%M"));
                                }
                            }
                            Command::Temperature(arg) => match arg.parse::<f32>() {
                                Ok(value) => {
                                    registry.set_temperature(value);
                                    println!("temperature: {}", registry.temperature());
                                }
                                Err(_) => eprintln!("usage: /temp VALUE"),
                            },
                            Command::Help => println!("{HELP}"),
                            Command::Quit => break,
                            Command::Unknown(name) => eprintln!("unknown command {name}, try /help"),
                        }
                        continue;
                    }
                };

                // Submission stays disabled until the previous reply is handled.
                if awaiting_reply {
                    eprintln!("still waiting for the previous reply");
                    // Keep the escape so the text stays a prompt.
                    buffer = if input.starts_with('/') { format!("/{input}") } else { input };
                    buffer.push('\n');
                    continue;
                }

                session.dispatch(Intent::EditInput(input)).await;
                awaiting_reply = true;
                let task_session = session.clone();
                let tx = effects_tx.clone();
                tokio::spawn(async move {
                    let effects = task_session.dispatch(Intent::Submit).await;
                    let _ = tx.send(effects);
                });
                println!("{}", render(&session.snapshot().await).status);
            }
            Some(effects) = effects_rx.recv() => {
                awaiting_reply = false;
                apply_effects(&session, effects).await;
            }
        }
    }

    drop(effects_tx);
    if awaiting_reply {
        eprintln!("waiting for the previous reply...");
        if let Some(effects) = effects_rx.recv().await {
            apply_effects(&session, effects).await;
        }
    }

    Ok(())
}

/// Carry out the effects of a dispatch.
async fn apply_effects(session: &ConversationSession, effects: Vec<Effect>) {
    let mut queue = std::collections::VecDeque::from(effects);
    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::Scroll(target) => show(session, target).await,
            Effect::Notify(notice) => match notice.level {
                NoticeLevel::Info => eprintln!("[info] {notice}"),
                NoticeLevel::Error => eprintln!("[error] {notice}"),
            },
            Effect::Navigate(path) => match path.strip_prefix("/chats/") {
                Some(id) if !id.is_empty() => {
                    queue.extend(session.dispatch(Intent::Load(ConversationId::new(id))).await);
                }
                _ => eprintln!("[error] cannot navigate to {path}"),
            },
        }
    }
}

async fn show(session: &ConversationSession, target: ScrollTarget) {
    let frame = render(&session.snapshot().await);
    let lines = match target {
        ScrollTarget::Top => frame.top(VIEWPORT_LINES),
        ScrollTarget::Bottom => frame.bottom(VIEWPORT_LINES),
    };
    println!("{}", "-".repeat(40));
    for line in lines {
        println!("{line}");
    }
    println!("{}", frame.status);
}
