//! `mchat-ctl`: command-line client for the mchat backend.
//!
//! Every endpoint binding is reachable from here; `chat` streams the reply
//! to stdout as it arrives.
//!
//! ```text
//! mchat-ctl [--config PATH] [--base URL] [--origin URL] [--log-level L] <command>
//!
//!   health
//!   roles list | get <id> | create --name N ... | update <id> --name N ... | delete <id>
//!   conversations list <role> | create <role> [--title T] | delete <id>
//!   messages <conversation>
//!   memories <role>
//!   chat <role> [--conversation N] <message>
//! ```
//!
//! Settings come from the same config file as the dev server (missing is
//! fine). Flags beat `VITE_API_BASE`/`MCHAT_LOG_LEVEL`, which beat the file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use mchat_web::{
    api::{ApiClient, ApiError, ChatStreamRequest, ResponseBody, conversation_id_of, fallback_message},
    config::{self, DEFAULT_CONFIG_PATH},
    error::AppError,
    logger,
    models::{ConversationInput, RoleInput},
};

#[derive(Parser)]
#[command(name = "mchat-ctl")]
#[command(version, about = "Command-line client for the mchat backend")]
struct Cli {
    /// Config file; a missing file means built-in defaults
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// API origin prefix, overrides `api.base`; empty means use the origin
    #[arg(long, global = true)]
    base: Option<String>,

    /// Origin used when the base is empty, overrides `api.origin`
    #[arg(long, global = true)]
    origin: Option<String>,

    /// Log filter (error, warn, info, debug, trace), overrides `app.log_level`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backend liveness probe
    Health,

    /// Role management
    Roles {
        #[command(subcommand)]
        command: RoleCommands,
    },

    /// Conversation management
    Conversations {
        #[command(subcommand)]
        command: ConversationCommands,
    },

    /// List the messages of a conversation
    Messages { conversation: String },

    /// List the memories kept for a role
    Memories { role: String },

    /// Send a message and stream the reply
    Chat {
        role: u64,
        /// Continue an existing conversation (omit to start a new one)
        #[arg(long)]
        conversation: Option<u64>,
        message: String,
    },
}

#[derive(Subcommand)]
enum RoleCommands {
    List,
    Get { id: String },
    Create(RoleFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: RoleFields,
    },
    Delete { id: String },
}

#[derive(Args)]
struct RoleFields {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    background: String,
    #[arg(long, default_value = "")]
    style: String,
    #[arg(long, default_value = "")]
    persona_hint: String,
    #[arg(long, default_value = "")]
    call_me: String,
}

impl From<RoleFields> for RoleInput {
    fn from(f: RoleFields) -> Self {
        RoleInput {
            name: f.name,
            background: f.background,
            style: f.style,
            persona_hint: f.persona_hint,
            call_me: f.call_me,
        }
    }
}

#[derive(Subcommand)]
enum ConversationCommands {
    List { role: String },
    Create {
        role: String,
        #[arg(long, default_value = "")]
        title: String,
    },
    Delete { id: String },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = config::load_or_default(&cli.config)?;
    if let Some(base) = cli.base {
        config.api.base = base;
    }
    if let Some(origin) = cli.origin {
        config.api.origin = origin;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    logger::init(&config.log_level)?;

    let client = ApiClient::from_config(&config.api);
    debug!(url = %client.url("/api"), config = %cli.config.display(), "client ready");

    let body = match cli.command {
        Commands::Health => client.health().await?,
        Commands::Roles { command } => match command {
            RoleCommands::List => client.list_roles().await?,
            RoleCommands::Get { id } => client.get_role(id).await?,
            RoleCommands::Create(fields) => client.create_role(&RoleInput::from(fields)).await?,
            RoleCommands::Update { id, fields } => {
                client.update_role(id, &RoleInput::from(fields)).await?
            }
            RoleCommands::Delete { id } => client.delete_role(id).await?,
        },
        Commands::Conversations { command } => match command {
            ConversationCommands::List { role } => client.list_conversations(role).await?,
            ConversationCommands::Create { role, title } => {
                client.create_conversation(role, &ConversationInput { title }).await?
            }
            ConversationCommands::Delete { id } => client.delete_conversation(id).await?,
        },
        Commands::Messages { conversation } => client.list_messages(conversation).await?,
        Commands::Memories { role } => client.list_memories(role).await?,
        Commands::Chat { role, conversation, message } => {
            let req = ChatStreamRequest::new(role, conversation, message);
            return stream_chat(&client, &req).await;
        }
    };

    print_body(body)
}

fn print_body(body: ResponseBody) -> Result<(), AppError> {
    match body {
        ResponseBody::Json(v) => {
            let pretty = serde_json::to_string_pretty(&v)
                .map_err(|e| ApiError::Request(format!("failed to format response: {e}")))?;
            println!("{pretty}");
        }
        ResponseBody::Text(s) => println!("{s}"),
        ResponseBody::Empty => {}
    }
    Ok(())
}

/// Copy the reply to stdout chunk by chunk.
async fn stream_chat(client: &ApiClient, req: &ChatStreamRequest) -> Result<(), AppError> {
    let resp = client.chat_stream(req).await?;

    // The streaming helper leaves status handling to us.
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        let message = if text.is_empty() { fallback_message(status) } else { text };
        return Err(ApiError::Request(message).into());
    }

    if let Some(id) = conversation_id_of(&resp) {
        eprintln!("conversation: {id}");
    }

    let mut stdout = tokio::io::stdout();
    let mut chunks = resp.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|e| ApiError::Request(e.to_string()))?;
        stdout.write_all(&chunk).await?;
        stdout.flush().await?;
    }
    stdout.write_all(b"\n").await?;
    Ok(())
}
