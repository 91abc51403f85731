//! Loopback MCP — entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde_json::{json, Value};

use loopback_mcp::config::{resolve_request_timeout, ClientConfig};
use loopback_mcp::protocol::Dispatcher;
use loopback_mcp::session::Session;
use loopback_mcp::transport::{Server, ServerHandle};
use loopback_mcp::types::{InitializeResult, LogLevel, LOG_MESSAGE_NOTIFICATION};

#[derive(Parser)]
#[command(
    name = "loopback-mcp",
    about = "In-process MCP client and server joined by an in-memory channel",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Per-request timeout in milliseconds, 0 to wait forever.
    /// Also reads from LOOPBACK_MCP_TIMEOUT_MS.
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect a client to a fresh server and exercise every built-in tool (default).
    Demo,

    /// Print the tool summaries the server advertises, as JSON.
    Tools,

    /// Call one tool and print its text content.
    Call {
        /// Tool name.
        name: String,

        /// Tool arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Print server identity and capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   loopback-mcp completions bash > ~/.local/share/bash-completion/completions/loopback-mcp
    ///   loopback-mcp completions zsh > ~/.zfunc/_loopback-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::default().with_request_timeout(resolve_request_timeout(cli.timeout_ms));

    match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => {
            let (session, server) = start(config).await?;

            session.on_notification(LOG_MESSAGE_NOTIFICATION, |params| {
                let data = params
                    .as_ref()
                    .and_then(|p| p.get("data"))
                    .cloned()
                    .unwrap_or(Value::Null);
                println!("[server] {data}");
            });
            server.log(LogLevel::Info, json!("client connected"))?;

            let tools = session.list_tools().await?;
            println!("Available tools:");
            for tool in &tools {
                println!("  {} - {}", tool.name, tool.description);
            }

            let echo = session
                .call_tool("echo", json!({ "message": "Hello from the loopback client" }))
                .await?;
            println!("{}", echo.text_content());

            let ping = session.call_tool("ping", json!({})).await?;
            println!("{}", ping.text_content());

            session.disconnect();
            server.join().await;
        }

        Commands::Tools => {
            let (session, server) = start(config).await?;
            let tools = session.list_tools().await?;
            println!("{}", serde_json::to_string_pretty(&tools)?);
            session.disconnect();
            server.join().await;
        }

        Commands::Call { name, args } => {
            let arguments: Value = serde_json::from_str(&args)
                .map_err(|e| anyhow::anyhow!("--args is not valid JSON: {e}"))?;

            let (session, server) = start(config).await?;
            let outcome = session.call_tool(&name, arguments).await;
            session.disconnect();
            server.join().await;

            match outcome {
                Ok(result) => println!("{}", result.text_content()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Info => {
            let capabilities = InitializeResult::default_result();
            let dispatcher = Dispatcher::with_builtin_tools();
            let tools = dispatcher.registry().list();
            let info = json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "loopback-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Serve the built-in tools on a fresh carrier and connect a session to it.
async fn start(config: ClientConfig) -> anyhow::Result<(Session, ServerHandle)> {
    let server = Server::new(Dispatcher::with_builtin_tools());
    let (port, handle) = server.loopback();

    let session = Session::from_port(port, config);
    let result = session.connect().await?;
    tracing::info!(
        "Session ready: {} v{} (protocol {})",
        result.server_info.name,
        result.server_info.version,
        result.protocol_version
    );

    Ok((session, handle))
}
