//! Trellis CLI - serve the site builder

use anyhow::Context;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use trellis_chatbot::{ChatbotEndpoint, EndpointTransport};
use trellis_core::{Config, CoreEngine};
use trellis_editor::{EditorPlugin, SessionManager};
use trellis_server::{AppServices, ServerPlugin};
use trellis_site::{SitePlugin, SiteServices};

/// CLI arguments structure
#[derive(Debug, Clone)]
pub struct Args {
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub config_file: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub dev_mode: bool,
    pub validate_config: bool,
}

impl Args {
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    fn command() -> Command {
        Command::new("trellis")
            .version("0.1.0")
            .about("Block-based website builder with an AI chatbot block")
            .long_about(
                "Trellis serves a website builder: pages are edited as typed blocks or raw \
                HTML, chatbot blocks talk to an OpenAI-compatible provider (or a built-in \
                mock when no API key is set), and the site shell offers navigation, search \
                and a simulated deployment.",
            )
            .arg(
                Arg::new("hostname")
                    .short('H')
                    .long("hostname")
                    .help("Hostname or IP address to bind the server to [default: 127.0.0.1]")
                    .value_parser(clap::value_parser!(String)),
            )
            .arg(
                Arg::new("port")
                    .short('p')
                    .long("port")
                    .help("Port number to bind the server to (1-65535) [default: 3000]")
                    .value_parser(clap::value_parser!(u16)),
            )
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .help("Path to configuration file (JSON format)")
                    .long_help(
                        "Path to a JSON configuration file with server, chatbot and site \
                        settings. Command line flags override values from the file.",
                    )
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("data-dir")
                    .long("data-dir")
                    .help("Directory where site data such as navigation is stored")
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("dev-mode")
                    .long("dev-mode")
                    .help("Enable development mode with verbose logging")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("validate-config")
                    .long("validate-config")
                    .help("Validate configuration and exit")
                    .action(clap::ArgAction::SetTrue),
            )
            .after_help(
                "EXAMPLES:\n    \
                trellis                                  Serve on 127.0.0.1:3000\n    \
                trellis -p 8080 -H 0.0.0.0               Bind to all interfaces on port 8080\n    \
                trellis --config trellis.json            Use a configuration file\n    \
                trellis --validate-config -c trellis.json  Check a configuration file",
            )
    }

    fn from_matches(matches: &clap::ArgMatches) -> Self {
        Self {
            hostname: matches.get_one::<String>("hostname").cloned(),
            port: matches.get_one::<u16>("port").copied(),
            config_file: matches.get_one::<PathBuf>("config").cloned(),
            data_dir: matches.get_one::<PathBuf>("data-dir").cloned(),
            dev_mode: matches.get_flag("dev-mode"),
            validate_config: matches.get_flag("validate-config"),
        }
    }

    /// Load the configuration file, if any, and apply command line overrides
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config_file {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                Config::from_file(path)
                    .with_context(|| format!("Failed to load {}", path.display()))?
            }
            None => Config::new(),
        };

        if let Some(hostname) = &self.hostname {
            config.server.hostname = hostname.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(data_dir) = &self.data_dir {
            config.site.data_dir = data_dir.clone();
        }

        Ok(config)
    }
}

fn init_logging(dev_mode: bool) {
    let level = if dev_mode { Level::DEBUG } else { Level::INFO };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(dev_mode)
        .with_line_number(dev_mode)
        .with_file(dev_mode);

    if dev_mode {
        subscriber.with_ansi(true).pretty().init();
        info!("Development mode enabled");
    } else {
        subscriber.with_ansi(true).init();
    }
}

/// Print a validation report; returns whether the configuration is usable
fn report_validation(config: &Config) -> bool {
    let result = config.validate_comprehensive();

    for warning in &result.warnings {
        println!("warning: {}", warning);
    }
    for error in &result.errors {
        println!("error: {}", error);
    }

    if result.is_valid {
        println!("Configuration is valid");
    }
    result.is_valid
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.dev_mode);

    let config = args.load_config()?;

    if args.validate_config {
        if !report_validation(&config) {
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut engine = CoreEngine::new(config).context("Invalid configuration")?;
    let config = engine.config();
    let event_bus = engine.event_bus();
    let context = engine.create_plugin_context();

    let endpoint = match ChatbotEndpoint::from_config(&config.chatbot) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            warn!("Chat provider unavailable, using mock responses: {}", e);
            ChatbotEndpoint::mock_only()
        }
    };
    let endpoint = Arc::new(endpoint.with_event_bus(event_bus.clone()));
    if endpoint.has_provider() {
        info!("Chatbot using model {}", config.chatbot.model);
    } else {
        info!(
            "No API key in {}, chatbot replies come from the mock responder",
            config.chatbot.api_key_env
        );
    }

    let sessions = Arc::new(SessionManager::new(Arc::new(EndpointTransport::new(
        endpoint.clone(),
    ))));
    let site = Arc::new(SiteServices::from_config(&config.site, event_bus));

    engine
        .register_plugin(Box::new(EditorPlugin::new(sessions.clone())), &context)
        .await?;
    engine
        .register_plugin(Box::new(SitePlugin::new(site.clone())), &context)
        .await?;
    engine
        .register_plugin(
            Box::new(ServerPlugin::new(AppServices {
                chatbot: endpoint,
                sessions,
                site,
            })),
            &context,
        )
        .await
        .context("Failed to start the HTTP server")?;

    if let Some(address) = engine.get_server_address() {
        println!("Trellis site builder");
        println!("Site:     http://{}/", address);
        println!("Builder:  http://{}/builder", address);
        println!("Edit:     http://{}/builder/edit/home", address);
        println!("Press Ctrl+C to stop.");
    }

    engine.run().await?;

    info!("Trellis shutdown complete");
    Ok(())
}
