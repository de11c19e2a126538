use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use logpilot_server::{ServerConfig, ServerError, Session, bind, dashboard_url, run_command, run_pipe, serve};
use logpilot_tui::{DashboardOptions, run_dashboard};

mod attach;
mod config;

use attach::run_attach;
use config::Settings;

/// How long shutdown waits for blocking tasks, such as a pending stdin read
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// logpilot - stream a command's output to a browser dashboard with live search and filters
#[derive(Parser, Debug)]
#[command(name = "logpilot")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the web dashboard [default: 51515, or a free port when taken]
    #[arg(short, long)]
    port: Option<u16>,

    /// Host name to bind and put in the dashboard URL
    #[arg(long = "hostname", visible_alias = "host", value_name = "HOST")]
    hostname: Option<String>,

    /// Token clients must present (random when not given)
    #[arg(short, long)]
    secret: Option<String>,

    /// Command to run, split on whitespace
    #[arg(short, long, conflicts_with = "args")]
    command: Option<String>,

    /// Do not draw the terminal dashboard
    #[arg(long)]
    no_dashboard: bool,

    /// Terminal dashboard refresh interval in milliseconds
    #[arg(long, default_value = "1000", value_name = "MS")]
    dashboard_tick_rate: u64,

    /// Settings file (default: <config dir>/logpilot/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Follow another logpilot dashboard instead of serving one
    #[arg(long, value_name = "URL", conflicts_with_all = ["command", "args"])]
    attach: Option<String>,

    /// Only print lines matching one of these queries (attach mode)
    #[arg(long = "filter", value_name = "QUERY", requires = "attach")]
    filters: Vec<String>,

    /// Report lines matching this query (attach mode)
    #[arg(long, value_name = "QUERY", requires = "attach")]
    search: Option<String>,

    /// Command to run, with its arguments
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Args {
    /// The command to run; empty means read piped stdin
    fn command_words(&self) -> Vec<String> {
        match &self.command {
            Some(command) => command.split_whitespace().map(str::to_string).collect(),
            None => self.args.clone(),
        }
    }

    /// File settings with command line flags on top
    fn server_config(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(port) = self.port {
            config.port = Some(port);
        }
        if let Some(host) = &self.hostname {
            config.host = host.clone();
        }
        if let Some(secret) = &self.secret {
            config.secret = Some(secret.clone());
        }
        config
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they stay out of the dashboard
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;
    let result = runtime.block_on(run_app(args));
    // A blocking stdin read cannot be cancelled
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run_app(args: Args) -> Result<()> {
    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    let cancel = CancellationToken::new();

    if let Some(url) = &args.attach {
        return run_attach(
            url,
            &settings.worker,
            &args.filters,
            args.search.as_deref(),
            cancel,
        )
        .await;
    }

    let command = args.command_words();
    if command.is_empty() && io::stdin().is_terminal() {
        bail!(
            "nothing to watch: pass a command (`logpilot -- npm run dev`) or pipe output into logpilot"
        );
    }

    let config = args.server_config(settings.server);
    let (session, control) = Session::new(&config);
    let listener = bind(&config)
        .await
        .context("Failed to start the web server")?;
    let port = listener.local_addr()?.port();
    let url = dashboard_url(&config.host, port, session.token());

    let server = {
        let session = session.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { serve(listener, session, &config, cancel).await })
    };

    let title = if command.is_empty() {
        "stdin".to_string()
    } else {
        command.join(" ")
    };

    let source = if command.is_empty() {
        let (session, cancel) = (session.clone(), cancel.clone());
        tokio::spawn(async move {
            run_pipe(session, tokio::io::stdin(), control, cancel).await;
            Ok::<(), ServerError>(())
        })
    } else {
        tokio::spawn(run_command(session.clone(), command, control, cancel.clone()))
    };

    let shown = if !args.no_dashboard && io::stdout().is_terminal() {
        let options = DashboardOptions {
            title,
            url,
            tick_rate: Duration::from_millis(args.dashboard_tick_rate.max(1)),
        };
        run_dashboard(session, options, cancel.clone())
            .await
            .context("Terminal dashboard failed")
    } else {
        println!("logpilot | {title}");
        println!("dashboard: {url}");
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::signal::ctrl_c() => {}
        }
        Ok(())
    };

    cancel.cancel();
    source
        .await
        .context("Input source task failed")?
        .context("Input source failed")?;
    server
        .await
        .context("Server task failed")?
        .context("Server failed")?;

    shown
}
