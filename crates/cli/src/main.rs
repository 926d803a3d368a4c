use clap::{Parser, Subcommand};
use frame_bridge::bridge::FrameDisplayBridge;
use frame_bridge::config;
use frame_bridge::display::ImageElement;
use frame_bridge::rosbridge::{RosbridgeClient, SubscribeOptions};
use frame_bridge::topic::ChannelEndpoint;
use frame_bridge::viewer;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "frame-bridge")]
#[command(about = "Show rosbridge compressed image frames in the browser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: FRAME_BRIDGE_CONFIG_PATH or ~/.frame-bridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Print the topic and message type that `run` subscribes to.
    Endpoint {
        /// Config file path (default: FRAME_BRIDGE_CONFIG_PATH or ~/.frame-bridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Workspace prefix (default from FRAME_BRIDGE_WORKSPACE or config)
        #[arg(long, short)]
        workspace: Option<String>,
    },

    /// Subscribe to the detections image topic and serve the latest frame to the browser.
    Run {
        /// Config file path (default: FRAME_BRIDGE_CONFIG_PATH or ~/.frame-bridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Workspace prefix (default from FRAME_BRIDGE_WORKSPACE or config)
        #[arg(long, short)]
        workspace: Option<String>,

        /// Rosbridge WebSocket URL (default from ROSBRIDGE_URL, config, or ws://localhost:9090)
        #[arg(long, short, value_name = "URL")]
        url: Option<String>,

        /// Viewer HTTP and WebSocket port (default from config or 8080)
        #[arg(long, short)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("frame-bridge {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Endpoint { config, workspace }) => {
            if let Err(e) = run_endpoint(config, workspace) {
                log::error!("endpoint failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Run {
            config,
            workspace,
            url,
            port,
        }) => {
            if let Err(e) = run_bridge(config, workspace, url, port).await {
                log::error!("run failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(config::default_config_path);
    let dir = frame_bridge::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

fn run_endpoint(config_path: Option<PathBuf>, workspace: Option<String>) -> anyhow::Result<()> {
    let (config, _) = config::load_config(config_path)?;
    let workspace = config::resolve_workspace(&config, workspace);
    let endpoint = ChannelEndpoint::detections_image(&workspace);
    println!("{} {}", endpoint.name(), endpoint.message_type());
    Ok(())
}

async fn run_bridge(
    config_path: Option<PathBuf>,
    workspace: Option<String>,
    url: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = config::load_config(config_path)?;
    log::debug!("using config {}", path.display());
    if let Some(p) = port {
        config.viewer.port = p;
    }
    let workspace = config::resolve_workspace(&config, workspace);
    let url = config::resolve_rosbridge_url(&config, url);

    let listener = viewer::bind_viewer(&config.viewer).await?;
    let element = Arc::new(ImageElement::new(config.viewer.element_id.clone()));
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let viewer_handle = tokio::spawn(viewer::serve_viewer(
        listener,
        element.clone(),
        async move {
            let _ = stop_rx.await;
        },
    ));

    let mut client = RosbridgeClient::connect(&url).await?;
    let mut bridge = FrameDisplayBridge::attach(
        &mut client,
        &workspace,
        element.clone(),
        SubscribeOptions::from(&config.rosbridge),
    )
    .await?;

    let shutdown = viewer::shutdown_signal();
    tokio::pin!(shutdown);

    let interrupted = tokio::select! {
        res = bridge.run(&mut client) => {
            match res {
                Ok(frames) => log::warn!(
                    "rosbridge connection ended after {} frames; viewer keeps the last frame until Ctrl+C",
                    frames
                ),
                Err(e) => log::error!(
                    "rosbridge stream failed: {}; viewer keeps the last frame until Ctrl+C",
                    e
                ),
            }
            false
        }
        _ = &mut shutdown => true,
    };

    if interrupted {
        if let Err(e) = bridge.detach(&mut client).await {
            log::debug!("unsubscribe on shutdown: {}", e);
        }
        if let Err(e) = client.close().await {
            log::debug!("closing rosbridge connection: {}", e);
        }
    } else {
        shutdown.await;
    }

    let _ = stop_tx.send(());
    viewer_handle.await??;
    Ok(())
}
