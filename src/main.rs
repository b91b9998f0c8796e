//! Swift Storage Agent
//!
//! Hook entry point for a storage node. The deployment framework invokes
//! the binary once per lifecycle event (`swift-storage-agent <hook-name>`)
//! with the invocation context supplied as JSON. Exit status follows the
//! event disposition: benign outcomes (waiting on the proxy, unknown hook
//! names) exit 0, everything else exits non-zero.
//!
//! Logs go to stderr; stdout is reserved for the advertised relation
//! payload when no `--relation-out` path is given.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use swift_storage_agent::{
    AgentPaths, AptPackageInstaller, FileRelationStore, Hook, HookContext, HookDispatcher,
    HttpRingFetcher, NrpeMonitorRegistrar, ProcAddressResolver, Result, ScannerConfig,
    ServiceManagerRef, SwiftConfigWriter, SysfsDeviceScanner, SystemdServiceManager,
    XfsStoragePreparer, DEFAULT_NRPE_DIR,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Swift Storage Agent - drives one node lifecycle hook per invocation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Hook name the framework invoked (install, config-changed, ...)
    hook: String,

    /// Path to the JSON invocation context; absent means empty context
    #[arg(long, env = "SWIFT_AGENT_CONTEXT")]
    context: Option<PathBuf>,

    /// Where the advertised relation payload is written; stdout when absent
    #[arg(long, env = "SWIFT_AGENT_RELATION_OUT")]
    relation_out: Option<PathBuf>,

    /// Swift configuration directory
    #[arg(long, env = "SWIFT_AGENT_CONF_DIR", default_value = "/etc/swift")]
    conf_dir: PathBuf,

    /// Storage mount root
    #[arg(long, env = "SWIFT_AGENT_NODE_DIR", default_value = "/srv/node")]
    node_dir: PathBuf,

    /// Operator drop-in scripts run before package installation
    #[arg(
        long,
        env = "SWIFT_AGENT_PREINSTALL_DIR",
        default_value = "/etc/swift-storage/preinstall.d"
    )]
    preinstall_dir: PathBuf,

    /// Sysfs root for block-device enumeration
    #[arg(long, env = "SWIFT_AGENT_SYSFS_ROOT", default_value = "/sys")]
    sysfs_root: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    if let Err(e) = run(args).await {
        if e.is_benign() {
            info!("{}", e);
        } else {
            error!("{}", e);
        }
        return ExitCode::from(e.exit_code() as u8);
    }

    ExitCode::SUCCESS
}

async fn run(args: Args) -> Result<()> {
    let hook = Hook::parse(&args.hook)?;
    let context = HookContext::load(args.context.as_deref())?;

    info!("Starting swift-storage-agent");
    info!("  Version: {}", swift_storage_agent::VERSION);
    info!("  Hook: {}", hook);
    info!("  Conf dir: {}", args.conf_dir.display());
    info!("  Node dir: {}", args.node_dir.display());

    let paths = AgentPaths {
        conf_dir: args.conf_dir.clone(),
        node_dir: args.node_dir.clone(),
        preinstall_dir: args.preinstall_dir.clone(),
    };

    // Host adapters behind the domain ports
    let scanner = SysfsDeviceScanner::new(ScannerConfig {
        sysfs_path: args.sysfs_root.clone(),
        ..ScannerConfig::default()
    });
    let services: ServiceManagerRef = Arc::new(SystemdServiceManager::new());
    let writer = SwiftConfigWriter::new(
        args.conf_dir.clone(),
        args.node_dir.clone(),
        context.config.clone(),
        context.relation.clone(),
    );
    let monitors = NrpeMonitorRegistrar::new(PathBuf::from(DEFAULT_NRPE_DIR), services.clone());

    let dispatcher = HookDispatcher::new(
        context,
        paths,
        Arc::new(scanner),
        Arc::new(AptPackageInstaller::new()),
        services,
        Arc::new(writer),
        Arc::new(HttpRingFetcher::new()?),
        Arc::new(FileRelationStore::new(args.relation_out.clone())),
        Arc::new(ProcAddressResolver::new()),
        Arc::new(monitors),
        Arc::new(XfsStoragePreparer::new(args.node_dir.clone())),
    );

    dispatcher.run(hook).await
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap());

    // Logs stay on stderr; stdout carries the relation payload
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
