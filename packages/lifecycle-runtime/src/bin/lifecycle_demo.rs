//! Drives a small set of simulated services through their whole lifecycle and
//! prints a JSON status report after each phase.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use lifecycle_core::{LifecycleOperation, ServiceSupport, StatefulService};
use lifecycle_runtime::simulated::{CompositeHooks, Journal, SimulatedHooks};
use lifecycle_runtime::{telemetry, LogFormat, RuntimeConfig, ServiceRegistry};
use parking_lot::Mutex;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "lifecycle-demo", about = "Run simulated services through start, suspend, resume, and shutdown")]
struct Args {
    /// JSON configuration file.
    #[arg(long, env = "LIFECYCLE_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format. Overrides the configuration file.
    #[arg(long, value_enum, env = "LIFECYCLE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log filter directive. Overrides the configuration file.
    #[arg(long, env = "LIFECYCLE_LOG_FILTER")]
    log_filter: Option<String>,

    /// Make the named service fail to start. Repeatable.
    #[arg(long = "fail-start", value_name = "NAME")]
    fail_start: Vec<String>,

    /// Simulated blocking time of every hook, in milliseconds.
    #[arg(long, default_value_t = 0)]
    hook_delay_ms: u64,

    /// Time to stay running before shutting down, in milliseconds.
    #[arg(long, default_value_t = 0)]
    hold_ms: u64,

    /// Stay running until Ctrl-C instead of `--hold-ms`.
    #[arg(long)]
    until_signal: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::default(),
    };
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }
    if let Some(filter) = &args.log_filter {
        config.logging.filter.clone_from(filter);
    }
    telemetry::init_tracing(&config.logging)?;

    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let registry = Arc::new(build_registry(&args, &config, &journal)?);
    info!(services = ?registry.names(), "registry built");

    // Hooks block, so lifecycle calls run on the blocking pool.
    let started = run_blocking(&registry, |r| r.start_all()).await?;
    print_report("started", &registry)?;
    if let Err(err) = started {
        warn!(error = ?err, "start failed, shutting down");
        run_blocking(&registry, |r| r.shutdown_all()).await??;
        print_report("shutdown", &registry)?;
        return Err(err.into());
    }

    run_blocking(&registry, |r| r.suspend_all()).await??;
    print_report("suspended", &registry)?;

    run_blocking(&registry, |r| r.resume_all()).await??;
    print_report("resumed", &registry)?;

    if args.until_signal {
        info!("running until Ctrl-C");
        tokio::signal::ctrl_c().await?;
    } else if args.hold_ms > 0 {
        tokio::time::sleep(Duration::from_millis(args.hold_ms)).await;
    }

    run_blocking(&registry, |r| r.shutdown_all()).await??;
    print_report("shutdown", &registry)?;

    info!(hook_calls = journal.lock().len(), "demo finished");
    Ok(())
}

/// Registers a connection pool, a timer, and a route composed of a consumer
/// and a producer.
fn build_registry(
    args: &Args,
    config: &RuntimeConfig,
    journal: &Journal,
) -> anyhow::Result<ServiceRegistry> {
    let delay = Duration::from_millis(args.hook_delay_ms);
    let simulated = |name: &str| {
        let hooks = SimulatedHooks::new(name, Arc::clone(journal)).with_delay(delay);
        if args.fail_start.iter().any(|n| n == name) {
            hooks.fail_on(LifecycleOperation::Start);
        }
        hooks
    };

    let registry = ServiceRegistry::with_config(config.registry.clone());
    registry.register(simulated("connection-pool").into_service())?;
    registry.register(simulated("timer").suspendable().into_service())?;

    let consumer: Arc<dyn StatefulService> =
        Arc::new(simulated("route-consumer").suspendable().into_service());
    let producer: Arc<dyn StatefulService> = Arc::new(simulated("route-producer").into_service());
    registry.register(ServiceSupport::new(
        "route",
        CompositeHooks::new(vec![consumer, producer]),
    ))?;

    Ok(registry)
}

async fn run_blocking<T, F>(registry: &Arc<ServiceRegistry>, f: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&ServiceRegistry) -> T + Send + 'static,
{
    let registry = Arc::clone(registry);
    Ok(tokio::task::spawn_blocking(move || f(&registry)).await?)
}

fn print_report(phase: &str, registry: &ServiceRegistry) -> anyhow::Result<()> {
    let report = serde_json::json!({
        "phase": phase,
        "services": registry.report(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
