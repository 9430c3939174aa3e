use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use initsvc::supervisor::{self, ChildProgram};
use initsvc::{service, InitKind, InitSystem, Logger, ServiceStatus};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = args[1].as_str();
    if matches!(command, "help" | "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let Some(file) = args.get(2) else {
        eprintln!("Error: {} requires a service description file", command);
        print_usage();
        std::process::exit(1);
    };

    let description = service::load(Path::new(file))
        .with_context(|| format!("Failed to load service description {}", file))?;

    let kind = InitKind::detect().context("No supported init system found on this host")?;
    let svc = kind.create(description);

    match command {
        "install" => {
            require_root(command);
            svc.install()?;
            println!("✓ Installed {} ({})", svc.display(), kind.name());
        }
        "uninstall" => {
            require_root(command);
            svc.uninstall()?;
            println!("✓ Uninstalled {}", svc.display());
        }
        "start" => svc.start()?,
        "stop" => svc.stop()?,
        "restart" => svc.restart()?,
        "status" => print_status(svc.as_ref())?,
        "run" => run(svc.as_ref())?,
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}

fn require_root(command: &str) {
    if !nix::unistd::Uid::effective().is_root() {
        eprintln!("Error: initsvc {} must be run as root (use sudo)", command);
        std::process::exit(1);
    }
}

fn print_status(svc: &dyn InitSystem) -> Result<()> {
    let status = match svc.status()? {
        ServiceStatus::NotInstalled => "not installed",
        ServiceStatus::Stopped => "stopped",
        ServiceStatus::Running => "running",
    };
    println!("{}: {}", svc.display(), status);
    Ok(())
}

fn run(svc: &dyn InitSystem) -> Result<()> {
    let shutdown = supervisor::shutdown_on_signal()?;
    let mut program = ChildProgram::for_service(svc)?;

    if let Err(e) = svc.run(&mut program, shutdown) {
        svc.logger().report(&e);
        bail!("{} stopped with an error", svc.display());
    }

    Ok(())
}

fn print_usage() {
    println!(
        r#"initsvc - Run a program as a system service

Usage:
    initsvc install <description>    Install the service definition (root)
    initsvc uninstall <description>  Remove the service definition (root)
    initsvc start <description>      Start the installed service
    initsvc stop <description>       Stop the running service
    initsvc restart <description>    Stop, then start the service
    initsvc status <description>     Show whether the service is running
    initsvc run <description>        Run the program in the foreground until signalled
    initsvc help                     Show this help message

The description is a YAML, JSON, or TOML file:

    name: webhook
    display_name: Webhook relay
    executable: /usr/local/bin/webhook
    arguments: ["--port", "8080"]
    user_name: relay
"#
    );
}
