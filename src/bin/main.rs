use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use botctl::{
    cli::{Commands, LogLevelArg, parse_args},
    config::Config,
    controller::ServiceController,
    error::ManagerError,
    privilege::require_elevated,
    secret::acquire_secret,
    systemd::Systemd,
};

fn main() -> ExitCode {
    let args = parse_args();
    init_logging();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn init_logging() {
    let filter = if let Some(level) = LogLevelArg::from_env() {
        EnvFilter::new(level.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(command: Commands) -> Result<(), ManagerError> {
    if command.requires_root() {
        require_elevated(command.name())?;
    }

    let config = Config::from_process()?;
    let controller = ServiceController::new(config, Systemd::default());

    match command {
        Commands::Install => controller.install(acquire_secret)?,
        Commands::Restart => controller.restart()?,
        Commands::Stop => controller.stop()?,
        Commands::Status => controller.status(),
        Commands::Logs => controller.logs()?,
        Commands::Uninstall => {
            controller.uninstall()?;
        }
    }

    Ok(())
}
