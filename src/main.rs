use booking_lifecycle::config::{CliConfig, Command, TomlConfig};
use booking_lifecycle::utils::error::ErrorSeverity;
use booking_lifecycle::utils::{logger, validation::Validate};
use booking_lifecycle::{
    BookingId, BookingLifecycleService, BookingRepository, BookingStatus, ConfigProvider,
    LifecycleError, Result, SqliteBookingRepository,
};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if config.json_logs() {
        logger::init_json_logger(config.logging.verbose);
    } else {
        logger::init_cli_logger(config.logging.verbose);
    }
    tracing::debug!("Resolved config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!(
            "Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(command: Command, config: &TomlConfig) -> Result<()> {
    let open_store = || {
        tracing::debug!("Opening booking store at {}", config.database_path());
        SqliteBookingRepository::open(config.database_path())
    };

    match command {
        Command::Transitions { status } => print_transitions(status),
        Command::Init => {
            open_store()?;
            println!("✅ Booking store ready at {}", config.database_path());
        }
        Command::Create {
            customer,
            worker,
            service,
        } => {
            let booking = open_store()?.create(customer, worker, service).await?;
            tracing::info!("Created booking {}", booking.id);
            println!("{}", serde_json::to_string_pretty(&booking)?);
        }
        Command::Show { id } => {
            let booking_id = BookingId(id);
            let booking = open_store()?
                .get_by_id(booking_id)
                .await?
                .ok_or(LifecycleError::NotFound { booking_id })?;
            println!("{}", serde_json::to_string_pretty(&booking)?);
        }
        Command::Status { id, status } => {
            let service = BookingLifecycleService::from_config(open_store()?, config);
            let change = service.change_status(BookingId(id), status).await?;
            println!("{}", serde_json::to_string_pretty(&change)?);
        }
    }

    Ok(())
}

fn print_transitions(status: Option<BookingStatus>) {
    let statuses = match status {
        Some(status) => vec![status],
        None => BookingStatus::ALL.to_vec(),
    };

    for from in statuses {
        let targets = from
            .allowed_targets()
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        if targets.is_empty() {
            println!("{:<12} (terminal)", from.as_str());
        } else {
            println!("{:<12} -> {}", from.as_str(), targets.join(", "));
        }
    }
}
