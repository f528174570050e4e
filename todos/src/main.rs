use clap::Parser;
use tokio::time::sleep;
use tracing::info;

use todos::app_state::AppState;
use todos::http::setup_http_server;
use todos::init_telemetry::{init_telemetry_and_tracing, traces_enabled};
use todos::scheduler::setup_sweeper;

#[derive(Parser)]
#[command(name = "todos")]
#[command(about = "Multi-tenant to-do list service")]
#[clap(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser)]
enum Commands {
    /// Show current configuration and exit
    Config,
    /// Start the server (default)
    Run,
}

/// `.env.local` overrides `.env`, both are optional.
fn load_dotenv() {
    for file in [".env.local", ".env"] {
        if let Ok(path) = dotenvy::from_filename(file) {
            eprintln!("Loaded environment from {}", path.display());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    match cli.command.as_ref().unwrap_or(&Commands::Run) {
        Commands::Config => {
            let settings = AppState::new_for_config_only()?;
            println!("{:#?}", &settings);
            return Ok(());
        }
        Commands::Run => {}
    }

    let mut handles = vec![];

    let app_state = AppState::new().await?;
    init_telemetry_and_tracing(&app_state.settings.telemetry, app_state.settings.debug)?;
    info!(
        "Starting todos in {} mode",
        app_state.settings.run_mode.as_str()
    );

    {
        let handle = setup_http_server(
            app_state.clone(),
            &app_state.settings.api.listen_address(),
            traces_enabled(&app_state.settings.telemetry),
        )
        .await?;
        handles.push(handle);
    }

    {
        let handle = setup_sweeper(app_state.clone()).await?;
        handles.push(handle);
    }

    sleep(std::time::Duration::from_millis(100)).await;

    loop {
        handles.retain(|handle| !handle.is_finished());

        if handles.is_empty() {
            info!("All tasks are done");
            break;
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
    }

    Ok(())
}
