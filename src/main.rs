// ============================================================================
// iodash - Tableau de bord des récompenses IO
// ============================================================================
// Programme TUI : récompenses horaires par processeur (en USD), nombre de
// devices, prix du token, annonces et calculateur de ROI.
//
// ARCHITECTURE :
// 1. Event loop (thread principal) : render → résultats → input
// 2. Worker thread : exécute les Command async (HTTP) via block_on
// 3. Tâches périodiques (tokio) : envoient des Trigger à l'event loop
// 4. Channels mpsc entre les trois
// ============================================================================

use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use iodash::api::FeedClient;
use iodash::app::App;
use iodash::config::Config;
use iodash::models::Selection;
use iodash::scheduler::{PeriodicTask, Trigger};
use iodash::ui::{events::EventHandler, render};
use iodash::worker::{spawn_worker, Command, Outcome, Worker};

// ============================================================================
// Logging
// ============================================================================
// Les logs vont dans un fichier (le terminal est occupé par la TUI).
//
// # Contrôler le niveau de log
// RUST_LOG=debug iodash
// RUST_LOG=iodash=trace iodash
// ============================================================================

fn init_logging(log_dir: &Path) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    // Rotation quotidienne : iodash.log.2024-06-03
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "iodash.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour iodash, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iodash=debug,info".into()),
        )
        .init();

    info!(log_dir = %log_dir.display(), "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let config = Config::load()?;

    init_logging(&config.logging.directory).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });
    info!("iodash starting up");

    // Runtime tokio partagé par le worker et les tâches périodiques
    let runtime = tokio::runtime::Runtime::new()?;

    let client = FeedClient::new(config.feeds.clone())?;
    let worker = Worker::new(client, &config.refresh);

    let (command_tx, command_rx) = mpsc::channel::<Command>();
    let (result_tx, result_rx) = mpsc::channel::<Outcome>();
    let (trigger_tx, trigger_rx) = mpsc::channel::<Trigger>();

    info!("Spawning background worker thread");
    spawn_worker(runtime.handle().clone(), worker, command_rx, result_tx)?;

    // CONCEPT RUST : RAII
    // - les tâches vivent tant que leur handle existe
    // - elles sont annulées à la fin de main(), avant le runtime
    let tasks = [
        (Trigger::RefreshData, "data-refresh", config.refresh.data_refresh()),
        (Trigger::SweepCache, "cache-sweep", config.refresh.cache_evict()),
        (Trigger::RefreshPrice, "price-refresh", config.refresh.price_refresh()),
    ]
    .map(|(trigger, name, period)| {
        let tx = trigger_tx.clone();
        PeriodicTask::start(runtime.handle(), name, period, move || tx.send(trigger).is_ok())
    });

    let selection = Selection::new(config.display.chart_kind(), &config.display.processors);
    let mut app = App::new(selection);

    // Chargements initiaux
    let initial = [
        app.request_series(false),
        Command::RefreshSpotPrice,
        Command::LoadAnnouncements,
        Command::LoadRoiInputs,
    ];
    for command in initial {
        dispatch(&command_tx, command);
    }

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;
    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &command_tx, &result_rx, &trigger_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    drop(tasks);
    drop(command_tx);
    runtime.shutdown_timeout(Duration::from_millis(500));

    result
}

/// Transmet une commande au worker
fn dispatch(command_tx: &mpsc::Sender<Command>, command: Command) {
    if command_tx.send(command).is_err() {
        error!("Worker thread disconnected, command dropped");
    }
}

// ============================================================================
// Event loop
// ============================================================================

/// Exécute la boucle principale de l'application
///
/// L'App n'est possédée que par ce thread : le worker et les tâches
/// périodiques ne communiquent que par channels.
fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    command_tx: &mpsc::Sender<Command>,
    result_rx: &mpsc::Receiver<Outcome>,
    trigger_rx: &mpsc::Receiver<Trigger>,
) -> Result<()> {
    while app.is_running() {
        // ========================================
        // 1. RENDER
        // ========================================
        terminal.draw(|frame| render(frame, app))?;

        // ========================================
        // 2. RÉSULTATS du worker et des tâches périodiques
        // ========================================
        // CONCEPT : try_iter() vide le channel sans bloquer
        for outcome in result_rx.try_iter() {
            if !app.apply(outcome) {
                debug!("Outcome ignored");
            }
        }

        for trigger in trigger_rx.try_iter() {
            debug!(?trigger, "Periodic trigger");
            let command = app.on_trigger(trigger);
            dispatch(command_tx, command);
        }

        // ========================================
        // 3. INPUT
        // ========================================
        match events.next() {
            Ok(event) => handle_event(app, event, command_tx),
            Err(e) => warn!(error = %e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
///
/// CONCEPT RUST : Pattern matching avec guards
/// - chaque bras combine la touche et l'écran courant
/// - l'ordre des bras compte : le premier qui correspond gagne
fn handle_event(app: &mut App, event: iodash::ui::events::Event, command_tx: &mpsc::Sender<Command>) {
    use iodash::ui::events::{
        get_char_from_event, is_backspace_event, is_cycle_range_event, is_down_event, is_enter_event,
        is_escape_event, is_next_announcement_event, is_picker_event, is_previous_announcement_event,
        is_price_char_event, is_quit_event, is_refresh_event, is_roi_event, is_space_event,
        is_toggle_chart_event, is_unit_event, is_up_event, Event,
    };

    match event {
        Event::Key(_) if is_quit_event(&event) => {
            // Two-step quit : première pression → confirmation
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        // ESC : retour au dashboard depuis les autres écrans
        Event::Key(_) if is_escape_event(&event) && !app.is_on_dashboard() => {
            app.cancel_quit();
            debug!("User returned to dashboard");
            app.show_dashboard();
        }

        // ========================================
        // Dashboard
        // ========================================
        Event::Key(_) if is_toggle_chart_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            let command = app.toggle_chart();
            dispatch(command_tx, command);
        }

        Event::Key(_) if is_cycle_range_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            let command = app.cycle_range();
            dispatch(command_tx, command);
        }

        Event::Key(_) if is_refresh_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            info!("User requested refresh");
            let command = app.request_series(true);
            dispatch(command_tx, command);
        }

        Event::Key(_) if is_picker_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            app.show_picker();
        }

        Event::Key(_) if is_roi_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            let command = app.show_roi();
            dispatch(command_tx, command);
        }

        Event::Key(_) if is_next_announcement_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            app.next_announcement();
        }

        Event::Key(_) if is_previous_announcement_event(&event) && app.is_on_dashboard() => {
            app.cancel_quit();
            app.previous_announcement();
        }

        // ========================================
        // Sélection des processeurs
        // ========================================
        Event::Key(_) if is_up_event(&event) && app.is_on_picker() => {
            app.cancel_quit();
            app.picker_up();
        }

        Event::Key(_) if is_down_event(&event) && app.is_on_picker() => {
            app.cancel_quit();
            app.picker_down();
        }

        Event::Key(_) if (is_space_event(&event) || is_enter_event(&event)) && app.is_on_picker() => {
            app.cancel_quit();
            app.toggle_picked();
        }

        // ========================================
        // Calculateur de ROI
        // ========================================
        Event::Key(_) if is_up_event(&event) && app.is_on_roi() => {
            app.cancel_quit();
            app.roi_up();
        }

        Event::Key(_) if is_down_event(&event) && app.is_on_roi() => {
            app.cancel_quit();
            app.roi_down();
        }

        Event::Key(_) if is_price_char_event(&event) && app.is_on_roi() => {
            app.cancel_quit();
            if let Some(c) = get_char_from_event(&event) {
                app.roi_append(c);
            }
        }

        Event::Key(_) if is_backspace_event(&event) && app.is_on_roi() => {
            app.roi_backspace();
        }

        Event::Key(_) if is_unit_event(&event) && app.is_on_roi() => {
            app.cancel_quit();
            app.roi_next_unit();
        }

        Event::Key(_) if is_enter_event(&event) && app.is_on_roi() => {
            app.cancel_quit();
            app.calculate_roi();
        }

        Event::Tick => {}

        Event::Key(_) => {
            // Toute autre touche : annule la confirmation de quit
            app.cancel_quit();
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : toujours restaurer le terminal avant de quitter
// ============================================================================

/// Configure le terminal en mode TUI (raw mode + alternate screen)
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
