use clap::Parser;
use color_eyre::Result;
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::time::Duration;
use vintui::{App, AppConfig, AppEvent, Theme, APP_NAME};

#[derive(Parser, Debug)]
#[command(version, about = "Interactive wine quality dashboard")]
struct Args {
    /// CSV file with wine_type, quality, and physiochemical columns
    path: PathBuf,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    debug: bool,
}

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, args: &Args, config: &AppConfig) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    let theme = Theme::from_config(&config.theme)?;
    let mut app = App::new_with_theme(tx.clone(), theme);
    if args.debug {
        app.enable_debug();
    }
    render(&mut terminal, &mut app)?;
    tx.send(AppEvent::Open(args.path.clone()))?;

    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);
    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    color_eyre::install()?;

    let config = AppConfig::load(APP_NAME)?;

    let terminal = ratatui::init();
    let result = run(terminal, &args, &config);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
