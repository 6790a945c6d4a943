use std::fs::File;
use std::io::{self, stdout, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use ratatui::{backend::CrosstermBackend, Terminal};
use simplelog::{Config, LevelFilter, WriteLogger};

use pagerat::event_source::KeyboardEventSource;
use pagerat::panic_handler::initialize_panic_handler;
use pagerat::settings::{Settings, APP_NAME};
use pagerat::system_command::RealSystemCommandExecutor;
use pagerat::terminal_guard::TerminalSession;
use pagerat::{run_app_with_event_source, App, Book, Navigator, Viewport};

#[derive(Parser)]
#[command(name = "pagerat")]
#[command(version, about = "Terminal pager for EPUB books", long_about = None)]
#[command(after_help = "EXAMPLES:
    pagerat book.epub            Browse the book
    pagerat -d -c 72 book.epub   Print the whole book wrapped at 72 columns")]
struct Cli {
    /// EPUB file to open
    #[arg(value_name = "BOOK")]
    book: PathBuf,

    /// Print the contents of the book to stdout instead of browsing it
    #[arg(short, long)]
    dump: bool,

    /// Wrap text at this many columns
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    cols: Option<u16>,

    /// Hide the status line in the chapter view
    #[arg(short = 'I', long)]
    no_info: bool,

    /// Read settings from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

fn log_path() -> PathBuf {
    match dirs::cache_dir() {
        Some(dir) => {
            let dir = dir.join(APP_NAME);
            if std::fs::create_dir_all(&dir).is_ok() {
                return dir.join("pagerat.log");
            }
            PathBuf::from("pagerat.log")
        }
        None => PathBuf::from("pagerat.log"),
    }
}

fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let path = log_path();
    match File::create(&path) {
        Ok(file) => {
            // A second init only happens if something else grabbed the logger.
            let _ = WriteLogger::init(level, Config::default(), file);
        }
        Err(e) => eprintln!("pagerat: cannot write log file {}: {e}", path.display()),
    }
}

fn dump(book: &Book, columns: Option<usize>) -> Result<()> {
    let stdout = stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    match book.dump(&mut out, columns).and_then(|()| out.flush()) {
        Ok(()) => Ok(()),
        // `pagerat -d book.epub | head` closes the pipe early.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn browse(book: Book, settings: &Settings, columns: Option<usize>, show_status: bool) -> Result<()> {
    initialize_panic_handler();
    let _session = TerminalSession::enter()?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    let size = terminal.size()?;
    let viewport = Viewport {
        width: size.width,
        height: size.height,
    };

    let navigator = Navigator::new(book, viewport, columns, show_status);
    let executor =
        RealSystemCommandExecutor::new(settings.editor_command(), settings.image_viewer.clone());
    let mut app = App::new(navigator, Box::new(executor));
    let mut event_source = KeyboardEventSource;

    run_app_with_event_source(&mut terminal, &mut app, &mut event_source)
}

fn open_book(path: &Path) -> std::result::Result<Book, String> {
    Book::open(path).map_err(|e| format!("cannot open {}: {e}", path.display()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);
    info!("Starting pagerat on {}", cli.book.display());

    let settings = Settings::load(cli.config.as_deref());
    let book = match open_book(&cli.book) {
        Ok(book) => book,
        Err(message) => {
            error!("{message}");
            eprintln!("pagerat: {message}");
            return ExitCode::FAILURE;
        }
    };

    let columns = cli.cols.map(usize::from).or(settings.columns);
    let result = if cli.dump {
        dump(&book, columns)
    } else {
        browse(book, &settings, columns, settings.show_status && !cli.no_info)
    };

    match result {
        Ok(()) => {
            info!("Shutting down pagerat");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Application error: {e:?}");
            eprintln!("pagerat: {e}");
            ExitCode::FAILURE
        }
    }
}
