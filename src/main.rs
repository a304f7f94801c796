// Respawn: a game-themed teaching language, run in the terminal

use std::fs;
use std::io;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use respawn::config::{Config, INPUT_ENV};
use respawn::host::StdioHost;
use respawn::logging::init_tracing;
use respawn::pipeline;
use respawn::ui::App;

fn print_usage(program_name: &str) {
    eprintln!("Usage: {} <file.rsp> [--plain] [--check] [--tokens]", program_name);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --plain    run on stdin/stdout instead of the terminal UI");
    eprintln!("  --check    stop after checking the program");
    eprintln!("  --tokens   print the token stream");
    eprintln!();
    eprintln!(
        "In plain mode, {} may hold ';'-separated lines answered before stdin.",
        INPUT_ENV
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let program_name = std::env::args()
        .next()
        .unwrap_or_else(|| String::from("respawn"));

    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config.with_env_input(),
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage(&program_name);
            std::process::exit(1);
        }
    };

    if !config.file.exists() {
        eprintln!("Error: File '{}' not found", config.file.display());
        print_usage(&program_name);
        std::process::exit(1);
    }

    let source = fs::read_to_string(&config.file)?;

    if config.print_tokens {
        let output = pipeline::analyze(&source);
        for token in &output.tokens {
            println!("{}", token);
        }
        for diagnostic in &output.diagnostics {
            eprintln!("{}", diagnostic);
        }
        if !output.is_clean() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let program = match pipeline::parse(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}", e.render(&source));
            std::process::exit(1);
        }
    };

    if config.check_only {
        eprintln!("{}: no errors found", config.file.display());
        return Ok(());
    }

    if config.plain {
        let stdin = io::stdin();
        let mut host = StdioHost::new(config.scripted_input, stdin.lock(), io::stdout());
        if let Err(e) = pipeline::run(&program, &mut host, None) {
            eprintln!("{}", e.render(&source));
            std::process::exit(1);
        }
        return Ok(());
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(source, program);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
