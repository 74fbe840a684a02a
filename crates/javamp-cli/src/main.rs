mod cli;
mod commands;

use cli::{CheckParams, TranslateParams, build_cli};

fn main() {
    let matches = build_cli().get_matches();
    if let Err(e) = setup_logger(matches.get_count("verbose")) {
        eprintln!("failed to set up logging: {e}");
    }

    let outcome = match matches.subcommand() {
        Some(("translate", m)) => commands::translate::run(TranslateParams::from_matches(m)),
        Some(("check", m)) => commands::check::run(CheckParams::from_matches(m)),
        _ => unreachable!("clap should have caught this"),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            log::error!("{e:#}");
            std::process::exit(2);
        }
    }
}

fn setup_logger(verbosity: u8) -> Result<(), fern::InitError> {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}", record.level(), message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}
