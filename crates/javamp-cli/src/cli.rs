//! Command-line definition and argument extraction.

#[cfg(test)]
mod cli_tests;

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

pub fn build_cli() -> Command {
    Command::new("javamp")
        .about("Translates pragma-annotated Java into standalone fork/join code")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .subcommand(
            Command::new("translate")
                .about("Rewrite annotated units and emit the translated source")
                .arg(files_arg())
                .arg(
                    Arg::new("out-dir")
                        .short('o')
                        .long("out-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write translated files here instead of stdout"),
                )
                .arg(
                    Arg::new("threads")
                        .long("threads")
                        .value_parser(value_parser!(u32).range(1..))
                        .help("Default team size for pragmas without threadNum"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Analyze units and report directives without rewriting")
                .arg(files_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["text", "json"])
                        .default_value("text")
                        .help("Report format"),
                ),
        )
}

fn files_arg() -> Arg {
    Arg::new("files")
        .required(true)
        .num_args(1..)
        .value_parser(value_parser!(PathBuf))
        .help("Java source files to process")
}

fn files_of(matches: &ArgMatches) -> Vec<PathBuf> {
    matches
        .get_many::<PathBuf>("files")
        .map(|files| files.cloned().collect())
        .unwrap_or_default()
}

#[derive(Debug)]
pub struct TranslateParams {
    pub files: Vec<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub threads: Option<u32>,
}

impl TranslateParams {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            files: files_of(matches),
            out_dir: matches.get_one::<PathBuf>("out-dir").cloned(),
            threads: matches.get_one::<u32>("threads").copied(),
        }
    }
}

#[derive(Debug)]
pub struct CheckParams {
    pub files: Vec<PathBuf>,
    pub json: bool,
}

impl CheckParams {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            files: files_of(matches),
            json: matches
                .get_one::<String>("format")
                .is_some_and(|f| f == "json"),
        }
    }
}
