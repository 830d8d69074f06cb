use std::env;
use std::io;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use ursula_logcheck_cli::{
    parse_args, run, usage_text, CliCommand, CONFIG_ENV_VAR, USAGE_EXIT_CODE,
};

fn main() -> ExitCode {
    init_tracing();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let env_config = env::var(CONFIG_ENV_VAR).ok();
    let command = match parse_args(&args, env_config.as_deref()) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}\n\n{}", usage_text());
            return ExitCode::from(USAGE_EXIT_CODE);
        }
    };

    match command {
        CliCommand::Help => {
            println!("{}", usage_text());
            ExitCode::SUCCESS
        }
        CliCommand::Run { options, kind } => match run(&options, &kind, &mut io::stdout()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(failure) => {
                eprintln!("{}", failure.message);
                ExitCode::from(failure.exit_code)
            }
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}
