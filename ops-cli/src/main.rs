use clap::Parser;
use ops_cli::{render_error, run, Cli, EXIT_ERROR};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let json = cli.json;
    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            if json {
                println!("{}", render_error(&e, true));
            } else {
                eprintln!("{}", render_error(&e, false));
            }
            ExitCode::from(EXIT_ERROR)
        }
    }
}
