mod aggregate;
mod api;
mod cli;
mod editor;
mod error;
mod export;
mod filter;
mod fmt;
mod models;
mod pager;
mod pdf;
mod settings;
mod status;
mod view;
mod xlsx;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List { filter, view, sort } => cli::list::run(filter, view, sort),
        Commands::Add {
            cantidad,
            tipo_pago,
            fecha,
            descripcion,
        } => cli::add::simple(cantidad, tipo_pago, fecha, descripcion),
        Commands::AddMsi {
            monto_compra,
            meses,
            tipo_pago,
            descripcion,
            inicio_pagos,
        } => cli::add::installment(monto_compra, meses, tipo_pago, descripcion, inicio_pagos),
        Commands::Delete { id, yes } => cli::delete::run(&id, yes),
        Commands::Export {
            format,
            filter,
            search,
            sort,
            output_dir,
        } => cli::export::run(format, filter, search, sort, output_dir),
        Commands::Tipos => cli::tipos::run(),
        Commands::Config {
            base_url,
            export_dir,
            page_size,
        } => cli::config::run(base_url, export_dir, page_size),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "gastos", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.kind().exit_code());
    }
}
