use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use nightqueue::core::cli::{CliArgs, CliCommand, USAGE};
use nightqueue::core::context::AppContext;
use nightqueue::core::shutdown::{EXIT_INTERRUPTED, install_quit_handler};
use nightqueue::errors::ExecutionError;
use nightqueue::executor::Executor;
use nightqueue::logging::LogTarget;
use nightqueue::queue;
use nightqueue::server::Server;
use nightqueue::server::clock::SystemClock;
use nightqueue::server::transport::TcpTransport;
use nightqueue::telescope::Telescope;
use nightqueue::ui::display::{render_config, render_queue};
use nightqueue::ui::table_printer::TablePrinter;

fn main() {
    let args = match CliArgs::from_env() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            std::process::exit(1);
        }
    };
    if args.command == CliCommand::Help {
        println!("{USAGE}");
        return;
    }

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run(args: CliArgs) -> Result<i32> {
    let ctx = AppContext::new_with_paths(args.config_path.clone(), args.logs_dir.clone())
        .with_context(|| {
            format!(
                "Unable to load configuration from {}",
                args.config_path.display()
            )
        })?;

    match args.command {
        CliCommand::Server { port, queue_name } => run_server(&ctx, port, queue_name.as_deref()),
        CliCommand::Execute { queue_file } => run_executor(&ctx, queue_file),
        CliCommand::List { queue_file } => list_queue(&ctx, queue_file),
        CliCommand::Config => {
            render_config(&TablePrinter::for_terminal(), &ctx.config, &mut io::stdout())?;
            Ok(0)
        }
        CliCommand::Help => Ok(0),
    }
}

fn run_server(ctx: &AppContext, port: Option<u16>, queue_name: Option<&str>) -> Result<i32> {
    let logger = ctx.logger.component("SERVER");
    let cancel = CancellationToken::new();
    install_quit_handler(cancel.clone(), logger.clone(), || {})?;

    let queue_file = ctx.server_queue(queue_name, Utc::now())?;
    let mut server = Server::from_config(&ctx.config, queue_file, Box::new(SystemClock), logger.clone())
        .context("Unable to start the queue server")?;

    let port = port.unwrap_or(ctx.config.server_port());
    let mut transport = TcpTransport::bind(port, cancel.clone())
        .with_context(|| format!("Unable to listen on port {port}"))?;
    logger.info(
        format!("Listening on {}.", transport.local_addr()?),
        LogTarget::ConsoleAndFile,
    );

    server.start(&mut transport, &cancel)?;
    Ok(0)
}

fn run_executor(ctx: &AppContext, queue_file: Option<PathBuf>) -> Result<i32> {
    let logger = ctx.logger.component("EXECUTOR");
    let path = match queue_file {
        Some(path) => path,
        None => ctx.observing_queue(Utc::now())?.path(),
    };
    let telescope = Arc::new(Telescope::from_config(
        &ctx.config,
        ctx.logger.component("TELESCOPE"),
    ));

    let cancel = CancellationToken::new();
    let mut executor = Executor::new(telescope, logger.clone(), cancel.clone());
    executor
        .load_queue(&path, ctx.session_defaults())
        .with_context(|| format!("Unable to load queue {}", path.display()))?;
    install_quit_handler(cancel, logger.clone(), executor.cleanup_hook())?;

    match executor.run() {
        Ok(_) => Ok(0),
        Err(ExecutionError::Cancelled { .. }) => Ok(EXIT_INTERRUPTED),
        Err(err) => {
            logger.error(format!("{err}"), LogTarget::ConsoleAndFile);
            Ok(1)
        }
    }
}

fn list_queue(ctx: &AppContext, queue_file: Option<PathBuf>) -> Result<i32> {
    let path = match queue_file {
        Some(path) => path,
        None => ctx.admission_queue(Utc::now())?.path(),
    };
    let entries = queue::load(&path).with_context(|| format!("Unable to read {}", path.display()))?;
    let title = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    render_queue(&TablePrinter::for_terminal(), &title, &entries, &mut io::stdout())?;
    Ok(0)
}
