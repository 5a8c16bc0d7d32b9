use std::io::{BufRead, Write};

use tokio_util::sync::CancellationToken;

use crate::errors::Result;
use crate::logging::{LogTarget, Logger};
use crate::prompter::prompter::Prompter;

/// Exit status after an operator-confirmed quit.
pub const EXIT_INTERRUPTED: i32 = 130;

const QUIT_QUESTION: &str = "Are you sure you would like to quit? The dome will be closed.";

/// Asks whether to quit. On yes, cancels `cancel` and runs `cleanup`.
pub fn confirm_quit<R: BufRead, W: Write>(
    prompter: &Prompter,
    reader: R,
    out: W,
    cancel: &CancellationToken,
    cleanup: &dyn Fn(),
) -> Result<bool> {
    if !prompter.confirm_with_reader(QUIT_QUESTION, reader, out)? {
        return Ok(false);
    }
    cancel.cancel();
    cleanup();
    Ok(true)
}

/// Watches for Ctrl-C on a background thread. Each interrupt asks the
/// operator to confirm; a confirmed quit cancels `cancel`, runs `cleanup`
/// and exits the process with [`EXIT_INTERRUPTED`].
pub fn install_quit_handler<F>(cancel: CancellationToken, logger: Logger, cleanup: F) -> Result<()>
where
    F: Fn() + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::Builder::new()
        .name("quit-handler".into())
        .spawn(move || {
            runtime.block_on(async move {
                let prompter = Prompter::new();
                loop {
                    if let Err(err) = tokio::signal::ctrl_c().await {
                        logger.warn(
                            format!("Interrupt handling unavailable: {err}"),
                            LogTarget::ConsoleAndFile,
                        );
                        return;
                    }
                    let stdin = std::io::stdin();
                    let answer = confirm_quit(
                        &prompter,
                        stdin.lock(),
                        std::io::stdout(),
                        &cancel,
                        &cleanup,
                    );
                    match answer {
                        Ok(true) => {
                            logger.warn("Quit confirmed by operator.", LogTarget::ConsoleAndFile);
                            std::process::exit(EXIT_INTERRUPTED);
                        }
                        Ok(false) => logger.info("Continuing.", LogTarget::ConsoleOnly),
                        Err(err) => logger.warn(
                            format!("Unable to read confirmation: {err}"),
                            LogTarget::ConsoleAndFile,
                        ),
                    }
                }
            })
        })?;
    Ok(())
}
