use blobget_core::logging;

mod cli;

fn main() {
    // Initialize logging as early as possible; fall back to stderr if the state dir is unusable.
    if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {:#}", e);
    }

    if let Err(err) = cli::run_from_args() {
        eprintln!("blobget error: {:#}", err);
        std::process::exit(1);
    }
}
