//! pngx - a command-line client for Paperless-NGX
//!
//! Uploads batches of documents, resolving tag, correspondent, document type,
//! owner and group names to server IDs (creating missing entities on demand)
//! and deriving titles and creation dates from file names.
//!
//! # Modules
//!
//! * [`api`]: the [`api::PaperlessApi`] boundary with HTTP and in-memory backends
//! * [`resolver`]: cached name → ID resolution
//! * [`upload`]: file name metadata and the batch upload orchestrator
//! * [`session`]: scoped connection holding the resolvers
//! * [`dry_run`]: record of actions a dry run would have performed

pub mod api;
pub mod cli;
pub mod config;
pub mod dry_run;
pub mod error;
pub mod listing;
pub mod logging;
pub mod progress;
pub mod resolver;
pub mod session;
pub mod upload;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::EntityKind;
use crate::cli::{Cli, Commands, ListArgs, ListCommand};
use crate::config::Config;
use crate::error::{ExitCode, PngxError};
use crate::listing::{format_listing, ListFormat};
use crate::progress::Progress;
use crate::session::{ConnectionSettings, Session};
use crate::upload::{BatchReport, UploadRequest, Uploader};

/// Run the application logic for a parsed command line.
///
/// Individual upload failures are logged and do not fail the command; an
/// error is returned only when the command as a whole could not run.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.merge_cli(&cli);

    let verbose = logging::effective_verbosity(cli.verbose, config.dry_run);
    logging::init_logging(verbose, cli.quiet, cli.no_color);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match &cli.command {
        Commands::Upload(args) => {
            config.merge_upload_args(args);
            let request = config.upload_request();
            let show_progress = !cli.quiet && verbose == 0 && std::io::stderr().is_terminal();

            let report = runtime.block_on(upload_files(
                &config.connection(),
                &args.files,
                &request,
                show_progress,
            ))?;
            log::info!(
                "{} of {} file(s) uploaded, {} failed",
                report.uploaded() + report.planned(),
                report.files.len(),
                report.failed()
            );
        }
        Commands::Tags(ListCommand::List(args)) => {
            runtime.block_on(list_entities(&config.connection(), EntityKind::Tag, args))?;
        }
        Commands::Correspondents(ListCommand::List(args)) => {
            runtime.block_on(list_entities(
                &config.connection(),
                EntityKind::Correspondent,
                args,
            ))?;
        }
    }

    Ok(ExitCode::Success)
}

async fn upload_files(
    settings: &ConnectionSettings,
    files: &[PathBuf],
    request: &UploadRequest,
    show_progress: bool,
) -> Result<BatchReport, PngxError> {
    Session::connect(settings)?
        .run(|session| async move {
            let mut uploader = Uploader::new(&session);
            if show_progress {
                uploader = uploader.with_progress(Arc::new(Progress::new(false)));
            }
            let report = uploader.upload(files, request).await?;
            Ok::<_, PngxError>(report)
        })
        .await
}

async fn list_entities(
    settings: &ConnectionSettings,
    kind: EntityKind,
    args: &ListArgs,
) -> Result<(), PngxError> {
    let names = Session::connect(settings)?
        .run(|session| async move {
            let names = session.list(kind).await?;
            Ok::<_, PngxError>(names)
        })
        .await?;

    println!(
        "{}",
        format_listing(
            &names,
            ListFormat {
                zero: args.zero,
                ids: args.ids,
            },
        )
    );
    Ok(())
}
