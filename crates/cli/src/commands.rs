//! Subcommand handlers.

use crate::cli::{Cli, Command, ProjectArgs, ProjectCommand};
use color_eyre::eyre::{eyre, WrapErr};
use colored::Colorize;
use psgcp_core::config::loader::load_settings;
use psgcp_core::config::models::StorageLayout;
use psgcp_core::config::project_info::ProjectInfoStore;
use psgcp_core::encoding::hex_encode;
use psgcp_core::pipelines::package::normalize_source_dir;
use psgcp_core::process::CommandLine;
use psgcp_core::scheduler::Scheduler;
use psgcp_protocol::operation_models::{
    CallSiteId, CallerId, Continuation, OperationKey, ResumeKind,
};
use psgcp_protocol::process_models::ProcessEvent;
use psgcp_protocol::project_models::ProjectInfo;
use psgcp_protocol::result_models::{ArtifactResult, OperationOutcome};
use std::io::Write;
use std::process::ExitCode;
use tracing::{debug, warn};

/// Exit code reported when an operation is interrupted.
const EXIT_INTERRUPTED: u8 = 130;

pub async fn run(cli: Cli) -> color_eyre::Result<ExitCode> {
    let layout = StorageLayout::new(&cli.saved_dir);

    match cli.command {
        Command::Fetch { bucket } => {
            let (mut scheduler, key, continuation) = start(layout, "OnFetched")?;
            scheduler.fetch_bundle(key, continuation, bucket);
            let resumed = drive(&mut scheduler, key, |_| Ok(())).await?;
            Ok(report_artifact(resumed))
        }
        Command::Package { dir } => {
            let (mut scheduler, key, continuation) = start(layout, "OnPackaged")?;
            scheduler.package_directory(key, continuation, normalize_source_dir(&dir));
            let resumed = drive(&mut scheduler, key, |_| Ok(())).await?;
            Ok(report_artifact(resumed))
        }
        Command::Run { program, args } => {
            let (mut scheduler, key, continuation) = start(layout, "OnProcessEvent")?;
            let mut session = scheduler
                .launch_process(key, continuation, CommandLine::new(program, args))
                .wrap_err("Failed to launch process")?;
            session.close_input();
            debug!(pid = ?session.pid(), "streaming process output");

            let mut stdout = std::io::stdout();
            let resumed = drive(&mut scheduler, key, |chunk| {
                stdout.write_all(chunk.as_bytes())?;
                stdout.flush()
            })
            .await?;

            Ok(match ProcessEvent::from_resume(&resumed) {
                Some(ProcessEvent::Exited { code }) => exit_code_from(code),
                _ if matches!(resumed, ResumeKind::Cancelled) => ExitCode::from(EXIT_INTERRUPTED),
                _ => return Err(eyre!("Unexpected resumption: {resumed:?}")),
            })
        }
        Command::Project(ProjectCommand::Save(args)) => {
            let store = ProjectInfoStore::new(layout.project_info_file());
            store.save(&project_info(args))?;
            println!("{}", store.path().display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Project(ProjectCommand::Show) => {
            let store = ProjectInfoStore::new(layout.project_info_file());
            match store.load() {
                Some(info) => {
                    println!("{}", serde_json::to_string_pretty(&info)?);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("{}", "not found".red());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Hex { input } => {
            println!("{}", hex_encode(&input));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn start(
    layout: StorageLayout,
    function: &str,
) -> color_eyre::Result<(Scheduler, OperationKey, Continuation)> {
    let settings = load_settings(&layout.settings_file())?;
    let scheduler = Scheduler::new(layout, settings).wrap_err("Failed to build HTTP client")?;

    let caller = CallerId::new();
    let key = OperationKey::new(caller, CallSiteId(0));
    Ok((scheduler, key, Continuation::new(function, 0, caller)))
}

/// Tick `scheduler` until the operation for `key` resumes for the last time.
///
/// Data chunks are handed to `on_data`. Ctrl-C, or `on_data` failing (for
/// example when stdout is a closed pipe), cancels the operation, which then
/// resumes as cancelled on a following tick.
async fn drive<F>(
    scheduler: &mut Scheduler,
    key: OperationKey,
    mut on_data: F,
) -> color_eyre::Result<ResumeKind>
where
    F: FnMut(&str) -> std::io::Result<()>,
{
    let mut ticker = tokio::time::interval(scheduler.settings().tick_interval());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    let mut output_closed = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for resumption in scheduler.tick() {
                    if resumption.key != key {
                        continue;
                    }
                    match resumption.kind {
                        ResumeKind::DataAvailable(_) if output_closed => {}
                        ResumeKind::DataAvailable(chunk) => {
                            if let Err(e) = on_data(&chunk) {
                                warn!(%key, error = %e, "failed to write output, cancelling");
                                output_closed = true;
                                scheduler.cancel(&key);
                            }
                        }
                        terminal => return Ok(terminal),
                    }
                }
            }
            signal = &mut ctrl_c, if !interrupted => {
                signal.wrap_err("Failed to listen for Ctrl-C")?;
                interrupted = true;
                warn!(%key, "interrupted, cancelling");
                scheduler.cancel(&key);
            }
        }
    }
}

fn report_artifact(resumed: ResumeKind) -> ExitCode {
    match resumed {
        ResumeKind::Finished(OperationOutcome::Artifact(ArtifactResult::Succeeded { path })) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        ResumeKind::Finished(OperationOutcome::Artifact(ArtifactResult::Failed {
            message, ..
        })) => {
            eprintln!("{} {message}", "error:".red().bold());
            ExitCode::FAILURE
        }
        ResumeKind::Cancelled => {
            eprintln!("{}", "cancelled".yellow());
            ExitCode::from(EXIT_INTERRUPTED)
        }
        other => {
            eprintln!("{} unexpected resumption {other:?}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Child exit codes outside `0..=255` (including the unavailable sentinel)
/// map to a generic failure.
fn exit_code_from(code: i32) -> ExitCode {
    match u8::try_from(code) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}

fn project_info(args: ProjectArgs) -> ProjectInfo {
    ProjectInfo {
        project_id: args.project_id,
        bucket_name: args.bucket_name,
        plain_credentials: args.plain_credentials,
        unique_app_name: args.unique_app_name,
        vm_zone: args.vm_zone,
        gpu_name: args.gpu_name,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use psgcp_core::config::models::CoreSettings;
    use std::io::{Error, ErrorKind};

    #[tokio::test]
    async fn test_drive_cancels_when_output_fails() {
        let saved = tempfile::tempdir().expect("Failed to create temp dir");
        let settings = CoreSettings {
            tick_interval_ms: 5,
            exit_status_delay_ms: 10,
            ..CoreSettings::default()
        };
        let mut scheduler =
            Scheduler::new(StorageLayout::new(saved.path()), settings).expect("Should build");
        let caller = CallerId::new();
        let key = OperationKey::new(caller, CallSiteId(0));

        let _session = scheduler
            .launch_process(
                key,
                Continuation::new("OnProcessEvent", 0, caller),
                CommandLine::new("sh", ["-c", "while true; do echo y; sleep 0.01; done"]),
            )
            .expect("Should launch");

        let mut writes = 0;
        let resumed = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            drive(&mut scheduler, key, |_| {
                writes += 1;
                Err(Error::new(ErrorKind::BrokenPipe, "closed"))
            }),
        )
        .await
        .expect("Should stop in time")
        .expect("Should drive");

        assert_eq!(resumed, ResumeKind::Cancelled);
        assert_eq!(writes, 1);
    }
}
