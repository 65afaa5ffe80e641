use aptmirror_lib::cli::{ResolvedCommand, parse_args, resolve_command, run_sync};
use aptmirror_lib::error::AptMirrorError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), AptMirrorError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command)?;

    match command {
        ResolvedCommand::Sync(params) => {
            run_sync(params).await?;
        }
    }

    Ok(())
}
