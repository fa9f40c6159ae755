pub mod analytics;
pub mod board;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod datetime;
pub mod error;
pub mod lifecycle;
pub mod priority;
pub mod prompt;
pub mod render;
pub mod repeat;
pub mod session;
pub mod task;
pub mod timer;
pub mod transfer;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let split =
    cli::split_rc_overrides(&raw_args);
  let cli = cli::GlobalCli::parse_from(
    split.args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting focus CLI"
  );
  debug!(?split.overrides, "positional rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    split
      .overrides
      .into_iter()
      .chain(cli.rc_overrides)
      .map(cli::RcOverride::into_pair)
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let store =
    datastore::FileStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open datastore at \
         {}",
        data_dir.display()
      )
    })?;

  let options =
    session::SessionOptions {
      seed_empty: cfg
        .get_bool("board.seed")
        .unwrap_or(true)
    };
  let mut session =
    session::Session::open(
      store,
      Utc::now(),
      options
    );

  let mut renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &mut session,
    &cfg,
    &mut renderer,
    commands::Prompter::new(cli.yes),
    inv
  )?;

  info!("done");
  Ok(())
}
