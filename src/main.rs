use anyhow::Result;
use clap::Parser;

mod assembler;
mod cli;
mod connector;
mod error;
mod ext;
mod lookup;
mod model;
mod render;
mod resolver;
mod util;
mod version;

use crate::cli::{normalize, Cli, Format};

fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  // Phase 1: normalize CLI
  let cfg = normalize(cli)?;

  // Phase 2: connect and index history (the bundle is frozen from here on)
  let connector = connector::build_connector(&cfg)?;

  // Phase 3: resolve target, then baseline, against the frozen bundle
  let current = connector.hash_for_tag(None);
  let (target, target_hash) =
    resolver::determine_target_version(cfg.target.as_deref(), current.as_deref(), connector.lookup())?;
  let (baseline, baseline_hash) = resolver::determine_baseline_version(&target, connector.lookup());

  // Phase 4: assemble the one immutable report value
  let info =
    assembler::assemble_build_information(connector.as_ref(), target, target_hash, baseline, baseline_hash)?;

  // Phase 5: render and write
  let rendered = match cfg.format {
    Format::Markdown => render::render_markdown(&info),
    Format::Json => render::render_json(&info)?,
  };

  if cfg.out == "-" {
    print!("{}", rendered);
  } else {
    std::fs::write(&cfg.out, &rendered)?;
  }

  Ok(())
}
