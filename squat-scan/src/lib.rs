mod report;

use anyhow::Context;
use squat_core::aggregator::{create_suspicious_package_dict, filter_by_package_name_len};
use squat_core::config::{self, Config};
use squat_core::differ::{RecencyDiffer, SnapshotStore};
use squat_core::mutation::create_potential_squatter_names;
use squat_core::record_store;
use squat_core::registry::{HttpRegistry, RegistryClient};
use squat_core::risk::{self, MetadataSource};
use squat_core::screens::homophone_attack_screen;
use squat_core::types::CandidateMapping;
use squat_core::whitelist::Whitelist;
use squat_core::{logging, paths};
use std::path::Path;

pub use report::{render_annotated, render_mapping, render_numbered, render_records};

const DEFAULT_RECORDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Module(String),
  TopMods,
  DefendName(String),
  ScanRecent,
  Homophones(String),
  Records(usize),
  Help,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
  pub max_distance: Option<usize>,
  pub top_n: Option<usize>,
  pub min_len: Option<usize>,
  pub stored_json: bool,
  pub save_new_list: bool,
  pub risk: bool,
  pub dry_run: bool,
  pub verbose: bool,
}

impl Options {
  /// Command-line values win over `[scan]` in config.toml.
  pub fn apply(&self, cfg: &mut Config) {
    if let Some(d) = self.max_distance {
      cfg.scan.max_distance = d;
    }
    if let Some(n) = self.top_n {
      cfg.scan.top_n = n;
    }
    if let Some(n) = self.min_len {
      cfg.scan.min_len = n;
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub action: Action,
  pub options: Options,
}

impl Invocation {
  /// `args[0]` is the program name and is ignored.
  pub fn from_args(args: &[String]) -> anyhow::Result<Self> {
    let mut action: Option<Action> = None;
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
      let flag = args[i].as_str();
      let next = match flag {
        "--help" | "-h" => Some(Action::Help),
        "--top-mods" => Some(Action::TopMods),
        "--scan-recent" => Some(Action::ScanRecent),
        "--module" => Some(Action::Module(value(args, i)?.to_string())),
        "--defend-name" => Some(Action::DefendName(value(args, i)?.to_string())),
        "--homophones" => Some(Action::Homophones(value(args, i)?.to_string())),
        "--records" => {
          let limit = match args.get(i + 1).filter(|v| !v.starts_with('-')) {
            Some(v) => {
              i += 1;
              parse_number(flag, v)?
            }
            None => DEFAULT_RECORDS,
          };
          Some(Action::Records(limit))
        }
        "--max-distance" => {
          options.max_distance = Some(parse_number(flag, value(args, i)?)?);
          None
        }
        "--top-n" => {
          options.top_n = Some(parse_number(flag, value(args, i)?)?);
          None
        }
        "--min-len" => {
          options.min_len = Some(parse_number(flag, value(args, i)?)?);
          None
        }
        "--stored-json" => {
          options.stored_json = true;
          None
        }
        "--save-new-list" => {
          options.save_new_list = true;
          None
        }
        "--risk" => {
          options.risk = true;
          None
        }
        "--dry-run" => {
          options.dry_run = true;
          None
        }
        "--verbose" | "-v" => {
          options.verbose = true;
          None
        }
        other => anyhow::bail!("unknown argument `{other}` (see --help)"),
      };

      if takes_value(flag) {
        i += 1;
      }

      if let Some(next) = next {
        if next == Action::Help {
          return Ok(Self {
            action: Action::Help,
            options,
          });
        }
        if let Some(prev) = &action {
          anyhow::bail!("conflicting actions: {prev:?} and {next:?}");
        }
        action = Some(next);
      }
      i += 1;
    }

    Ok(Self {
      action: action.unwrap_or(Action::Help),
      options,
    })
  }
}

fn takes_value(flag: &str) -> bool {
  matches!(
    flag,
    "--module" | "--defend-name" | "--homophones" | "--max-distance" | "--top-n" | "--min-len"
  )
}

fn value(args: &[String], i: usize) -> anyhow::Result<&str> {
  args
    .get(i + 1)
    .map(String::as_str)
    .filter(|v| !v.starts_with('-'))
    .ok_or_else(|| anyhow::anyhow!("`{}` expects a value", args[i]))
}

fn parse_number(flag: &str, raw: &str) -> anyhow::Result<usize> {
  raw
    .parse()
    .with_context(|| format!("`{flag}` expects a non-negative integer, got `{raw}`"))
}

pub fn run(inv: &Invocation) -> anyhow::Result<()> {
  if inv.action == Action::Help {
    print_help();
    return Ok(());
  }

  let opts = &inv.options;
  let base = paths::base_dir()?;
  let config_path = paths::config_path(&base);
  let mut cfg = if opts.dry_run {
    config::load_or_default_readonly(&config_path)?
  } else {
    config::load_or_create_default(&config_path)?
  };
  opts.apply(&mut cfg);
  init_logging(&base, &cfg, opts)?;
  for reason in &cfg.warnings {
    tracing::warn!(config = %config_path.display(), reason = %reason, "config value rejected");
  }

  tracing::info!(action = ?inv.action, dry_run = opts.dry_run, "squat-scan starting");

  match &inv.action {
    Action::DefendName(name) => {
      names_to_defend(name);
      Ok(())
    }
    Action::Records(limit) => {
      let records = record_store::list_recent(&paths::results_dir(&base), *limit)?;
      print!("{}", render_records(&records));
      Ok(())
    }
    action => {
      let registry = HttpRegistry::new(&cfg.registry, paths::stored_top_packages_path(&base))?;
      match action {
        Action::Module(name) => mod_squatters(&registry, &cfg, opts, name),
        Action::TopMods => top_mods(&registry, &base, &cfg, opts),
        Action::ScanRecent => scan_recent(&registry, &base, &cfg, opts),
        Action::Homophones(name) => homophones(&registry, name),
        _ => Ok(()),
      }
    }
  }
}

fn init_logging(base: &Path, cfg: &Config, opts: &Options) -> anyhow::Result<()> {
  if opts.dry_run {
    return logging::init_stderr_only(&cfg.logging.level);
  }
  let dir = paths::logs_dir(base);
  if opts.verbose {
    logging::init_file_and_stderr(&dir, &cfg.logging.level, cfg.logging.retention_days)
  } else {
    logging::init_file_only(&dir, &cfg.logging.level, cfg.logging.retention_days)
  }
}

fn mod_squatters(
  registry: &HttpRegistry,
  cfg: &Config,
  opts: &Options,
  module: &str,
) -> anyhow::Result<()> {
  let universe = registry.fetch_universe().context("fetch package universe")?;
  let candidates = create_suspicious_package_dict(&universe, &[module.to_string()], &cfg.scan);

  println!("Checking {module} for typosquatting candidates.");
  let found = candidates.get(module).cloned().unwrap_or_default();
  if found.is_empty() {
    println!("No typosquatting candidates found.");
    return Ok(());
  }

  if opts.risk {
    print_with_risk(&candidates, registry)?;
  } else {
    print!("{}", render_numbered(&found));
  }
  Ok(())
}

fn names_to_defend(name: &str) {
  println!("Here is a list of similar names--measured by keyboard distance--to \"{name}\":");
  let names: Vec<String> = create_potential_squatter_names(name).into_iter().collect();
  print!("{}", render_numbered(&names));
}

fn top_mods(
  registry: &HttpRegistry,
  base: &Path,
  cfg: &Config,
  opts: &Options,
) -> anyhow::Result<()> {
  let whitelist = Whitelist::load(&paths::whitelist_path(base))?;
  let universe = registry.fetch_universe().context("fetch package universe")?;
  let top = registry
    .fetch_top_names(cfg.scan.top_n, opts.stored_json)
    .context("fetch top packages")?;

  let ranked: Vec<&str> = top.keys().map(String::as_str).collect();
  let targets = filter_by_package_name_len(&ranked, cfg.scan.min_len);
  tracing::info!(
    top = ranked.len(),
    targets = targets.len(),
    min_len = cfg.scan.min_len,
    "screening top packages"
  );

  let candidates = create_suspicious_package_dict(&universe, &targets, &cfg.scan);
  let kept = whitelist.apply(&candidates);
  record_store::store_squatting_candidates(&paths::results_dir(base), &kept, opts.dry_run)?;

  if opts.risk {
    print_with_risk(&kept, registry)
  } else {
    print!("{}", render_mapping(&kept));
    Ok(())
  }
}

fn scan_recent(
  registry: &HttpRegistry,
  base: &Path,
  cfg: &Config,
  opts: &Options,
) -> anyhow::Result<()> {
  let universe = registry.fetch_universe().context("fetch package universe")?;
  let store = SnapshotStore::new(paths::package_lists_dir(base)).with_dry_run(opts.dry_run);
  let differ = RecencyDiffer::new(&store, &cfg.scan, cfg.snapshots.staleness_hours);

  let report = match differ.run(&universe, opts.save_new_list, chrono::Utc::now()) {
    Ok(r) => r,
    Err(e) if e.is_no_eligible_snapshot() => {
      tracing::warn!(error = %e, "recency scan skipped");
      println!("{e}");
      return Ok(());
    }
    Err(e) => return Err(e).context("recency scan"),
  };

  println!(
    "Compared against {} ({} new packages).",
    report.baseline.path.display(),
    report.new_names.len()
  );
  if opts.risk {
    print_with_risk(&report.candidates, registry)
  } else {
    print!("{}", render_mapping(&report.candidates));
    Ok(())
  }
}

fn homophones(registry: &HttpRegistry, name: &str) -> anyhow::Result<()> {
  let universe = registry.fetch_universe().context("fetch package universe")?;
  let found = homophone_attack_screen(name, &universe);
  println!("Checking {name} for homophone candidates.");
  if found.is_empty() {
    println!("No homophone candidates found.");
  } else {
    print!("{}", render_numbered(&found));
  }
  Ok(())
}

fn print_with_risk(mapping: &CandidateMapping, source: &dyn MetadataSource) -> anyhow::Result<()> {
  let annotated = risk::annotate(mapping, source).context("score candidate metadata")?;
  print!("{}", render_annotated(&annotated));
  Ok(())
}

fn print_help() {
  println!(
    "squat-scan {}

Usage:
  squat-scan --module <name>          Screen one package name against the registry
  squat-scan --top-mods               Screen the most downloaded packages
  squat-scan --defend-name <name>     List keyboard-adjacent names worth registering
  squat-scan --scan-recent            Screen packages registered since the last snapshot
  squat-scan --homophones <name>      List registered names that sound alike
  squat-scan --records [n]            Show the most recent stored results (default {DEFAULT_RECORDS})

Options:
  --max-distance <n>   Edit distance threshold (config: scan.max_distance)
  --top-n <n>          Number of top packages (config: scan.top_n)
  --min-len <n>        Skip top packages with shorter names (config: scan.min_len)
  --stored-json        Read top packages from top_packages.json instead of the feed
  --save-new-list      With --scan-recent, snapshot the current package list first
  --risk               Compare metadata and label each candidate
  --dry-run            Write nothing to disk; log to stderr
  --verbose, -v        Mirror logs to stderr
  --version            Print version
  --help, -h           Show this help

Files live under ${} (or the working directory).",
    env!("CARGO_PKG_VERSION"),
    paths::HOME_ENV
  );
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(raw: &[&str]) -> Vec<String> {
    std::iter::once("squat-scan")
      .chain(raw.iter().copied())
      .map(String::from)
      .collect()
  }

  #[test]
  fn parses_actions_with_values() {
    let inv = Invocation::from_args(&args(&["--module", "requests"])).unwrap();
    assert_eq!(inv.action, Action::Module("requests".into()));

    let inv = Invocation::from_args(&args(&["--defend-name", "numpy"])).unwrap();
    assert_eq!(inv.action, Action::DefendName("numpy".into()));

    let inv = Invocation::from_args(&args(&["--homophones", "klumps"])).unwrap();
    assert_eq!(inv.action, Action::Homophones("klumps".into()));
  }

  #[test]
  fn parses_top_mods_overrides() {
    let inv = Invocation::from_args(&args(&[
      "--top-mods",
      "--top-n",
      "200",
      "--max-distance",
      "2",
      "--min-len",
      "6",
      "--stored-json",
      "--risk",
    ]))
    .unwrap();
    assert_eq!(inv.action, Action::TopMods);
    assert_eq!(inv.options.top_n, Some(200));
    assert_eq!(inv.options.max_distance, Some(2));
    assert_eq!(inv.options.min_len, Some(6));
    assert!(inv.options.stored_json);
    assert!(inv.options.risk);
    assert!(!inv.options.dry_run);
  }

  #[test]
  fn overrides_replace_config_values() {
    let inv = Invocation::from_args(&args(&["--top-mods", "--top-n", "7"])).unwrap();
    let mut cfg = Config::default();
    let before = cfg.scan.max_distance;
    inv.options.apply(&mut cfg);
    assert_eq!(cfg.scan.top_n, 7);
    assert_eq!(cfg.scan.max_distance, before);
  }

  #[test]
  fn records_limit_is_optional() {
    let inv = Invocation::from_args(&args(&["--records"])).unwrap();
    assert_eq!(inv.action, Action::Records(DEFAULT_RECORDS));
    let inv = Invocation::from_args(&args(&["--records", "3", "--dry-run"])).unwrap();
    assert_eq!(inv.action, Action::Records(3));
    assert!(inv.options.dry_run);

    let inv = Invocation::from_args(&args(&["--records", "-v"])).unwrap();
    assert_eq!(inv.action, Action::Records(DEFAULT_RECORDS));
    assert!(inv.options.verbose);

    let inv = Invocation::from_args(&args(&["-v", "--records", "-h"])).unwrap();
    assert_eq!(inv.action, Action::Help);
  }

  #[test]
  fn scan_recent_with_save() {
    let inv = Invocation::from_args(&args(&["--scan-recent", "--save-new-list"])).unwrap();
    assert_eq!(inv.action, Action::ScanRecent);
    assert!(inv.options.save_new_list);
  }

  #[test]
  fn no_action_means_help() {
    assert_eq!(Invocation::from_args(&args(&[])).unwrap().action, Action::Help);
    let inv = Invocation::from_args(&args(&["--top-mods", "--help"])).unwrap();
    assert_eq!(inv.action, Action::Help);
  }

  #[test]
  fn rejects_bad_input() {
    assert!(Invocation::from_args(&args(&["--module"])).is_err());
    assert!(Invocation::from_args(&args(&["--module", "--risk"])).is_err());
    assert!(Invocation::from_args(&args(&["--module", "-v"])).is_err());
    assert!(Invocation::from_args(&args(&["--top-n", "many", "--top-mods"])).is_err());
    assert!(Invocation::from_args(&args(&["--top-mods", "--scan-recent"])).is_err());
    assert!(Invocation::from_args(&args(&["--quick"])).is_err());
  }
}
