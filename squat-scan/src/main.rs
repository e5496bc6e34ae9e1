use anyhow::Context;

fn main() -> anyhow::Result<()> {
  let args: Vec<String> = std::env::args().collect();

  if args.iter().any(|a| a == "--version") {
    println!("{}", env!("CARGO_PKG_VERSION"));
    return Ok(());
  }

  let invocation = squat_scan::Invocation::from_args(&args)?;
  squat_scan::run(&invocation).context("squat-scan run")
}
