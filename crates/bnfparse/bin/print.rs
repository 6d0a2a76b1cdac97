use std::{io::Read, path::PathBuf, str::FromStr};

use anyhow::{bail, Context};
use bnfparse::{common, ParseOptions, Parser, ParserConfig, RuleOptions};

const USAGE: &str = "usage: print <grammar> [input] [--main NAME] [--partial] \
                     [--ignore-whitespace] [--config FILE] [--json]";

fn main() {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "WARN".to_owned());
    let level = log::LevelFilter::from_str(&level).unwrap_or(log::LevelFilter::Warn);

    simplelog::TermLogger::init(
        level,
        simplelog::ConfigBuilder::new()
            .set_time_format_custom(&[])
            .build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Never,
    )
    .unwrap();

    if let Err(e) = run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    let mut main = None;
    let mut allow_partial = false;
    let mut ignore_whitespace = false;
    let mut config_path = None;
    let mut json = false;

    let mut files = Vec::new();
    let mut iter = args.iter().map(String::as_str);

    while let Some(arg) = iter.next() {
        match arg {
            "--main" => main = Some(iter.next().context("Expected rule name after --main")?),
            "--partial" => allow_partial = true,
            "--ignore-whitespace" => ignore_whitespace = true,
            "--config" => {
                let path = iter.next().context("Expected path after --config")?;
                config_path = Some(PathBuf::from(path));
            }
            "--json" => json = true,
            "--help" | "-h" => {
                println!("{USAGE}");
                return Ok(());
            }
            _ if arg.starts_with("--") => bail!("Unknown option `{arg}`\n{USAGE}"),
            _ => files.push(PathBuf::from(arg)),
        }
    }

    let (grammar_path, input_path) = match files.as_slice() {
        [grammar] => (grammar, None),
        [grammar, input] => (grammar, Some(input)),
        [] => bail!("No grammar provided\n{USAGE}"),
        _ => bail!("Too many files provided\n{USAGE}"),
    };

    let mut config = match &config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read `{}`", path.display()))?;
            ParserConfig::from_json(&text)
                .with_context(|| format!("Invalid configuration `{}`", path.display()))?
        }
        None => ParserConfig::default(),
    };
    config.ignore_whitespace |= ignore_whitespace;
    log::debug!("{config:?}");

    let grammar = std::fs::read_to_string(grammar_path)
        .with_context(|| format!("Failed to read `{}`", grammar_path.display()))?;

    let mut parser = Parser::with_config(config);
    parser
        .grammar(&grammar)
        .with_context(|| format!("Invalid grammar `{}`", grammar_path.display()))?;

    // the character class rules follow the whitespace policy like grammar literals do
    let installed = common::install(&mut parser, RuleOptions::default().whitespace())?;
    log::debug!("installed {installed} common rules");

    for name in parser.registry().undefined_references() {
        log::warn!("rule `{name}` is referenced but never defined");
    }

    let input = match input_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read `{}`", path.display()))?,
        None => {
            let mut input = String::new();
            std::io::stdin()
                .lock()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            input
        }
    };
    // a trailing newline is not part of the input
    let input = input.strip_suffix('\n').unwrap_or(&input);

    let options = ParseOptions {
        main,
        allow_partial,
    };
    let root = parser.parse_with(input, options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&root)?);
    } else {
        print!("{}", root.display_tree());
    }
    Ok(())
}
