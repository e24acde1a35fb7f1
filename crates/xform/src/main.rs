use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use env_logger::Env;

use xform_calc::Calculator;
use xform_matrix::{Matrix, Point};

#[derive(Parser)]
#[command(name = "xform")]
#[command(about = "Build 2D affine transforms from transformation commands", long_about = None)]
#[command(version)]
struct Cli {
    /// Transformation commands, e.g. "T 10 20 R 45 S 2"
    commands: String,

    /// Preset a variable for command expressions (the value may itself
    /// be an expression)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,

    /// Map a point through the transform and print it instead of the matrix
    #[arg(long = "apply", value_name = "X,Y")]
    apply: Vec<String>,

    /// Print the raw matrix grid instead of the SVG transform attribute
    #[arg(long = "debug-matrix", conflicts_with = "apply")]
    debug_matrix: bool,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", hide = true)]
    debug: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug; RUST_LOG overrides either way
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    let mut calc = Calculator::new();
    for var in &cli.vars {
        let (name, value) = var.split_once('=').ok_or_else(|| {
            anyhow::anyhow!("invalid variable definition '{var}', expected NAME=VALUE")
        })?;
        let value = calc
            .eval(value)
            .with_context(|| format!("invalid value for variable '{name}'"))?;
        calc.set_variable(name, value);
    }

    let matrix = Matrix::parse(&cli.commands, &calc)
        .with_context(|| format!("invalid transformation '{}'", cli.commands))?;
    log::debug!("parsed matrix {matrix}");

    if cli.apply.is_empty() {
        if cli.debug_matrix {
            println!("{matrix}");
        } else {
            println!("{}", matrix.to_svg_transform());
        }
    } else {
        for point in &cli.apply {
            let mapped = matrix.apply(parse_point(point)?);
            println!("{},{}", mapped.x, mapped.y);
        }
    }

    Ok(())
}

fn parse_point(text: &str) -> anyhow::Result<Point> {
    let invalid = || anyhow::anyhow!("invalid point '{text}', expected X,Y");
    let (x, y) = text.split_once(',').ok_or_else(invalid)?;
    let x: f64 = x.trim().parse().map_err(|_| invalid())?;
    let y: f64 = y.trim().parse().map_err(|_| invalid())?;
    Ok(Point::new(x, y))
}
