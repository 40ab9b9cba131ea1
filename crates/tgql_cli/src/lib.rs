//! Command-line interface for tgql.
//!
//! # Usage
//!
//! ```bash
//! # Print the schema of a declaration document
//! tgql build recipes.json
//!
//! # Write it to a file, with federation directives
//! tgql build recipes.json -o schema.graphql --federation
//!
//! # Check declaration documents
//! tgql check recipes.json users.json
//! ```

pub mod document;

use clap::{Parser, Subcommand};
use colored::Colorize;
use document::{DeclarationDocument, DocumentError};
use std::path::{Path, PathBuf};
use tgql_core::BuildError;
use tgql_schema::{
    print_schema, ApolloFederation, DirectiveSource, FileDirectiveSource, PrintOptions, Schema,
    SchemaBuilder, SCHEMA_FILE_HEADER,
};

#[derive(Parser, Debug)]
#[command(name = "tgql")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a schema from a declaration document
    Build {
        /// Declaration document (JSON)
        input: PathBuf,

        /// Write the schema to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Add the Apollo federation directives
        #[arg(long)]
        federation: bool,

        /// Load federation directives from a JSON file
        #[arg(long, value_name = "FILE")]
        federation_directives: Option<PathBuf>,

        /// Skip structural validation
        #[arg(long)]
        skip_check: bool,

        /// Print types sorted by name
        #[arg(long)]
        sort: bool,
    },

    /// Check declaration documents for errors
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show version information
    Version,
}

/// Settings of one schema build.
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub federation: bool,
    pub federation_directives: Option<PathBuf>,
    pub skip_check: bool,
}

pub fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Build {
            input,
            output,
            federation,
            federation_directives,
            skip_check,
            sort,
        } => {
            let request = BuildRequest {
                federation,
                federation_directives,
                skip_check,
            };
            build_file(&input, output.as_deref(), &request, sort, cli.quiet)
        }
        Commands::Check { files } => check_files(&files, cli.verbose),
        Commands::Version => {
            println!("tgql {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

/// Loads a declaration document and builds its schema.
pub fn build_schema(path: &Path, request: &BuildRequest) -> Result<Schema, DocumentError> {
    let declared = DeclarationDocument::load(path)?.declare()?;
    let mut options = declared.options;
    options.skip_check |= request.skip_check;
    let builder = SchemaBuilder::new()
        .with_options(options)
        .with_orphaned_types(declared.orphaned_types);

    let source: Option<Box<dyn DirectiveSource>> = match &request.federation_directives {
        Some(file) => Some(Box::new(FileDirectiveSource::new(file.clone()))),
        None if request.federation => Some(Box::new(ApolloFederation)),
        None => None,
    };
    let schema = match source {
        Some(source) => builder.build_federated(&declared.registry, source.as_ref())?,
        None => builder.build(&declared.registry)?,
    };
    Ok(schema)
}

fn build_file(
    input: &Path,
    output: Option<&Path>,
    request: &BuildRequest,
    sort: bool,
    quiet: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let schema = match build_schema(input, request) {
        Ok(schema) => schema,
        Err(error) => {
            report_error(input, &error);
            return Ok(1);
        }
    };

    let print_options = PrintOptions {
        sort_types: sort,
        ..PrintOptions::default()
    };
    let sdl = print_schema(&schema, &print_options);

    match output {
        Some(path) => {
            std::fs::write(path, format!("{SCHEMA_FILE_HEADER}{sdl}"))?;
            if !quiet {
                println!(
                    "{} {} type(s) written to {}",
                    "Success:".green().bold(),
                    schema.len(),
                    path.display()
                );
            }
        }
        None => print!("{sdl}"),
    }
    Ok(0)
}

fn check_files(files: &[PathBuf], verbose: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let mut has_errors = false;

    for file in files {
        if verbose {
            println!("{} {}", "Checking".blue(), file.display());
        }

        match build_schema(file, &BuildRequest::default()) {
            Ok(schema) => {
                if verbose {
                    println!("{} {} ({} types)", "OK".green(), file.display(), schema.len());
                }
            }
            Err(error) => {
                has_errors = true;
                report_error(file, &error);
            }
        }
    }

    if has_errors {
        Ok(1)
    } else {
        println!(
            "{} {} file(s) checked",
            "Success:".green().bold(),
            files.len()
        );
        Ok(0)
    }
}

fn report_error(file: &Path, error: &DocumentError) {
    eprintln!("{} {}", "Error".red().bold(), file.display());

    let DocumentError::Build(BuildError::InvalidSchema { diagnostics, .. }) = error else {
        match error.code() {
            Some(code) => eprintln!("  {} [{}] {}", "-->".blue(), code.yellow(), error),
            None => eprintln!("  {} {}", "-->".blue(), error),
        }
        return;
    };
    for diagnostic in diagnostics {
        eprintln!(
            "  {} [{}] {}",
            "-->".blue(),
            diagnostic.code.yellow(),
            diagnostic.title
        );
        for label in &diagnostic.labels {
            eprintln!("      {} {}: {}", "at".dimmed(), label.location, label.message);
        }
    }
}
