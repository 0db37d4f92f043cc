#![allow(missing_docs)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "blendrna", version, about = "Schema registration and accessor planning over Blender struct layouts")]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// More log output; repeat for trace level.
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbose: u8,

	/// Only log errors.
	#[arg(short, long, global = true)]
	quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Summarize a layout table from a `.blend` file or JSON description.
	Layout {
		path: PathBuf,
		#[arg(long = "struct")]
		struct_name: Option<String>,
		#[arg(long)]
		json: bool,
	},
	/// Resolve a member path inside a layout struct.
	Resolve {
		layout: PathBuf,
		#[arg(long = "struct")]
		struct_name: String,
		#[arg(long)]
		path: String,
		#[arg(long)]
		json: bool,
	},
	/// Register a schema manifest, run the accessor generator, and print the plans.
	Schema {
		manifest: PathBuf,
		#[arg(long)]
		layout: Option<PathBuf>,
		/// Collections missing accessors are warnings instead of errors.
		#[arg(long)]
		lenient: bool,
		/// Skip raw access annotations.
		#[arg(long)]
		no_raw: bool,
		#[arg(long)]
		json: bool,
	},
	/// Read every property of one stored instance in a `.blend` file.
	Read {
		path: PathBuf,
		#[arg(long)]
		manifest: PathBuf,
		#[arg(long = "struct")]
		struct_name: String,
		#[arg(long)]
		addr: String,
		#[arg(long)]
		json: bool,
	},
}

fn main() {
	let cli = Cli::parse();
	init_tracing(cli.verbose, cli.quiet);
	if let Err(err) = run(cli.command) {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn init_tracing(verbose: u8, quiet: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = if quiet {
		EnvFilter::new("error")
	} else {
		match verbose {
			0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
			1 => EnvFilter::new("debug"),
			_ => EnvFilter::new("trace"),
		}
	};
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();
}

fn run(command: Commands) -> blendrna::rna::Result<()> {
	match command {
		Commands::Layout { path, struct_name, json } => cmd::layout::run(path, struct_name, json),
		Commands::Resolve {
			layout,
			struct_name,
			path,
			json,
		} => cmd::resolve::run(layout, &struct_name, &path, json),
		Commands::Schema {
			manifest,
			layout,
			lenient,
			no_raw,
			json,
		} => cmd::schema::run(manifest, layout, cmd::schema::SchemaOptions { lenient, no_raw, json }),
		Commands::Read {
			path,
			manifest,
			struct_name,
			addr,
			json,
		} => cmd::read::run(path, manifest, &struct_name, &addr, json),
	}
}
