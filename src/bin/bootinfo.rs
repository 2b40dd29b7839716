//! bootinfo CLI
//!
//! Command-line interface for the boot info store.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bootinfo::{BootInfo, Config, OpenFlags};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// Failure count at which check-status asks for a boot slot switch
const MAX_BOOT_FAILURES: u8 = 3;

/// Exit status signalling "initiate recovery"
const EXIT_SWITCH_SLOT: u8 = 77;

/// Largest value accepted from --from-file
const MAX_FILE_VALUE: u64 = 512 * 1024;

/// bootinfo CLI
#[derive(Parser, Debug)]
#[command(name = "bootinfo")]
#[command(about = "Manage persistent boot variables and boot-failure counters")]
#[command(version)]
struct Args {
    /// Storage device (default: built-in device list)
    #[arg(short, long)]
    device: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a successful boot
    BootSuccess,

    /// Count a boot attempt and check it is under the failure limit
    CheckStatus,

    /// Initialize the store
    Init {
        /// Initialize even if a valid store exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show boot counter information
    Show,

    /// Print a variable, or all variables if no name is given
    Get {
        /// Variable name
        name: Option<String>,

        /// Print only the value
        #[arg(short = 'n', long)]
        omit_name: bool,
    },

    /// Set a variable (NAME VALUE or NAME=VALUE); deletes if no value
    Set {
        /// Variable name, optionally NAME=VALUE
        name: String,

        /// Variable value
        value: Option<String>,

        /// Read the value from FILE ("-" for stdin)
        #[arg(short = 'f', long, conflicts_with = "value")]
        from_file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder();
    if let Some(device) = args.device {
        builder = builder.device_path(device);
    }
    let config = builder.build();

    let result = match args.command {
        Commands::BootSuccess => boot_success(&config),
        Commands::CheckStatus => check_status(&config),
        Commands::Init { force } => init(&config, force),
        Commands::Show => show(&config),
        Commands::Get { name, omit_name } => get(&config, name.as_deref(), omit_name),
        Commands::Set {
            name,
            value,
            from_file,
        } => set(&config, name, value, from_file),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("bootinfo: {}", e);
            ExitCode::FAILURE
        }
    }
}

type CmdResult = Result<ExitCode, Box<dyn std::error::Error>>;

fn boot_success(config: &Config) -> CmdResult {
    let mut ctx = BootInfo::open(config, OpenFlags::READ_WRITE)?;
    let failed = ctx.mark_successful()?;
    ctx.close();
    eprintln!("Failed boot count: {}", failed);
    Ok(ExitCode::SUCCESS)
}

fn check_status(config: &Config) -> CmdResult {
    let mut ctx = BootInfo::open(config, OpenFlags::READ_WRITE)?;
    let failed = ctx.mark_in_progress()?;
    if failed < MAX_BOOT_FAILURES {
        return Ok(ExitCode::SUCCESS);
    }

    eprintln!("Too many boot failures, exit with error to signal boot slot switch");
    // Clear the in-progress state for the check after the slot switch
    if let Err(e) = ctx.mark_successful() {
        tracing::warn!("Could not reset boot status: {}", e);
    }
    Ok(ExitCode::from(EXIT_SWITCH_SLOT))
}

fn init(config: &Config, force: bool) -> CmdResult {
    let flags = if force {
        OpenFlags::FORCE_INIT
    } else {
        OpenFlags::READ_WRITE
    };
    BootInfo::open(config, flags)?.close();
    Ok(ExitCode::SUCCESS)
}

fn show(config: &Config) -> CmdResult {
    let ctx = BootInfo::open(config, OpenFlags::READ_ONLY)?;
    let sectors = ctx.extension_sectors();
    println!("devinfo version:\t{}", ctx.version());
    println!(
        "Boot in progress:\t{}",
        if ctx.is_in_progress() { "YES" } else { "NO" }
    );
    println!("Failed boots:\t\t{}", ctx.failed_boot_count());
    println!(
        "Extension space:\t{} sector{}",
        sectors,
        if sectors == 1 { "" } else { "s" }
    );
    Ok(ExitCode::SUCCESS)
}

fn get(config: &Config, name: Option<&str>, omit_name: bool) -> CmdResult {
    let ctx = BootInfo::open(config, OpenFlags::READ_ONLY)?;
    match name {
        None => {
            for (name, value) in ctx.vars() {
                println!("{}={}", name, value);
            }
        }
        Some(name) => match ctx.get(name) {
            Ok(value) if omit_name => println!("{}", value),
            Ok(value) => println!("{}={}", name, value),
            Err(_) => {
                eprintln!("not found: {}", name);
                return Ok(ExitCode::FAILURE);
            }
        },
    }
    Ok(ExitCode::SUCCESS)
}

fn set(
    config: &Config,
    name: String,
    value: Option<String>,
    from_file: Option<PathBuf>,
) -> CmdResult {
    let (name, value) = match from_file {
        Some(path) => {
            if name.contains('=') {
                return Err("cannot specify both value and input file".into());
            }
            (name, Some(read_value_file(&path)?))
        }
        None => match (value, name.find('=')) {
            (None, Some(0)) => return Err("invalid variable name".into()),
            (None, Some(eq)) => (name[..eq].to_string(), Some(name[eq + 1..].to_string())),
            (value, _) => (name, value),
        },
    };

    let mut ctx = BootInfo::open(config, OpenFlags::READ_WRITE)?;
    ctx.set(&name, value.as_deref())?;
    ctx.commit()?;
    ctx.close();
    Ok(ExitCode::SUCCESS)
}

fn read_value_file(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let reader: Box<dyn Read> = if path.as_os_str() == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(path)?)
    };

    let mut buf = Vec::new();
    reader.take(MAX_FILE_VALUE).read_to_end(&mut buf)?;
    if buf.len() as u64 >= MAX_FILE_VALUE - 1 {
        return Err("input value too large".into());
    }
    if buf.contains(&0) {
        return Err("null character in input value not allowed".into());
    }
    Ok(String::from_utf8(buf)?)
}
