use anyhow::Result;
use clap::Parser;
use repotool::{
    application::Interrupt,
    commands::{RunOptions, config::Config, run},
    config::{CONFIG_FILE, MAPPING_FILE},
    package::{IdentityStrategy, PackageFile},
    runtime::RealRuntime,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// repotool - Manage Arch Linux packages and repositories
///
/// Adds built packages to the repositories they belong to, optionally
/// removing other versions and mirroring the result with rsync.
///
/// The exit code is the number of packages that could not be added.
///
/// Examples:
///   repotool foo-1.0-1-x86_64.pkg.tar.zst      # Add to the mapped repositories
///   repotool -R myrepo -c -r *.pkg.tar.zst      # Add, clean and mirror myrepo
///   repotool -R myrepo                          # List the packages in myrepo
#[derive(Parser, Debug)]
#[command(author, version = env!("REPOTOOL_VERSION"), about)]
struct Cli {
    /// The packages to add to the repository
    #[arg(value_name = "PACKAGE")]
    packages: Vec<PackageFile>,

    /// The target repository
    #[arg(short = 'R', long, value_name = "NAME")]
    repository: Option<String>,

    /// Remove other versions of the package from the repository
    #[arg(short, long)]
    clean: bool,

    /// Invoke rsync with the delete flag
    #[arg(short, long)]
    delete: bool,

    /// Config file to read
    #[arg(short = 'f', long, env = "REPOTOOL_CONFIG", default_value = CONFIG_FILE, value_name = "FILE")]
    config_file: PathBuf,

    /// Package / repository mapping file to read
    #[arg(short, long, env = "REPOTOOL_MAPPING", default_value = MAPPING_FILE, value_name = "FILE")]
    mapping_file: PathBuf,

    /// Rsync the repository to the configured location
    #[arg(short, long)]
    rsync: bool,

    /// Sign the packages and repository
    #[arg(short, long)]
    sign: bool,

    /// Do not sign, regardless of the repository configuration
    #[arg(long, conflicts_with = "sign")]
    no_sign: bool,

    /// The rsync target
    #[arg(short, long, value_name = "TARGET")]
    target: Option<String>,

    /// Also add the packages `makepkg --packagelist` reports for DIR
    #[arg(short, long, value_name = "DIR", num_args = 0..=1, default_missing_value = ".")]
    packagelist: Option<PathBuf>,

    /// How to derive pkgbase and version of a package file
    #[arg(long, value_enum, env = "REPOTOOL_IDENTITY", default_value_t = IdentityStrategy::Filename)]
    identity: IdentityStrategy,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn sign(&self) -> Option<bool> {
        match (self.sign, self.no_sign) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn into_options(self) -> RunOptions {
        RunOptions {
            sign: self.sign(),
            packages: self.packages,
            packagelist: self.packagelist,
            repository: self.repository,
            clean: self.clean,
            rsync: self.rsync,
            target: self.target,
            delete: self.delete,
        }
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args())
        })
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let interrupt = Interrupt::new();
    interrupt.install()?;

    let config = Config::new(RealRuntime, &cli.config_file, &cli.mapping_file, cli.identity)?;
    let failures = run(config, cli.into_options(), &interrupt)?;

    Ok(ExitCode::from(u8::try_from(failures).unwrap_or(u8::MAX)))
}
