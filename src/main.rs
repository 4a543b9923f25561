use anyhow::Result;
use clap::Parser;
use distrodb::commands::{self, Report};
use distrodb::runtime::RealRuntime;
use distrodb::{Config, Distro};
use std::path::PathBuf;
use std::sync::Arc;

/// distrodb - query the native package database of the running distribution
///
/// Detects the distribution (RPM, APT, Portage, Conary, Solaris or a JHBuild
/// environment) and answers version, file, dependency and translation
/// catalog queries through its package manager.
///
/// Set CERTIFIED_GNOMIE=yes to force the JHBuild backend.
///
/// Examples:
///   distrodb detect
///   distrodb version glib2
///   distrodb domains gedit --lang de_DE.UTF-8
#[derive(Parser, Debug)]
#[command(author, version = env!("DISTRODB_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Filesystem root to inspect (also via DISTRODB_ROOT)
    #[arg(long, env = "DISTRODB_ROOT", value_name = "PATH", global = true)]
    root: Option<PathBuf>,

    /// Config file (also via DISTRODB_CONFIG)
    #[arg(long, env = "DISTRODB_CONFIG", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Show the detected distribution
    Detect,

    /// Show the upstream version of an installed package
    Version(PackageArgs),

    /// List the files owned by a package
    Files(PackageArgs),

    /// List the packages a package depends on
    Deps(PackageArgs),

    /// List gettext catalogs below the locale directories
    MoFiles(MoFilesArgs),

    /// List the gettext catalogs of a package and its dependencies
    PackageMoFiles(PackageMoFilesArgs),

    /// List the translation domains of a package and its dependencies
    Domains(DomainsArgs),

    /// Show which queries the package database supports
    Capabilities,
}

#[derive(clap::Args, Debug)]
struct PackageArgs {
    /// Package name
    #[arg(value_name = "PACKAGE")]
    package: String,
}

#[derive(clap::Args, Debug)]
struct MoFilesArgs {
    /// Only search this locale, e.g. "de" or "pt_BR"
    #[arg(long, value_name = "LOCALE")]
    locale: Option<String>,
}

#[derive(clap::Args, Debug)]
struct PackageMoFilesArgs {
    /// Package name
    #[arg(value_name = "PACKAGE")]
    package: String,

    /// Ignore the package's dependencies
    #[arg(long)]
    no_deps: bool,
}

#[derive(clap::Args, Debug)]
struct DomainsArgs {
    /// Package name
    #[arg(value_name = "PACKAGE")]
    package: String,

    /// Ignore the package's dependencies
    #[arg(long)]
    no_deps: bool,

    /// Language used to pick Ubuntu language packs
    #[arg(long, env = "LANG", value_name = "LANG")]
    lang: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let runtime = Arc::new(RealRuntime);
    let mut config = Config::load(&*runtime, cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config = config.with_root(root);
    }

    let distro = Distro::detect(runtime, &config)?;

    let report: Report = match cli.command {
        Commands::Detect => commands::detect(&distro),
        Commands::Version(args) => commands::version(&distro, &args.package)?,
        Commands::Files(args) => commands::files(&distro, &args.package)?,
        Commands::Deps(args) => commands::dependencies(&distro, &args.package)?,
        Commands::MoFiles(args) => commands::mo_files(&distro, args.locale.as_deref())?,
        Commands::PackageMoFiles(args) => {
            commands::package_mo_files(&distro, &args.package, !args.no_deps)?
        }
        Commands::Domains(args) => {
            commands::domains(&distro, &args.package, !args.no_deps, args.lang.as_deref())?
        }
        Commands::Capabilities => commands::capabilities(&distro),
    };
    report.print(cli.json)
}
