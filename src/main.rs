use std::io;
use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use dns_manager::infrastructure::tracing::{TracingOutput, init_tracing};

mod cli;

use cli::GlobalArgs;

#[derive(Parser)]
#[command(name = "dns-manager")]
#[command(about = "Configure BIND and dnsmasq on remote hosts over ssh")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with the defaults and the given connection flags
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Manage a BIND name server
    Bind {
        #[command(subcommand)]
        command: BindCommand,
    },

    /// Manage a dnsmasq forwarder
    Dnsmasq {
        #[command(subcommand)]
        command: DnsmasqCommand,
    },

    /// Show operations run from this machine (filtered by --host if given)
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value_t = 50)]
        lines: usize,

        /// Delete the history file
        #[arg(long)]
        clear: bool,
    },

    /// Print a shell completion script
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum BindCommand {
    /// Install bind and bind-utils and start named
    Install,

    /// Write named.conf with the given forwarders
    Configure {
        /// Upstream resolver (repeatable)
        #[arg(long = "forwarder", required = true)]
        forwarders: Vec<IpAddr>,

        /// Fall back to recursion when forwarders do not answer
        #[arg(long)]
        forward_first: bool,
    },

    /// Create or rewrite a forward zone
    AddZone {
        /// Zone name, e.g. example.com
        zone: String,

        /// Record as "NAME TYPE VALUE", e.g. "www A 192.168.1.10" (repeatable)
        #[arg(long = "record", conflicts_with = "file")]
        records: Vec<String>,

        /// TOML file with the zone's records
        #[arg(long)]
        file: Option<PathBuf>,

        /// Make this a slave zone of the given master (repeatable)
        #[arg(long = "master", conflicts_with_all = ["records", "file"])]
        masters: Vec<IpAddr>,

        /// SOA serial (defaults to the current UNIX time)
        #[arg(long)]
        serial: Option<u32>,

        /// Name server for the NS records (repeatable)
        #[arg(long = "nameserver")]
        nameservers: Vec<String>,
    },

    /// Create or rewrite the reverse zone of a network
    AddPtrZone {
        /// Network in CIDR form: /8, /16 or /24
        network: String,

        /// Record as "IP=HOSTNAME" (repeatable)
        #[arg(long = "record", conflicts_with = "file")]
        records: Vec<String>,

        /// TOML file with the PTR records
        #[arg(long)]
        file: Option<PathBuf>,

        /// SOA serial (defaults to the current UNIX time)
        #[arg(long)]
        serial: Option<u32>,

        /// Name server for the NS records (repeatable)
        #[arg(long = "nameserver")]
        nameservers: Vec<String>,
    },

    /// Remove a zone file and its registration
    DeleteZone {
        zone: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// List registered zones
    ListZones,
}

#[derive(Subcommand)]
enum DnsmasqCommand {
    /// Install dnsmasq and start it
    Install,

    /// Write dnsmasq.conf with the given upstream servers
    Configure {
        /// Upstream server (repeatable)
        #[arg(long = "server", required = true)]
        servers: Vec<IpAddr>,

        /// Number of cached names, 0 disables the cache
        #[arg(long, default_value_t = 0)]
        cache_size: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "dns-manager", &mut io::stdout());
        return Ok(());
    }

    let output = match &cli.global.log_file {
        Some(path) => TracingOutput::File(path.clone()),
        None => TracingOutput::Stderr,
    };
    init_tracing(cli.global.verbose, output)?;

    match cli.command {
        Commands::Init { force } => cli::init::execute(&cli.global, force),
        Commands::Bind { command } => {
            let ctx = cli::Context::load(&cli.global)?;
            match command {
                BindCommand::Install => cli::bind::install(&ctx),
                BindCommand::Configure {
                    forwarders,
                    forward_first,
                } => cli::bind::configure(&ctx, forwarders, forward_first),
                BindCommand::AddZone {
                    zone,
                    records,
                    file,
                    masters,
                    serial,
                    nameservers,
                } => cli::bind::add_zone(
                    &ctx,
                    cli::bind::ZoneArgs {
                        zone,
                        records,
                        file,
                        masters,
                        serial,
                        nameservers,
                    },
                ),
                BindCommand::AddPtrZone {
                    network,
                    records,
                    file,
                    serial,
                    nameservers,
                } => cli::bind::add_ptr_zone(
                    &ctx,
                    cli::bind::PtrZoneArgs {
                        network,
                        records,
                        file,
                        serial,
                        nameservers,
                    },
                ),
                BindCommand::DeleteZone { zone, force } => {
                    cli::bind::delete_zone(&ctx, zone, force)
                }
                BindCommand::ListZones => cli::bind::list_zones(&ctx),
            }
        }
        Commands::Dnsmasq { command } => {
            let ctx = cli::Context::load(&cli.global)?;
            match command {
                DnsmasqCommand::Install => cli::dnsmasq::install(&ctx),
                DnsmasqCommand::Configure {
                    servers,
                    cache_size,
                } => cli::dnsmasq::configure(&ctx, servers, cache_size),
            }
        }
        Commands::History { lines, clear } => {
            cli::history::execute(lines, clear, cli.global.host.as_deref())
        }
        Commands::Completions { .. } => Ok(()),
    }
}
