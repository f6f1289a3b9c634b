//! Command-line front end, enabled by the `cli` feature.

mod progress;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::Level;

use crate::compression::CompressionMethod;
use crate::error::{Error, Result};
use crate::formats::lsf;
use crate::pak::{self, PakReader, PakWriteOptions};
use crate::utils::BTree;

use self::progress::ConsoleProgress;

#[derive(Parser)]
#[command(
    name = "lskit",
    version,
    about = "LSF resource and LSPK archive tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List the contents of an archive in name order
    List {
        archive: PathBuf,

        /// Also print per-entry sizes and compression methods
        #[arg(short, long)]
        long: bool,
    },
    /// Extract an archive (or one entry of it) into a directory
    Extract {
        archive: PathBuf,

        #[arg(default_value = ".")]
        dest: PathBuf,

        /// Extract only this entry
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Pack a directory into a new archive
    Create {
        source: PathBuf,
        archive: PathBuf,

        /// Store entries uncompressed
        #[arg(long)]
        uncompressed: bool,

        /// Archive load priority
        #[arg(long, default_value_t = 0)]
        priority: u8,
    },
    /// Show header details of an archive or LSF resource
    Info { path: PathBuf },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::List { archive, long } => list(&archive, long),
        Command::Extract {
            archive,
            dest,
            file,
        } => extract(&archive, &dest, file.as_deref()),
        Command::Create {
            source,
            archive,
            uncompressed,
            priority,
        } => create(&source, &archive, uncompressed, priority),
        Command::Info { path } => info(&path),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn list(archive: &Path, long: bool) -> Result<()> {
    let reader = PakReader::open(archive)?;
    let mut names: BTree<&str, &pak::FileEntry> = BTree::new();
    for entry in reader.entries() {
        names.insert(&entry.name, entry);
    }
    for (name, entry) in names.in_order() {
        if long {
            println!("{:>12}  {:<5} {name}", entry.size(), entry.method().as_str());
        } else {
            println!("{name}");
        }
    }
    Ok(())
}

fn extract(archive: &Path, dest: &Path, file: Option<&str>) -> Result<()> {
    let reader = PakReader::open(archive)?;
    match file {
        Some(name) => reader.extract_file(name, &dest.join(name)),
        None => reader.extract_all(dest, &ConsoleProgress::new()),
    }
}

fn create(source: &Path, archive: &Path, uncompressed: bool, priority: u8) -> Result<()> {
    let options = PakWriteOptions {
        compression: if uncompressed {
            CompressionMethod::None
        } else {
            CompressionMethod::Lz4
        },
        priority,
        ..PakWriteOptions::default()
    };
    pak::create_from_directory(source, archive, &options, &ConsoleProgress::new())
}

fn info(path: &Path) -> Result<()> {
    let mut magic = [0u8; 4];
    {
        use std::io::Read as _;
        let mut file = std::fs::File::open(path)?;
        file.read_exact(&mut magic)?;
    }
    match &magic {
        b"LSPK" => pak_info(path),
        b"LSOF" => lsf_info(path),
        other => Err(Error::InvalidPath(format!(
            "{}: unrecognized magic {other:?}",
            path.display()
        ))),
    }
}

fn pak_info(path: &Path) -> Result<()> {
    let reader = PakReader::open(path)?;
    let header = reader.header();
    let total: u64 = reader.entries().iter().map(pak::FileEntry::size).sum();
    println!("LSPK archive, version {}", pak::PAK_VERSION);
    println!("  files:     {}", reader.entries().len());
    println!("  parts:     {}", header.num_parts);
    println!("  priority:  {}", header.priority);
    println!("  flags:     {:#04x}", header.flags);
    println!("  content:   {total} bytes uncompressed");
    Ok(())
}

fn lsf_info(path: &Path) -> Result<()> {
    let resource = lsf::read(path)?;
    println!("LSF resource, engine version {}", resource.version);
    println!("  nodes:     {}", resource.node_count());
    println!("  regions:   {}", resource.regions().len());
    for (name, id) in resource.regions() {
        let children = resource.children_of(*id).count();
        println!("    {name} ({children} children)");
    }
    Ok(())
}
