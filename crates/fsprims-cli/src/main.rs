use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use fsprims_core::{
    exit_codes,
    schema::{
        BOOT_TIME_V1, DIR_LISTING_V1, FILE_STATUS_V1, LINE_READ_V1, PATH_RESOLUTION_V1,
        PID_FILE_STATUS_V1,
    },
    FsprimsError, FsprimsResult,
};
use fsprims_fs::{
    close, close_dir, root_filesystem, set_root_filesystem, FileKind, FileStatus, OpenFlags,
    RootFs, MAX_PATH_LEN,
};
use fsprims_line::{Encoding, LineReader};
use fsprims_pidfile::{read_pid, PidFile};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// File primitives for agents that inspect a host filesystem mounted
/// somewhere else.
#[derive(Parser, Debug)]
#[command(name = "fsprims", version, about, long_about = None)]
struct Cli {
    /// The format for log output.
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// The minimum log level to display.
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: tracing::Level,

    /// Directory where the monitored host's root filesystem is mounted.
    ///
    /// Absolute paths given to the file commands are resolved under this
    /// directory. PID files are never redirected.
    #[arg(long, value_name = "DIR", env = "FSPRIMS_ROOT_FS", global = true)]
    root_fs: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the physical path a logical path resolves to.
    Resolve(ResolveArgs),

    /// Show file status.
    Stat(StatArgs),

    /// Show the target of a symbolic link.
    Readlink(ReadlinkArgs),

    /// List a directory.
    Ls(LsArgs),

    /// Read lines from a file, one block read per line.
    ///
    /// Prints each line with its byte offset and the offset to pass to
    /// --offset to continue where this run stopped.
    Lines(LinesArgs),

    /// Inspect or hold a PID file.
    #[command(subcommand)]
    Pid(PidCommand),

    /// Show the host boot time from /proc/stat.
    Boottime(BoottimeArgs),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Resolve(_) => "resolve",
            Command::Stat(_) => "stat",
            Command::Readlink(_) => "readlink",
            Command::Ls(_) => "ls",
            Command::Lines(_) => "lines",
            Command::Pid(PidCommand::Read(_)) => "pid read",
            Command::Pid(PidCommand::Hold(_)) => "pid hold",
            Command::Boottime(_) => "boottime",
        }
    }
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    /// Logical path.
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Size of the output buffer in bytes; longer results are truncated.
    #[arg(long, value_name = "BYTES", default_value_t = MAX_PATH_LEN)]
    capacity: usize,

    /// Output as human-readable text.
    #[arg(long)]
    table: bool,
}

#[derive(Parser, Debug)]
struct StatArgs {
    /// Logical path.
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Output as human-readable text.
    #[arg(long)]
    table: bool,
}

#[derive(Parser, Debug)]
struct ReadlinkArgs {
    /// Logical path of the link.
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Size of the target buffer in bytes; longer targets are truncated.
    #[arg(long, value_name = "BYTES", default_value_t = MAX_PATH_LEN)]
    capacity: usize,
}

#[derive(Parser, Debug)]
struct LsArgs {
    /// Logical path of the directory.
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Include the "." and ".." entries.
    #[arg(short = 'a', long)]
    all: bool,

    /// Output as human-readable table.
    #[arg(long)]
    table: bool,
}

#[derive(Parser, Debug)]
struct LinesArgs {
    /// Logical path of the file.
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Text encoding name (e.g. UTF-16LE, UnicodeBig, UTF-32).
    ///
    /// Unknown names and the empty string mean a single-byte encoding.
    #[arg(short = 'e', long, value_name = "NAME", default_value = "")]
    encoding: String,

    /// Read buffer size in bytes; longer lines come back in pieces.
    #[arg(long, value_name = "BYTES", default_value_t = 4096)]
    buffer_size: usize,

    /// Byte offset to start reading from.
    #[arg(long, value_name = "OFFSET", default_value_t = 0)]
    offset: u64,

    /// Stop after this many lines.
    #[arg(short = 'n', long, value_name = "N")]
    max_lines: Option<usize>,

    /// Output as human-readable text.
    #[arg(long)]
    table: bool,
}

#[derive(Subcommand, Debug)]
enum PidCommand {
    /// Print the PID stored in a PID file.
    Read(PidReadArgs),

    /// Create and lock a PID file, hold it, then remove it.
    ///
    /// Fails with exit code 10 if another instance holds the file.
    Hold(PidHoldArgs),
}

#[derive(Parser, Debug)]
struct PidReadArgs {
    /// Path of the PID file.
    #[arg(value_name = "PATH")]
    path: PathBuf,
}

#[derive(Parser, Debug)]
struct PidHoldArgs {
    /// Path of the PID file.
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// How long to hold the file, in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 0)]
    seconds: u64,
}

#[derive(Parser, Debug)]
struct BoottimeArgs {
    /// Output as human-readable text.
    #[arg(long)]
    table: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Eq)]
enum LogFormat {
    /// Human-readable text format.
    Text,
    /// Machine-readable JSON format.
    Json,
}

fn main() {
    let cli = Cli::parse();

    // Initialize the tracing subscriber
    let filter = EnvFilter::from_default_env().add_directive(cli.log_level.into());

    match cli.log_format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }

    if let Some(root) = cli.root_fs {
        debug!(root = %root.display(), "Using redirected root filesystem");
        if let Err(err) = set_root_filesystem(RootFs::new(root)) {
            eprintln!("Error: {err}");
            std::process::exit(err.error_code());
        }
    }

    let Some(command) = cli.command else {
        if let Err(err) = Cli::command().print_help() {
            eprintln!("Error: {err}");
            std::process::exit(FsprimsError::io("write", "", err).error_code());
        }
        return;
    };

    let name = command.name();
    info!(command = name, "Running command");
    match run_command(command) {
        Ok(exit_code) => {
            info!(command = name, exit_code, "Command finished");
            std::process::exit(exit_code);
        }
        Err(err) => {
            debug!(
                command = name,
                code = err.error_code(),
                os_error = ?err.raw_os_error(),
                "Command failed"
            );
            eprintln!("Error: {err}");
            std::process::exit(err.error_code());
        }
    }
}

fn run_command(command: Command) -> FsprimsResult<i32> {
    match command {
        Command::Resolve(args) => run_resolve(args),
        Command::Stat(args) => run_stat(args),
        Command::Readlink(args) => run_readlink(args),
        Command::Ls(args) => run_ls(args),
        Command::Lines(args) => run_lines(args),
        Command::Pid(PidCommand::Read(args)) => run_pid_read(args),
        Command::Pid(PidCommand::Hold(args)) => run_pid_hold(args),
        Command::Boottime(args) => run_boottime(args),
    }
}

fn success() -> FsprimsResult<i32> {
    Ok(i32::from(exit_codes::EXIT_SUCCESS))
}

fn print_json<T: Serialize>(value: &T) -> FsprimsResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| FsprimsError::internal(format!("JSON serialization failed: {e}")))?;
    println!("{text}");
    Ok(())
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// ============================================================================
// Resolve command
// ============================================================================

#[derive(Serialize)]
struct ResolveJson {
    schema_id: &'static str,
    root: Option<String>,
    logical: String,
    physical: String,
}

fn run_resolve(args: ResolveArgs) -> FsprimsResult<i32> {
    let rootfs = root_filesystem();
    let physical = rootfs.resolve_bounded(&args.path, args.capacity);

    if args.table {
        println!("{}", physical.display());
        return success();
    }

    print_json(&ResolveJson {
        schema_id: PATH_RESOLUTION_V1,
        root: rootfs.root().map(display),
        logical: display(&args.path),
        physical: display(&physical),
    })?;
    success()
}

// ============================================================================
// Stat command
// ============================================================================

#[derive(Serialize)]
struct FileStatusJson<'a> {
    schema_id: &'static str,
    path: String,
    physical: String,
    #[serde(flatten)]
    status: &'a FileStatus,
}

fn run_stat(args: StatArgs) -> FsprimsResult<i32> {
    let rootfs = root_filesystem();
    let status = rootfs.stat(&args.path)?;

    if args.table {
        print_status_table(&args.path, &status);
        return success();
    }

    print_json(&FileStatusJson {
        schema_id: FILE_STATUS_V1,
        path: display(&args.path),
        physical: display(&rootfs.resolve(&args.path)),
        status: &status,
    })?;
    success()
}

fn print_status_table(path: &Path, status: &FileStatus) {
    println!("{:<10} {}", "Path:", path.display());
    println!("{:<10} {}", "Kind:", kind_str(Some(status.kind)));
    println!("{:<10} {}", "Size:", status.size);
    println!("{:<10} {}", "Readonly:", status.readonly);
    if let Some(mode) = status.mode {
        println!("{:<10} {:o}", "Mode:", mode & 0o7777);
    }
    println!(
        "{:<10} {}",
        "Modified:",
        status.modified.as_deref().unwrap_or("-")
    );
}

fn kind_str(kind: Option<FileKind>) -> &'static str {
    match kind {
        Some(FileKind::Regular) => "file",
        Some(FileKind::Directory) => "dir",
        Some(FileKind::Symlink) => "symlink",
        Some(FileKind::Other) => "other",
        None => "-",
    }
}

// ============================================================================
// Readlink command
// ============================================================================

fn run_readlink(args: ReadlinkArgs) -> FsprimsResult<i32> {
    let target = root_filesystem().read_link(&args.path, args.capacity)?;
    println!("{}", target.display());
    success()
}

// ============================================================================
// Ls command
// ============================================================================

#[derive(Serialize)]
struct DirEntryJson {
    name: String,
    kind: Option<FileKind>,
}

#[derive(Serialize)]
struct DirListingJson {
    schema_id: &'static str,
    path: String,
    entries: Vec<DirEntryJson>,
}

fn run_ls(args: LsArgs) -> FsprimsResult<i32> {
    let mut dir = root_filesystem().open_dir(&args.path)?;

    let mut entries = Vec::new();
    while let Some(entry) = dir.next_entry() {
        if !args.all && (entry.name == "." || entry.name == "..") {
            continue;
        }
        entries.push(DirEntryJson {
            name: entry.name.to_string_lossy().into_owned(),
            kind: entry.kind,
        });
    }
    close_dir(dir)?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    if args.table {
        println!("{:<8} NAME", "KIND");
        println!("{:-<60}", "");
        if entries.is_empty() {
            println!("(empty directory)");
        }
        for entry in &entries {
            println!("{:<8} {}", kind_str(entry.kind), entry.name);
        }
        return success();
    }

    print_json(&DirListingJson {
        schema_id: DIR_LISTING_V1,
        path: display(&args.path),
        entries,
    })?;
    success()
}

// ============================================================================
// Lines command
// ============================================================================

#[derive(Serialize)]
struct LineJson {
    offset: u64,
    length: usize,
    text: String,
}

#[derive(Serialize)]
struct LineReadJson {
    schema_id: &'static str,
    path: String,
    encoding: Encoding,
    start_offset: u64,
    next_offset: u64,
    lines: Vec<LineJson>,
}

fn run_lines(args: LinesArgs) -> FsprimsResult<i32> {
    let encoding = Encoding::from_name(&args.encoding);
    let file = root_filesystem().open(&args.path, OpenFlags::READ)?;
    let mut reader = LineReader::at_offset(file, args.offset, args.buffer_size, encoding)?;

    let mut lines = Vec::new();
    while args.max_lines.map_or(true, |max| lines.len() < max) {
        let offset = reader.offset();
        let Some(line) = reader.next_line()? else {
            break;
        };
        lines.push(LineJson {
            offset,
            length: line.len(),
            text: encoding.decode(line),
        });
    }

    let next_offset = reader.offset();
    close(reader.into_inner())?;

    if args.table {
        for line in &lines {
            println!("{:>10} {}", line.offset, line.text.trim_end_matches(['\r', '\n']));
        }
        return success();
    }

    print_json(&LineReadJson {
        schema_id: LINE_READ_V1,
        path: display(&args.path),
        encoding,
        start_offset: args.offset,
        next_offset,
        lines,
    })?;
    success()
}

// ============================================================================
// Pid commands
// ============================================================================

#[derive(Serialize)]
struct PidFileStatusJson {
    schema_id: &'static str,
    path: String,
    pid: u32,
    held: bool,
}

fn run_pid_read(args: PidReadArgs) -> FsprimsResult<i32> {
    let pid = read_pid(&args.path)?;
    println!("{pid}");
    success()
}

fn run_pid_hold(args: PidHoldArgs) -> FsprimsResult<i32> {
    let mut pid_file = PidFile::create(&args.path)?;

    print_json(&PidFileStatusJson {
        schema_id: PID_FILE_STATUS_V1,
        path: display(pid_file.path()),
        pid: pid_file.pid(),
        held: pid_file.is_held(),
    })?;
    // Waiting callers read stdout before contending for the lock.
    io::stdout()
        .flush()
        .map_err(|e| FsprimsError::io("flush", "", e))?;

    if args.seconds > 0 {
        info!(seconds = args.seconds, "Holding PID file");
        std::thread::sleep(Duration::from_secs(args.seconds));
    }

    pid_file.remove();
    success()
}

// ============================================================================
// Boottime command
// ============================================================================

#[derive(Serialize)]
struct BootTimeJson {
    schema_id: &'static str,
    boot_time_unix: u64,
    boot_time: String,
}

fn run_boottime(args: BoottimeArgs) -> FsprimsResult<i32> {
    let btime = read_boot_time(root_filesystem())?;
    let boot_time = format_unix_time(btime)?;

    if args.table {
        println!("{boot_time}");
        return success();
    }

    print_json(&BootTimeJson {
        schema_id: BOOT_TIME_V1,
        boot_time_unix: btime,
        boot_time,
    })?;
    success()
}

/// Boot time in seconds since the epoch, from the `btime` line of /proc/stat.
fn read_boot_time(rootfs: &RootFs) -> FsprimsResult<u64> {
    let mut stream = rootfs.open_stream("/proc/stat", "r")?;
    let physical = stream.path().to_path_buf();

    let mut btime = None;
    for line in (&mut stream).lines() {
        let line = line.map_err(|e| FsprimsError::io("read", &physical, e))?;
        if let Some(value) = parse_btime(&line) {
            btime = Some(value);
            break;
        }
    }
    stream.close()?;

    btime.ok_or_else(|| {
        let message = format!("Cannot find a line with \"btime\" in {}.", physical.display());
        FsprimsError::io("read", &physical, io::Error::new(io::ErrorKind::InvalidData, message))
    })
}

fn parse_btime(line: &str) -> Option<u64> {
    line.strip_prefix("btime ")?.trim().parse().ok()
}

fn format_unix_time(secs: u64) -> FsprimsResult<String> {
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    let secs = i64::try_from(secs)
        .map_err(|_| FsprimsError::invalid_argument(format!("timestamp {secs} out of range")))?;
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .ok_or_else(|| FsprimsError::invalid_argument(format!("timestamp {secs} out of range")))
}
