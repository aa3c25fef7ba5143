use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use patchcov_core::{OutputFormat, ParseMode, PatchcovConfig, PatchcovError};
use patchcov_difflens::changeset::build_change_sets;
use patchcov_difflens::filter::SourceFilter;
use patchcov_difflens::prefix::PathPrefix;
use patchcov_report::correlate::correlate;
use patchcov_report::github::{parse_pr_reference, GitHubClient};
use patchcov_report::render::{render, RenderOptions};
use patchcov_report::summary::{CoverageSummary, GateStatus};

const CONFIG_FILE: &str = ".patchcov.toml";

#[derive(Parser)]
#[command(
    name = "patchcov",
    version,
    about = "Flag added lines that no test executes",
    long_about = "patchcov compares the lines a change adds against a Go coverage profile\n\
                   and reports every added line that no test executed.\n\n\
                   Examples:\n  \
                     patchcov check --cover-file cover.out               Check `git diff` in the current repo\n  \
                     git diff main | patchcov check --diff-file - ...    Check a diff from stdin\n  \
                     patchcov check --pr owner/repo#1 --post-comment ... Comment on a GitHub pull request\n  \
                     patchcov init                                       Write a .patchcov.toml template\n\n\
                   Exit status: 0 when every added line is covered, 1 when uncovered lines\n\
                   were found, 2 on error."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .patchcov.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for the report.\n\n\
                       Formats:\n  \
                         text      Header, file paths and uncovered lines (default)\n  \
                         markdown  The same report inside one fenced code block\n  \
                         json      Machine-readable summary with camelCase keys"
    )]
    format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Report added lines not covered by tests
    #[command(long_about = "Report added lines not covered by tests.\n\n\
        Reads a unified diff, keeps the added lines of non-test source files, and marks\n\
        each one covered when a block of the coverage profile with a non-zero hit count\n\
        contains it. Blank lines and lone closing braces never count as uncovered.\n\n\
        Examples:\n  patchcov check --cover-file cover.out --base origin/main\n  \
        patchcov check --cover-file cover.out --diff-file change.patch --prefix-from-go-mod")]
    Check(CheckArgs),
    /// Create a default .patchcov.toml configuration file
    Init,
    /// Generate shell completions
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Coverage profile written by `go test -coverprofile`
    #[arg(long, env = "COVER_FILE")]
    cover_file: Option<PathBuf>,

    /// Read the diff from a file ("-" for stdin)
    #[arg(long, conflicts_with = "pr")]
    diff_file: Option<PathBuf>,

    /// Repository to run `git diff` in when no diff source is given
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Revision to diff the working tree against (default: the index)
    #[arg(long, conflicts_with_all = ["diff_file", "pr"])]
    base: Option<String>,

    /// GitHub pull request (owner/repo#123)
    #[arg(long)]
    pr: Option<String>,

    /// GitHub token for pull request access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Post the markdown report as a pull request comment instead of printing it
    #[arg(long)]
    post_comment: bool,

    /// Prefix joined in front of every diff path
    #[arg(long, conflicts_with_all = ["prefix_from_go_mod", "gopath_base"])]
    prefix: Option<String>,

    /// Read the prefix from the module directive of go.mod in --repo
    #[arg(long, conflicts_with = "gopath_base")]
    prefix_from_go_mod: bool,

    /// Derive the prefix from the working directory under $GOPATH/src plus this directory
    #[arg(long)]
    gopath_base: Option<String>,

    /// Fail on a malformed diff instead of treating it as empty
    #[arg(long)]
    strict: bool,
}

const DEFAULT_CONFIG: &str = r#"# patchcov configuration

[diff]
# source_suffixes = [".go"]
# test_suffixes = ["_test.go"]
# skip_patterns = ["vendor/**", "*.pb.go"]
# strict = false

[paths]
# Prefix joined in front of diff paths to match the file names in the profile.
# prefix = "github.com/acme/widgets"
# from_go_mod = false

[report]
# header = "Please note the following code is not covered by tests."
# fence_language = "go"
"#;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    })) {
        eprintln!("failed to install error handler: {e}");
    }
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(status) => status,
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .ok();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Check(args) => {
            let config = load_config(cli.config.as_deref())?;
            check(args, &config, cli.format).await
        }
        Command::Init => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
            Ok(ExitCode::SUCCESS)
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "patchcov", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<PatchcovConfig> {
    let config = match explicit {
        Some(path) => PatchcovConfig::from_file(path)
            .wrap_err_with(|| format!("failed to load {}", path.display()))?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                PatchcovConfig::from_file(default_path)?
            } else {
                PatchcovConfig::default()
            }
        }
    };
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

async fn check(args: CheckArgs, config: &PatchcovConfig, format: OutputFormat) -> Result<ExitCode> {
    // Everything that can be rejected without touching the filesystem or network.
    let cover_file = args.cover_file.clone().ok_or_else(|| {
        PatchcovError::Config("no coverage profile given. Pass --cover-file or set COVER_FILE".into())
    })?;
    if args.post_comment && args.pr.is_none() {
        return Err(PatchcovError::Config("--post-comment requires --pr".into()).into());
    }
    let pull_request = match &args.pr {
        Some(pr_ref) => {
            let pr = parse_pr_reference(pr_ref)?;
            let client = GitHubClient::new(args.github_token.as_deref().unwrap_or_default())?;
            Some((client, pr))
        }
        None => None,
    };

    let mode = if args.strict {
        ParseMode::Strict
    } else {
        config.diff.parse_mode()
    };
    let filter = SourceFilter::from_config(&config.diff);
    let prefix = resolve_prefix(&args, config)?;
    tracing::debug!(?mode, ?prefix, "resolved check options");

    let profile = patchcov_profile::parse_profile(&cover_file)?;
    tracing::debug!(
        blocks = profile.block_count(),
        mode = ?profile.mode(),
        "coverage profile loaded"
    );

    let diff_text = match &pull_request {
        Some((client, pr)) => client.get_pr_diff(pr).await?,
        None => match &args.diff_file {
            Some(path) => read_diff_file(path)?,
            None => git_diff(&args.repo, args.base.as_deref())?,
        },
    };

    let change_sets = build_change_sets(&diff_text, &prefix, &filter, mode)?;
    let change_sets = correlate(change_sets, &profile);
    let summary = CoverageSummary::from_change_sets(&change_sets);
    let status = match summary.status {
        GateStatus::Covered => ExitCode::SUCCESS,
        GateStatus::Uncovered => ExitCode::from(1),
    };

    if args.post_comment {
        let body = render(&change_sets, &RenderOptions::from_config(&config.report, true));
        if body.is_empty() {
            tracing::info!("every added line is covered; no comment posted");
        } else if let Some((client, pr)) = &pull_request {
            let url = client.post_comment(pr, &body).await?;
            println!("Created a comment at {url}");
        }
        return Ok(status);
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary).into_diagnostic()?;
            println!("{json}");
        }
        OutputFormat::Text | OutputFormat::Markdown => {
            let options =
                RenderOptions::from_config(&config.report, format == OutputFormat::Markdown);
            let report = render(&change_sets, &options);
            if !report.is_empty() {
                println!("{report}");
            }
        }
    }

    Ok(status)
}

fn resolve_prefix(args: &CheckArgs, config: &PatchcovConfig) -> Result<PathPrefix> {
    if let Some(prefix) = &args.prefix {
        return Ok(PathPrefix::new(prefix));
    }
    if args.prefix_from_go_mod {
        return Ok(PathPrefix::from_go_mod(&args.repo)?);
    }
    if let Some(base_dir) = &args.gopath_base {
        let gopath = std::env::var_os("GOPATH").ok_or_else(|| {
            PatchcovError::Config("--gopath-base requires the GOPATH environment variable".into())
        })?;
        let working_dir = std::env::current_dir().into_diagnostic()?;
        return Ok(PathPrefix::from_gopath(
            &working_dir,
            Path::new(&gopath),
            base_dir,
        ));
    }
    if let Some(prefix) = &config.paths.prefix {
        return Ok(PathPrefix::new(prefix));
    }
    if config.paths.from_go_mod {
        return Ok(PathPrefix::from_go_mod(&args.repo)?);
    }
    Ok(PathPrefix::none())
}

fn read_diff_file(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .into_diagnostic()
            .wrap_err("failed to read diff from stdin")?;
        return Ok(input);
    }
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))
}

fn git_diff(repo: &Path, base: Option<&str>) -> Result<String> {
    let mut cmd = std::process::Command::new("git");
    // Pin the output shape regardless of the user's diff.* settings.
    cmd.arg("-C")
        .arg(repo)
        .args(["diff", "--no-color", "--no-ext-diff", "--src-prefix=a/", "--dst-prefix=b/"]);
    if let Some(base) = base {
        cmd.arg(base);
    }
    tracing::debug!(repo = %repo.display(), ?base, "running git diff");

    let output = cmd
        .output()
        .map_err(|e| PatchcovError::Git(format!("failed to run git: {e}")))?;
    if !output.status.success() {
        return Err(PatchcovError::Git(format!(
            "git diff failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ))
        .into());
    }
    String::from_utf8(output.stdout)
        .map_err(|e| PatchcovError::Git(format!("git diff output is not UTF-8: {e}")).into())
}
