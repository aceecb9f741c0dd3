use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::{Context, IntoDiagnostic};

use kiln_backend_core::{BackendOptions, BackendRegistry, OutputKind};
use kiln_backend_sycl::SyclBackend;
use kiln_opt::{BlockSimplify, Pass};

/// Kiln: lowered kernel IR to SYCL source
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Input module (JSON)
    input: PathBuf,

    /// Target backend
    #[arg(short, long, default_value = "sycl")]
    target: String,

    /// Output path (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit declarations only
    #[arg(long)]
    header: bool,

    /// Wrap kernels in C linkage for runtime compilation
    #[arg(long)]
    rtc: bool,

    /// Dump IR to stderr before backend compilation
    #[arg(long)]
    emit_ir: bool,

    /// Load and validate without producing output
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    // 1. Read the module.
    let source = std::fs::read_to_string(&cli.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", cli.input.display()))?;
    let mut module: kiln_ir::Module = serde_json::from_str(&source)
        .into_diagnostic()
        .wrap_err("malformed module JSON")?;

    // 2. Validate handles and names.
    module
        .validate()
        .map_err(|e| miette::miette!("{e}"))
        .wrap_err("invalid module")?;
    log::info!(
        "loaded module `{}` with {} function(s)",
        module.name,
        module.functions.len()
    );

    // 3. Flatten nested blocks.
    if BlockSimplify.run(&mut module) {
        log::debug!("{} rewrote at least one function", BlockSimplify.name());
    }

    // 4. Optionally dump IR to stderr.
    if cli.emit_ir {
        eprintln!("{}", kiln_ir::dump_module(&module));
    }

    // 5. Dry-run: stop here.
    if cli.dry_run {
        return Ok(());
    }

    // 6. Backend dispatch.
    let mut registry = BackendRegistry::with_builtins();
    registry.register(Box::new(SyclBackend::new()));
    let backend = registry.find(&cli.target).ok_or_else(|| {
        let available = registry.list_targets().join(", ");
        miette::miette!("unknown target '{}' (available: {})", cli.target, available)
    })?;

    let opts = BackendOptions {
        output_kind: if cli.header {
            OutputKind::Header
        } else {
            OutputKind::Implementation
        },
        runtime_compile: cli.rtc,
    };
    log::debug!("compiling with {} backend, {opts}", backend.name());

    let output = backend
        .compile(&module, &opts)
        .map_err(|e| miette::miette!("{e}"))
        .wrap_err("backend compilation failed")?;

    // 7. Print diagnostics.
    for diag in &output.diagnostics {
        eprintln!("{:?}: {}", diag.level, diag.message);
    }

    // 8. Write output.
    for file in &output.files {
        match &cli.output {
            Some(path) => {
                std::fs::write(path, &file.content)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            }
            None => print!("{}", file.content),
        }
    }

    Ok(())
}
