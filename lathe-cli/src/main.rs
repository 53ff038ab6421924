use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use lathe_core::{CompilationUnit, Diagnostic, Emitter, LoadError, ModuleLoader};
use tracing::debug;
use wasmi::{Engine, Instance, Linker, Module, Store};

#[derive(Parser, Debug)]
#[command(name = "lathe", version, about, long_about = None)]
struct Cli {
    /// Source file to compile (reads stdin when omitted)
    #[arg(short, long)]
    input: Option<String>,

    /// Directory to write build artifacts into
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<String>,

    /// Unit name (defaults to the input file stem)
    #[arg(long)]
    name: Option<String>,

    /// Load and run the program in-process instead of writing artifacts
    #[arg(long)]
    run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Trace-level logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(cli.debug)
        .init();

    execute(cli)
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {path}"))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let name = cli
        .name
        .clone()
        .or_else(|| {
            cli.input.as_ref().and_then(|path| {
                Path::new(path)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
        })
        .unwrap_or_else(|| "main".to_string());

    let unit = CompilationUnit::parse(&name, &source);
    let emitter = Emitter::new(&unit);

    if cli.run {
        let mut module = match emitter.load(&WasmiLoader) {
            Ok(module) => module,
            Err(LoadError::CompilationFailed { diagnostics, .. }) => {
                render_diagnostics(&diagnostics);
                bail!("compilation of '{name}' failed");
            }
            Err(other) => return Err(other.into()),
        };
        let result = module.invoke_main()?;
        println!("Program exited with {result}");
        return Ok(ExitCode::SUCCESS);
    }

    let out_dir = cli
        .out_dir
        .context("--out-dir is required unless --run is given")?;
    let result = emitter.emit(Path::new(&out_dir))?;
    render_diagnostics(result.diagnostics());

    if result.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("build of '{name}' failed");
        Ok(ExitCode::FAILURE)
    }
}

fn render_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
}

/// Production loader: instantiates the finished binary with wasmi.
struct WasmiLoader;

struct LoadedModule {
    store: Store<()>,
    instance: Instance,
}

impl LoadedModule {
    fn invoke_main(&mut self) -> Result<i32> {
        let main = self
            .instance
            .get_typed_func::<(), i32>(&self.store, "main")
            .context("exported main function missing or has wrong type")?;
        main.call(&mut self.store, ())
            .context("failed to execute main")
    }
}

impl ModuleLoader for WasmiLoader {
    type Module = LoadedModule;
    type Error = wasmi::Error;

    fn load_module(
        &self,
        binary: &[u8],
        symbols: Option<&[u8]>,
    ) -> Result<LoadedModule, wasmi::Error> {
        if let Some(symbols) = symbols {
            // wasmi has no symbol input; the map only aids post-mortem
            // tooling.
            debug!(bytes = symbols.len(), "symbol stream ignored by wasmi");
        }
        let engine = Engine::default();
        let module = Module::new(&engine, binary)?;
        let linker = Linker::new(&engine);
        let mut store = Store::new(&engine, ());
        let instance = linker.instantiate(&mut store, &module)?.start(&mut store)?;
        Ok(LoadedModule { store, instance })
    }
}
