use clap::Parser;
use spim_shell::core::commands::HELP;
use spim_shell::domain::ports::{Presenter, Simulator, SourceLoader, StagingFs};
use spim_shell::utils::{logger, validation::Validate};
use spim_shell::{
    CliConfig, Command, HostFs, Printer, Session, ShellContext, ShellSettings, SourceAcquirer,
    SpimError, SpimFfi, TerminalView,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let settings = match ShellSettings::resolve(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    logger::init_cli_logger(
        settings.verbose,
        settings.log_level.as_deref(),
        settings.log_format,
    );

    tracing::info!("Starting spim-shell");
    if settings.verbose {
        tracing::debug!("Settings: {:?}", settings);
    }

    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let printer = Printer::new();
    let context = ShellContext {
        loader: SourceAcquirer::with_timeout(settings.timeout())?,
        fs: HostFs::new(&settings.stage_root)?,
        simulator: SpimFfi::acquire(printer.clone())?,
        view: TerminalView::new(std::io::stdout()),
        printer,
        stage_path: settings.stage_path.clone(),
        memory_view: settings.memory_view,
    };
    let mut session = Session::new(context);

    // a failed first load is logged and the shell stays usable for `load`
    if let Err(e) = session.load(&settings.source_input()).await {
        report_error(&e);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e.user_friendly_message());
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }

        if let Err(e) = execute(&mut session, command).await {
            report_error(&e);
        }
    }

    tracing::info!("spim-shell finished");
    Ok(())
}

async fn execute<L, F, S, P>(session: &mut Session<L, F, S, P>, command: Command) -> spim_shell::Result<()>
where
    L: SourceLoader,
    F: StagingFs,
    S: Simulator,
    P: Presenter,
{
    match command {
        Command::Click(trigger) => session.click(trigger),
        Command::StepMany(count) => {
            let outcome = session.step_many(count)?;
            println!("{} (PC = 0x{:08x})", outcome, session.pc()?);
            Ok(())
        }
        Command::Registers => session.refresh_registers(),
        Command::SpecialRegisters => session.show_special_registers(),
        Command::Memory(view) => session.show_memory(view),
        Command::Register(index) => {
            let value = session.register(index)?;
            println!("R{} = {} (0x{:08x})", index, value, value);
            Ok(())
        }
        Command::Pc => {
            println!("PC = 0x{:08x}", session.pc()?);
            Ok(())
        }
        Command::Breakpoint(address) => session.add_breakpoint(address),
        Command::DeleteBreakpoint(address) => session.delete_breakpoint(address),
        Command::Load(input) => session.load(&input).await,
        Command::Report => {
            println!("{}", serde_json::to_string_pretty(&session.report())?);
            Ok(())
        }
        Command::Help => {
            println!("{}", HELP);
            Ok(())
        }
        Command::Quit => Ok(()),
    }
}

fn report_error(e: &SpimError) {
    tracing::error!("❌ {} (category: {:?})", e, e.category());
    eprintln!("❌ {}", e.user_friendly_message());
}
