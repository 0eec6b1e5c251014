use anyhow::Context;
use argh::FromArgs;
use nemu_sdb::expr::Evaluator;
use nemu_sdb::flat::{self, FlatMachine};
use nemu_sdb::io_adapters::{Readline, ScriptedLines};
use nemu_sdb::machine::Machine;
use nemu_sdb::{Console, Mode};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(FromArgs)]
/// Monitor for a program running on a flat-memory machine.
struct Args {
    #[argh(switch, short = 'b')]
    /// run the program to completion without prompting.
    batch: bool,

    #[argh(option, short = 'l')]
    /// write the log to this file instead of stderr.
    log: Option<PathBuf>,

    #[argh(option, from_str_fn(parse_hex), default = "flat::DEFAULT_MEM_BASE")]
    /// guest address RAM and the image start at, as a 0x-prefixed hex literal.
    mem_base: u32,

    #[argh(option, default = "flat::DEFAULT_MEM_SIZE")]
    /// size of guest RAM in bytes.
    mem_size: usize,

    #[argh(positional)]
    /// raw image to load; a built-in program is used when omitted.
    image: Option<PathBuf>,
}

fn parse_hex(value: &str) -> Result<u32, String> {
    let evaluator = Evaluator::compile().map_err(|e| e.to_string())?;
    evaluator.eval(value).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args: Args = argh::from_env();
    nemu_sdb::log::init(args.log.as_deref())?;

    let mut machine = FlatMachine::new(args.mem_base, args.mem_size);
    let loaded = match &args.image {
        Some(path) => machine.load_image_file(path)?,
        None => machine
            .load_builtin_image()
            .context("failed to load the built-in image")?,
    };
    info!(
        bytes = loaded,
        base = format_args!("{:#x}", args.mem_base),
        image = ?args.image,
        "image loaded"
    );

    let mut console = Console::new(machine, std::io::stdout(), Mode::Interactive)?;
    let machine = if args.batch {
        console.enable_batch_mode();
        console.run(&mut ScriptedLines::default())?
    } else {
        println!("Welcome to the NEMU monitor!");
        println!("For help, type \"help\"");
        console.run(&mut Readline::new()?)?
    };

    Ok(if machine.state().is_good() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
