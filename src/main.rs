mod ast;
mod builtins;
mod config;
mod error;
mod executor;
mod expander;
mod history;
mod job_control;
mod jobs;
mod logger;
mod parser;
mod process;
mod reaper;
mod shell;
mod signals;
mod spawn;

#[cfg(not(unix))]
compile_error!("mini-shell relies on Unix process control and only builds on Unix");

use std::io::{self, Write};

use config::ShellConfig;
use shell::Shell;

const PROMPT: &str = "mini-shell> ";

fn main() {
    let config = ShellConfig::from_env();
    signals::arm_alarm(config.alarm_secs);
    logger::init(config.log_level);

    if let Err(err) = signals::install() {
        eprintln!("mini-shell: {err}");
        std::process::exit(1);
    }
    log::debug!(
        "started (interactive: {}, alarm: {}s)",
        config.interactive,
        config.alarm_secs
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let mut shell = Shell::default();

    loop {
        shell.reap_and_report(&mut stdout);

        if config.interactive {
            print!("{PROMPT}");
            if stdout.flush().is_err() {
                break;
            }
        }

        let mut input = String::new();
        match stdin.read_line(&mut input) {
            Ok(0) => {
                if config.interactive {
                    println!();
                }
                break;
            }
            Ok(_) => {
                let line = input.trim_end_matches(['\n', '\r']);
                if line.trim().is_empty() {
                    continue;
                }

                shell.history.add(line);
                if let Some(code) = shell.run_line(line, &mut stdout, &mut stderr) {
                    let _ = stdout.flush();
                    std::process::exit(code);
                }
            }
            Err(error) => {
                eprintln!("mini-shell: error reading input: {error}");
                break;
            }
        }
    }

    let _ = stdout.flush();
    std::process::exit(0);
}
