use std::io::Write;

use crate::job_control;
use crate::shell::Shell;

/// The list of all builtin command names.
const BUILTINS: &[&str] = &["cd", "pwd", "help", "history", "exit", "jobs", "fg", "bg"];

#[derive(Debug, PartialEq)]
pub enum BuiltinAction {
    Continue(i32),
    Exit(i32),
}

/// Returns true if the command name is a shell builtin.
pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Execute a builtin command, writing output to the provided streams.
pub fn execute(
    program: &str,
    args: &[String],
    shell: &mut Shell,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> BuiltinAction {
    match program {
        "cd" => BuiltinAction::Continue(builtin_cd(args, stderr)),
        "pwd" => BuiltinAction::Continue(builtin_pwd(stdout, stderr)),
        "help" => BuiltinAction::Continue(builtin_help(stdout)),
        "history" => {
            shell.history.print(stdout);
            BuiltinAction::Continue(0)
        }
        "exit" => builtin_exit(args, shell.last_status, stderr),
        "jobs" => BuiltinAction::Continue(job_control::jobs(&shell.jobs, stdout)),
        "fg" => BuiltinAction::Continue(job_control::fg(
            args,
            &mut shell.jobs,
            shell.procs.as_mut(),
            stdout,
            stderr,
        )),
        "bg" => BuiltinAction::Continue(job_control::bg(
            args,
            &mut shell.jobs,
            shell.procs.as_mut(),
            stdout,
            stderr,
        )),
        _ => {
            let _ = writeln!(stderr, "mini-shell: unknown builtin: {program}");
            BuiltinAction::Continue(1)
        }
    }
}

fn builtin_cd(args: &[String], stderr: &mut dyn Write) -> i32 {
    let target = match args.first() {
        Some(dir) if dir == "-" => match std::env::var("OLDPWD") {
            Ok(prev) => prev,
            Err(_) => {
                let _ = writeln!(stderr, "cd: OLDPWD not set");
                return 1;
            }
        },
        Some(dir) => dir.clone(),
        None => std::env::var("HOME").unwrap_or_else(|_| "/".to_string()),
    };

    let previous = std::env::current_dir();

    if let Err(e) = std::env::set_current_dir(&target) {
        let _ = writeln!(stderr, "cd: {target}: {e}");
        return 1;
    }

    // SAFETY: environment variables are only touched from the main thread;
    // the Ctrl-C thread never reads them.
    if let Ok(cwd) = previous {
        unsafe { std::env::set_var("OLDPWD", cwd) };
    }

    0
}

fn builtin_pwd(stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32 {
    match std::env::current_dir() {
        Ok(path) => {
            let _ = writeln!(stdout, "{}", path.display());
            0
        }
        Err(e) => {
            let _ = writeln!(stderr, "pwd: {e}");
            1
        }
    }
}

fn builtin_help(stdout: &mut dyn Write) -> i32 {
    let _ = write!(
        stdout,
        "Built-in commands:\n\
         \x20 cd [dir]    Change directory\n\
         \x20 pwd         Print current working directory\n\
         \x20 exit [n]    Exit the shell with status n (default: last status)\n\
         \x20 help        Show this help message\n\
         \x20 jobs        List background or stopped jobs\n\
         \x20 fg [id]     Move a job into the foreground\n\
         \x20 bg [id]     Resume a stopped job in the background\n\
         \x20 history     Show command history\n"
    );
    0
}

/// `exit [n]`: `n` is truncated to 0-255; the default is the last status.
fn builtin_exit(args: &[String], last_status: i32, stderr: &mut dyn Write) -> BuiltinAction {
    match args.first() {
        None => BuiltinAction::Exit(last_status & 0xFF),
        Some(s) => match s.parse::<i64>() {
            Ok(code) => BuiltinAction::Exit((code & 0xFF) as i32),
            Err(_) => {
                let _ = writeln!(stderr, "exit: {s}: numeric argument required");
                BuiltinAction::Exit(2)
            }
        },
    }
}
