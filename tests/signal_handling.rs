use std::io::Write;
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

fn run_shell(lines: &[&str]) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mini-shell"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn mini-shell");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        for line in lines {
            let _ = writeln!(stdin, "{line}");
        }
    }

    child.wait_with_output().expect("wait output")
}

#[test]
fn pipeline_sigpipe_does_not_abort_shell() {
    // head exits after one line; yes then dies of SIGPIPE, not the shell.
    let output = run_shell(&["yes | head -1", "echo ALIVE", "echo STATUS:$?"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("y\n"), "stdout was: {stdout}");
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(stdout.contains("STATUS:0"), "stdout was: {stdout}");
    assert!(output.status.success(), "shell did not exit cleanly");
}

#[test]
fn shell_ignores_sigtstp_at_prompt() {
    let output = run_shell(&["kill -TSTP $$", "echo ALIVE"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
}

// Unlike a conventional shell, which forwards SIGINT only to the foreground
// job and keeps running, Ctrl-C here terminates every job and the shell.
#[test]
fn interrupt_terminates_jobs_and_shell() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mini-shell"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn mini-shell");

    // Keep stdin open so the shell is still at its prompt when interrupted.
    let mut stdin = child.stdin.take().expect("stdin");
    writeln!(stdin, "sleep 30 &").expect("write line");
    thread::sleep(Duration::from_millis(300));

    let rc = unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGINT) };
    assert_eq!(rc, 0);

    // Returns promptly only if the background sleep was terminated too,
    // since it holds the other end of the stdout pipe.
    let output = child.wait_with_output().expect("wait output");
    drop(stdin);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout.ends_with("\nmini-shell terminated\n"), "stdout was: {stdout}");
}

#[test]
fn interrupt_terminates_foreground_command() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mini-shell"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn mini-shell");

    let mut stdin = child.stdin.take().expect("stdin");
    writeln!(stdin, "sleep 30").expect("write line");
    thread::sleep(Duration::from_millis(300));

    let rc = unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGINT) };
    assert_eq!(rc, 0);

    let output = child.wait_with_output().expect("wait output");
    drop(stdin);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("mini-shell terminated"));
}

fn run_shell_with_alarm(secs: &str, lines: &[&str]) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mini-shell"))
        .env("MINISH_ALARM_SECS", secs)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn mini-shell");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        for line in lines {
            let _ = writeln!(stdin, "{line}");
        }
    }

    child.wait_with_output().expect("wait output")
}

#[test]
fn alarm_ends_a_long_running_shell() {
    let output = run_shell_with_alarm("1", &["sleep 3", "echo AFTER"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.signal(), Some(libc::SIGALRM));
    assert!(!stdout.contains("AFTER"), "stdout was: {stdout}");
}

#[test]
fn zero_alarm_seconds_leaves_the_alarm_unarmed() {
    let output = run_shell_with_alarm("0", &["sleep 2", "echo AFTER"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout.contains("AFTER"), "stdout was: {stdout}");
}
