use console::style;

/// Entry point for the `git-remote-migrate` binary.
///
/// Delegates to the CLI entry function and exits the process with the
/// returned exit code. Fatal errors are printed and exit with status code 1.
fn main() {
    match git_remote_migrate::cli::entry() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}", style(format!("Error: {e}")).red().bold());
            std::process::exit(1)
        }
    }
}
