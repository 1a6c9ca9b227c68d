use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap_complete::{generate, Shell};

use crate::app::AppError;

const BIN_NAME: &str = "recordbook";

pub fn generate_completions(shell: Shell, buf: &mut dyn Write) {
    let mut cmd = crate::cli::styled_command();
    generate(shell, &mut cmd, BIN_NAME, buf);
}

fn parse_shell(raw: &str) -> Option<Shell> {
    let name = raw.trim().rsplit('/').next()?.to_ascii_lowercase();
    match name.as_str() {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        "elvish" => Some(Shell::Elvish),
        "powershell" | "pwsh" => Some(Shell::PowerShell),
        _ => None,
    }
}

/// An explicit name wins; otherwise the basename of `$SHELL`.
fn resolve_shell(explicit: Option<&str>, shell_var: Option<&str>) -> Result<Shell, AppError> {
    match explicit {
        Some(name) => parse_shell(name)
            .ok_or_else(|| AppError::InvalidArgument(format!("unknown shell '{name}'"))),
        None => shell_var.and_then(parse_shell).ok_or_else(|| {
            AppError::InvalidArgument(
                "unable to detect shell from $SHELL; pass a shell name".to_string(),
            )
        }),
    }
}

fn install_path(shell: Shell, home: &Path) -> Option<PathBuf> {
    let path = match shell {
        Shell::Bash => home
            .join(".local/share/bash-completion/completions")
            .join(BIN_NAME),
        Shell::Zsh => home
            .join(".config/recordbook/completions")
            .join(format!("{BIN_NAME}.zsh")),
        Shell::Fish => home
            .join(".config/fish/completions")
            .join(format!("{BIN_NAME}.fish")),
        _ => return None,
    };
    Some(path)
}

fn install_completions(shell: Shell, home: &Path) -> io::Result<PathBuf> {
    let path = install_path(shell, home).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no install location for {shell:?}"),
        )
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut buf = Vec::new();
    generate_completions(shell, &mut buf);
    std::fs::write(&path, buf)?;

    if shell == Shell::Zsh {
        source_from_zshrc(&home.join(".zshrc"), &path)?;
    }
    Ok(path)
}

/// Appends a `source` line to `.zshrc` once.
fn source_from_zshrc(zshrc: &Path, script: &Path) -> io::Result<()> {
    let line = format!("source \"{}\"", script.display());
    match std::fs::read_to_string(zshrc) {
        Ok(content) if content.lines().any(|existing| existing.trim() == line) => return Ok(()),
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(zshrc)?;
    writeln!(file)?;
    writeln!(file, "# {BIN_NAME} shell completions")?;
    writeln!(file, "{line}")?;
    Ok(())
}

pub fn run_completions_command(shell_arg: Option<&str>, install: bool) -> Result<(), AppError> {
    let shell_var = std::env::var("SHELL").ok();
    let shell = resolve_shell(shell_arg, shell_var.as_deref())?;

    if !install {
        let mut stdout = io::stdout().lock();
        generate_completions(shell, &mut stdout);
        return Ok(());
    }

    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| AppError::InvalidArgument("HOME is not set".to_string()))?;
    let path = install_completions(shell, &home)?;
    println!("completions installed to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap_complete::Shell;

    use super::{generate_completions, install_completions, install_path, parse_shell, resolve_shell};

    fn temp_home() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "recordbook-completions-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).expect("temp home should be creatable");
        dir
    }

    #[test]
    fn shells_parse_from_names_and_paths() {
        assert_eq!(parse_shell("BASH"), Some(Shell::Bash));
        assert_eq!(parse_shell("/usr/bin/zsh"), Some(Shell::Zsh));
        assert_eq!(parse_shell("pwsh"), Some(Shell::PowerShell));
        assert_eq!(parse_shell("/bin/csh"), None);
    }

    #[test]
    fn explicit_shell_wins_over_environment() {
        assert_eq!(
            resolve_shell(Some("fish"), Some("/bin/zsh")).expect("explicit"),
            Shell::Fish
        );
        assert_eq!(
            resolve_shell(None, Some("/bin/zsh")).expect("detected"),
            Shell::Zsh
        );
        assert!(resolve_shell(None, None).is_err());
        assert!(resolve_shell(Some("nonsense"), Some("/bin/bash")).is_err());
    }

    #[test]
    fn bash_script_names_the_binary() {
        let mut buf = Vec::new();
        generate_completions(Shell::Bash, &mut buf);
        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains("recordbook"));
    }

    #[test]
    fn only_bash_zsh_and_fish_have_install_paths() {
        let home = PathBuf::from("/tmp/home");
        assert_eq!(
            install_path(Shell::Fish, &home),
            Some(home.join(".config/fish/completions/recordbook.fish"))
        );
        assert!(install_path(Shell::Elvish, &home).is_none());
        assert!(install_path(Shell::PowerShell, &home).is_none());
    }

    #[test]
    fn zsh_install_sources_script_once() {
        let home = temp_home();
        let path = install_completions(Shell::Zsh, &home).expect("zsh install");
        assert!(path.ends_with("recordbook.zsh"));
        install_completions(Shell::Zsh, &home).expect("second install");

        let rc = std::fs::read_to_string(home.join(".zshrc")).expect("zshrc");
        assert_eq!(rc.matches("source ").count(), 1);
        assert!(install_completions(Shell::Elvish, &home).is_err());
        let _ = std::fs::remove_dir_all(home);
    }
}
