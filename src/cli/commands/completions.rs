//! Shell completion generation.

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::args::Cli;
use crate::error::OffsyncError;

/// Execute the completions command.
///
/// # Errors
///
/// Returns an error for an unknown shell name.
pub fn completions(shell: &str, install: bool) -> Result<String, OffsyncError> {
    let shell = shell_from_str(shell).ok_or_else(|| {
        OffsyncError::NotFound(format!(
            "unknown shell '{shell}' (expected bash, zsh, fish, powershell or elvish)"
        ))
    })?;

    if install {
        return Ok(install_instructions(shell));
    }
    generate_completions(shell)
}

/// Generate the completion script for `shell`.
///
/// # Errors
///
/// Returns an error if the generated script is not valid UTF-8.
pub fn generate_completions(shell: Shell) -> Result<String, OffsyncError> {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut cmd, "offsync", &mut buf);
    String::from_utf8(buf).map_err(|e| OffsyncError::Config(format!("UTF-8 error: {e}")))
}

/// Get shell from string name.
#[must_use]
pub fn shell_from_str(s: &str) -> Option<Shell> {
    match s.to_lowercase().as_str() {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        "powershell" | "ps" | "pwsh" => Some(Shell::PowerShell),
        "elvish" => Some(Shell::Elvish),
        _ => None,
    }
}

fn install_instructions(shell: Shell) -> String {
    match shell {
        Shell::Bash => "# Add to ~/.bashrc:\nsource <(offsync completions bash)\n".to_string(),
        Shell::Zsh => "# Save to a directory in $fpath:\n\
                       offsync completions zsh > ~/.zsh/completions/_offsync\n"
            .to_string(),
        Shell::Fish => "offsync completions fish > ~/.config/fish/completions/offsync.fish\n"
            .to_string(),
        Shell::PowerShell => {
            "# Add to $PROFILE:\noffsync completions powershell | Out-String | Invoke-Expression\n"
                .to_string()
        }
        Shell::Elvish => "offsync completions elvish > ~/.elvish/lib/offsync.elv\n".to_string(),
        _ => "Unknown shell".to_string(),
    }
}
