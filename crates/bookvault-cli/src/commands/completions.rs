use std::io::{self, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::aot::Generator;
use clap_complete::{generate, shells};

use crate::cli::{Cli, CompletionShell};
use crate::error::CliError;

pub fn run_completions(shell: CompletionShell, output_path: Option<&Path>) -> Result<(), CliError> {
    let script = render_completions(shell);

    if let Some(path) = output_path {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &script)?;
        println!("{}", path.display());
    } else {
        io::stdout().write_all(&script)?;
    }

    Ok(())
}

fn render_completions(shell: CompletionShell) -> Vec<u8> {
    let mut command = Cli::command();
    let bin_name = command.get_name().to_string();
    let mut script = Vec::new();
    match shell {
        CompletionShell::Bash => render_for(shells::Bash, &mut command, &bin_name, &mut script),
        CompletionShell::Zsh => render_for(shells::Zsh, &mut command, &bin_name, &mut script),
        CompletionShell::Fish => render_for(shells::Fish, &mut command, &bin_name, &mut script),
    }
    script
}

fn render_for<G: Generator>(
    generator: G,
    command: &mut clap::Command,
    bin_name: &str,
    script: &mut Vec<u8>,
) {
    generate(generator, command, bin_name, script);
}
