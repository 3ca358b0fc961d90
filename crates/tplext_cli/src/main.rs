//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `tplext_core` linkage from a standalone executable.
//! - Show one template rendered before, during and after an extension is
//!   active; output is deterministic.

use std::process::ExitCode;
use tplext_core::{
    default_log_level, init_logging, option_map, Extension, ExtensionEntry, LogTarget, OptionMap,
    Renderer,
};

const DEMO_SOURCE: &str = "//Comment\n- $foo = 1\np=$foo";

struct TwigLikeExtension;

impl Extension for TwigLikeExtension {
    fn name(&self) -> &str {
        "tplext_cli::TwigLikeExtension"
    }

    fn options(&self) -> OptionMap {
        option_map([("execute_code", false)])
    }

    fn patterns(&self) -> OptionMap {
        option_map([
            ("html_comment", "{# %s #}"),
            ("handle_code", "{% %s %}"),
            ("display_code", "{{ %s|e }}"),
        ])
    }
}

fn main() -> ExitCode {
    if let Err(err) = init_logging(default_log_level(), LogTarget::Stderr) {
        eprintln!("tplext logging disabled: {err}");
    }
    println!("tplext_core version={}", tplext_core::core_version());
    match run_demo() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tplext demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo() -> Result<(), Box<dyn std::error::Error>> {
    let mut renderer = Renderer::default();
    let extension = ExtensionEntry::standard(TwigLikeExtension);
    let name = extension.id()?.to_string();

    println!("before: {}", renderer.render(DEMO_SOURCE)?);
    renderer.add_extension(&extension)?;
    println!("active: {}", renderer.render(DEMO_SOURCE)?);
    renderer.remove_extension(&name)?;
    println!("after:  {}", renderer.render(DEMO_SOURCE)?);
    Ok(())
}
