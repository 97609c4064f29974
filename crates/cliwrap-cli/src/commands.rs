// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subcommand implementations.

use anyhow::{Context, Result, bail};
use cliwrap_config::load_config;
use cliwrap_exec::Executable;
use std::path::Path;

use crate::params::record_from_params;

fn load(path: Option<&Path>) -> Result<Executable> {
    let config = load_config(path).context("load config")?;
    config.build().context("build executable from config")
}

pub fn list(path: Option<&Path>) -> Result<()> {
    let exe = load(path)?;
    match exe.resolve_program() {
        Some(found) => println!("program: {} ({})", exe.program(), found.display()),
        None => println!("program: {} (not found on PATH)", exe.program()),
    }
    for command in exe.commands() {
        let slots: Vec<&str> = command.slots().iter().map(|s| s.name()).collect();
        println!("{}\t{}", command.name(), slots.join(" "));
    }
    Ok(())
}

pub fn args(path: Option<&Path>, name: &str, params: &[String]) -> Result<()> {
    let exe = load(path)?;
    let command = exe
        .get(name)
        .with_context(|| format!("unknown command '{name}'"))?;
    let record = record_from_params(params)?;
    let arguments = command
        .construct_arguments(&record)
        .with_context(|| format!("construct arguments for '{name}'"))?;
    println!("{arguments}");
    Ok(())
}

pub async fn run(path: Option<&Path>, name: &str, params: &[String], json: bool) -> Result<()> {
    let exe = load(path)?;
    let record = record_from_params(params)?;
    let execution = exe
        .create_execution(name, &record)
        .with_context(|| format!("prepare '{name}'"))?;
    tracing::info!(
        target: "cliwrap.exec",
        program = execution.program(),
        arguments = execution.arguments(),
        "running"
    );
    let lines: Vec<String> = execution
        .parse_as_list()
        .await
        .with_context(|| format!("run '{name}'"))?;
    let exit = execution.exit_info();

    if json {
        let out = serde_json::json!({
            "command": name,
            "program": execution.program(),
            "arguments": execution.arguments(),
            "output": lines,
            "exit_code": exit.and_then(|e| e.code),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for line in &lines {
            println!("{line}");
        }
    }

    match exit {
        Some(info) if info.success => Ok(()),
        Some(info) => bail!(
            "'{}' exited unsuccessfully (code {:?})",
            execution.program(),
            info.code
        ),
        None => bail!("'{}' did not report an exit status", execution.program()),
    }
}

pub fn schema() -> Result<()> {
    let schema = cliwrap_config::config_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
