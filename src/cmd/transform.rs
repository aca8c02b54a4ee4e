//! Flat/nested conversion commands (`sitepress flatten` and `sitepress unflatten`).

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use sitepress::path_transform::{flatten, unflatten};
use sitepress::site::api::decode_form;

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

pub fn cmd_flatten(file: Option<&Path>) -> Result<()> {
    let input = read_input(file)?;
    let document: Value = serde_json::from_str(&input).context("Input is not valid JSON")?;
    let flat = flatten(&document);
    println!("{}", serde_json::to_string_pretty(&flat)?);
    Ok(())
}

pub fn cmd_unflatten(file: Option<&Path>, form: bool) -> Result<()> {
    let input = read_input(file)?;
    let flat = if form {
        decode_form(input.trim_end())?
    } else {
        match serde_json::from_str(&input).context("Input is not valid JSON")? {
            Value::Object(map) => map,
            _ => bail!("Expected a JSON object of flat keys"),
        }
    };
    let document = unflatten(&flat)?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
