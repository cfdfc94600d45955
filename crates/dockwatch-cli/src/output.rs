//! Human mode prints one line per item to stdout; JSON mode prints
//! `{ "data": ... }`.

use anyhow::Result;
use serde::Serialize;
use serde_json::json;

use crate::opts::ClientOpts;

pub fn print_success<T: Serialize>(opts: &ClientOpts, data: &T, lines: Vec<String>) -> Result<()> {
    if opts.json {
        println!("{}", serde_json::to_string(&json!({ "data": data }))?);
    } else {
        for line in lines {
            println!("{line}");
        }
    }
    Ok(())
}
