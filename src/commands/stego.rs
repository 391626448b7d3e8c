//! `stego encode` and `stego decode`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use mugshot_origin::stego::{decode_file, encode_file};

pub fn encode(input: PathBuf, output: PathBuf, message: String) -> Result<()> {
    encode_file(&input, &message, &output)
        .with_context(|| format!("Failed to encode message into {}", input.display()))?;
    println!("Message encoded and saved to {}", output.display());
    Ok(())
}

pub fn decode(input: PathBuf) -> Result<()> {
    let message = decode_file(&input)
        .with_context(|| format!("Failed to decode message from {}", input.display()))?;
    println!("{message}");
    Ok(())
}
