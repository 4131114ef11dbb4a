//! Compress command implementation.

use cpro_container::{CompressorId, compress};
use log::info;
use std::path::Path;

pub fn cmd_compress(
    input: &Path,
    output: &Path,
    algorithm: CompressorId,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    let file = compress(&data, algorithm)?;
    std::fs::write(output, &file)?;

    info!(
        "{} -> {} ({}, {} -> {} bytes)",
        input.display(),
        output.display(),
        algorithm,
        data.len(),
        file.len()
    );
    println!(
        "Compressed {} ({} bytes) to {} ({} bytes) using {}",
        input.display(),
        data.len(),
        output.display(),
        file.len(),
        algorithm
    );
    Ok(())
}
