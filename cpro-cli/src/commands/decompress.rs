//! Decompress command implementation.

use cpro_container::{decompress, read_header};
use log::info;
use std::path::Path;

pub fn cmd_decompress(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::read(input)?;
    let header = read_header(&file)?;
    let data = decompress(&file)?;
    std::fs::write(output, &data)?;

    info!(
        "{} -> {} ({}, {} bytes)",
        input.display(),
        output.display(),
        header.compressor,
        data.len()
    );
    println!(
        "Decompressed {} to {} ({} bytes)",
        input.display(),
        output.display(),
        data.len()
    );
    Ok(())
}
