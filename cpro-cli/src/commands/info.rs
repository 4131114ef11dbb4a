//! Info command implementation.

use cpro_container::{FileHeader, HEADER_SIZE, read_header};
use serde::Serialize;
use std::path::Path;

/// Header fields as reported by `cpro info`.
#[derive(Debug, Serialize)]
pub struct HeaderInfo {
    pub file: String,
    pub version: u16,
    pub algorithm: &'static str,
    pub original_size: u64,
    pub compressed_size: u64,
    pub file_size: u64,
    pub crc32: String,
    pub ratio: Option<f64>,
}

impl HeaderInfo {
    pub fn new(file: &Path, header: &FileHeader) -> Self {
        let file_size = HEADER_SIZE as u64 + header.compressed_size;
        let ratio =
            (header.original_size > 0).then_some(file_size as f64 / header.original_size as f64);
        Self {
            file: file.display().to_string(),
            version: header.version,
            algorithm: header.compressor.name(),
            original_size: header.original_size,
            compressed_size: header.compressed_size,
            file_size,
            crc32: format!("{:08x}", header.crc),
            ratio,
        }
    }
}

pub fn cmd_info(file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(file)?;
    let header = read_header(&data)?;
    let info = HeaderInfo::new(file, &header);

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("CPRO File Information");
    println!("=====================");
    println!("File: {}", info.file);
    println!("Format version: {}", info.version);
    println!("Algorithm: {}", info.algorithm);
    println!("Original size: {} bytes", info.original_size);
    println!("Payload size: {} bytes", info.compressed_size);
    println!("CRC-32: {}", info.crc32);
    if let Some(ratio) = info.ratio {
        println!("Compression ratio: {:.1}%", (1.0 - ratio) * 100.0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpro_container::CompressorId;

    #[test]
    fn test_info_json_fields() {
        let header = FileHeader::new(CompressorId::Huffman, 100, 23, 0xCAFE);
        let info = HeaderInfo::new(Path::new("x.cpro"), &header);
        let value: serde_json::Value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["algorithm"], "huffman");
        assert_eq!(value["original_size"], 100);
        assert_eq!(value["file_size"], 50);
        assert_eq!(value["crc32"], "0000cafe");
        assert_eq!(value["ratio"], 0.5);
    }

    #[test]
    fn test_empty_original_has_no_ratio() {
        let header = FileHeader::new(CompressorId::Null, 0, 0, 0);
        let info = HeaderInfo::new(Path::new("empty.cpro"), &header);
        assert!(info.ratio.is_none());
    }
}
