//! Frames file
//!
//! One frame per line: the ingress interface index, then the frame bytes in
//! hex. Hex may be split by whitespace. Blank lines and `#` comments are
//! skipped.
//!
//! ```text
//! # access side, untagged IPv4
//! 4 0200000000aa 0200000000bb 0800 4500...
//! ```

use anyhow::{bail, Context, Result};

/// One frame to replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    /// Line the frame came from
    pub line: usize,
    /// Ingress interface index
    pub ingress: u32,
    /// Frame bytes
    pub bytes: Vec<u8>,
}

/// Parse a frames file
pub fn parse(text: &str) -> Result<Vec<FrameRecord>> {
    let mut frames = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let mut fields = content.split_whitespace();
        let ingress = match fields.next() {
            Some(field) => field
                .parse::<u32>()
                .with_context(|| format!("line {}: invalid ingress ifindex `{}`", line, field))?,
            None => continue,
        };

        let hex: String = fields.collect();
        if hex.is_empty() {
            bail!("line {}: no frame bytes", line);
        }
        let bytes =
            hex::decode(&hex).with_context(|| format!("line {}: invalid hex frame", line))?;

        frames.push(FrameRecord {
            line,
            ingress,
            bytes,
        });
    }

    Ok(frames)
}

/// Load and parse a frames file
pub fn load(path: &str) -> Result<Vec<FrameRecord>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    parse(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        let text = "\
# comment
4 0200 0000 00aa  # trailing comment

3 ffffffffffff
";
        let frames = parse(text).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].line, 2);
        assert_eq!(frames[0].ingress, 4);
        assert_eq!(frames[0].bytes, vec![0x02, 0x00, 0x00, 0x00, 0x00, 0xaa]);
        assert_eq!(frames[1].ingress, 3);
        assert_eq!(frames[1].bytes, vec![0xff; 6]);
    }

    #[test]
    fn test_bad_ingress() {
        let err = parse("eth0 0800").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_missing_bytes() {
        assert!(parse("4").is_err());
    }

    #[test]
    fn test_odd_hex() {
        let err = parse("\n4 080").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
