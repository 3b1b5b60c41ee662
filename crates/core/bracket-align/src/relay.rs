//! Console relay for the aligner's output streams.
//!
//! Standard output is echoed as it arrives, indented with [`PREFIX`] after
//! every line break. Standard error is collected whole and printed as one
//! indented block afterwards. Both streams end at EOF or at the first NUL
//! byte.

use std::io::Write;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Left margin put in front of every relayed line.
pub const PREFIX: &str = "  > ";

const CHUNK: usize = 4096;

/// Echo `reader` to `out` live, indenting every line.
///
/// Returns the number of bytes relayed.
pub async fn relay_live<R, W>(mut reader: R, out: &mut W) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    write!(out, "\n{PREFIX}")?;
    out.flush()?;

    let mut buf = [0u8; CHUNK];
    let mut translated = Vec::with_capacity(CHUNK);
    let mut total = 0;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        let (chunk, hit_nul) = until_nul(&buf[..n]);
        translated.clear();
        for &byte in chunk {
            if byte == b'\n' {
                translated.push(b'\n');
                translated.extend_from_slice(PREFIX.as_bytes());
            } else {
                translated.push(byte);
            }
        }
        out.write_all(&translated)?;
        out.flush()?;
        total += chunk.len();

        if hit_nul {
            break;
        }
    }

    write!(out, "\n\n")?;
    out.flush()?;
    Ok(total)
}

/// Read `reader` to EOF or the first NUL byte.
pub async fn read_until_nul<R>(mut reader: R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut collected = Vec::new();
    let mut buf = [0u8; CHUNK];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let (chunk, hit_nul) = until_nul(&buf[..n]);
        collected.extend_from_slice(chunk);
        if hit_nul {
            break;
        }
    }
    Ok(collected)
}

/// Format a buffered stream as an indented block.
///
/// Surrounding whitespace is trimmed; `None` when nothing is left.
pub fn format_block(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let indented = text.replace('\n', &format!("\n{PREFIX}"));
    Some(format!("\n{PREFIX}{indented}\n\n"))
}

fn until_nul(bytes: &[u8]) -> (&[u8], bool) {
    match bytes.iter().position(|&b| b == 0) {
        Some(pos) => (&bytes[..pos], true),
        None => (bytes, false),
    }
}
