//! `.cube` text format for 3D LUTs.
//!
//! ```text
//! TITLE "MoodTransfer Color Grade"
//! LUT_3D_SIZE 33
//!
//! 0.000000 0.000000 0.000000      ← (r=0, g=0, b=0)
//! 0.031250 0.000000 0.000000      ← (r=1, g=0, b=0)
//! ...
//! ```
//!
//! Data lines run with **b outermost, g in the middle, r fastest**. That is
//! the reverse of the in-memory [`Lut3D`] order (r outermost), so both
//! directions translate indices explicitly.
//!
//! The reader accepts `#` comments, `TITLE`, `LUT_3D_SIZE`, and
//! `DOMAIN_MIN`/`DOMAIN_MAX` when they describe the unit cube. 1D LUTs are
//! rejected.

use std::path::Path;

use tracing::info;

use crate::error::{Result, TransferError};
use crate::transform::lut::Lut3D;

/// Title written when the caller has none.
pub const DEFAULT_TITLE: &str = "MoodTransfer Color Grade";

/// A parsed `.cube` file.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeFile {
    pub title: Option<String>,
    pub lut: Lut3D,
}

/// Serialize `lut` to `.cube` text.
pub fn write_cube(lut: &Lut3D, title: &str) -> String {
    let n = lut.size();
    let mut out = String::with_capacity(n * n * n * 27 + 64);
    out.push_str(&format!("TITLE \"{title}\"\nLUT_3D_SIZE {n}\n\n"));
    for b in 0..n {
        for g in 0..n {
            for r in 0..n {
                let [x, y, z] = lut.get(r, g, b);
                out.push_str(&format!("{x:.6} {y:.6} {z:.6}\n"));
            }
        }
    }
    out
}

/// Parse `.cube` text.
pub fn parse_cube(text: &str) -> Result<CubeFile> {
    let mut title = None;
    let mut size: Option<usize> = None;
    let mut data: Vec<[f32; 3]> = Vec::new();
    let mut expected = 0usize;
    let mut last_line = 0usize;

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        last_line = line_no;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else { continue };

        match head {
            "TITLE" => {
                let rest = line["TITLE".len()..].trim();
                title = Some(rest.trim_matches('"').to_string());
            }
            "LUT_3D_SIZE" => {
                if size.is_some() {
                    return Err(parse_error(line_no, "duplicate LUT_3D_SIZE"));
                }
                let n: usize = tokens
                    .next()
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| parse_error(line_no, "LUT_3D_SIZE needs an integer"))?;
                if !(Lut3D::MIN_SIZE..=Lut3D::MAX_SIZE).contains(&n) {
                    return Err(parse_error(line_no, format!("unsupported LUT_3D_SIZE {n}")));
                }
                size = Some(n);
                expected = n * n * n;
                data.reserve(expected);
            }
            "LUT_1D_SIZE" => {
                return Err(parse_error(line_no, "1D LUTs are not supported"));
            }
            "DOMAIN_MIN" | "DOMAIN_MAX" => {
                let want = if head == "DOMAIN_MIN" { 0.0 } else { 1.0 };
                let values = parse_triple(tokens, line_no)?;
                if values.iter().any(|&v| (v - want).abs() > 1e-6) {
                    return Err(parse_error(
                        line_no,
                        format!("{head} must be {want} {want} {want}"),
                    ));
                }
            }
            _ if head.parse::<f32>().is_ok() => {
                if size.is_none() {
                    return Err(parse_error(line_no, "data before LUT_3D_SIZE"));
                }
                if data.len() == expected {
                    return Err(parse_error(line_no, "more data lines than LUT_3D_SIZE allows"));
                }
                data.push(parse_triple(line.split_whitespace(), line_no)?);
            }
            other => {
                return Err(parse_error(line_no, format!("unknown keyword {other}")));
            }
        }
    }

    let n = size.ok_or_else(|| parse_error(last_line, "missing LUT_3D_SIZE"))?;
    if data.len() != expected {
        return Err(parse_error(
            last_line,
            format!("expected {expected} data lines, found {}", data.len()),
        ));
    }

    // File order is b-outer, r-fastest; memory order is r-outer, b-fastest.
    let mut nodes = vec![[0.0_f32; 3]; expected];
    for (i, value) in data.into_iter().enumerate() {
        let r = i % n;
        let g = (i / n) % n;
        let b = i / (n * n);
        nodes[(r * n + g) * n + b] = value;
    }

    Ok(CubeFile {
        title,
        lut: Lut3D::from_data(n, nodes)?,
    })
}

/// Write `lut` to `path` as `.cube` text.
pub fn save_cube(lut: &Lut3D, path: &Path, title: &str) -> Result<()> {
    std::fs::write(path, write_cube(lut, title))?;
    info!(path = %path.display(), size = lut.size(), "saved .cube LUT");
    Ok(())
}

/// Read a `.cube` file from `path`.
pub fn load_cube(path: &Path) -> Result<CubeFile> {
    let text = std::fs::read_to_string(path)?;
    let cube = parse_cube(&text)?;
    info!(path = %path.display(), size = cube.lut.size(), "loaded .cube LUT");
    Ok(cube)
}

fn parse_triple<'a>(mut tokens: impl Iterator<Item = &'a str>, line: usize) -> Result<[f32; 3]> {
    let mut out = [0.0_f32; 3];
    for slot in &mut out {
        let token = tokens
            .next()
            .ok_or_else(|| parse_error(line, "expected three values"))?;
        let value: f32 = token
            .parse()
            .map_err(|_| parse_error(line, format!("invalid number {token:?}")))?;
        if !value.is_finite() {
            return Err(parse_error(line, "non-finite value"));
        }
        *slot = value;
    }
    if tokens.next().is_some() {
        return Err(parse_error(line, "expected three values"));
    }
    Ok(out)
}

fn parse_error(line: usize, message: impl Into<String>) -> TransferError {
    TransferError::CubeParse {
        line,
        message: message.into(),
    }
}
