//! Reading jobs, scenarios, screenshots and location fixes from disk.

use std::io::BufRead;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;

use crate::error::FleetlineError;
use crate::fleet::FleetScenario;
use crate::geo::GeoFix;
use crate::shift::Job;
use crate::tracking::parse_fix_line;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, FleetlineError> {
    let contents = std::fs::read_to_string(path).map_err(|source| FleetlineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| FleetlineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// A JSON array of jobs.
pub fn read_jobs(path: &Path) -> Result<Vec<Job>, FleetlineError> {
    read_json(path)
}

/// A JSON `{drivers, orders}` scenario.
pub fn read_scenario(path: &Path) -> Result<FleetScenario, FleetlineError> {
    read_json(path)
}

/// Base64 payload and MIME type of a PNG, JPEG or WebP image.
pub fn read_image(path: &Path) -> Result<(String, &'static str), FleetlineError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mime = match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => return Err(FleetlineError::ImageType(path.to_path_buf())),
    };
    let bytes = std::fs::read(path).map_err(|source| FleetlineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((STANDARD.encode(bytes), mime))
}

/// Every fix in a `lat,lon` per line stream, skipping blanks and comments.
pub fn read_fixes(reader: impl BufRead) -> Result<Vec<GeoFix>, FleetlineError> {
    let mut fixes = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| FleetlineError::Read {
            path: "<input>".into(),
            source,
        })?;
        match parse_fix_line(&line) {
            Ok(Some(fix)) => fixes.push(fix),
            Ok(None) => {}
            Err(e) => {
                return Err(FleetlineError::Fix {
                    line: idx + 1,
                    message: format!("{e:#}"),
                });
            }
        }
    }
    Ok(fixes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn reads_jobs_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"platform": "DoorDash", "restaurant": "Wok", "pay": 9.5, "distance": 2.0}}]"#
        )
        .unwrap();
        let jobs = read_jobs(file.path()).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].restaurant, "Wok");
        assert!(!jobs[0].id.is_empty());
    }

    #[test]
    fn bad_json_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{{").unwrap();
        let err = read_jobs(file.path()).unwrap_err();
        assert!(matches!(err, FleetlineError::Json { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn image_type_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("offer.PNG");
        std::fs::write(&png, [1u8, 2, 3]).unwrap();
        let (data, mime) = read_image(&png).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(data, "AQID");

        let gif = dir.path().join("offer.gif");
        assert!(matches!(read_image(&gif), Err(FleetlineError::ImageType(_))));
    }

    #[test]
    fn fixes_report_line_numbers() {
        let fixes = read_fixes(Cursor::new("# start\n0,0\n\n0,1\n")).unwrap();
        assert_eq!(fixes.len(), 2);

        let err = read_fixes(Cursor::new("0,0\nnorth\n")).unwrap_err();
        assert!(matches!(err, FleetlineError::Fix { line: 2, .. }));
    }
}
