//! Band table loading: JSON rows or UCSC cytoBand text

use idiogram_core::RawBand;
use std::io::BufRead;
use std::path::Path;

use crate::error::{CliError, CliResult};

/// Read band rows from `path`. `.json` files hold an array of rows; anything
/// else is parsed as tab-separated cytoBand text.
pub fn load_rows(path: &Path) -> CliResult<Vec<RawBand>> {
    if !path.exists() {
        return Err(CliError::file_not_found(path.to_path_buf()));
    }
    let file_name = path.display().to_string();
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let rows = if is_json {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|err| CliError::parse(file_name.clone(), err.to_string()))?
    } else {
        let file = std::fs::File::open(path)?;
        parse_cytoband(std::io::BufReader::new(file), &file_name)?
    };
    log::info!("Loaded {} band rows from {}", rows.len(), file_name);
    Ok(rows)
}

/// Parse `chrom  start  end  name  stain` lines. `#` comments and blank lines are skipped.
pub fn parse_cytoband<R: BufRead>(reader: R, file_name: &str) -> CliResult<Vec<RawBand>> {
    let mut rows = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 5 {
            return Err(CliError::parse(
                file_name.to_string(),
                format!(
                    "line {}: expected 5 tab-separated columns, got {}",
                    line_num + 1,
                    fields.len()
                ),
            ));
        }

        let coordinate = |index: usize| {
            fields[index].trim().parse::<i64>().map_err(|err| {
                CliError::parse(
                    file_name.to_string(),
                    format!("line {}: invalid coordinate '{}': {}", line_num + 1, fields[index], err),
                )
            })
        };

        rows.push(RawBand {
            chromosome: fields[0].trim().to_string(),
            start: coordinate(1)?,
            end: coordinate(2)?,
            name: fields[3].trim().to_string(),
            stain: fields[4].trim().to_string(),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const CYTOBAND: &str = "\
#chrom\tchromStart\tchromEnd\tname\tgieStain
chr1\t0\t2300000\tp36.33\tgneg
chr1\t2300000\t5300000\tp36.32\tgpos25

chrX\t0\t4400000\tp22.33\tgneg
";

    #[test]
    fn test_parse_cytoband() {
        let rows = parse_cytoband(Cursor::new(CYTOBAND), "cytoBand.txt").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], RawBand::new("chr1", 2300000, 5300000, "p36.32", "gpos25"));
        assert_eq!(rows[2].chromosome, "chrX");
    }

    #[test]
    fn test_parse_cytoband_errors() {
        let short = parse_cytoband(Cursor::new("chr1\t0\t100\n"), "short.txt");
        assert!(matches!(short, Err(CliError::Parse { .. })));

        let bad = parse_cytoband(Cursor::new("chr1\t0\tten\tp1\tgneg\n"), "bad.txt");
        let message = bad.unwrap_err().to_string();
        assert!(message.contains("line 1"));
        assert!(message.contains("ten"));
    }

    #[test]
    fn test_load_json_rows() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"chromosome":"chr2","start":0,"end":800,"name":"q21","stain":"gneg"}}]"#
        )
        .unwrap();
        let rows = load_rows(file.path()).unwrap();
        assert_eq!(rows, vec![RawBand::new("chr2", 0, 800, "q21", "gneg")]);
    }

    #[test]
    fn test_load_text_rows() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CYTOBAND.as_bytes()).unwrap();
        assert_eq!(load_rows(file.path()).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_file() {
        let missing = load_rows(Path::new("/nonexistent/cytoBand.txt"));
        assert!(matches!(missing, Err(CliError::FileNotFound { .. })));
    }
}
