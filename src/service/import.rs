//! Team roster CSV: a header row containing `Team Name`, one team per row.

use csv::{ReaderBuilder, Trim};

use crate::error::{Error, Result};

pub const TEAM_NAME_HEADER: &str = "Team Name";

pub const SAMPLE_TEAMS_CSV: &str = "Team Name
Team Alpha
Team Beta
Team Gamma
Team Delta
Team Echo
Team Foxtrot
Team Golf
Team Hotel
";

pub const SAMPLE_FILENAME: &str = "sample_teams.csv";

/// Upload names must end in `.csv`, in any case.
pub fn check_csv_filename(filename: &str) -> Result<()> {
    let is_csv = filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        Ok(())
    } else {
        Err(Error::Validation("Only CSV files are allowed".to_string()))
    }
}

/// Parses the whole file before anything is written. Returns non-blank team
/// names in file order, repeats included; the import decides what to skip.
pub fn parse_team_names(data: &[u8]) -> Result<Vec<String>> {
    let text = std::str::from_utf8(data)
        .map_err(|_| Error::Csv("file is not valid UTF-8".to_string()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let column = reader
        .headers()?
        .iter()
        .position(|h| h == TEAM_NAME_HEADER)
        .ok_or_else(|| Error::Csv(format!("missing '{TEAM_NAME_HEADER}' column")))?;

    let mut names = Vec::new();
    for record in reader.records() {
        let record = record?;
        match record.get(column) {
            Some(name) if !name.is_empty() => names.push(name.to_string()),
            _ => {}
        }
    }

    Ok(names)
}
