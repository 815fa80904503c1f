use common::observation::{MacAddress, ScanHeader, WirelessObservation};
use locator::transport::{Scan, ScanError, WirelessScanner};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Reports the observations listed in a CSV file.
///
/// One observation per line, the file is read again on every scan:
///
/// ```text
/// wifi,a4:2b:b0:01:02:03,-61,6
/// cell,26871000,41012,262,2
/// ```
pub struct CsvScanner {
    header: ScanHeader,
    path: Option<PathBuf>,
}

impl CsvScanner {
    /// Without a file every scan is empty.
    pub fn new(header: ScanHeader, path: Option<PathBuf>) -> Self {
        CsvScanner { header, path }
    }
}

impl WirelessScanner for CsvScanner {
    fn scan(&mut self) -> Result<Scan, ScanError> {
        let observations = match &self.path {
            Some(path) => read_observations(path)?,
            None => Vec::new(),
        };
        debug!("Scanned {} observations", observations.len());
        Ok(Scan {
            header: self.header.clone(),
            observations,
        })
    }
}

fn read_observations(path: &Path) -> Result<Vec<WirelessObservation>, ScanError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ScanError::Failed(format!("{}: {e}", path.display())))?;
    let mut observations = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| ScanError::Failed(e.to_string()))?;
        let observation = parse_record(&record)
            .ok_or_else(|| ScanError::Failed(format!("Invalid observation in line {}", line + 1)))?;
        observations.push(observation);
    }
    Ok(observations)
}

fn parse_record(record: &csv::StringRecord) -> Option<WirelessObservation> {
    match record.get(0)? {
        "wifi" => Some(WirelessObservation::wifi(
            MacAddress::from_str(record.get(1)?).ok()?.0,
            field(record, 2)?,
            field(record, 3)?,
        )),
        "cell" => Some(WirelessObservation::cell(
            field(record, 1)?,
            field(record, 2)?,
            field(record, 3)?,
            field(record, 4)?,
        )),
        _ => None,
    }
}

fn field<T: FromStr>(record: &csv::StringRecord, index: usize) -> Option<T> {
    record.get(index)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_scan_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{name}-{}.csv", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test_log::test]
    fn read_wifi_and_cell_observations() {
        let path = write_scan_file(
            "fleet-tracker-scan",
            "wifi, a4:2b:b0:01:02:03, -61, 6\ncell,26871000,41012,262,2\n",
        );
        let mut scanner = CsvScanner::new(ScanHeader::Wifi { consider_ip: true }, Some(path.clone()));

        let scan = scanner.scan();
        std::fs::remove_file(&path).unwrap();

        let scan = scan.unwrap();
        assert_eq!(scan.header, ScanHeader::Wifi { consider_ip: true });
        assert_eq!(
            scan.observations,
            vec![
                WirelessObservation::wifi([0xa4, 0x2b, 0xb0, 0x01, 0x02, 0x03], -61, 6),
                WirelessObservation::cell(26_871_000, 41_012, 262, 2),
            ]
        );
    }

    #[test_log::test]
    fn invalid_line_fails_the_scan() {
        let path = write_scan_file("fleet-tracker-invalid-scan", "wifi,not-a-mac,-61,6\n");
        let mut scanner = CsvScanner::new(ScanHeader::Wifi { consider_ip: false }, Some(path.clone()));

        let scan = scanner.scan();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            scan,
            Err(ScanError::Failed("Invalid observation in line 1".to_string()))
        );
    }

    #[test]
    fn scan_without_file_is_empty() {
        let mut scanner = CsvScanner::new(
            ScanHeader::Cellular {
                operator: "Telekom.de".to_string(),
            },
            None,
        );

        assert!(scanner.scan().unwrap().observations.is_empty());
    }

    #[test]
    fn missing_file_fails_the_scan() {
        let path = std::env::temp_dir().join("fleet-tracker-no-such-scan.csv");
        let mut scanner = CsvScanner::new(ScanHeader::Wifi { consider_ip: true }, Some(path));

        assert!(matches!(scanner.scan(), Err(ScanError::Failed(_))));
    }
}
