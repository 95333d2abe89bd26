//! Command resolver
//!
//! Turns a chat command and the latest stored row into the reply text.

use chrono::{FixedOffset, Offset, Utc};
use thiserror::Error;

use crate::{schema, Cell, CommandEntry, CommandTable, SensorRow};

/// Sent before the key listing when a command is not recognized
pub const HELP_PREAMBLE: &str = "Comando no reconocido. Comandos disponibles:\n";

/// Heading placed before composite replies
pub const LATEST_READING_HEADING: &str = "*Última lectura de LABSense:*";

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Errors raised while resolving a command
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No readings stored yet")]
    EmptyStore,
}

/// Formatting knobs for the reply
#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    /// Offset applied to the stored UTC timestamp before display
    pub utc_offset_secs: i32,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            utc_offset_secs: schema::DEFAULT_UTC_OFFSET_SECS,
        }
    }
}

/// Outcome of a resolution, tagged with the branch that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Direct(String),
    Composite(String),
    Help(String),
}

impl Resolution {
    pub fn text(&self) -> &str {
        match self {
            Resolution::Direct(t) | Resolution::Composite(t) | Resolution::Help(t) => t,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Resolution::Direct(t) | Resolution::Composite(t) | Resolution::Help(t) => t,
        }
    }
}

/// Lowercase and trim a raw command
pub fn normalize(command: &str) -> String {
    command.trim().to_lowercase()
}

/// Resolve `command` against the latest row
///
/// `last_row` is `None` when the store holds no rows.
pub fn resolve(
    table: &CommandTable,
    last_row: Option<&SensorRow>,
    command: &str,
    options: &ResolverOptions,
) -> Result<Resolution, ResolveError> {
    let row = match last_row {
        Some(row) if !row.is_empty() => row,
        _ => return Err(ResolveError::EmptyStore),
    };

    let key = normalize(command);

    let resolution = match table.get(&key) {
        None => Resolution::Help(help_message(table)),
        // Direct replies carry no heading; only composites get one.
        Some(CommandEntry::Direct { index, unit, name }) => {
            Resolution::Direct(format!("*{}*: {} {}", name, row.cell(*index), unit))
        }
        Some(CommandEntry::Composite { refs, name }) => {
            let mut text = latest_heading(row, options);
            text.push_str(&format!("*{}*:\n\n", name));
            for sub in refs {
                // Dangling references are skipped without a placeholder
                if let Some(entry) = table.get(sub) {
                    text.push_str(&format!(
                        "*{}*: {} {}\n",
                        entry.name(),
                        entry_value(entry, row),
                        entry.unit()
                    ));
                }
            }
            Resolution::Composite(text)
        }
    };

    Ok(resolution)
}

/// The fallback listing every key in table order
pub fn help_message(table: &CommandTable) -> String {
    let keys: Vec<&str> = table.keys().collect();
    format!("{}{}", HELP_PREAMBLE, keys.join("\n"))
}

fn latest_heading(row: &SensorRow, options: &ResolverOptions) -> String {
    format!(
        "{}\n{}\n\n",
        LATEST_READING_HEADING,
        format_timestamp(row.timestamp(), options)
    )
}

/// Render the timestamp cell in the configured offset
pub fn format_timestamp(cell: &Cell, options: &ResolverOptions) -> String {
    match cell {
        Cell::Timestamp(ts) => {
            let offset = FixedOffset::east_opt(options.utc_offset_secs)
                .unwrap_or_else(|| Utc.fix());
            ts.with_timezone(&offset).format(TIMESTAMP_FORMAT).to_string()
        }
        other => other.to_string(),
    }
}

fn entry_value<'a>(entry: &CommandEntry, row: &'a SensorRow) -> &'a Cell {
    match entry {
        CommandEntry::Direct { index, .. } => row.cell(*index),
        // A composite has no column of its own
        CommandEntry::Composite { .. } => &EMPTY,
    }
}

static EMPTY: Cell = Cell::Empty;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TelemetryRecord;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_row() -> SensorRow {
        let record: TelemetryRecord = serde_json::from_value(json!({
            "temperatura": 21.5, "humedad": 60, "lpg_ppm": 12, "h2_ppm": 3,
            "humo_ppm": 40, "benceno_mgL": 0.12, "alcohol_mgL": 0.3, "co_ppm": 7,
            "co2_ppm": 415, "amoniaco_ppm": 2, "tolueno_ppm": 1, "ica_valor": 40
        }))
        .unwrap();
        record.to_row(Utc.with_ymd_and_hms(2025, 3, 14, 18, 30, 5).unwrap())
    }

    fn run(command: &str) -> Resolution {
        resolve(
            &CommandTable::labsense(),
            Some(&sample_row()),
            command,
            &ResolverOptions::default(),
        )
        .expect("resolve failed")
    }

    #[test]
    fn test_direct_command() {
        assert_eq!(
            run("/temperatura"),
            Resolution::Direct("*Temperatura*: 21.5 °C".into())
        );
        assert_eq!(
            run("/co2"),
            Resolution::Direct("*Dióxido de Carbono (CO2)*: 415 ppm".into())
        );
    }

    #[test]
    fn test_direct_with_empty_unit_keeps_trailing_space() {
        assert_eq!(
            run("/ica").text(),
            "*Índice de Calidad del Aire (ICA)*: 40 "
        );
    }

    #[test]
    fn test_lookup_ignores_case_and_whitespace() {
        let expected = run("/temperatura");
        assert_eq!(run(" /TEMPERATURA "), expected);
        assert_eq!(run("/TeMpErAtUra"), expected);
        assert_eq!(run("\t/temperatura\n"), expected);
    }

    #[test]
    fn test_composite_command() {
        let text = run("/dht22").into_text();
        assert_eq!(
            text,
            "*Última lectura de LABSense:*\n14/03/2025 12:30:05\n\n\
             *Sensor DHT22*:\n\n\
             *Temperatura*: 21.5 °C\n\
             *Humedad*: 60 %\n"
        );
    }

    #[test]
    fn test_every_vocabulary_command() {
        const HEADING: &str = "*Última lectura de LABSense:*\n14/03/2025 12:30:05\n\n";
        let cases: [(&str, &str); 18] = [
            ("/temperatura", "*Temperatura*: 21.5 °C"),
            ("/humedad", "*Humedad*: 60 %"),
            ("/lpg", "*Gas LPG*: 12 ppm"),
            ("/h2", "*Hidrógeno (H2)*: 3 ppm"),
            ("/humo", "*Humo*: 40 ppm"),
            ("/benceno", "*Benceno*: 0.12 mg/L"),
            ("/alcohol", "*Alcohol*: 0.3 mg/L"),
            ("/co", "*Monóxido de Carbono (CO)*: 7 ppm"),
            ("/co2", "*Dióxido de Carbono (CO2)*: 415 ppm"),
            ("/amoniaco", "*Amoníaco*: 2 ppm"),
            ("/tolueno", "*Tolueno*: 1 ppm"),
            ("/ica", "*Índice de Calidad del Aire (ICA)*: 40 "),
            (
                "/dht22",
                "*Sensor DHT22*:\n\n*Temperatura*: 21.5 °C\n*Humedad*: 60 %\n",
            ),
            (
                "/mq2",
                "*Sensor MQ-2*:\n\n*Gas LPG*: 12 ppm\n*Hidrógeno (H2)*: 3 ppm\n*Humo*: 40 ppm\n",
            ),
            (
                "/mq3",
                "*Sensor MQ-3*:\n\n*Alcohol*: 0.3 mg/L\n*Benceno*: 0.12 mg/L\n",
            ),
            (
                "/mq7",
                "*Sensor MQ-7*:\n\n*Dióxido de Carbono (CO2)*: 415 ppm\n*Dióxido de Carbono (CO2)*: 415 ppm\n",
            ),
            (
                "/mq135",
                "*Sensor MQ-135*:\n\n*Dióxido de Carbono (CO2)*: 415 ppm\n*Amoníaco*: 2 ppm\n\
                 *Tolueno*: 1 ppm\n*Índice de Calidad del Aire (ICA)*: 40 \n",
            ),
            ("/anemometro", "*Anemómetro*:\n\n"),
        ];

        let table = CommandTable::labsense();
        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(keys, cases.map(|(key, _)| key).to_vec());

        for (key, expected) in cases {
            match table.get(key).expect("key in table") {
                CommandEntry::Direct { .. } => {
                    assert_eq!(run(key), Resolution::Direct(expected.to_string()), "{key}");
                }
                CommandEntry::Composite { .. } => {
                    assert_eq!(
                        run(key),
                        Resolution::Composite(format!("{HEADING}{expected}")),
                        "{key}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_composite_keeps_duplicate_refs() {
        let text = run("/mq7").into_text();
        assert_eq!(text.matches("*Dióxido de Carbono (CO2)*: 415 ppm\n").count(), 2);
        assert!(!text.contains("Monóxido"));
    }

    #[test]
    fn test_dangling_composite_renders_heading_only() {
        let text = run("/anemometro").into_text();
        assert!(text.ends_with("*Anemómetro*:\n\n"));
        assert_eq!(text.lines().filter(|l| l.starts_with("*")).count(), 2);
    }

    #[test]
    fn test_unknown_command_lists_every_key() {
        let table = CommandTable::labsense();
        let resolution = run("/unknown");

        let expected_body: Vec<&str> = table.keys().collect();
        assert_eq!(
            resolution,
            Resolution::Help(format!("{}{}", HELP_PREAMBLE, expected_body.join("\n")))
        );
        assert_eq!(expected_body.len(), 18);
    }

    #[test]
    fn test_empty_command_falls_back_to_help() {
        assert!(matches!(run("   "), Resolution::Help(_)));
    }

    #[test]
    fn test_empty_store() {
        let table = CommandTable::labsense();
        let options = ResolverOptions::default();

        assert_eq!(
            resolve(&table, None, "/temperatura", &options),
            Err(ResolveError::EmptyStore)
        );
        assert_eq!(
            resolve(&table, Some(&SensorRow::default()), "/nope", &options),
            Err(ResolveError::EmptyStore)
        );
    }

    #[test]
    fn test_missing_value_renders_blank() {
        let record: TelemetryRecord =
            serde_json::from_value(json!({"temperatura": 21.5})).unwrap();
        let row = record.to_row(Utc::now());
        let resolution = resolve(
            &CommandTable::labsense(),
            Some(&row),
            "/humo",
            &ResolverOptions::default(),
        )
        .unwrap();

        assert_eq!(resolution.text(), "*Humo*:  ppm");
    }

    #[test]
    fn test_timestamp_offset() {
        let cell = Cell::Timestamp(Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap());
        let utc = ResolverOptions { utc_offset_secs: 0 };

        assert_eq!(format_timestamp(&cell, &utc), "01/01/2025 03:00:00");
        assert_eq!(
            format_timestamp(&cell, &ResolverOptions::default()),
            "31/12/2024 21:00:00"
        );
        assert_eq!(format_timestamp(&Cell::Text("ayer".into()), &utc), "ayer");
    }
}
