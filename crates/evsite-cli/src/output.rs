//! Record serialization for the CLI: pretty JSON or flat CSV.

use std::io::Write;

use evsite_enrich::SiteRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

/// Writes records in the chosen format.
///
/// JSON renders a single record as an object and several as an array; CSV
/// renders one header row (the column set is identical for every record)
/// followed by one row per record.
pub fn write_records(
    records: &[SiteRecord],
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            if let [record] = records {
                serde_json::to_writer_pretty(&mut *out, record)?;
            } else {
                serde_json::to_writer_pretty(&mut *out, records)?;
            }
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            if let Some(first) = records.first() {
                writer.write_record(first.flat_fields().iter().map(|(name, _)| *name))?;
            }
            for record in records {
                writer.write_record(record.flat_fields().iter().map(|(_, value)| value.as_str()))?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}
