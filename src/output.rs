//! Tabular output for the `print` commands.

use std::io::Write;

use crate::error::GamResult;
use crate::sanitize::clean_cell;

/// Writes a header row and data rows as CSV.
///
/// Cells are cleaned of control characters; short rows are padded so every
/// record has the header's width.
///
/// # Examples
///
/// ```
/// let mut out = Vec::new();
/// gam::output::write_csv(&mut out, &["Email", "Firstname"], &[vec!["a@example.com".to_string()]]).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "Email,Firstname\na@example.com,\n");
/// ```
pub fn write_csv<W, H>(out: W, header: &[H], rows: &[Vec<String>]) -> GamResult<()>
where
    W: Write,
    H: AsRef<str>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);
    writer
        .write_record(header.iter().map(|h| h.as_ref()))
        .map_err(std::io::Error::from)?;
    for row in rows {
        let mut record: Vec<String> = row.iter().map(|c| clean_cell(c)).collect();
        record.resize(header.len().max(record.len()), String::new());
        writer.write_record(&record).map_err(std::io::Error::from)?;
    }
    writer.flush()?;
    Ok(())
}

/// [`write_csv`] to stdout.
pub fn print_csv<H: AsRef<str>>(header: &[H], rows: &[Vec<String>]) -> GamResult<()> {
    write_csv(std::io::stdout().lock(), header, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_cells_that_need_it() {
        let mut out = Vec::new();
        write_csv(
            &mut out,
            &["Name", "Description"],
            &[vec!["Sales, East".to_string(), "line1\nline2".to_string()]],
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Name,Description\n\"Sales, East\",line1 line2\n"
        );
    }
}
