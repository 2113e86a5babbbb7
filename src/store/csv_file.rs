use crate::core::error::{Result, TrackerError};
use crate::core::store::{AppendLog, TabularRow};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Append-only CSV file with a header row.
///
/// Reading tolerates missing and unknown columns. Appending rows that carry
/// columns the file lacks widens the header; existing cells are kept and new
/// columns are left empty for old rows.
#[derive(Debug, Clone)]
pub struct CsvLog<R> {
    path: PathBuf,
    _row: PhantomData<fn() -> R>,
}

impl<R> CsvLog<R> {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            _row: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_empty_file(&self) -> Result<bool> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    fn read_records(&self) -> Result<(Vec<String>, Vec<csv::StringRecord>)> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_path(&self.path)?;
        let header: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((header, records))
    }

    fn read_header(&self) -> Result<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_path(&self.path)?;
        Ok(reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect())
    }

    fn ends_with_newline(&self) -> Result<bool> {
        let mut file = File::open(&self.path)?;
        if file.seek(SeekFrom::End(0))? == 0 {
            return Ok(true);
        }
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] == b'\n')
    }
}

fn encode(header: &[String], rows: &[Vec<String>], with_header: bool) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if with_header {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| TrackerError::Storage(e.to_string()))
}

/// Orders `fields` by `header`, leaving unknown columns empty.
fn project(header: &[String], fields: &HashMap<String, String>) -> Vec<String> {
    header
        .iter()
        .map(|column| fields.get(column).cloned().unwrap_or_default())
        .collect()
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

impl<R: TabularRow> AppendLog<R> for CsvLog<R> {
    fn load(&self) -> Result<Vec<R>> {
        if self.is_empty_file()? {
            debug!("No ledger at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let (header, records) = self.read_records()?;
        let rows = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let fields: HashMap<String, String> = header
                    .iter()
                    .zip(record.iter())
                    .map(|(column, value)| (column.clone(), value.to_string()))
                    .collect();
                R::from_fields(i + 1, &fields)
            })
            .collect::<Result<Vec<R>>>()?;

        debug!("Loaded {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }

    fn append(&self, rows: &[R]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let new_fields: Vec<Vec<(String, String)>> = rows.iter().map(TabularRow::to_fields).collect();
        let fresh = self.is_empty_file()?;
        let existing = if fresh { Vec::new() } else { self.read_header()? };

        let mut header = existing.clone();
        for (column, _) in new_fields.iter().flatten() {
            if !header.contains(column) {
                header.push(column.clone());
            }
        }

        let encoded_rows: Vec<Vec<String>> = new_fields
            .into_iter()
            .map(|fields| project(&header, &fields.into_iter().collect()))
            .collect();

        if fresh {
            ensure_parent_dir(&self.path)?;
            let bytes = encode(&header, &encoded_rows, true)?;
            let mut file = File::create(&self.path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            info!("Created {} with {} rows", self.path.display(), rows.len());
            return Ok(());
        }

        if header.len() == existing.len() {
            let mut bytes = encode(&header, &encoded_rows, false)?;
            if !self.ends_with_newline()? {
                bytes.insert(0, b'\n');
            }
            let mut file = OpenOptions::new().append(true).open(&self.path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            debug!("Appended {} rows to {}", rows.len(), self.path.display());
            return Ok(());
        }

        // New columns: rewrite with the wider header, padding old rows.
        let (_, records) = self.read_records()?;
        let mut all_rows: Vec<Vec<String>> = records
            .iter()
            .map(|record| {
                let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
                cells.resize(header.len(), String::new());
                cells
            })
            .collect();
        all_rows.extend(encoded_rows);

        let bytes = encode(&header, &all_rows, true)?;
        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&bytes)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        info!(
            added = ?&header[existing.len()..],
            "Widened header of {}",
            self.path.display()
        );
        Ok(())
    }
}
