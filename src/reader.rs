use noodles::bgzf;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::chrom_registry::ChromosomeRegistry;
use crate::error::{RescueError, Result};
use crate::record::{Record, RecordLayout, RecordSet};

/// Open a file and auto-detect bgzip compression, returning a boxed BufRead
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| RescueError::InputAccess {
        path: path.to_path_buf(),
        source,
    })?;

    // Check by file extension (faster than reading magic bytes)
    let is_compressed = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz" || ext == "bgz")
        .unwrap_or(false);

    if is_compressed {
        Ok(Box::new(BufReader::new(bgzf::io::reader::Reader::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Check that an input file exists and can be opened, before any processing
pub fn check_input<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let meta = std::fs::metadata(path).map_err(|source| RescueError::InputAccess {
        path: path.to_path_buf(),
        source,
    })?;
    if meta.is_dir() {
        return Err(RescueError::InputAccess {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "is a directory"),
        });
    }
    File::open(path).map_err(|source| RescueError::InputAccess {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Line-based reader of tab-separated alignment records
pub struct RecordReader<R: BufRead> {
    reader: R,
    layout: RecordLayout,
    has_header: bool,
    header: Option<String>,
    registry: ChromosomeRegistry,
    line_no: usize,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R, layout: RecordLayout) -> Self {
        RecordReader {
            reader,
            layout,
            has_header: false,
            header: None,
            registry: ChromosomeRegistry::new(),
            line_no: 0,
        }
    }

    /// Treat the first line as a header and skip it
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn read_record(&mut self) -> Result<Option<Record>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let raw = line.trim_end_matches(['\n', '\r']);
            if self.has_header && self.line_no == 1 {
                self.header = Some(raw.to_string());
                continue;
            }
            if raw.trim().is_empty() {
                continue;
            }

            return Record::parse(self.layout, raw, self.line_no, &mut self.registry).map(Some);
        }
    }

    pub fn read_all(mut self) -> Result<RecordSet> {
        let mut records = Vec::new();
        while let Some(record) = self.read_record()? {
            records.push(record);
        }

        let mut set = RecordSet::new(self.layout, self.registry);
        set.header = self.header;
        for record in records {
            set.push(record);
        }
        set.finish()?;
        Ok(set)
    }
}

/// Read all records from a file (auto-detects bgzip compression)
pub fn read_records_file<P: AsRef<Path>>(
    path: P,
    layout: RecordLayout,
    has_header: bool,
) -> Result<RecordSet> {
    let input = open_input(path)?;
    RecordReader::new(input, layout).with_header(has_header).read_all()
}
