//! 遥测日志输出

use crate::error::SinkError;
use crate::sample::{HEADER, SampleRow};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// 采样行的去向
pub trait LogSink {
    fn write_row(&mut self, row: &SampleRow) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: LogSink + ?Sized> LogSink for &mut S {
    fn write_row(&mut self, row: &SampleRow) -> Result<(), SinkError> {
        (**self).write_row(row)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

/// CSV 日志：首行为表头，每行写入后立即刷新
pub struct CsvLogSink<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl CsvLogSink<File> {
    /// 创建（覆盖）日志文件
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        Self::new(file)
    }
}

impl<W: Write> CsvLogSink<W> {
    pub fn new(inner: W) -> Result<Self, SinkError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

impl<W: Write> LogSink for CsvLogSink<W> {
    fn write_row(&mut self, row: &SampleRow) -> Result<(), SinkError> {
        self.writer.write_record(row.to_record())?;
        // 中途断电也不丢已采集的数据
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// 内存日志（测试与 `status` 使用）
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub rows: Vec<SampleRow>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogSink for MemorySink {
    fn write_row(&mut self, row: &SampleRow) -> Result<(), SinkError> {
        self.rows.push(row.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_sink_writes_header_and_na() {
        let mut sink = CsvLogSink::new(Vec::new()).unwrap();
        let row = SampleRow {
            sp_temp: Some(-10.03),
            ..SampleRow::new(3)
        };
        sink.write_row(&row).unwrap();
        assert_eq!(sink.rows_written(), 1);

        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Time_Stamp,SP_Temp,SP_SetPoint"));
        assert_eq!(lines[1], "3,-10.03,NA,NA,NA,NA,NA,NA,NA,NA,NA,NA");
    }

    #[test]
    fn test_csv_sink_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        {
            let mut sink = CsvLogSink::create(&path).unwrap();
            sink.write_row(&SampleRow::new(0)).unwrap();
            sink.write_row(&SampleRow::new(1)).unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
