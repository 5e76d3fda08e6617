use super::TabularSink;
use crate::error::SinkError;
use crate::models::{Sheet, TabularDocument};
use async_trait::async_trait;
use csv::Writer;
use std::path::{Path, PathBuf};

/// UTF-8 BOM, 便于表格软件识别编码
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 以目录形式输出表格文档: `<name>/NN_<sheet>.csv`, 每个工作表一个 CSV
///
/// 列宽与表头样式无法在 CSV 中表达, 写出时忽略
#[derive(Debug, Clone)]
pub struct CsvWorkbookSink {
    output_dir: PathBuf,
}

impl CsvWorkbookSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// 将工作表编码为 CSV 字节
pub fn sheet_to_csv(sheet: &Sheet) -> Result<Vec<u8>, SinkError> {
    let mut buffer = UTF8_BOM.to_vec();
    {
        // 行长度不一 (统计表两列, 明细表八列)
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(&mut buffer);
        write_rows(&mut writer, sheet)?;
        writer.flush()?;
    }
    Ok(buffer)
}

fn write_rows<W: std::io::Write>(writer: &mut Writer<W>, sheet: &Sheet) -> Result<(), SinkError> {
    for row in &sheet.rows {
        writer.write_record(row.iter().map(|cell| cell.display()))?;
    }
    Ok(())
}

#[async_trait]
impl TabularSink for CsvWorkbookSink {
    async fn write(&self, document: &TabularDocument) -> Result<PathBuf, SinkError> {
        let target = self.output_dir.join(&document.name);
        // 同名产物整体替换, 不与上一次导出的工作表混在一起
        match tokio::fs::remove_dir_all(&target).await {
            Ok(()) => tracing::debug!("覆盖已有产物 {}", target.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tokio::fs::create_dir_all(&target).await?;

        let start_time = std::time::Instant::now();
        for (idx, sheet) in document.sheets.iter().enumerate() {
            let bytes = sheet_to_csv(sheet)?;
            let path = target.join(format!("{:02}_{}.csv", idx + 1, sheet.name));
            tokio::fs::write(&path, bytes).await?;
            tracing::debug!("写出工作表 {} ({} 行)", path.display(), sheet.rows.len());
        }

        tracing::info!(
            "✓ 表格导出完成: {} 个工作表 -> {}, 耗时: {:?}",
            document.sheets.len(),
            target.display(),
            start_time.elapsed()
        );
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn sheet(name: &str, rows: Vec<Vec<Cell>>) -> Sheet {
        Sheet {
            name: name.to_string(),
            rows,
            column_widths: vec![],
            header_style: None,
        }
    }

    #[test]
    fn encodes_ragged_rows_with_bom() {
        let sheet = sheet(
            "s",
            vec![
                vec![Cell::text("a,b"), Cell::Number(2.0), Cell::Empty],
                vec![Cell::text("x")],
            ],
        );
        let bytes = sheet_to_csv(&sheet).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(std::str::from_utf8(&bytes[3..]).unwrap(), "\"a,b\",2,\nx\n");
    }

    #[tokio::test]
    async fn writes_one_file_per_sheet() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sink = CsvWorkbookSink::new(temp_dir.path());
        let document = TabularDocument {
            name: "ETA_Invoices_Page1_20240101".to_string(),
            sheets: vec![
                sheet("ملخص الفواتير", vec![vec![Cell::text("h")]]),
                sheet("الإحصائيات", vec![vec![Cell::text("k"), Cell::Number(1.0)]]),
            ],
        };

        let target = sink.write(&document).await.unwrap();

        assert_eq!(target, temp_dir.path().join("ETA_Invoices_Page1_20240101"));
        let summary = std::fs::read(target.join("01_ملخص الفواتير.csv")).unwrap();
        assert_eq!(&summary[3..], b"h\n");
        assert!(target.join("02_الإحصائيات.csv").exists());
    }

    #[tokio::test]
    async fn rewriting_same_name_replaces_previous_sheets() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sink = CsvWorkbookSink::new(temp_dir.path());
        let name = "ETA_Invoices_Page1_20240101".to_string();

        let with_details = TabularDocument {
            name: name.clone(),
            sheets: vec![
                sheet("ملخص الفواتير", vec![vec![Cell::text("a")]]),
                sheet("تفاصيل_فاتورة_1", vec![vec![Cell::text("d1")]]),
                sheet("تفاصيل_فاتورة_2", vec![vec![Cell::text("d2")]]),
                sheet("الإحصائيات", vec![vec![Cell::text("k"), Cell::Number(2.0)]]),
            ],
        };
        sink.write(&with_details).await.unwrap();

        let summary_only = TabularDocument {
            name,
            sheets: vec![
                sheet("ملخص الفواتير", vec![vec![Cell::text("b")]]),
                sheet("الإحصائيات", vec![vec![Cell::text("k"), Cell::Number(1.0)]]),
            ],
        };
        let target = sink.write(&summary_only).await.unwrap();

        let mut files: Vec<String> = std::fs::read_dir(&target)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(files, vec!["01_ملخص الفواتير.csv", "02_الإحصائيات.csv"]);
        let summary = std::fs::read(target.join("01_ملخص الفواتير.csv")).unwrap();
        assert_eq!(&summary[3..], b"b\n");
    }
}
