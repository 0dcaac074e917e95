// ==========================================
// 服装生产排程系统 - 导入层
// ==========================================
// 职责: 外部 CSV / Excel 数据 → 作业、资源、工位快照
// 红线: 导入只做映射，不做业务校验（无效记录由引擎输出诊断）
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;

pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};

use crate::domain::job::Job;
use crate::domain::resource::Resource;
use crate::domain::station::StationMetric;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument};

/// 生产数据文件导入器
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductionImporter;

impl ProductionImporter {
    /// 导入作业表
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn import_jobs<P: AsRef<Path>>(&self, path: P) -> ImportResult<Vec<Job>> {
        let jobs = self.map_keyed_records(path.as_ref(), |r| FieldMapper.map_job(r), |job| {
            job.id.clone()
        })?;
        info!(count = jobs.len(), "作业表导入完成");
        Ok(jobs)
    }

    /// 导入资源表
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn import_resources<P: AsRef<Path>>(&self, path: P) -> ImportResult<Vec<Resource>> {
        let resources = self.map_keyed_records(
            path.as_ref(),
            |r| FieldMapper.map_resource(r),
            |resource| resource.id.clone(),
        )?;
        info!(count = resources.len(), "资源表导入完成");
        Ok(resources)
    }

    /// 导入工位快照表
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn import_station_metrics<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> ImportResult<Vec<StationMetric>> {
        let metrics = self.map_records(path.as_ref(), |r| FieldMapper.map_station_metric(r))?;
        info!(count = metrics.len(), "工位快照导入完成");
        Ok(metrics)
    }

    fn map_records<T, F>(&self, path: &Path, map: F) -> ImportResult<Vec<T>>
    where
        F: Fn(&RawRecord) -> ImportResult<T>,
    {
        UniversalFileParser
            .parse(path)?
            .iter()
            .map(map)
            .collect()
    }

    /// 映射并校验主键在文件内唯一
    fn map_keyed_records<T, F, K>(&self, path: &Path, map: F, key_of: K) -> ImportResult<Vec<T>>
    where
        F: Fn(&RawRecord) -> ImportResult<T>,
        K: Fn(&T) -> String,
    {
        let records = UniversalFileParser.parse(path)?;
        let mut first_seen: HashMap<String, usize> = HashMap::with_capacity(records.len());
        let mut items = Vec::with_capacity(records.len());

        for record in &records {
            let item = map(record)?;
            let key = key_of(&item);
            if let Some(&first_row) = first_seen.get(&key) {
                return Err(ImportError::DuplicateKey {
                    row: record.row_number,
                    first_row,
                    key,
                });
            }
            first_seen.insert(key, record.row_number);
            items.push(item);
        }
        Ok(items)
    }
}

